//! Bearer gate: token validation followed by identity resolution.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::auth::credentials::{from_headers, Scheme};
use crate::auth::token::TokenValidator;
use crate::domain::User;
use crate::error::GateResult;
use crate::http::request::Identity;
use crate::http::response::reject;
use crate::identity::IdentityResolver;

/// State for [`bearer_auth`].
#[derive(Clone)]
pub struct BearerGate {
    validator: Arc<dyn TokenValidator>,
    resolver: Arc<IdentityResolver>,
}

impl BearerGate {
    pub fn new(validator: Arc<dyn TokenValidator>, resolver: Arc<IdentityResolver>) -> Self {
        Self {
            validator,
            resolver,
        }
    }

    /// Verify the request's token and resolve its subject.
    pub async fn authenticate(&self, headers: &HeaderMap) -> GateResult<Arc<User>> {
        let credentials = from_headers(headers, Scheme::Bearer)?;
        let claims = self.validator.validate_token(credentials.token()?)?;
        self.resolver.resolve(claims.subject).await
    }
}

/// Middleware attaching the caller's [`Identity`] or stopping the request.
///
/// Authentication failures answer `unauthorized`; a failing store or cache
/// answers `internal-error`.
pub async fn bearer_auth(
    State(gate): State<BearerGate>,
    mut request: Request,
    next: Next,
) -> Response {
    let authenticated = gate.authenticate(request.headers()).await;
    match authenticated {
        Ok(user) => {
            tracing::debug!(user_id = %user.id, "Bearer token accepted");
            request.extensions_mut().insert(Identity(user));
            next.run(request).await
        }
        Err(e) => reject(&request, &e, e.outcome()),
    }
}
