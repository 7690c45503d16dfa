//! Ownership-or-role gate middleware.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::Authorizer;
use crate::domain::Owned;
use crate::error::GateError;
use crate::http::request::{Identity, Resource};
use crate::http::response::{reject, Outcome};

/// State for [`authorize`]: the authorizer and the role the route requires.
#[derive(Clone)]
pub struct OwnershipGate {
    authorizer: Arc<Authorizer>,
    required_role: Arc<str>,
}

impl OwnershipGate {
    pub fn new(authorizer: Arc<Authorizer>, required_role: &str) -> Self {
        Self {
            authorizer,
            required_role: required_role.into(),
        }
    }

    pub fn required_role(&self) -> &str {
        &self.required_role
    }
}

/// Middleware letting the resource owner, or anyone holding at least the
/// required role, through to the handler.
///
/// Must run after the Bearer gate and after the loader inserting
/// `Resource<R>`.
pub async fn authorize<R>(State(gate): State<OwnershipGate>, request: Request, next: Next) -> Response
where
    R: Owned + Send + Sync + 'static,
{
    let user = request.extensions().get::<Identity>().map(|i| i.0.clone());
    let resource = request.extensions().get::<Resource<R>>().map(|r| r.0.clone());

    let (user, resource) = match (user, resource) {
        (Some(user), Some(resource)) => (user, resource),
        _ => {
            let err = GateError::Infrastructure("ownership gate composed without identity or resource".into());
            return reject(&request, &err, Outcome::InternalError);
        }
    };

    match gate.authorizer.authorize(&user, &*resource, gate.required_role()).await {
        Ok(true) => next.run(request).await,
        Ok(false) => {
            tracing::debug!(
                user_id = %user.id,
                owner_id = %resource.owner_id(),
                required_role = gate.required_role(),
                "Neither owner nor privileged enough"
            );
            reject(&request, &GateError::Forbidden, Outcome::Forbidden)
        }
        Err(e) => reject(&request, &e, Outcome::InternalError),
    }
}
