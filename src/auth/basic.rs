//! Basic gate: a single shared username/password pair.
//!
//! The gate controls access; it does not establish who the caller is, so no
//! identity is attached to the request.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::auth::credentials::{from_headers, Scheme};
use crate::config::BasicAuthConfig;
use crate::error::{GateError, GateResult};
use crate::http::response::{reject, Outcome};

/// State for [`basic_auth`].
#[derive(Clone)]
pub struct BasicGate {
    username: Arc<str>,
    password: Arc<str>,
}

impl BasicGate {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn from_config(config: &BasicAuthConfig) -> Self {
        Self::new(&config.user, &config.pass)
    }

    /// Check the request's Basic credentials against the configured pair.
    pub fn check(&self, headers: &axum::http::HeaderMap) -> GateResult<()> {
        let pair = from_headers(headers, Scheme::Basic)?.basic()?;

        // Evaluate both fields so timing does not reveal which one differed.
        let user_ok = pair.username.as_bytes().ct_eq(self.username.as_bytes());
        let pass_ok = pair.password.as_bytes().ct_eq(self.password.as_bytes());

        if bool::from(user_ok & pass_ok) {
            Ok(())
        } else {
            Err(GateError::InvalidCredentials)
        }
    }
}

/// Middleware admitting only requests carrying the shared Basic credentials.
pub async fn basic_auth(State(gate): State<BasicGate>, request: Request, next: Next) -> Response {
    match gate.check(request.headers()) {
        Ok(()) => next.run(request).await,
        Err(e) => reject(&request, &e, Outcome::UnauthorizedBasic),
    }
}
