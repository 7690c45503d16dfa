//! Typed per-request context.
//!
//! Gates attach what they establish as typed request extensions and
//! handlers read them through extractors. Reading a slot that no gate in
//! front of the handler fills is a wiring bug and answers `internal-error`.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use std::sync::Arc;

use crate::domain::User;
use crate::http::response::Outcome;

pub const X_REQUEST_ID: &str = "x-request-id";

/// The caller established by the Bearer gate.
#[derive(Debug, Clone)]
pub struct Identity(pub Arc<User>);

/// The resource a request targets, loaded by the application.
#[derive(Debug)]
pub struct Resource<R>(pub Arc<R>);

impl<R> Clone for Resource<R> {
    fn clone(&self) -> Self {
        Resource(self.0.clone())
    }
}

/// The request id set by the request-id layer, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Extracts the authenticated user.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Arc<User>);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Outcome;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Identity>() {
            Some(identity) => Ok(CurrentUser(identity.0.clone())),
            None => {
                tracing::error!(path = %parts.uri.path(), "Identity read before the bearer gate ran");
                Err(Outcome::InternalError)
            }
        }
    }
}

/// Extracts the loaded target resource of type `R`.
#[derive(Debug)]
pub struct CurrentResource<R>(pub Arc<R>);

impl<S, R> FromRequestParts<S> for CurrentResource<R>
where
    S: Send + Sync,
    R: Send + Sync + 'static,
{
    type Rejection = Outcome;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Resource<R>>() {
            Some(resource) => Ok(CurrentResource(resource.0.clone())),
            None => {
                tracing::error!(
                    path = %parts.uri.path(),
                    resource = std::any::type_name::<R>(),
                    "Resource read before it was loaded"
                );
                Err(Outcome::InternalError)
            }
        }
    }
}
