//! Gatekeeper error taxonomy.
//!
//! Every stage reports failures as a [`GateError`]. Gates convert the errors
//! of their own stage into exactly one terminal [`Outcome`].

use std::time::Duration;

use crate::domain::UserId;
use crate::http::response::Outcome;

#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("missing authorization header")]
    MissingHeader,

    #[error("invalid authorization header format: {0}")]
    MalformedHeader(&'static str),

    #[error("invalid base64 credentials: {0}")]
    DecodeError(#[from] base64::DecodeError),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("user {0} not found")]
    IdentityNotFound(UserId),

    #[error("infrastructure error: {0}")]
    Infrastructure(String),

    #[error("forbidden")]
    Forbidden,

    #[error("rate limit exceeded, retry after {retry_after:?}")]
    RateLimitExceeded { retry_after: Duration },
}

impl GateError {
    pub fn infrastructure(err: impl std::fmt::Display) -> Self {
        GateError::Infrastructure(err.to_string())
    }

    /// Whether the caller can fix this by presenting different credentials.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            GateError::MissingHeader
                | GateError::MalformedHeader(_)
                | GateError::DecodeError(_)
                | GateError::InvalidCredentials
                | GateError::InvalidToken(_)
                | GateError::IdentityNotFound(_)
        )
    }

    /// Default mapping used by every gate except the Basic gate.
    pub fn outcome(&self) -> Outcome {
        match self {
            e if e.is_authentication_failure() => Outcome::Unauthorized,
            GateError::Forbidden => Outcome::Forbidden,
            GateError::RateLimitExceeded { retry_after } => Outcome::RateLimitExceeded {
                retry_after: *retry_after,
            },
            _ => Outcome::InternalError,
        }
    }
}

pub type GateResult<T> = Result<T, GateError>;
