//! Terminal gate outcomes and their wire form.
//!
//! # Wire mapping
//! ```text
//! unauthorized-basic   401  WWW-Authenticate: Basic realm="restricted", charset="UTF-8"
//! unauthorized         401
//! forbidden            403
//! rate-limit-exceeded  429  Retry-After: <secs>
//! internal-error       500
//! ```
//!
//! Bodies are `{"error": "..."}`. Internal failures never leak their cause to
//! the client; it is logged instead.

use axum::{
    body::Body,
    http::{header, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::time::Duration;

use crate::error::GateError;
use crate::http::request::request_id;
use crate::observability::metrics;

/// The response a gate ends the pipeline with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    UnauthorizedBasic,
    Unauthorized,
    Forbidden,
    RateLimitExceeded { retry_after: Duration },
    InternalError,
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::UnauthorizedBasic => "unauthorized-basic",
            Outcome::Unauthorized => "unauthorized",
            Outcome::Forbidden => "forbidden",
            Outcome::RateLimitExceeded { .. } => "rate-limit-exceeded",
            Outcome::InternalError => "internal-error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Outcome::UnauthorizedBasic | Outcome::Unauthorized => StatusCode::UNAUTHORIZED,
            Outcome::Forbidden => StatusCode::FORBIDDEN,
            Outcome::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            Outcome::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Whole seconds a client should wait, rounded up and never zero.
pub fn retry_after_secs(retry_after: Duration) -> u64 {
    let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
    secs.max(1)
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        metrics::record_outcome(self.label());

        let status = self.status();
        let mut response = match &self {
            Outcome::UnauthorizedBasic | Outcome::Unauthorized => {
                (status, Json(json!({ "error": "unauthorized" }))).into_response()
            }
            Outcome::Forbidden => (status, Json(json!({ "error": "forbidden" }))).into_response(),
            Outcome::RateLimitExceeded { retry_after } => {
                let secs = retry_after_secs(*retry_after);
                (
                    status,
                    [(header::RETRY_AFTER, secs.to_string())],
                    Json(json!({
                        "error": format!("rate limit exceeded, retry after: {}s", secs),
                        "retry_after_secs": secs,
                    })),
                )
                    .into_response()
            }
            Outcome::InternalError => (
                status,
                Json(json!({ "error": "the server encountered a problem" })),
            )
                .into_response(),
        };

        if self == Outcome::UnauthorizedBasic {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(r#"Basic realm="restricted", charset="UTF-8""#),
            );
        }
        response
    }
}

/// Log why a request was stopped and answer with `outcome`.
pub fn reject(request: &Request<Body>, error: &GateError, outcome: Outcome) -> Response {
    let request_id = request_id(request.headers());
    let method = request.method();
    let path = request.uri().path();

    match outcome {
        Outcome::InternalError => tracing::error!(
            request_id = %request_id,
            method = %method,
            path = %path,
            error = %error,
            "internal error"
        ),
        _ => tracing::warn!(
            request_id = %request_id,
            method = %method,
            path = %path,
            error = %error,
            outcome = outcome.label(),
            "request rejected"
        ),
    }

    outcome.into_response()
}
