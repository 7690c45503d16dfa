//! `Authorization` header parsing.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::{GateError, GateResult};

/// Authentication scheme named in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Basic,
    Bearer,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Basic => "Basic",
            Scheme::Bearer => "Bearer",
        }
    }
}

/// Credentials lifted out of a header, not yet verified.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub scheme: Scheme,
    /// Decoded payload for Basic, the token bytes for Bearer.
    pub raw: Vec<u8>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("scheme", &self.scheme)
            .field("raw", &"<redacted>")
            .finish()
    }
}

/// A decoded `username:password` pair.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Split a Basic payload on the first `:`.
    pub fn basic(&self) -> GateResult<BasicCredentials> {
        if self.scheme != Scheme::Basic {
            return Err(GateError::MalformedHeader("expected Basic credentials"));
        }
        let decoded = std::str::from_utf8(&self.raw)
            .map_err(|_| GateError::MalformedHeader("credentials are not valid UTF-8"))?;
        let (username, password) = decoded
            .split_once(':')
            .ok_or(GateError::MalformedHeader("expected `username:password`"))?;

        Ok(BasicCredentials {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    /// The opaque Bearer token.
    pub fn token(&self) -> GateResult<&str> {
        if self.scheme != Scheme::Bearer {
            return Err(GateError::MalformedHeader("expected Bearer credentials"));
        }
        std::str::from_utf8(&self.raw)
            .map_err(|_| GateError::MalformedHeader("token is not valid UTF-8"))
    }
}

/// Parse an `Authorization` header value for the given scheme.
///
/// The header must be exactly `<scheme> <credentials>` with a single space.
pub fn decode(header: Option<&str>, expected: Scheme) -> GateResult<Credentials> {
    let header = header
        .filter(|h| !h.is_empty())
        .ok_or(GateError::MissingHeader)?;

    let mut parts = header.split(' ');
    let (scheme, value) = match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(value), None) => (scheme, value),
        _ => {
            return Err(GateError::MalformedHeader(
                "expected `<scheme> <credentials>`",
            ))
        }
    };

    if scheme != expected.as_str() {
        return Err(GateError::MalformedHeader("unexpected authorization scheme"));
    }

    let raw = match expected {
        Scheme::Basic => STANDARD.decode(value)?,
        Scheme::Bearer => value.as_bytes().to_vec(),
    };

    Ok(Credentials {
        scheme: expected,
        raw,
    })
}

/// Read and decode the `Authorization` header of a request.
pub fn from_headers(headers: &HeaderMap, expected: Scheme) -> GateResult<Credentials> {
    let header = headers
        .get(AUTHORIZATION)
        .map(|v| {
            v.to_str()
                .map_err(|_| GateError::MalformedHeader("header is not visible ASCII"))
        })
        .transpose()?;
    decode(header, expected)
}
