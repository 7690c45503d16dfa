//! Bearer token validation.
//!
//! Tokens are HS256 JWTs pinned to a configured issuer and audience. The
//! `sub` claim carries the numeric user id.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::Value;

use crate::config::TokenConfig;
use crate::domain::UserId;
use crate::error::{GateError, GateResult};

/// Claims extracted from a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub subject: UserId,
    pub expires_at: DateTime<Utc>,
    pub issued_at: Option<DateTime<Utc>>,
    pub issuer: Option<String>,
    pub audience: Vec<String>,
}

/// Verifies a bearer token and extracts its claims.
pub trait TokenValidator: Send + Sync {
    fn validate_token(&self, token: &str) -> GateResult<TokenClaims>;
}

/// Wire form of the claims we read.
#[derive(Debug, Deserialize)]
struct RawClaims {
    #[serde(default)]
    sub: Value,
    exp: i64,
    #[serde(default)]
    iat: Option<i64>,
    #[serde(default)]
    iss: Option<String>,
    #[serde(default)]
    aud: Value,
}

/// HMAC-SHA256 JWT validator.
pub struct JwtValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtValidator {
    pub fn new(secret: &[u8], issuer: &str, audience: &str, leeway_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.leeway = leeway_secs;

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn from_config(config: &TokenConfig) -> Self {
        Self::new(
            config.secret.as_bytes(),
            &config.issuer,
            &config.audience,
            config.leeway_secs,
        )
    }
}

impl TokenValidator for JwtValidator {
    fn validate_token(&self, token: &str) -> GateResult<TokenClaims> {
        let data = decode::<RawClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => GateError::InvalidToken("token expired".into()),
                _ => GateError::InvalidToken(e.to_string()),
            },
        )?;
        let claims = data.claims;

        Ok(TokenClaims {
            subject: parse_subject(&claims.sub)?,
            expires_at: timestamp(claims.exp)?,
            issued_at: claims.iat.map(timestamp).transpose()?,
            issuer: claims.iss,
            audience: audience_list(&claims.aud),
        })
    }
}

/// Decode the `sub` claim into a positive user id.
///
/// Numbers may arrive as floats; they are accepted only when they round-trip
/// exactly to an integer. Fractional values are rejected, never truncated.
pub fn parse_subject(sub: &Value) -> GateResult<UserId> {
    let invalid = |why: &str| GateError::InvalidToken(format!("invalid subject: {}", why));

    let id = match sub {
        Value::Null => return Err(invalid("missing")),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i,
            (None, Some(f)) => {
                if !f.is_finite() || f.fract() != 0.0 {
                    return Err(invalid("not an integer"));
                }
                if f < i64::MIN as f64 || f >= i64::MAX as f64 {
                    return Err(invalid("out of range"));
                }
                f as i64
            }
            (None, None) => return Err(invalid("not a number")),
        },
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| invalid("not an integer"))?,
        _ => return Err(invalid("unexpected type")),
    };

    let id = UserId(id);
    if !id.is_positive() {
        return Err(invalid("must be positive"));
    }
    Ok(id)
}

fn timestamp(secs: i64) -> GateResult<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| GateError::InvalidToken("timestamp out of range".into()))
}

fn audience_list(aud: &Value) -> Vec<String> {
    match aud {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}
