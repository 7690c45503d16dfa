//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! Every section has defaults so a minimal file only names what it changes.

use serde::{Deserialize, Serialize};

use crate::domain::{Post, Role};

/// Root configuration for the gatekeeper.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatekeeperConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Credentials accepted by the Basic and Bearer gates.
    pub auth: AuthConfig,

    /// Identity cache settings.
    pub cache: CacheConfig,

    /// Rate admission settings.
    pub rate_limit: RateLimitConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Records loaded into the in-memory stores at start-up.
    pub seed: SeedConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    pub basic: BasicAuthConfig,
    pub token: TokenConfig,
}

/// The single shared Basic credential pair.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BasicAuthConfig {
    pub user: String,
    pub pass: String,
}

impl Default for BasicAuthConfig {
    fn default() -> Self {
        Self {
            user: "admin".to_string(),
            // WARNING: This is a placeholder! Change this in production.
            pass: "CHANGE_ME_IN_PRODUCTION".to_string(),
        }
    }
}

/// Bearer token verification settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenConfig {
    /// HMAC secret used to verify token signatures.
    pub secret: String,

    /// Expected `iss` claim.
    pub issuer: String,

    /// Expected `aud` claim.
    pub audience: String,

    /// Clock skew tolerated on `exp`, in seconds.
    pub leeway_secs: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            // WARNING: This is a placeholder! Change this in production.
            secret: "CHANGE_ME_IN_PRODUCTION".to_string(),
            issuer: "gatekeeper".to_string(),
            audience: "gatekeeper-api".to_string(),
            leeway_secs: 0,
        }
    }
}

/// Identity cache configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Consult the cache before the user store.
    pub enabled: bool,

    /// Expire cached users after this many seconds. Unset keeps them forever.
    pub ttl_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RateAlgorithm {
    #[default]
    FixedWindow,
    TokenBucket,
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Admission algorithm.
    pub algorithm: RateAlgorithm,

    /// Requests admitted per key in each window.
    pub requests_per_window: u32,

    /// Window length in seconds.
    pub window_secs: u64,

    /// Burst capacity (token bucket only).
    pub burst_size: u32,

    /// Keys idle for this long are evicted.
    pub idle_ttl_secs: u64,

    /// How often idle keys are swept.
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            algorithm: RateAlgorithm::FixedWindow,
            requests_per_window: 20,
            window_secs: 5,
            burst_size: 20,
            idle_ttl_secs: 300,
            sweep_interval_secs: 60,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Deadline for each store, cache or role-store call in milliseconds.
    pub collaborator_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            collaborator_ms: 2_000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// A user record to seed, referring to its role by name.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SeedUser {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    pub role: String,
}

/// Demo data for the in-memory stores.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SeedConfig {
    pub roles: Vec<Role>,
    pub users: Vec<SeedUser>,
    pub posts: Vec<Post>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            roles: vec![
                Role::new(1, "user", 1),
                Role::new(2, "moderator", 2),
                Role::new(3, "admin", 3),
            ],
            users: Vec::new(),
            posts: Vec::new(),
        }
    }
}
