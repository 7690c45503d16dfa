//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatekeeperConfig (validated, immutable)
//!     → AppContext built once at start-up
//! ```
//!
//! # Design Decisions
//! - Config is read-only for the process lifetime; no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AuthConfig, BasicAuthConfig, CacheConfig, GatekeeperConfig, ListenerConfig,
    ObservabilityConfig, RateAlgorithm, RateLimitConfig, SeedConfig, SeedUser, TimeoutConfig,
    TokenConfig,
};
