//! Request gatekeeper for an HTTP API.
//!
//! Four stages, composed as Axum middleware:
//! rate admission, credential verification (Basic or Bearer), identity
//! resolution through a cache-aside layer, and ownership-or-role
//! authorization.

pub mod app;
pub mod auth;
pub mod authz;
pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod identity;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod security;
pub mod store;

pub use app::{AppContext, Collaborators};
pub use config::GatekeeperConfig;
pub use error::{GateError, GateResult};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
