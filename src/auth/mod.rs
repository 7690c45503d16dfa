//! Authentication gates.
//!
//! # Data Flow
//! ```text
//! Authorization header
//!     → credentials.rs (split scheme, decode Basic / pass Bearer through)
//!     → basic.rs  (compare against the shared pair, attach nothing)
//!     → bearer.rs (token.rs validates, IdentityResolver resolves, attach Identity)
//! ```
//!
//! # Design Decisions
//! - Each gate only accepts its own scheme
//! - Basic failures answer with a Basic challenge; Bearer failures do not
//! - Infrastructure failures during resolution are internal errors, not 401s

pub mod basic;
pub mod bearer;
pub mod credentials;
pub mod token;

pub use basic::{basic_auth, BasicGate};
pub use bearer::{bearer_auth, BearerGate};
pub use credentials::{BasicCredentials, Credentials, Scheme};
pub use token::{JwtValidator, TokenClaims, TokenValidator};
