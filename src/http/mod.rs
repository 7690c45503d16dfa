//! HTTP surface of the gatekeeper.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, gate composition)
//!     → request.rs (typed identity/resource slots, request id)
//!     → handlers.rs (demo API behind the gates)
//!     → response.rs (terminal outcomes → status, headers, JSON body)
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{CurrentResource, CurrentUser, Identity, Resource, X_REQUEST_ID};
pub use response::Outcome;
pub use server::{build_router, HttpServer};
