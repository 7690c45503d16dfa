//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Gate needs a collaborator (store, cache, role store):
//!     → timeouts.rs (bound the call by the collaborator deadline)
//!     → on elapse: InfrastructureError → internal-error outcome
//! ```
//!
//! # Design Decisions
//! - No automatic retries; retry policy belongs to the collaborator's own client
//! - Every I/O call made for a request has a deadline
//! - Cancellation is structural: dropping the request future drops the call

pub mod timeouts;
