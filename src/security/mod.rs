//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (check per-IP admission, before any identity work)
//!     → auth gates
//! ```
//!
//! # Design Decisions
//! - Keyed by client IP, never by authenticated identity
//! - Per-key atomic counters, no global lock
//! - Idle keys are swept so address churn cannot grow state without bound

pub mod rate_limit;

pub use rate_limit::{
    FixedWindowLimiter, RateAdmission, RateDecision, RateLimiter, TokenBucketLimiter,
};
