//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Gates produce:
//!     → logging.rs (structured log events with request ids)
//!     → metrics.rs (outcome, cache and rate-limit counters)
//!
//! Consumers:
//!     → stdout log stream
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```

pub mod logging;
pub mod metrics;
