//! Lifecycle management.
//!
//! # Data Flow
//! ```text
//! Ctrl+C → Shutdown::trigger
//!     → HTTP server stops accepting, drains in-flight requests
//!     → rate-limit sweeper exits
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
