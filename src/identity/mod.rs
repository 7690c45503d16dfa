//! Identity resolution.
//!
//! # Data Flow
//! ```text
//! TokenClaims.subject
//!     → resolver.rs
//!         cache disabled: UserStore::get_by_id
//!         cache enabled:  UserCache::get → (miss) UserStore::get_by_id → UserCache::set
//!     → Arc<User> attached to the request
//! ```
//!
//! # Design Decisions
//! - Cache failures surface as infrastructure errors; the store is not a fallback
//! - Write-back is strict: a failed `set` fails the lookup
//! - No single-flight: concurrent misses each read the store

pub mod resolver;

pub use resolver::IdentityResolver;
