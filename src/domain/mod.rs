//! Domain types shared by every gate.
//!
//! # Data Flow
//! ```text
//! Authorization header
//!     → Credentials (request scoped, dropped after verification)
//!     → TokenClaims (Bearer only, carries the subject UserId)
//!     → Arc<User> (store owned, shared read-only snapshot)
//!     → authorized against a resource implementing `Owned`
//! ```
//!
//! # Design Decisions
//! - Users and roles are never mutated by the gatekeeper
//! - `Role::level` is unsigned, so the non-negative invariant is a type property
//! - Authorization is generic over anything exposing an owner id

pub mod types;

pub use types::{Owned, Post, Role, User, UserId};
