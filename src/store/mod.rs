//! Collaborator capabilities consumed by the gatekeeper.
//!
//! # Design Decisions
//! - Each trait exposes only the calls the pipeline makes
//! - Production backends (SQL, Redis) live outside this crate
//! - `memory.rs` and `cache.rs` are in-process adapters for tests and the demo binary

pub mod cache;
pub mod memory;

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::{Post, Role, User, UserId};

pub use cache::InMemoryUserCache;
pub use memory::{InMemoryPostStore, InMemoryRoleStore, InMemoryUserStore};

/// Error reported by a store or cache collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Source of truth for users.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_by_id(&self, id: UserId) -> Result<User, StoreError>;
}

/// Source of truth for roles, looked up by name.
#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn get_by_name(&self, name: &str) -> Result<Role, StoreError>;
}

/// Fast user cache in front of a [`UserStore`].
///
/// `get` returns `Ok(None)` on a miss; an `Err` means the cache itself failed.
#[async_trait]
pub trait UserCache: Send + Sync {
    async fn get(&self, id: UserId) -> Result<Option<Arc<User>>, StoreError>;
    async fn set(&self, user: Arc<User>) -> Result<(), StoreError>;
}

/// Posts, the resource type behind the demo ownership gate.
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn get_by_id(&self, id: i64) -> Result<Post, StoreError>;
    async fn update(&self, post: Post) -> Result<Post, StoreError>;
    async fn delete(&self, id: i64) -> Result<(), StoreError>;
}
