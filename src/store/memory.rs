//! In-memory stores backed by `DashMap`.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

use super::{PostStore, RoleStore, StoreError, UserStore};
use crate::domain::{Post, Role, User, UserId};

/// Users keyed by id.
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    inner: Arc<DashMap<UserId, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user: User) {
        self.inner.insert(user.id, user);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get_by_id(&self, id: UserId) -> Result<User, StoreError> {
        self.inner
            .get(&id)
            .filter(|u| u.is_active)
            .map(|u| u.value().clone())
            .ok_or(StoreError::NotFound)
    }
}

/// Roles keyed by name.
#[derive(Clone, Default)]
pub struct InMemoryRoleStore {
    inner: Arc<DashMap<String, Role>>,
}

impl InMemoryRoleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock `user` < `moderator` < `admin` ladder.
    pub fn with_default_roles() -> Self {
        let store = Self::new();
        store.insert(Role::new(1, "user", 1));
        store.insert(Role::new(2, "moderator", 2));
        store.insert(Role::new(3, "admin", 3));
        store
    }

    /// Register a role. A name keeps the level it was first registered with.
    pub fn insert(&self, role: Role) -> Role {
        self.inner
            .entry(role.name.clone())
            .or_insert(role)
            .value()
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<Role> {
        self.inner.get(name).map(|r| r.value().clone())
    }
}

#[async_trait]
impl RoleStore for InMemoryRoleStore {
    async fn get_by_name(&self, name: &str) -> Result<Role, StoreError> {
        self.get(name).ok_or(StoreError::NotFound)
    }
}

/// Posts keyed by id.
#[derive(Clone, Default)]
pub struct InMemoryPostStore {
    inner: Arc<DashMap<i64, Post>>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, post: Post) {
        self.inner.insert(post.id, post);
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn get_by_id(&self, id: i64) -> Result<Post, StoreError> {
        self.inner
            .get(&id)
            .map(|p| p.value().clone())
            .ok_or(StoreError::NotFound)
    }

    async fn update(&self, post: Post) -> Result<Post, StoreError> {
        match self.inner.get_mut(&post.id) {
            Some(mut existing) => {
                *existing = post.clone();
                Ok(post)
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.inner
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}
