//! In-process user cache.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{StoreError, UserCache};
use crate::domain::{User, UserId};

#[derive(Debug, Clone)]
struct CachedUser {
    user: Arc<User>,
    stored_at: Instant,
}

/// A thread-safe user cache.
///
/// Entries never expire unless a TTL is given. Concurrent `get`/`set` on the
/// same id are serialized by the owning DashMap shard.
#[derive(Clone, Default)]
pub struct InMemoryUserCache {
    inner: Arc<DashMap<UserId, CachedUser>>,
    ttl: Option<Duration>,
}

impl InMemoryUserCache {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Number of cached users, expired ones included until next touched.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Drop a cached user so the next lookup reads the store.
    pub fn invalidate(&self, id: UserId) {
        self.inner.remove(&id);
    }

    fn is_fresh(&self, entry: &CachedUser) -> bool {
        match self.ttl {
            Some(ttl) => entry.stored_at.elapsed() < ttl,
            None => true,
        }
    }
}

#[async_trait]
impl UserCache for InMemoryUserCache {
    async fn get(&self, id: UserId) -> Result<Option<Arc<User>>, StoreError> {
        let hit = self
            .inner
            .get(&id)
            .map(|r| (self.is_fresh(r.value()), r.user.clone()));

        match hit {
            Some((true, user)) => Ok(Some(user)),
            Some((false, _)) => {
                self.inner.remove_if(&id, |_, entry| !self.is_fresh(entry));
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, user: Arc<User>) -> Result<(), StoreError> {
        self.inner.insert(
            user.id,
            CachedUser {
                user,
                stored_at: Instant::now(),
            },
        );
        Ok(())
    }
}
