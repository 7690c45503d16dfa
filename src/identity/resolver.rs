//! Cache-aside user lookup.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::{User, UserId};
use crate::error::{GateError, GateResult};
use crate::observability::metrics;
use crate::resilience::timeouts::with_deadline;
use crate::store::{StoreError, UserCache, UserStore};

/// Resolves a user id to a shared user snapshot.
///
/// With a cache configured, the cache is consulted first and populated on a
/// miss. A cache failure is surfaced, never masked by reading the store, and
/// a failed write-back fails the lookup.
pub struct IdentityResolver {
    store: Arc<dyn UserStore>,
    cache: Option<Arc<dyn UserCache>>,
    deadline: Option<Duration>,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn UserStore>, cache: Option<Arc<dyn UserCache>>) -> Self {
        Self {
            store,
            cache,
            deadline: None,
        }
    }

    /// Bound every collaborator call by `deadline`.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache.is_some()
    }

    pub async fn resolve(&self, id: UserId) -> GateResult<Arc<User>> {
        let Some(cache) = &self.cache else {
            return self.read_store(id).await;
        };

        let cached = with_deadline("cache.get", self.deadline, async {
            cache.get(id).await.map_err(GateError::infrastructure)
        })
        .await?;

        if let Some(user) = cached {
            metrics::record_identity_cache("hit");
            return Ok(user);
        }
        metrics::record_identity_cache("miss");

        let user = self.read_store(id).await?;

        with_deadline("cache.set", self.deadline, async {
            cache.set(user.clone()).await.map_err(GateError::infrastructure)
        })
        .await?;

        tracing::debug!(user_id = %id, "Cached user after store read");
        Ok(user)
    }

    async fn read_store(&self, id: UserId) -> GateResult<Arc<User>> {
        with_deadline("store.get_by_id", self.deadline, async {
            match self.store.get_by_id(id).await {
                Ok(user) => Ok(Arc::new(user)),
                Err(StoreError::NotFound) => Err(GateError::IdentityNotFound(id)),
                Err(e) => Err(GateError::infrastructure(e)),
            }
        })
        .await
    }
}
