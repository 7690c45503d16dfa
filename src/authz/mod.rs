//! Ownership-or-role authorization.
//!
//! # Decision order
//! ```text
//! resource.owner_id() == user.id  → allowed, role store untouched
//! otherwise                       → RoleStore::get_by_name(required)
//!                                   allowed iff user.role.level >= required.level
//! ```
//!
//! # Design Decisions
//! - Generic over any resource implementing `Owned`
//! - Role lookup failures are infrastructure errors, never a silent deny
//! - The required role is a floor, not an exact match

pub mod gate;

use std::sync::Arc;
use std::time::Duration;

use crate::domain::{Owned, User};
use crate::error::{GateError, GateResult};
use crate::resilience::timeouts::with_deadline;
use crate::store::RoleStore;

pub use gate::{authorize, OwnershipGate};

pub struct Authorizer {
    roles: Arc<dyn RoleStore>,
    deadline: Option<Duration>,
}

impl Authorizer {
    pub fn new(roles: Arc<dyn RoleStore>) -> Self {
        Self {
            roles,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Decide whether `user` may act on `resource`.
    pub async fn authorize<R>(&self, user: &User, resource: &R, required_role: &str) -> GateResult<bool>
    where
        R: Owned + ?Sized,
    {
        if resource.owner_id() == user.id {
            return Ok(true);
        }

        let required = with_deadline("roles.get_by_name", self.deadline, async {
            self.roles
                .get_by_name(required_role)
                .await
                .map_err(|e| GateError::Infrastructure(format!("role {:?}: {}", required_role, e)))
        })
        .await?;

        Ok(user.role.satisfies(&required))
    }
}
