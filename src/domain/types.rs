//! Users, roles and owned resources.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a user as understood by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    pub fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(UserId)
    }
}

/// A named privilege level. Higher level means more privilege.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub level: u32,
    #[serde(default)]
    pub description: String,
}

impl Role {
    pub fn new(id: i64, name: impl Into<String>, level: u32) -> Self {
        Self {
            id,
            name: name.into(),
            level,
            description: String::new(),
        }
    }

    /// Whether this role is at least as privileged as `required`.
    pub fn satisfies(&self, required: &Role) -> bool {
        self.level >= required.level
    }
}

/// A user record as held by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl User {
    pub fn new(id: i64, username: impl Into<String>, role: Role) -> Self {
        let username = username.into();
        Self {
            id: UserId(id),
            email: format!("{}@example.com", username),
            username,
            role,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

/// Anything with an owner that can be compared against `User::id`.
pub trait Owned {
    fn owner_id(&self) -> UserId;
}

/// A post authored by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub user_id: UserId,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Owned for Post {
    fn owner_id(&self) -> UserId {
        self.user_id
    }
}

impl<T: Owned + ?Sized> Owned for std::sync::Arc<T> {
    fn owner_id(&self) -> UserId {
        (**self).owner_id()
    }
}
