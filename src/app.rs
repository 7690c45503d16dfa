//! Start-up wiring.
//!
//! Everything the gates share is built here once and handed to each gate by
//! value; there are no process-wide singletons.

use std::sync::Arc;
use std::time::Duration;

use crate::auth::{BasicGate, BearerGate, JwtValidator, TokenValidator};
use crate::authz::Authorizer;
use crate::config::GatekeeperConfig;
use crate::domain::User;
use crate::identity::IdentityResolver;
use crate::security::rate_limit::RateAdmission;
use crate::store::{
    InMemoryPostStore, InMemoryRoleStore, InMemoryUserCache, InMemoryUserStore, PostStore,
    RoleStore, UserCache, UserStore,
};

/// External capabilities the gatekeeper consumes.
#[derive(Clone)]
pub struct Collaborators {
    pub users: Arc<dyn UserStore>,
    pub roles: Arc<dyn RoleStore>,
    pub cache: Arc<dyn UserCache>,
    pub posts: Arc<dyn PostStore>,
}

impl Collaborators {
    /// In-memory collaborators loaded from the `seed` section.
    pub fn in_memory(config: &GatekeeperConfig) -> Self {
        let roles = InMemoryRoleStore::new();
        for role in &config.seed.roles {
            roles.insert(role.clone());
        }

        let users = InMemoryUserStore::new();
        for seed in &config.seed.users {
            let Some(role) = roles.get(&seed.role) else {
                tracing::warn!(user = %seed.username, role = %seed.role, "Skipping seed user with unknown role");
                continue;
            };
            let mut user = User::new(seed.id, seed.username.clone(), role);
            if let Some(email) = &seed.email {
                user.email = email.clone();
            }
            users.insert(user);
        }

        let posts = InMemoryPostStore::new();
        for post in &config.seed.posts {
            posts.insert(post.clone());
        }

        tracing::info!(
            users = config.seed.users.len(),
            roles = config.seed.roles.len(),
            posts = config.seed.posts.len(),
            "Seeded in-memory stores"
        );

        Self {
            users: Arc::new(users),
            roles: Arc::new(roles),
            cache: Arc::new(InMemoryUserCache::new(config.cache.ttl_secs.map(Duration::from_secs))),
            posts: Arc::new(posts),
        }
    }
}

/// Immutable dependency context shared by every request.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<GatekeeperConfig>,
    pub basic: BasicGate,
    pub bearer: BearerGate,
    pub resolver: Arc<IdentityResolver>,
    pub authorizer: Arc<Authorizer>,
    pub admission: RateAdmission,
    pub posts: Arc<dyn PostStore>,
}

impl AppContext {
    pub fn new(
        config: GatekeeperConfig,
        collaborators: Collaborators,
        validator: Arc<dyn TokenValidator>,
    ) -> Self {
        let deadline = Duration::from_millis(config.timeouts.collaborator_ms);

        let cache = config.cache.enabled.then(|| collaborators.cache.clone());
        let resolver = Arc::new(
            IdentityResolver::new(collaborators.users.clone(), cache).with_deadline(deadline),
        );
        let authorizer = Arc::new(Authorizer::new(collaborators.roles.clone()).with_deadline(deadline));

        Self {
            basic: BasicGate::from_config(&config.auth.basic),
            bearer: BearerGate::new(validator, resolver.clone()),
            resolver,
            authorizer,
            admission: RateAdmission::from_config(&config.rate_limit),
            posts: collaborators.posts,
            config: Arc::new(config),
        }
    }

    /// Context over in-memory collaborators and the configured JWT validator.
    pub fn in_memory(config: GatekeeperConfig) -> Self {
        let collaborators = Collaborators::in_memory(&config);
        let validator = Arc::new(JwtValidator::from_config(&config.auth.token));
        Self::new(config, collaborators, validator)
    }
}
