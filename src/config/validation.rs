//! Configuration validation.
//!
//! Serde handles syntax; this checks values. All problems are returned at
//! once, not just the first.

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::config::schema::GatekeeperConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &GatekeeperConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("{:?} is not a socket address", config.listener.bind_address),
        ));
    }

    if config.auth.basic.user.is_empty() || config.auth.basic.user.contains(':') {
        errors.push(ValidationError::new(
            "auth.basic.user",
            "must be non-empty and must not contain ':'",
        ));
    }
    if config.auth.token.secret.is_empty() {
        errors.push(ValidationError::new("auth.token.secret", "must not be empty"));
    }

    if config.cache.ttl_secs == Some(0) {
        errors.push(ValidationError::new("cache.ttl_secs", "must be greater than 0"));
    }

    let rl = &config.rate_limit;
    if rl.enabled {
        if rl.requests_per_window == 0 {
            errors.push(ValidationError::new(
                "rate_limit.requests_per_window",
                "must be greater than 0",
            ));
        }
        if rl.window_secs == 0 {
            errors.push(ValidationError::new("rate_limit.window_secs", "must be greater than 0"));
        }
        if rl.burst_size == 0 {
            errors.push(ValidationError::new("rate_limit.burst_size", "must be greater than 0"));
        }
        if rl.idle_ttl_secs < rl.window_secs {
            errors.push(ValidationError::new(
                "rate_limit.idle_ttl_secs",
                "must be at least window_secs",
            ));
        }
        if rl.sweep_interval_secs == 0 {
            errors.push(ValidationError::new(
                "rate_limit.sweep_interval_secs",
                "must be greater than 0",
            ));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }
    if config.timeouts.collaborator_ms == 0 {
        errors.push(ValidationError::new("timeouts.collaborator_ms", "must be greater than 0"));
    }

    let mut role_names = HashSet::new();
    for role in &config.seed.roles {
        if !role_names.insert(role.name.as_str()) {
            errors.push(ValidationError::new(
                "seed.roles",
                format!("role {:?} is defined twice", role.name),
            ));
        }
    }
    for user in &config.seed.users {
        if user.id <= 0 {
            errors.push(ValidationError::new(
                "seed.users",
                format!("user {:?} must have a positive id", user.username),
            ));
        }
        if !role_names.contains(user.role.as_str()) {
            errors.push(ValidationError::new(
                "seed.users",
                format!("user {:?} refers to unknown role {:?}", user.username, user.role),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
