//! Shared utilities for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::connect_info::MockConnectInfo,
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

use gatekeeper::config::{GatekeeperConfig, SeedUser};
use gatekeeper::domain::{Post, User, UserId};
use gatekeeper::store::{StoreError, UserStore};

pub const SECRET: &str = "integration-test-secret";
pub const ISSUER: &str = "gatekeeper";
pub const AUDIENCE: &str = "gatekeeper-api";
pub const BASIC_USER: &str = "ops";
pub const BASIC_PASS: &str = "hunter2";

pub const ALICE: i64 = 1;
pub const MODERATOR: i64 = 2;
pub const ADMIN: i64 = 3;
pub const BOB: i64 = 4;
pub const ALICE_POST: i64 = 10;

/// Config with three role levels, four users and one post owned by alice.
/// Rate limiting starts disabled.
pub fn test_config() -> GatekeeperConfig {
    let mut config = GatekeeperConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.auth.basic.user = BASIC_USER.into();
    config.auth.basic.pass = BASIC_PASS.into();
    config.auth.token.secret = SECRET.into();
    config.auth.token.issuer = ISSUER.into();
    config.auth.token.audience = AUDIENCE.into();
    config.rate_limit.enabled = false;

    for (id, name, role) in [
        (ALICE, "alice", "user"),
        (MODERATOR, "mod", "moderator"),
        (ADMIN, "root", "admin"),
        (BOB, "bob", "user"),
    ] {
        config.seed.users.push(SeedUser {
            id,
            username: name.into(),
            email: None,
            role: role.into(),
        });
    }
    config.seed.posts.push(Post {
        id: ALICE_POST,
        user_id: UserId(ALICE),
        title: "first".into(),
        content: "hello".into(),
        tags: vec![],
    });
    config
}

pub fn mint_token_with(sub: Value, ttl_secs: i64, secret: &str) -> String {
    let now = Utc::now().timestamp();
    let claims = json!({
        "sub": sub,
        "exp": now + ttl_secs,
        "iat": now,
        "nbf": now,
        "iss": ISSUER,
        "aud": AUDIENCE,
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub fn token_for(user_id: i64) -> String {
    mint_token_with(json!(user_id), 3600, SECRET)
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

pub fn basic(user: &str, pass: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", user, pass)))
}

pub fn client_addr(last_octet: u8) -> SocketAddr {
    SocketAddr::from(([10, 0, 0, last_octet], 40000))
}

/// Attach a fixed client address, as the real listener would.
pub fn with_client(router: Router, addr: SocketAddr) -> Router {
    router.layer(MockConnectInfo(addr))
}

pub fn request(method: &str, uri: &str, authorization: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = authorization {
        builder = builder.header("authorization", value);
    }
    let body = match body {
        Some(v) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&v).unwrap())
        }
        None => Body::empty(),
    };
    builder.body(body).unwrap()
}

/// Send a request to the router and decode the JSON body, if any.
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let json = if bytes.is_empty() {
        json!({})
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| json!({ "raw": String::from_utf8_lossy(&bytes) }))
    };
    (status, headers, json)
}

/// User store wrapper counting reads, with a switch to simulate an outage.
pub struct CountingUserStore {
    pub inner: Arc<dyn UserStore>,
    pub reads: AtomicUsize,
    pub fail: AtomicBool,
}

impl CountingUserStore {
    pub fn new(inner: Arc<dyn UserStore>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            reads: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        })
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserStore for CountingUserStore {
    async fn get_by_id(&self, id: UserId) -> Result<User, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".into()));
        }
        self.inner.get_by_id(id).await
    }
}
