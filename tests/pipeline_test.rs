//! Router-level tests of the full gate pipeline.
//!
//! Requests go through `tower::ServiceExt::oneshot` with a mocked client
//! address, so every layer the real server installs is exercised.

mod common;

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware,
    routing::get,
    Router,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use common::*;
use gatekeeper::auth::{basic_auth, bearer_auth, BasicGate, JwtValidator};
use gatekeeper::authz::{authorize, OwnershipGate};
use gatekeeper::domain::{Post, Role};
use gatekeeper::store::{RoleStore, StoreError, UserStore};
use gatekeeper::config::RateAlgorithm;
use gatekeeper::http::{build_router, Identity, X_REQUEST_ID};
use gatekeeper::{AppContext, Collaborators, GatekeeperConfig};

fn app(config: GatekeeperConfig) -> Router {
    let ctx = AppContext::in_memory(config);
    with_client(build_router(&ctx), client_addr(1))
}

/// Context whose user store counts reads and can be made to fail.
fn counted_context(config: GatekeeperConfig) -> (AppContext, Arc<CountingUserStore>) {
    let mut collaborators = Collaborators::in_memory(&config);
    let store = CountingUserStore::new(collaborators.users.clone());
    collaborators.users = store.clone() as Arc<dyn UserStore>;
    let validator = Arc::new(JwtValidator::from_config(&config.auth.token));
    (AppContext::new(config, collaborators, validator), store)
}

/// A single downstream route recording how often it ran and which
/// identity, if any, it saw.
fn downstream(hits: Arc<AtomicUsize>, seen_level: Arc<AtomicUsize>) -> Router {
    let handler = move |request: Request| {
        let hits = hits.clone();
        let seen_level = seen_level.clone();
        async move {
            hits.fetch_add(1, Ordering::SeqCst);
            if let Some(Identity(user)) = request.extensions().get::<Identity>() {
                seen_level.store(user.role.level as usize, Ordering::SeqCst);
            }
            StatusCode::OK
        }
    };
    Router::new().route("/target", get(handler))
}

// ============================================================================
// Basic gate
// ============================================================================

fn basic_guarded() -> (Router, Arc<AtomicUsize>, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(AtomicUsize::new(0));
    let gate = BasicGate::new(BASIC_USER, BASIC_PASS);
    let router = downstream(hits.clone(), seen.clone())
        .route_layer(middleware::from_fn_with_state(gate, basic_auth));
    (router, hits, seen)
}

#[tokio::test]
async fn test_basic_accepts_configured_pair_without_identity() {
    let (router, hits, seen) = basic_guarded();
    let auth = basic(BASIC_USER, BASIC_PASS);

    let (status, _, _) = send(&router, request("GET", "/target", Some(&auth), None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(seen.load(Ordering::SeqCst), 0, "basic gate must not attach an identity");
}

#[tokio::test]
async fn test_basic_rejections_carry_challenge_and_stop_request() {
    let (router, hits, _) = basic_guarded();
    let wrong_pass = basic(BASIC_USER, "nope");
    let wrong_user = basic("root", BASIC_PASS);
    let token = bearer(&token_for(ALICE));

    let cases: Vec<Option<&str>> = vec![
        None,
        Some(wrong_pass.as_str()),
        Some(wrong_user.as_str()),
        Some(token.as_str()),
        Some("Basic !!!not-base64!!!"),
        Some("Basic"),
    ];

    for auth in cases {
        let (status, headers, body) = send(&router, request("GET", "/target", auth, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "header: {:?}", auth);
        let challenge = headers.get(header::WWW_AUTHENTICATE).unwrap().to_str().unwrap();
        assert!(challenge.starts_with("Basic realm=\"restricted\""));
        assert_eq!(body["error"], "unauthorized");
    }
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_debug_vars_behind_basic() {
    let router = app(test_config());

    let (status, _, _) = send(&router, request("GET", "/v1/debug/vars", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let auth = basic(BASIC_USER, BASIC_PASS);
    let (status, _, body) = send(&router, request("GET", "/v1/debug/vars", Some(&auth), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rate_limit_enabled"], false);
}

// ============================================================================
// Bearer gate and identity resolution
// ============================================================================

fn bearer_guarded(ctx: &AppContext) -> (Router, Arc<AtomicUsize>, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(AtomicUsize::new(0));
    let router = downstream(hits.clone(), seen.clone())
        .route_layer(middleware::from_fn_with_state(ctx.bearer.clone(), bearer_auth));
    (router, hits, seen)
}

#[tokio::test]
async fn test_bearer_attaches_stored_identity() {
    let ctx = AppContext::in_memory(test_config());
    let (router, hits, seen) = bearer_guarded(&ctx);
    let auth = bearer(&token_for(MODERATOR));

    let (status, _, _) = send(&router, request("GET", "/target", Some(&auth), None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(seen.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_me_returns_authenticated_user() {
    let router = app(test_config());
    let auth = bearer(&token_for(ADMIN));

    let (status, _, body) = send(&router, request("GET", "/v1/users/me", Some(&auth), None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], ADMIN);
    assert_eq!(body["data"]["username"], "root");
    assert_eq!(body["data"]["role"]["level"], 3);
}

#[tokio::test]
async fn test_subject_encodings() {
    let router = app(test_config());

    for sub in [json!(ALICE), json!(1.0), json!("1")] {
        let auth = bearer(&mint_token_with(sub.clone(), 3600, SECRET));
        let (status, _, body) =
            send(&router, request("GET", "/v1/users/me", Some(&auth), None)).await;
        assert_eq!(status, StatusCode::OK, "subject {}", sub);
        assert_eq!(body["data"]["id"], ALICE);
    }

    for sub in [json!(1.5), json!("alice"), json!(null)] {
        let auth = bearer(&mint_token_with(sub.clone(), 3600, SECRET));
        let (status, _, _) = send(&router, request("GET", "/v1/users/me", Some(&auth), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "subject {}", sub);
    }
}

#[tokio::test]
async fn test_bearer_rejections_stop_request() {
    let ctx = AppContext::in_memory(test_config());
    let (router, hits, _) = bearer_guarded(&ctx);

    let expired = bearer(&mint_token_with(json!(ALICE), -120, SECRET));
    let forged = bearer(&mint_token_with(json!(ALICE), 3600, "someone-elses-secret"));
    let unknown_user = bearer(&token_for(999));
    let basic_creds = basic(BASIC_USER, BASIC_PASS);

    let cases: Vec<Option<&str>> = vec![
        None,
        Some(expired.as_str()),
        Some(forged.as_str()),
        Some(unknown_user.as_str()),
        Some(basic_creds.as_str()),
        Some("Bearer not.a.jwt"),
        Some("Bearer"),
    ];

    for auth in cases {
        let (status, headers, _) = send(&router, request("GET", "/target", auth, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "header: {:?}", auth);
        assert!(headers.get(header::WWW_AUTHENTICATE).is_none());
    }
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_store_outage_is_internal_error() {
    let (ctx, store) = counted_context(test_config());
    store.fail.store(true, Ordering::SeqCst);
    let router = with_client(build_router(&ctx), client_addr(1));
    let auth = bearer(&token_for(ALICE));

    let (status, _, body) = send(&router, request("GET", "/v1/users/me", Some(&auth), None)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "the server encountered a problem");
}

#[tokio::test]
async fn test_identity_cache_serves_repeat_requests() {
    let mut config = test_config();
    config.cache.enabled = true;
    let (ctx, store) = counted_context(config);
    let router = with_client(build_router(&ctx), client_addr(1));
    let auth = bearer(&token_for(ALICE));

    for _ in 0..3 {
        let (status, _, _) = send(&router, request("GET", "/v1/users/me", Some(&auth), None)).await;
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(store.reads(), 1);
}

#[tokio::test]
async fn test_cache_disabled_reads_store_every_time() {
    let (ctx, store) = counted_context(test_config());
    let router = with_client(build_router(&ctx), client_addr(1));
    let auth = bearer(&token_for(ALICE));

    for _ in 0..3 {
        let (status, _, _) = send(&router, request("GET", "/v1/users/me", Some(&auth), None)).await;
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(store.reads(), 3);
}

#[tokio::test]
async fn test_get_user_by_id() {
    let router = app(test_config());
    let auth = bearer(&token_for(ALICE));

    let (status, _, body) = send(&router, request("GET", "/v1/users/4", Some(&auth), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "bob");

    let (status, _, _) = send(&router, request("GET", "/v1/users/404", Some(&auth), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Ownership-or-role authorization
// ============================================================================

fn post_uri() -> String {
    format!("/v1/posts/{}", ALICE_POST)
}

#[tokio::test]
async fn test_any_authenticated_user_can_read_post() {
    let router = app(test_config());
    let auth = bearer(&token_for(BOB));

    let (status, _, body) = send(&router, request("GET", &post_uri(), Some(&auth), None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "first");
}

#[tokio::test]
async fn test_owner_edits_without_role() {
    let router = app(test_config());
    let auth = bearer(&token_for(ALICE));

    let (status, _, body) = send(
        &router,
        request("PATCH", &post_uri(), Some(&auth), Some(json!({ "title": "edited" }))),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "edited");
    assert_eq!(body["data"]["content"], "hello");
}

#[tokio::test]
async fn test_non_owner_below_required_level_is_forbidden() {
    let router = app(test_config());
    let auth = bearer(&token_for(BOB));

    let (status, _, body) = send(
        &router,
        request("PATCH", &post_uri(), Some(&auth), Some(json!({ "title": "mine now" }))),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _, _) = send(&router, request("DELETE", &post_uri(), Some(&auth), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Nothing changed.
    let (_, _, body) = send(&router, request("GET", &post_uri(), Some(&auth), None)).await;
    assert_eq!(body["data"]["title"], "first");
}

#[tokio::test]
async fn test_moderator_edits_but_cannot_delete() {
    let router = app(test_config());
    let auth = bearer(&token_for(MODERATOR));

    let (status, _, _) = send(
        &router,
        request("PATCH", &post_uri(), Some(&auth), Some(json!({ "content": "moderated" }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(&router, request("DELETE", &post_uri(), Some(&auth), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_deletes_any_post() {
    let router = app(test_config());
    let auth = bearer(&token_for(ADMIN));

    let (status, _, _) = send(&router, request("DELETE", &post_uri(), Some(&auth), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _, _) = send(&router, request("GET", &post_uri(), Some(&auth), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_owner_deletes_own_post() {
    let router = app(test_config());
    let auth = bearer(&token_for(ALICE));

    let (status, _, _) = send(&router, request("DELETE", &post_uri(), Some(&auth), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_authentication_precedes_resource_loading() {
    let router = app(test_config());

    let (status, _, _) = send(&router, request("DELETE", "/v1/posts/12345", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let auth = bearer(&token_for(ADMIN));
    let (status, _, _) = send(&router, request("DELETE", "/v1/posts/12345", Some(&auth), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

struct UnavailableRoleStore;

#[async_trait]
impl RoleStore for UnavailableRoleStore {
    async fn get_by_name(&self, _name: &str) -> Result<Role, StoreError> {
        Err(StoreError::Unavailable("role store down".into()))
    }
}

#[tokio::test]
async fn test_role_store_outage_is_internal_error() {
    let config = test_config();
    let mut collaborators = Collaborators::in_memory(&config);
    collaborators.roles = Arc::new(UnavailableRoleStore) as Arc<dyn RoleStore>;
    let validator = Arc::new(JwtValidator::from_config(&config.auth.token));
    let ctx = AppContext::new(config, collaborators, validator);
    let router = with_client(build_router(&ctx), client_addr(1));
    let auth = bearer(&token_for(BOB));

    let (status, _, body) = send(
        &router,
        request("PATCH", &post_uri(), Some(&auth), Some(json!({ "title": "mine now" }))),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "the server encountered a problem");

    let (status, _, _) = send(&router, request("DELETE", &post_uri(), Some(&auth), None)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    // Neither handler ran.
    let (status, _, body) = send(&router, request("GET", &post_uri(), Some(&auth), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "first");

    // The owner never needs the role store.
    let owner = bearer(&token_for(ALICE));
    let (status, _, _) = send(
        &router,
        request("PATCH", &post_uri(), Some(&owner), Some(json!({ "title": "still mine" }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_ownership_gate_without_loaded_resource_is_internal_error() {
    let ctx = AppContext::in_memory(test_config());
    let hits = Arc::new(AtomicUsize::new(0));
    let gate = middleware::from_fn_with_state(
        OwnershipGate::new(ctx.authorizer.clone(), "admin"),
        authorize::<Post>,
    );

    // Identity attached, but no loader in front of the gate.
    let router = downstream(hits.clone(), Arc::new(AtomicUsize::new(0)))
        .route_layer(gate.clone())
        .route_layer(middleware::from_fn_with_state(ctx.bearer.clone(), bearer_auth));
    let auth = bearer(&token_for(ADMIN));
    let (status, _, body) = send(&router, request("GET", "/target", Some(&auth), None)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "the server encountered a problem");

    // Neither identity nor resource.
    let bare = downstream(hits.clone(), Arc::new(AtomicUsize::new(0))).route_layer(gate);
    let (status, _, _) = send(&bare, request("GET", "/target", None, None)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Rate admission
// ============================================================================

fn limited_config(limit: u32) -> GatekeeperConfig {
    let mut config = test_config();
    config.rate_limit.enabled = true;
    config.rate_limit.algorithm = RateAlgorithm::FixedWindow;
    config.rate_limit.requests_per_window = limit;
    config.rate_limit.window_secs = 60;
    config
}

#[tokio::test]
async fn test_request_beyond_limit_is_rejected_with_retry_after() {
    let router = app(limited_config(3));

    for _ in 0..3 {
        let (status, _, _) = send(&router, request("GET", "/v1/health", None, None)).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, headers, body) = send(&router, request("GET", "/v1/health", None, None)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    let retry_after: u64 = headers
        .get(header::RETRY_AFTER)
        .unwrap()
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=60).contains(&retry_after));
    assert_eq!(body["retry_after_secs"], retry_after);
}

#[tokio::test]
async fn test_rate_gate_runs_before_authentication() {
    let router = app(limited_config(1));
    let good = basic(BASIC_USER, BASIC_PASS);

    let (status, _, _) = send(&router, request("GET", "/v1/debug/vars", Some(&good), None)).await;
    assert_eq!(status, StatusCode::OK);

    // Over the limit: no credential check happens, even for bad credentials.
    let (status, headers, _) = send(&router, request("GET", "/v1/debug/vars", None, None)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(headers.get(header::WWW_AUTHENTICATE).is_none());
}

#[tokio::test]
async fn test_clients_are_limited_independently() {
    let ctx = AppContext::in_memory(limited_config(2));
    let first = with_client(build_router(&ctx), client_addr(1));
    let second = with_client(build_router(&ctx), client_addr(2));

    for _ in 0..2 {
        let (status, _, _) = send(&first, request("GET", "/v1/health", None, None)).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, _, _) = send(&first, request("GET", "/v1/health", None, None)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    let (status, _, _) = send(&second, request("GET", "/v1/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ctx.admission.tracked_keys(), 2);
}

#[tokio::test]
async fn test_token_bucket_algorithm_from_config() {
    let mut config = limited_config(1);
    config.rate_limit.algorithm = RateAlgorithm::TokenBucket;
    config.rate_limit.burst_size = 2;
    let router = app(config);

    for _ in 0..2 {
        let (status, _, _) = send(&router, request("GET", "/v1/health", None, None)).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, headers, _) = send(&router, request("GET", "/v1/health", None, None)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(headers.contains_key(header::RETRY_AFTER));
}

#[tokio::test]
async fn test_disabled_limiter_admits_everything() {
    let router = app(test_config());

    for _ in 0..100 {
        let (status, _, _) = send(&router, request("GET", "/v1/health", None, None)).await;
        assert_eq!(status, StatusCode::OK);
    }
}

// ============================================================================
// Ambient layers
// ============================================================================

#[tokio::test]
async fn test_responses_carry_request_id() {
    let router = app(test_config());

    let (_, headers, _) = send(&router, request("GET", "/v1/health", None, None)).await;
    assert!(headers.contains_key(X_REQUEST_ID));

    let (_, headers, _) = send(&router, request("GET", "/v1/users/me", None, None)).await;
    assert!(headers.contains_key(X_REQUEST_ID));
}
