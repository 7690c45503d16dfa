//! Demo API handlers and the post loader sitting in front of them.

use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::app::AppContext;
use crate::domain::{Post, UserId};
use crate::error::GateError;
use crate::http::request::{CurrentResource, CurrentUser, Resource};
use crate::http::response::Outcome;
use crate::store::StoreError;

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Gatekeeper state, behind the Basic gate.
pub async fn debug_vars(State(ctx): State<AppContext>) -> Json<serde_json::Value> {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "cache_enabled": ctx.resolver.cache_enabled(),
        "rate_limit_enabled": ctx.admission.is_enabled(),
        "rate_limit_keys": ctx.admission.tracked_keys(),
    }))
}

pub async fn me(CurrentUser(user): CurrentUser) -> Json<serde_json::Value> {
    Json(json!({ "data": user }))
}

pub async fn get_user(
    State(ctx): State<AppContext>,
    _caller: CurrentUser,
    Path(id): Path<i64>,
) -> Response {
    match ctx.resolver.resolve(UserId(id)).await {
        Ok(user) => Json(json!({ "data": user })).into_response(),
        Err(GateError::IdentityNotFound(_)) => not_found(),
        Err(e) => {
            tracing::error!(user_id = id, error = %e, "User lookup failed");
            Outcome::InternalError.into_response()
        }
    }
}

/// Load the post named in the path into the request's resource slot.
pub async fn load_post(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
    mut request: Request,
    next: Next,
) -> Response {
    match ctx.posts.get_by_id(id).await {
        Ok(post) => {
            request.extensions_mut().insert(Resource(Arc::new(post)));
            next.run(request).await
        }
        Err(StoreError::NotFound) => not_found(),
        Err(e) => {
            tracing::error!(post_id = id, error = %e, "Post lookup failed");
            Outcome::InternalError.into_response()
        }
    }
}

pub async fn get_post(CurrentResource(post): CurrentResource<Post>) -> Json<serde_json::Value> {
    Json(json!({ "data": post }))
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostPayload {
    pub title: Option<String>,
    pub content: Option<String>,
}

pub async fn update_post(
    State(ctx): State<AppContext>,
    CurrentResource(post): CurrentResource<Post>,
    Json(payload): Json<UpdatePostPayload>,
) -> Response {
    let mut post = Post::clone(&post);
    if let Some(title) = payload.title {
        post.title = title;
    }
    if let Some(content) = payload.content {
        post.content = content;
    }

    match ctx.posts.update(post).await {
        Ok(post) => Json(json!({ "data": post })).into_response(),
        Err(StoreError::NotFound) => not_found(),
        Err(e) => {
            tracing::error!(error = %e, "Post update failed");
            Outcome::InternalError.into_response()
        }
    }
}

pub async fn delete_post(
    State(ctx): State<AppContext>,
    CurrentResource(post): CurrentResource<Post>,
) -> Response {
    match ctx.posts.delete(post.id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(StoreError::NotFound) => not_found(),
        Err(e) => {
            tracing::error!(post_id = post.id, error = %e, "Post delete failed");
            Outcome::InternalError.into_response()
        }
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" }))).into_response()
}
