//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router and compose the gates in pipeline order
//! - Wire up middleware (tracing, request timeout, request ID)
//! - Bind server to listener with client addresses available to the rate gate
//! - Run the rate-limit sweeper alongside the server

use axum::{
    handler::Handler,
    middleware,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::app::AppContext;
use crate::auth::{basic_auth, bearer_auth};
use crate::authz::{authorize, OwnershipGate};
use crate::domain::Post;
use crate::http::handlers;
use crate::lifecycle::Shutdown;
use crate::security::rate_limit::rate_limit;

/// Role required to edit someone else's post.
pub const EDIT_POST_ROLE: &str = "moderator";
/// Role required to delete someone else's post.
pub const DELETE_POST_ROLE: &str = "admin";

/// HTTP server fronted by the gatekeeper pipeline.
pub struct HttpServer {
    router: Router,
    ctx: AppContext,
}

impl HttpServer {
    pub fn new(ctx: AppContext) -> Self {
        let router = build_router(&ctx);
        Self { router, ctx }
    }

    /// Run the server until `shutdown` fires, then drain.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            cache_enabled = self.ctx.config.cache.enabled,
            rate_limit_enabled = self.ctx.config.rate_limit.enabled,
            "HTTP server starting"
        );

        let sweeper = self.ctx.admission.spawn_sweeper(
            Duration::from_secs(self.ctx.config.rate_limit.sweep_interval_secs),
            shutdown.subscribe(),
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        // The sweeper may have subscribed after an early trigger.
        shutdown.trigger();
        if let Some(sweeper) = sweeper {
            let _ = sweeper.await;
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the router with all gates in place.
///
/// ```text
/// request-id → trace → timeout → rate gate → { basic | bearer → post loader → ownership gate } → handler
/// ```
#[allow(deprecated)]
pub fn build_router(ctx: &AppContext) -> Router {
    let basic = middleware::from_fn_with_state(ctx.basic.clone(), basic_auth);
    let bearer = middleware::from_fn_with_state(ctx.bearer.clone(), bearer_auth);
    let load_post = middleware::from_fn_with_state(ctx.clone(), handlers::load_post);
    let can_edit = middleware::from_fn_with_state(
        OwnershipGate::new(ctx.authorizer.clone(), EDIT_POST_ROLE),
        authorize::<Post>,
    );
    let can_delete = middleware::from_fn_with_state(
        OwnershipGate::new(ctx.authorizer.clone(), DELETE_POST_ROLE),
        authorize::<Post>,
    );

    let debug = Router::new()
        .route("/v1/debug/vars", get(handlers::debug_vars))
        .route_layer(basic);

    let users = Router::new()
        .route("/v1/users/me", get(handlers::me))
        .route("/v1/users/{id}", get(handlers::get_user))
        .route_layer(bearer.clone());

    let posts = Router::new()
        .route(
            "/v1/posts/{id}",
            get(handlers::get_post)
                .patch(handlers::update_post.layer(can_edit))
                .delete(handlers::delete_post.layer(can_delete)),
        )
        .route_layer(load_post)
        .route_layer(bearer);

    Router::new()
        .route("/v1/health", get(handlers::health))
        .merge(debug)
        .merge(users)
        .merge(posts)
        .with_state(ctx.clone())
        .layer(middleware::from_fn_with_state(ctx.admission.clone(), rate_limit))
        .layer(TimeoutLayer::new(Duration::from_secs(ctx.config.timeouts.request_secs)))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
