//! HTTP surface: JSON API, asset serving and health.

mod auth;
pub mod error;
mod handlers;
mod middleware;
mod multipart;
mod state;

pub use auth::AdminSession;
pub use middleware::RequestContext;
pub use state::AppState;

use std::future::IntoFuture;
use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, post, put},
};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::ServerSettings;
use crate::infra::error::InfraError;

use handlers::{assets, collections, health, menu, pages, posts};
use middleware::{log_responses, set_request_context};

pub fn build_router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/api/pages/{key}", put(pages::update_page))
        .route("/api/pages/{key}/upload", post(pages::upload_page))
        .route(
            "/api/pages/{key}/collections/{collection}/reorder",
            put(collections::reorder),
        )
        .route(
            "/api/pages/{key}/collections/{collection}/{index}",
            delete(collections::remove),
        )
        .route("/api/posts", post(posts::create_post))
        .route("/api/posts/reorder", put(posts::reorder_posts))
        .route(
            "/api/posts/{id}",
            put(posts::update_post).delete(posts::delete_post),
        )
        .route("/api/menu", post(menu::create_menu_item))
        .route("/api/menu/reorder", put(menu::reorder_menu))
        .route(
            "/api/menu/{id}",
            put(menu::update_menu_item).delete(menu::delete_menu_item),
        )
        .route("/api/auth/session", get(handlers::auth::session))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin_session,
        ));

    let mut public = Router::new()
        .route("/api/pages/{key}", get(pages::get_page))
        .route("/api/posts", get(posts::list_posts))
        .route("/api/posts/{id}", get(posts::get_post))
        .route("/api/menu", get(menu::list_menu))
        .route("/api/menu/{id}", get(menu::get_menu_item))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/_health", get(health::health));

    // Absolute URL prefixes point at another host; nothing to mount locally.
    if state.public_prefix.starts_with('/') {
        let asset_route = format!("{}/{{*path}}", state.public_prefix);
        public = public.route(&asset_route, get(assets::serve_asset));
    }

    let body_limit = state.max_request_bytes;
    public
        .merge(admin)
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

/// Serve `router` until ctrl-c or SIGTERM, then allow in-flight requests `graceful_shutdown` to finish.
pub async fn serve(settings: &ServerSettings, router: Router) -> Result<(), InfraError> {
    let listener = TcpListener::bind(settings.addr).await?;
    info!(target = "tavola::http", addr = %settings.addr, "listening");

    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .into_future();
    let grace = settings.graceful_shutdown;

    tokio::select! {
        result = server => result?,
        () = drain_deadline(grace) => {
            warn!(
                target = "tavola::http",
                grace_secs = grace.as_secs(),
                "graceful shutdown timed out; dropping open connections"
            );
        }
    }

    info!(target = "tavola::http", "server stopped");
    Ok(())
}

async fn drain_deadline(grace: Duration) {
    shutdown_signal().await;
    tokio::time::sleep(grace).await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(target = "tavola::http", error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(target = "tavola::http", error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
