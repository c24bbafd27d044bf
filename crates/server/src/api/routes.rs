use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::{handlers, middleware::metrics_middleware, sessions};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let storage = &state.config().storage;
    let public_prefix = format!("/{}", storage.public_url_prefix.trim_matches('/'));
    let serve_public = ServeDir::new(&storage.public_dir);

    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Sessions
        .route("/sessions", post(sessions::create_session))
        .route("/sessions", get(sessions::list_sessions))
        .route("/sessions/{id}/status", get(sessions::get_status))
        .route("/sessions/{id}/content", get(sessions::get_content))
        .route("/sessions/{id}/publish", post(sessions::publish_session));

    let router = Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics));

    // Published artifacts; a bare "/" prefix serves them as the fallback
    let router = if public_prefix == "/" {
        router.fallback_service(serve_public)
    } else {
        router.nest_service(&public_prefix, serve_public)
    };

    router
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
