use axum::{
    middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, middleware::metrics_middleware, series, sync};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Sync control
        .route(
            "/sync",
            get(sync::get_status)
                .post(sync::start_sync)
                .delete(sync::cancel_sync),
        )
        // Mirror
        .route("/series/stats", get(series::get_stats))
        .route_layer(middleware::from_fn(metrics_middleware))
        .with_state(Arc::clone(&state));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
