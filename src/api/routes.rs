use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/ping", get(handlers::ping))
        // Recommendations
        .route("/recommend", post(handlers::recommend))
        // Catalogue lookups
        .route("/meta", get(handlers::meta))
        .route("/poster", get(handlers::poster))
        .route("/genres", post(handlers::genres))
        .route("/autocomplete", get(handlers::autocomplete))
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        // Permissive for local development; tighten in production
        .layer(CorsLayer::permissive())
        .with_state(state)
}
