//! Router construction

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::web::{
    handlers,
    state::{AppState, UnavailableState},
};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Form pages
        .route("/", get(handlers::index))
        .route("/predict", post(handlers::predict_form))
        .route("/guide", get(handlers::guide))
        // JSON endpoints
        .route("/api/predict", post(handlers::predict_json))
        .route("/api/guide", get(handlers::guide_json))
        // System endpoints
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Router for a process whose asset bundle failed to load: every path
/// answers 503 with the load error.
pub fn create_unavailable_router(state: UnavailableState) -> Router {
    Router::new()
        .fallback(handlers::unavailable)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
