// ABOUTME: Route definitions for the inkpost HTTP server.
// ABOUTME: Assembles pages, form endpoints, static assets and the health probe into one Router.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use inkpost_core::PostStore;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::SharedState;
use crate::web;

/// Build the complete Axum router with all routes and shared state.
pub fn create_router(state: SharedState) -> Router {
    let static_files = ServeDir::new(&state.static_dir);
    let request_timeout = state.request_timeout;

    Router::new()
        .route("/", get(web::index))
        .route("/new", get(web::new_post_form))
        .route("/create", post(web::create_post))
        .route("/post/{id}", get(web::show_post))
        .route("/post/{id}/comment", post(web::create_comment))
        .route("/health", get(health))
        .nest_service("/static", static_files)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check for process supervisors. Reports 503 when the store
/// cannot answer a count query.
async fn health(State(state): State<SharedState>) -> impl IntoResponse {
    match state.store.count_posts() {
        Ok(_) => (
            StatusCode::OK,
            axum::Json(serde_json::json!({ "status": "ok" })),
        ),
        Err(e) => {
            tracing::error!("health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                axum::Json(serde_json::json!({ "status": "unavailable" })),
            )
        }
    }
}
