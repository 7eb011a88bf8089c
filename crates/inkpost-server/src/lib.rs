// ABOUTME: HTTP server for inkpost, serving the blog pages, forms and static assets.
// ABOUTME: Uses Axum with Askama templates and an explicitly constructed shared store handle.

pub mod app_state;
pub mod config;
pub mod routes;
pub mod web;

pub use app_state::{AppState, SharedState};
pub use config::{ConfigError, InkpostConfig, StorageKind};
pub use routes::create_router;
