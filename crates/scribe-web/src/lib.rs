//! HTTP upload boundary for scribe.
//!
//! The router is built here so integration tests can drive it without a
//! socket; `main.rs` only resolves settings and serves it.

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

pub mod error;
pub mod handlers;
pub mod models;
pub mod settings;
pub mod state;
pub mod template;
pub mod upload;

pub use error::ApiError;
pub use settings::ServerSettings;
pub use state::AppState;

/// Build the application router around shared state.
pub fn app(state: Arc<AppState>) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        .route("/", get(handlers::index::index))
        .route("/extract", post(handlers::extract::extract))
        .route("/health", get(handlers::health::health))
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
