//! Read API over the snapshot store
//!
//! This module serves the latest snapshots over HTTP:
//! - `GET /` - service index
//! - `GET /stock` - full stock state, or one category via `?category=<key>`
//! - `GET /stock/refresh` - runs an extraction cycle, then reports the state
//!
//! Refresh requests are funneled through the scheduler loop's channel, so a
//! manual cycle can never overlap a timer-triggered one.

mod handlers;

use crate::scrape::RefreshRequest;
use crate::storage::SqliteStore;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::mpsc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared state handed to every request handler
#[derive(Clone)]
pub struct AppState {
    /// Handle to the snapshot store, shared with the extraction cycle
    pub store: Arc<Mutex<SqliteStore>>,
    /// Sends manual refresh requests into the scheduler loop
    pub refresh: mpsc::Sender<RefreshRequest>,
}

impl AppState {
    /// Creates the shared request state
    pub fn new(store: Arc<Mutex<SqliteStore>>, refresh: mpsc::Sender<RefreshRequest>) -> Self {
        Self { store, refresh }
    }
}

/// Errors surfaced to API callers as JSON payloads
#[derive(Debug, Error)]
pub enum ApiError {
    /// The requested category does not exist or has no data yet
    #[error("not found: {0}")]
    NotFound(String),

    /// The store or scheduler failed while handling the request
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found(msg: &str) -> Self {
        Self::NotFound(msg.to_string())
    }

    pub fn internal<E: std::fmt::Display>(e: E) -> Self {
        Self::Internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (code, msg) = match self {
            ApiError::NotFound(m) => (axum::http::StatusCode::NOT_FOUND, m),
            ApiError::Internal(m) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, m),
        };
        (code, Json(json!({ "error": msg }))).into_response()
    }
}

/// Builds the HTTP router for the read API
///
/// # Arguments
///
/// * `state` - Shared store handle and refresh channel
///
/// # Returns
///
/// A router with tracing and permissive CORS applied
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::get_index))
        .route("/stock", get(handlers::get_stock))
        .route("/stock/refresh", get(handlers::refresh_stock))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
