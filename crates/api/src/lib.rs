//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - File routes under `/api/files`
//! - Health check
//! - The JSON response envelope

pub mod response;
pub mod routes;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use docvault_core::files::FileService;
use docvault_core::storage::StorageService;
use docvault_shared::EmptySearchPolicy;

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// File gateway backed by the configured object store.
    pub files: Arc<FileService<StorageService>>,
    /// Response for searches that match nothing.
    pub empty_search: EmptySearchPolicy,
}

impl AppState {
    /// Create application state.
    #[must_use]
    pub fn new(files: Arc<FileService<StorageService>>, empty_search: EmptySearchPolicy) -> Self {
        Self {
            files,
            empty_search,
        }
    }

    /// Request body limit derived from the storage upload limit.
    #[must_use]
    pub fn body_limit(&self) -> usize {
        let max = self.files.store().config().max_file_size;
        usize::try_from(max.saturating_add(MULTIPART_OVERHEAD)).unwrap_or(usize::MAX)
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::api_routes())
        .layer(DefaultBodyLimit::max(state.body_limit()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
