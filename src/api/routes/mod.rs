//! API routes module

pub mod pdf;
pub mod sessions;

use axum::Router;

use crate::api::state::SharedState;

/// Create the combined API router
pub fn router() -> Router<SharedState> {
    Router::new()
        // Standalone PDF text extraction
        .nest("/parse-pdf", pdf::router())
        // Chat sessions
        .nest("/sessions", sessions::router())
}
