use std::sync::Arc;
use std::sync::RwLock;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    response::Html,
    routing::get,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::public::ApiError;
use super::routes;
use crate::api::state::{AppState, SharedState};
use crate::core::{AppConfig, init_tracing};
use crate::view::templates::render_index;

/// The chat page. Everything after the first load arrives over the
/// session's event stream.
async fn index(State(state): State<SharedState>) -> Result<Html<String>, ApiError> {
    let templates = state
        .read()
        .expect("Unable to read share state")
        .templates
        .clone();
    Ok(Html(render_index(&templates)?))
}

pub fn app(shared_state: SharedState) -> Router {
    let cors = CorsLayer::permissive();
    let body_limit = shared_state
        .read()
        .expect("Unable to read share state")
        .config
        .max_request_bytes;

    Router::new()
        .route("/", get(index))
        // API routes
        .nest("/api", routes::router())
        // PDFs arrive base64 encoded in JSON bodies
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(Arc::clone(&shared_state))
}

// Run the server
pub async fn serve(host: String, port: String, config: AppConfig) -> anyhow::Result<()> {
    // axum logs rejections from built-in extractors with the `axum::rejection`
    // target, at `TRACE` level. `axum::rejection=trace` enables showing those events
    init_tracing(&format!(
        "{}=debug,tower_http=debug,axum::rejection=trace",
        env!("CARGO_CRATE_NAME")
    ));

    let app_state = AppState::new(config);
    let shared_state = Arc::new(RwLock::new(app_state));
    let app = app(Arc::clone(&shared_state));

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;

    tracing::debug!("Server started. Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
