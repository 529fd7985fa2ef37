//! Router for chat sessions: the upload and conversation workflow
//! plus the views of it.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{
        Html, IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use handlebars::Handlebars;

use super::public::{
    ConflictResponse, MessageRequest, MessageResponse, SendStatus, SessionResponse, UploadRequest,
    UploadResponse, UploadStatus,
};
use crate::api::public::ApiError;
use crate::api::state::SharedState;
use crate::session::{FileSource, SendError, SendOutcome, Session, UploadError, UploadFile};
use crate::view::templates::{render_frame, render_transcript};
use crate::view::{View, ViewModel};

fn not_found(id: &str) -> Response {
    (StatusCode::NOT_FOUND, format!("Session {} not found", id)).into_response()
}

fn conflict(error: &str) -> Response {
    (
        StatusCode::CONFLICT,
        Json(ConflictResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

fn find_session(state: &SharedState, id: &str) -> Option<Session> {
    state
        .read()
        .expect("Unable to read share state")
        .find_session(id)
}

/// Start a new, empty chat session
async fn create_session(State(state): State<SharedState>) -> Response {
    let session = state
        .write()
        .expect("Unable to write share state")
        .create_session();

    (
        StatusCode::CREATED,
        Json(SessionResponse {
            session_id: session.id().to_string(),
            view: ViewModel::from_snapshot(&session.snapshot()),
        }),
    )
        .into_response()
}

/// Get the current view of a session
async fn session_view_model(State(state): State<SharedState>, Path(id): Path<String>) -> Response {
    match find_session(&state, &id) {
        Some(session) => Json(ViewModel::from_snapshot(&session.snapshot())).into_response(),
        None => not_found(&id),
    }
}

/// End a session and forget its conversation
async fn delete_session(State(state): State<SharedState>, Path(id): Path<String>) -> Response {
    let removed = state
        .write()
        .expect("Unable to write share state")
        .remove_session(&id);

    match removed {
        Some(_) => {
            tracing::info!("Deleted session {}", id);
            StatusCode::NO_CONTENT.into_response()
        }
        None => not_found(&id),
    }
}

/// The transcript as an HTML fragment
async fn session_html(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let (session, templates) = {
        let shared_state = state.read().expect("Unable to read share state");
        (shared_state.find_session(&id), shared_state.templates.clone())
    };
    let Some(session) = session else {
        return Ok(not_found(&id));
    };

    let html = render_transcript(&templates, &ViewModel::from_snapshot(&session.snapshot()))?;
    Ok(Html(html).into_response())
}

/// Stream a rendered frame for the current state and again after
/// every change. The session ends with its last stream.
async fn session_events(State(state): State<SharedState>, Path(id): Path<String>) -> Response {
    let (session, templates) = {
        let mut shared_state = state.write().expect("Unable to write share state");
        (shared_state.add_subscriber(&id), shared_state.templates.clone())
    };
    let Some(session) = session else {
        return not_found(&id);
    };

    let subscription = Subscription {
        state: Arc::clone(&state),
        session_id: id,
    };
    let stream = frames(session, templates, subscription);
    Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response()
}

/// Held by an event stream for as long as the client is connected
struct Subscription {
    state: SharedState,
    session_id: String,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        match self.state.write() {
            Ok(mut state) => state.remove_subscriber(&self.session_id),
            Err(_) => tracing::error!(
                "Unable to release subscriber of session {}",
                self.session_id
            ),
        }
    }
}

fn frames(
    session: Session,
    templates: Arc<Handlebars<'static>>,
    subscription: Subscription,
) -> impl tokio_stream::Stream<Item = Result<Event, Infallible>> {
    let mut changes = session.subscribe();

    async_stream::stream! {
        let _subscription = subscription;
        let mut view = View::new();
        while !session.is_closed() {
            // Anything that changes after this point wakes the loop again
            let _ = *changes.borrow_and_update();
            let frame = view.render(&session.snapshot());
            match render_frame(&templates, &frame) {
                Ok(payload) => yield Ok(Event::default().event("view").data(payload.to_string())),
                Err(e) => tracing::error!("Failed to render view for session {}: {:#}", session.id(), e),
            }
            tokio::select! {
                changed = changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = session.closed() => break,
            }
        }
        tracing::debug!("Event stream for session {} ended", session.id());
    }
}

/// Upload a PDF into the session
async fn upload(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<UploadRequest>,
) -> Result<Response, ApiError> {
    let (session, controller) = {
        let shared_state = state.read().expect("Unable to read share state");
        let Some(session) = shared_state.find_session(&id) else {
            return Ok(not_found(&id));
        };
        let controller = shared_state.upload_controller(&session);
        (session, controller)
    };

    let source = payload.data.map(FileSource::Base64).unwrap_or(FileSource::Missing);
    let file = UploadFile::new(&payload.file_name, &payload.mime_type, source);

    // Detached so a client disconnect does not abort the extraction
    let task = controller.clone();
    let result = match tokio::spawn(async move { task.submit_upload(file).await }).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => {
            tracing::error!("Upload task for session {} panicked", id);
            Err(controller.record_failure(UploadError::ExtractionFailed))
        }
        Err(e) => return Err(e.into()),
    };

    let (outcome, error) = match result {
        Ok(_) => (UploadStatus::Processed, None),
        Err(UploadError::Busy) => return Ok(conflict(&UploadError::Busy.to_string())),
        Err(e @ UploadError::InvalidFileType) => (UploadStatus::Rejected, Some(e.to_string())),
        Err(e) => (UploadStatus::Failed, Some(e.to_string())),
    };

    Ok(Json(UploadResponse {
        outcome,
        error,
        view: ViewModel::from_snapshot(&session.snapshot()),
    })
    .into_response())
}

/// Send a chat message and wait for the reply
async fn send_message(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<MessageRequest>,
) -> Result<Response, ApiError> {
    let (session, controller) = {
        let shared_state = state.read().expect("Unable to read share state");
        let Some(session) = shared_state.find_session(&id) else {
            return Ok(not_found(&id));
        };
        let controller = shared_state.conversation_controller(&session);
        (session, controller)
    };

    // Detached so a client disconnect does not abort the request
    let task = controller.clone();
    let outcome = match tokio::spawn(async move { task.send_message(&payload.message).await }).await
    {
        Ok(Ok(SendOutcome::Ignored)) => SendStatus::Ignored,
        Ok(Ok(SendOutcome::Replied(_))) => SendStatus::Replied,
        Ok(Ok(SendOutcome::Failed(_))) => SendStatus::Failed,
        Ok(Err(SendError::Busy)) => return Ok(conflict(&SendError::Busy.to_string())),
        Err(e) if e.is_panic() => {
            tracing::error!("Send task for session {} panicked", id);
            controller.record_failure();
            SendStatus::Failed
        }
        Err(e) => return Err(e.into()),
    };

    Ok(Json(MessageResponse {
        outcome,
        view: ViewModel::from_snapshot(&session.snapshot()),
    })
    .into_response())
}

/// Create the sessions router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", post(create_session))
        .route("/{id}", get(session_view_model).delete(delete_session))
        .route("/{id}/view", get(session_html))
        .route("/{id}/events", get(session_events))
        .route("/{id}/upload", post(upload))
        .route("/{id}/messages", post(send_message))
}
