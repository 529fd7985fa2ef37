use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use handlebars::Handlebars;

use crate::completion::{BoxedCompletionApi, GeminiClient};
use crate::core::AppConfig;
use crate::pdf::{BoxedPdfExtractor, extractor_for};
use crate::session::{ConversationController, Session, UploadController};
use crate::view::templates::templates;

pub type SharedState = Arc<RwLock<AppState>>;

pub struct AppState {
    // Live chat sessions by ID. Nothing is persisted, a restart
    // forgets every conversation.
    pub sessions: HashMap<String, Session>,
    // Open event streams per session. A session whose last stream
    // goes away belonged to a page that was closed or reloaded.
    subscribers: HashMap<String, usize>,
    pub config: AppConfig,
    pub extractor: BoxedPdfExtractor,
    pub completion: BoxedCompletionApi,
    pub templates: Arc<Handlebars<'static>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let extractor = extractor_for(config.extractor_url.as_deref());
        let completion = Arc::new(GeminiClient::new(
            &config.completion_api_hostname,
            &config.completion_api_key,
            &config.completion_model,
        ));
        Self::with_collaborators(config, extractor, completion)
    }

    pub fn with_collaborators(
        config: AppConfig,
        extractor: BoxedPdfExtractor,
        completion: BoxedCompletionApi,
    ) -> Self {
        Self {
            sessions: HashMap::new(),
            subscribers: HashMap::new(),
            config,
            extractor,
            completion,
            templates: Arc::new(templates()),
        }
    }

    pub fn create_session(&mut self) -> Session {
        let session = Session::new();
        self.sessions
            .insert(session.id().to_string(), session.clone());
        tracing::info!("Created session {}", session.id());
        session
    }

    pub fn find_session(&self, id: &str) -> Option<Session> {
        self.sessions.get(id).cloned()
    }

    /// Forget a session and end its event streams.
    pub fn remove_session(&mut self, id: &str) -> Option<Session> {
        self.subscribers.remove(id);
        let session = self.sessions.remove(id)?;
        session.close();
        Some(session)
    }

    /// Register an event stream for the session, if it exists.
    pub fn add_subscriber(&mut self, id: &str) -> Option<Session> {
        let session = self.find_session(id)?;
        *self.subscribers.entry(id.to_string()).or_default() += 1;
        Some(session)
    }

    /// Unregister an event stream. The session is removed along with
    /// its last one.
    pub fn remove_subscriber(&mut self, id: &str) {
        let Some(count) = self.subscribers.get_mut(id) else {
            return;
        };
        *count -= 1;
        if *count == 0 {
            tracing::info!("Last subscriber left session {}", id);
            self.remove_session(id);
        }
    }

    pub fn subscriber_count(&self, id: &str) -> usize {
        self.subscribers.get(id).copied().unwrap_or(0)
    }

    pub fn upload_controller(&self, session: &Session) -> UploadController {
        UploadController::new(session.clone(), self.extractor.clone())
    }

    pub fn conversation_controller(&self, session: &Session) -> ConversationController {
        ConversationController::new(
            session.clone(),
            self.completion.clone(),
            self.config.generation.clone(),
        )
    }
}
