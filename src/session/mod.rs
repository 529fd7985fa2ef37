//! Per-session workflow state: the transcript, the upload slot and the
//! typing indicator, plus the controllers that drive them.
//!
//! A [`Session`] is a cheap, cloneable handle. Every mutation goes
//! through [`Session::update`], which holds the write lock only for the
//! duration of the closure (never across an `.await`) and then
//! publishes a new revision so subscribers can re-render.
pub mod conversation;
pub mod models;
pub mod upload;

use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::watch;
use uuid::Uuid;

pub use conversation::{ConversationController, SendError, SendOutcome};
pub use models::{
    Conversation, FALLBACK_REPLY, Message, Sender, SessionSnapshot, SessionState, UploadState,
};
pub use upload::{FileSource, UploadController, UploadError, UploadFile, UploadOutcome};

#[derive(Clone, Debug)]
pub struct Session {
    id: String,
    state: Arc<RwLock<SessionState>>,
    revision: Arc<watch::Sender<u64>>,
    closed: Arc<watch::Sender<bool>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_id(&Uuid::new_v4().to_string())
    }

    pub fn with_id(id: &str) -> Self {
        let (revision, _) = watch::channel(0);
        let (closed, _) = watch::channel(false);
        Self {
            id: id.to_string(),
            state: Arc::new(RwLock::new(SessionState::new(id))),
            revision: Arc::new(revision),
            closed: Arc::new(closed),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// A copy of the current state for rendering.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.read(|s| s.clone())
    }

    /// Receive a notification after every state change. The value is a
    /// monotonically increasing revision number.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Mark the session as ended. Anyone waiting in [`Session::closed`]
    /// wakes up; operations already in flight still finish.
    pub fn close(&self) {
        self.closed.send_replace(true);
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Resolves once the session is closed, immediately if it already is.
    pub async fn closed(&self) {
        let mut rx = self.closed.subscribe();
        let _ = rx.wait_for(|closed| *closed).await;
    }

    pub fn read<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// Mutate the state and publish the change.
    pub fn update<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let result = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            f(&mut state)
        };
        self.revision.send_modify(|rev| *rev += 1);
        result
    }

    /// Clears `flag` when dropped, whichever way the owning operation
    /// exits.
    pub(crate) fn release_on_drop(&self, flag: BusyFlag) -> FlagGuard {
        FlagGuard {
            session: self.clone(),
            flag,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BusyFlag {
    Processing,
    Typing,
}

impl BusyFlag {
    fn is_set(self, state: &SessionState) -> bool {
        match self {
            BusyFlag::Processing => state.upload.processing,
            BusyFlag::Typing => state.typing,
        }
    }

    fn clear(self, state: &mut SessionState) {
        match self {
            BusyFlag::Processing => state.upload.processing = false,
            BusyFlag::Typing => state.typing = false,
        }
    }
}

pub(crate) struct FlagGuard {
    session: Session,
    flag: BusyFlag,
}

impl Drop for FlagGuard {
    fn drop(&mut self) {
        let flag = self.flag;
        if self.session.read(|s| flag.is_set(s)) {
            tracing::debug!("Releasing {:?} flag for session {}", flag, self.session.id());
            self.session.update(|s| flag.clear(s));
        }
    }
}
