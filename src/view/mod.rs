//! Presentation of a session. Everything here is derived from a
//! [`SessionSnapshot`]; no state is changed.
pub mod templates;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::session::{Sender, SessionSnapshot};

pub const TYPING_INDICATOR: &str = "Typing...";

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct MessageView {
    pub id: Uuid,
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct ViewModel {
    pub session_id: String,
    pub messages: Vec<MessageView>,
    pub error: Option<String>,
    pub typing: bool,
    pub upload_enabled: bool,
    pub upload_label: String,
    pub send_enabled: bool,
}

impl ViewModel {
    pub fn from_snapshot(snapshot: &SessionSnapshot) -> Self {
        let messages = snapshot
            .conversation
            .iter()
            .map(|m| MessageView {
                id: m.id(),
                sender: m.sender(),
                text: m.text().to_string(),
                timestamp: m.timestamp(),
            })
            .collect();
        let processing = snapshot.upload.processing;

        Self {
            session_id: snapshot.id.clone(),
            messages,
            error: snapshot.upload.error.clone(),
            typing: snapshot.typing,
            upload_enabled: !processing,
            upload_label: if processing {
                "Processing...".to_string()
            } else {
                "Upload PDF".to_string()
            },
            send_enabled: !snapshot.typing,
        }
    }
}

// The parts of the view whose change moves the scroll position
#[derive(Clone, Debug, PartialEq)]
struct ScrollKey {
    messages: usize,
    error: Option<String>,
    typing: bool,
}

#[derive(Clone, Serialize, Debug)]
pub struct Frame {
    pub view: ViewModel,
    pub scroll_to_latest: bool,
}

/// A subscriber's view of one session. Remembers what it last showed
/// so it can tell when to scroll to the latest entry.
#[derive(Default)]
pub struct View {
    last: Option<ScrollKey>,
}

impl View {
    pub fn new() -> Self {
        Self { last: None }
    }

    pub fn render(&mut self, snapshot: &SessionSnapshot) -> Frame {
        let view = ViewModel::from_snapshot(snapshot);
        let key = ScrollKey {
            messages: view.messages.len(),
            error: view.error.clone(),
            typing: view.typing,
        };
        let scroll_to_latest = self.last.as_ref() != Some(&key);
        self.last = Some(key);
        Frame {
            view,
            scroll_to_latest,
        }
    }
}
