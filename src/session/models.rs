//! The core models for a single chat session.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::completion::{Role, Turn};

pub const DOCUMENT_CONTEXT_PREFIX: &str = "Here is the content of the uploaded PDF:\n";
pub const FALLBACK_REPLY: &str =
    "An error occurred while fetching the response. Please try again.";

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Sender {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "ai")]
    Ai,
}

impl From<Sender> for Role {
    fn from(sender: Sender) -> Role {
        match sender {
            Sender::User => Role::User,
            Sender::Ai => Role::Model,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Message {
    id: Uuid,
    sender: Sender,
    text: String,
    timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(sender: Sender, text: &str) -> Self {
        Message {
            id: Uuid::new_v4(),
            sender,
            text: text.to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(text: &str) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn ai(text: &str) -> Self {
        Self::new(Sender::Ai, text)
    }

    pub fn upload_processed(file_name: &str) -> Self {
        Self::ai(&format!("PDF \"{}\" processed successfully!", file_name))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn to_turn(&self) -> Turn {
        Turn::new(self.sender.into(), &self.text)
    }
}

/// Append-only transcript of a session.
#[derive(Clone, Default, Serialize, Debug)]
pub struct Conversation(Vec<Message>);

impl Conversation {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, msg: Message) {
        self.0.push(msg)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.0.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.0.iter()
    }

    /// The request payload for the completion API: the document turn
    /// first when there is document text, then the whole history in
    /// order.
    pub fn turns(&self, document_text: Option<&str>) -> Vec<Turn> {
        let mut turns = Vec::with_capacity(self.0.len() + 1);
        if let Some(text) = document_text.filter(|t| !t.is_empty()) {
            turns.push(Turn::new(
                Role::User,
                &format!("{}{}", DOCUMENT_CONTEXT_PREFIX, text),
            ));
        }
        turns.extend(self.0.iter().map(Message::to_turn));
        turns
    }
}

#[derive(Clone, Default, Serialize, Debug, PartialEq)]
pub struct UploadState {
    pub processing: bool,
    pub error: Option<String>,
    pub extracted_text: Option<String>,
}

/// Everything a session holds. Lives only in memory.
#[derive(Clone, Serialize, Debug)]
pub struct SessionState {
    pub id: String,
    pub conversation: Conversation,
    pub upload: UploadState,
    pub typing: bool,
}

impl SessionState {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            conversation: Conversation::new(),
            upload: UploadState::default(),
            typing: false,
        }
    }
}

pub type SessionSnapshot = SessionState;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_serialization() {
        assert_eq!(serde_json::to_string(&Sender::User).unwrap(), r#""user""#);
        assert_eq!(serde_json::to_string(&Sender::Ai).unwrap(), r#""ai""#);
    }

    #[test]
    fn test_message_ids_are_unique() {
        let a = Message::user("Hello");
        let b = Message::user("Hello");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_upload_processed_text() {
        let msg = Message::upload_processed("report.pdf");
        assert_eq!(msg.sender(), Sender::Ai);
        assert_eq!(msg.text(), "PDF \"report.pdf\" processed successfully!");
    }

    #[test]
    fn test_turns_without_document() {
        let mut conversation = Conversation::new();
        conversation.push(Message::user("Hi"));
        conversation.push(Message::ai("Hello!"));
        conversation.push(Message::user("How are you?"));

        let turns = conversation.turns(None);
        assert_eq!(
            turns,
            vec![
                Turn::new(Role::User, "Hi"),
                Turn::new(Role::Model, "Hello!"),
                Turn::new(Role::User, "How are you?"),
            ]
        );
        // Empty document text is treated as no document
        assert_eq!(conversation.turns(Some("")), turns);
    }

    #[test]
    fn test_turns_with_document_first() {
        let mut conversation = Conversation::new();
        conversation.push(Message::upload_processed("report.pdf"));
        conversation.push(Message::user("Summarize the document"));

        let turns = conversation.turns(Some("page one\n"));
        assert_eq!(turns.len(), 3);
        assert_eq!(
            turns[0],
            Turn::new(
                Role::User,
                "Here is the content of the uploaded PDF:\npage one\n"
            )
        );
        assert_eq!(turns[1].role, Role::Model);
        assert_eq!(turns[2], Turn::new(Role::User, "Summarize the document"));
    }
}
