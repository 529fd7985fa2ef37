//! Turns user input into a completion request and records the reply,
//! or a fallback message when the request fails.
use thiserror::Error;

use super::{BusyFlag, FALLBACK_REPLY, Message, Session};
use crate::completion::BoxedCompletionApi;
use crate::core::GenerationConfig;

#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Blank input, nothing happened
    Ignored,
    Replied(Message),
    /// The request failed and the fallback message was appended
    Failed(Message),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendError {
    #[error("A reply is already being generated.")]
    Busy,
}

#[derive(Clone)]
pub struct ConversationController {
    session: Session,
    completion: BoxedCompletionApi,
    generation: GenerationConfig,
}

impl ConversationController {
    pub fn new(
        session: Session,
        completion: BoxedCompletionApi,
        generation: GenerationConfig,
    ) -> Self {
        Self {
            session,
            completion,
            generation,
        }
    }

    /// Send `text` with the full history, and the document text if an
    /// upload succeeded earlier, and append the reply. Failures of the
    /// completion API never propagate; they become a fallback message.
    pub async fn send_message(&self, text: &str) -> Result<SendOutcome, SendError> {
        if text.trim().is_empty() {
            return Ok(SendOutcome::Ignored);
        }

        // The payload is built from whatever document text exists right
        // now, an upload still in flight is not waited for
        let turns = self.session.update(|s| {
            if s.typing {
                return Err(SendError::Busy);
            }
            s.conversation.push(Message::user(text));
            s.typing = true;
            Ok(s.conversation.turns(s.upload.extracted_text.as_deref()))
        })?;

        let _typing = self.session.release_on_drop(BusyFlag::Typing);

        let (reply, replied) = match self.completion.complete(&turns, &self.generation).await {
            Ok(text) => (Message::ai(&text), true),
            Err(e) => {
                tracing::error!(
                    "Error calling the completion API for session {}: {:#}",
                    self.session.id(),
                    e
                );
                (Message::ai(FALLBACK_REPLY), false)
            }
        };

        self.finish(reply.clone());

        if replied {
            Ok(SendOutcome::Replied(reply))
        } else {
            Ok(SendOutcome::Failed(reply))
        }
    }

    /// Append the fallback reply and end typing. Used when the send
    /// task died before it could record a reply.
    pub fn record_failure(&self) -> Message {
        let reply = Message::ai(FALLBACK_REPLY);
        self.finish(reply.clone());
        reply
    }

    // Append before clearing the indicator
    fn finish(&self, reply: Message) {
        self.session.update(|s| {
            s.conversation.push(reply);
            s.typing = false;
        });
    }
}
