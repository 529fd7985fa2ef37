use anyhow::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::GenerationConfig;

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "model")]
    Model,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Part {
    pub text: String,
}

/// One role-tagged unit of dialogue in the wire format of the
/// completion API.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Turn {
    pub fn new(role: Role, text: &str) -> Self {
        Turn {
            role,
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }

    /// Text of the first part, if any.
    pub fn text(&self) -> Option<&str> {
        self.parts.first().map(|p| p.text.as_str())
    }
}

/// Produces the next reply for a conversation. Implementations make
/// exactly one attempt and never retry.
#[async_trait]
pub trait CompletionApi: Send + Sync {
    async fn complete(&self, turns: &[Turn], generation: &GenerationConfig)
    -> Result<String, Error>;
}

pub type BoxedCompletionApi = std::sync::Arc<dyn CompletionApi + 'static>;
