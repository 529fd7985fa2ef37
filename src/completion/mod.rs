//! Client for the hosted text generation API.
pub mod core;
pub mod gemini;

pub use self::core::{BoxedCompletionApi, CompletionApi, Part, Role, Turn};
pub use gemini::GeminiClient;
