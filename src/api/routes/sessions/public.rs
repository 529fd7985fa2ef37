//! Public types for the chat session API
use serde::{Deserialize, Serialize};

use crate::view::ViewModel;

#[derive(Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub view: ViewModel,
}

#[derive(Deserialize)]
pub struct UploadRequest {
    pub file_name: String,
    pub mime_type: String,
    // Base64 or a data URL. Absent when the client failed to read the
    // file.
    pub data: Option<String>,
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Processed,
    Rejected,
    Failed,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub outcome: UploadStatus,
    pub error: Option<String>,
    pub view: ViewModel,
}

#[derive(Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SendStatus {
    Ignored,
    Replied,
    Failed,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub outcome: SendStatus,
    pub view: ViewModel,
}

#[derive(Serialize)]
pub struct ConflictResponse {
    pub error: String,
}
