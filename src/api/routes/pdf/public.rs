//! Public types for the PDF extraction API
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct ParsePdfRequest {
    #[serde(rename = "pdfBuffer")]
    pub pdf_buffer: Option<Vec<u8>>,
}

#[derive(Serialize, Deserialize)]
pub struct ParsePdfResponse {
    pub text: String,
}

#[derive(Serialize, Deserialize)]
pub struct ParsePdfError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ParsePdfError {
    pub fn new(error: &str, details: Option<String>) -> Self {
        Self {
            error: error.to_string(),
            details,
        }
    }
}
