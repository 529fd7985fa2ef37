use std::sync::Arc;

use anyhow::{Context, Error, Result, anyhow, bail};
use async_trait::async_trait;
use lopdf::Document;
use serde_json::{Value, json};

/// Turns raw PDF bytes into a flat text string.
#[async_trait]
pub trait PdfExtractor: Send + Sync {
    async fn extract(&self, bytes: Vec<u8>) -> Result<String, Error>;
}

pub type BoxedPdfExtractor = Arc<dyn PdfExtractor + 'static>;

/// Extract the text of every page in page order, one newline after
/// each page.
pub fn extract_text(bytes: &[u8]) -> Result<String, Error> {
    let doc = Document::load_mem(bytes).context("Failed to load PDF")?;

    let mut text = String::new();
    for page_num in doc.get_pages().keys() {
        let content = doc
            .extract_text(&[*page_num])
            .with_context(|| format!("Failed to extract text from page {}", page_num))?;
        text.push_str(content.trim_end());
        text.push('\n');
    }
    Ok(text)
}

/// Parses documents in process with `lopdf`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LopdfExtractor;

#[async_trait]
impl PdfExtractor for LopdfExtractor {
    async fn extract(&self, bytes: Vec<u8>) -> Result<String, Error> {
        // Parsing is CPU bound so keep it off the async workers
        tokio::task::spawn_blocking(move || extract_text(&bytes))
            .await
            .map_err(|e| anyhow!("PDF extraction task failed: {}", e))?
    }
}

/// Delegates extraction to a remote `/api/parse-pdf` endpoint.
#[derive(Clone, Debug)]
pub struct RemoteExtractor {
    client: reqwest::Client,
    api_url: String,
}

impl RemoteExtractor {
    pub fn new(api_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PdfExtractor for RemoteExtractor {
    async fn extract(&self, bytes: Vec<u8>) -> Result<String, Error> {
        let url = format!("{}/api/parse-pdf", self.api_url);
        let response = self
            .client
            .post(url)
            .json(&json!({ "pdfBuffer": bytes }))
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        if !status.is_success() {
            bail!(
                "Extraction endpoint responded with {}: {} {}",
                status,
                body["error"].as_str().unwrap_or("unknown error"),
                body["details"].as_str().unwrap_or("")
            );
        }

        body["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("Extraction response missing text: {}", body))
    }
}
