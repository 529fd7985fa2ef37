//! Gemini `generateContent` client.
use anyhow::{Error, Result, anyhow, bail};
use async_trait::async_trait;
use serde_json::{Value, json};

use super::core::{CompletionApi, Turn};
use crate::core::GenerationConfig;

/// Send the conversation to the `generateContent` endpoint and return
/// the raw JSON response. Non-success statuses are errors.
pub async fn generate_content(
    client: &reqwest::Client,
    turns: &[Turn],
    generation: &GenerationConfig,
    api_hostname: &str,
    api_key: &str,
    model: &str,
) -> Result<Value, Error> {
    let payload = json!({
        "contents": turns,
        "generation_config": generation,
    });
    let url = format!(
        "{}/v1beta/models/{}:generateContent",
        api_hostname.trim_end_matches('/'),
        model
    );
    let response = client
        .post(url)
        .header("x-goog-api-key", api_key)
        .header("Content-Type", "application/json")
        .json(&payload)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!("Completion API responded with {}: {}", status, body);
    }

    Ok(response.json().await?)
}

/// Pull the text of the first candidate out of a response. Any other
/// shape is an error rather than an empty reply.
pub fn reply_text(resp: &Value) -> Result<String, Error> {
    resp["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Invalid API response: {}", resp))
}

#[derive(Clone, Debug)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_hostname: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_hostname: &str, api_key: &str, model: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_hostname: api_hostname.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionApi for GeminiClient {
    async fn complete(
        &self,
        turns: &[Turn],
        generation: &GenerationConfig,
    ) -> Result<String, Error> {
        tracing::debug!("Requesting completion from {} with {} turns", self.model, turns.len());
        let resp = generate_content(
            &self.client,
            turns,
            generation,
            &self.api_hostname,
            &self.api_key,
            &self.model,
        )
        .await?;
        reply_text(&resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::Role;
    use mockito::Matcher;

    const PATH: &str = "/v1beta/models/gemini-1.5-flash:generateContent";

    fn turns() -> Vec<Turn> {
        vec![
            Turn::new(Role::User, "Hello"),
            Turn::new(Role::Model, "Hi there"),
            Turn::new(Role::User, "Summarize the document"),
        ]
    }

    #[test]
    fn it_extracts_first_candidate_text() {
        let resp = json!({
            "candidates": [
                {"content": {"parts": [{"text": "first"}], "role": "model"}},
                {"content": {"parts": [{"text": "second"}], "role": "model"}}
            ]
        });
        assert_eq!(reply_text(&resp).unwrap(), "first");
    }

    #[test]
    fn it_rejects_responses_without_candidates() {
        assert!(reply_text(&json!({})).is_err());
        assert!(reply_text(&json!({"candidates": []})).is_err());
        assert!(reply_text(&json!({"candidates": [{"content": {}}]})).is_err());
        assert!(reply_text(&json!({"candidates": [{"content": {"parts": [{}]}}]})).is_err());
    }

    #[tokio::test]
    async fn it_sends_contents_and_generation_config() -> Result<()> {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", PATH)
            .match_header("x-goog-api-key", "test-key")
            .match_body(Matcher::PartialJson(json!({
                "contents": [
                    {"role": "user", "parts": [{"text": "Hello"}]},
                    {"role": "model", "parts": [{"text": "Hi there"}]},
                    {"role": "user", "parts": [{"text": "Summarize the document"}]}
                ],
                "generation_config": {"top_k": 40, "max_output_tokens": 8192}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"candidates": [{"content": {"parts": [{"text": "Here is a summary..."}]}}]})
                    .to_string(),
            )
            .create_async()
            .await;

        let client = GeminiClient::new(&server.url(), "test-key", "gemini-1.5-flash");
        let reply = client
            .complete(&turns(), &GenerationConfig::default())
            .await?;

        assert_eq!(reply, "Here is a summary...");
        mock.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn it_fails_on_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .with_status(500)
            .with_body(r#"{"error": {"message": "boom"}}"#)
            .create_async()
            .await;

        let client = GeminiClient::new(&server.url(), "test-key", "gemini-1.5-flash");
        let result = client.complete(&turns(), &GenerationConfig::default()).await;

        let err = result.unwrap_err().to_string();
        assert!(err.contains("500"));
    }

    #[tokio::test]
    async fn it_fails_on_malformed_response() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#)
            .create_async()
            .await;

        let client = GeminiClient::new(&server.url(), "test-key", "gemini-1.5-flash");
        let result = client.complete(&turns(), &GenerationConfig::default()).await;

        assert!(result.unwrap_err().to_string().contains("Invalid API response"));
    }

    #[tokio::test]
    async fn it_fails_when_unreachable() {
        let client = GeminiClient::new("http://127.0.0.1:1", "test-key", "gemini-1.5-flash");
        let result = client.complete(&turns(), &GenerationConfig::default()).await;
        assert!(result.is_err());
    }
}
