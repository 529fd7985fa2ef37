use std::env;

use serde::Serialize;

pub const DEFAULT_COMPLETION_API_HOST: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_COMPLETION_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 64 * 1024 * 1024;

/// Sampling parameters sent with every completion request. These are
/// fixed for the application and not adjustable per message.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 8192,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub completion_api_hostname: String,
    pub completion_api_key: String,
    pub completion_model: String,
    // When set, PDFs are sent to a remote `/api/parse-pdf` endpoint
    // instead of being parsed in process
    pub extractor_url: Option<String>,
    // Uploads travel as JSON so this bounds the PDF size
    pub max_request_bytes: usize,
    pub generation: GenerationConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let completion_api_hostname = env::var("PDFCHAT_COMPLETION_API_HOST")
            .unwrap_or_else(|_| DEFAULT_COMPLETION_API_HOST.to_string());
        let completion_api_key =
            env::var("GEMINI_API_KEY").unwrap_or_else(|_| "thiswontworkforgemini".to_string());
        let completion_model = env::var("PDFCHAT_COMPLETION_MODEL")
            .unwrap_or_else(|_| DEFAULT_COMPLETION_MODEL.to_string());
        let extractor_url = env::var("PDFCHAT_EXTRACTOR_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        let max_request_bytes = env::var("PDFCHAT_MAX_REQUEST_BYTES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_REQUEST_BYTES);

        Self {
            completion_api_hostname,
            completion_api_key,
            completion_model,
            extractor_url,
            max_request_bytes,
            generation: GenerationConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    /// # Safety
    /// Every test touching these variables is `#[serial]`.
    unsafe fn clear_env() {
        unsafe {
            env::remove_var("PDFCHAT_COMPLETION_API_HOST");
            env::remove_var("GEMINI_API_KEY");
            env::remove_var("PDFCHAT_COMPLETION_MODEL");
            env::remove_var("PDFCHAT_EXTRACTOR_URL");
            env::remove_var("PDFCHAT_MAX_REQUEST_BYTES");
        }
    }

    #[test]
    #[serial]
    fn it_uses_defaults_without_env() {
        unsafe { clear_env() };

        let config = AppConfig::default();
        assert_eq!(config.completion_api_hostname, DEFAULT_COMPLETION_API_HOST);
        assert_eq!(config.completion_model, DEFAULT_COMPLETION_MODEL);
        assert_eq!(config.completion_api_key, "thiswontworkforgemini");
        assert!(config.extractor_url.is_none());
        assert_eq!(config.max_request_bytes, DEFAULT_MAX_REQUEST_BYTES);
        assert_eq!(config.generation, GenerationConfig::default());
    }

    #[test]
    #[serial]
    fn it_reads_overrides_from_env() {
        unsafe {
            clear_env();
            env::set_var("PDFCHAT_COMPLETION_API_HOST", "http://localhost:9999");
            env::set_var("GEMINI_API_KEY", "secret");
            env::set_var("PDFCHAT_COMPLETION_MODEL", "gemini-2.0-flash");
            env::set_var("PDFCHAT_EXTRACTOR_URL", "http://localhost:3000");
            env::set_var("PDFCHAT_MAX_REQUEST_BYTES", "1024");
        }

        let config = AppConfig::default();
        assert_eq!(config.completion_api_hostname, "http://localhost:9999");
        assert_eq!(config.completion_api_key, "secret");
        assert_eq!(config.completion_model, "gemini-2.0-flash");
        assert_eq!(config.extractor_url.as_deref(), Some("http://localhost:3000"));
        assert_eq!(config.max_request_bytes, 1024);

        unsafe { clear_env() };
    }

    #[test]
    #[serial]
    fn it_ignores_blank_extractor_url() {
        unsafe {
            clear_env();
            env::set_var("PDFCHAT_EXTRACTOR_URL", "  ");
        }

        assert!(AppConfig::default().extractor_url.is_none());

        unsafe { clear_env() };
    }

    #[test]
    fn it_serializes_generation_config_in_snake_case() {
        let json = serde_json::to_value(GenerationConfig::default()).unwrap();
        assert_eq!(json["top_k"], 40);
        assert_eq!(json["max_output_tokens"], 8192);
        assert!((json["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        assert!((json["top_p"].as_f64().unwrap() - 0.95).abs() < 1e-6);
    }
}
