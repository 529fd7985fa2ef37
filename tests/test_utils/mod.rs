//! Test utilities for integration tests
#![allow(dead_code)]
use std::sync::{Arc, RwLock};

use axum::{Router, body::Body};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use serde_json::Value;

use pdfchat::api::AppState;
use pdfchat::api::app;
use pdfchat::completion::BoxedCompletionApi;
use pdfchat::core::{AppConfig, GenerationConfig};
use pdfchat::pdf::BoxedPdfExtractor;

pub const TEST_MODEL: &str = "gemini-test";

/// Creates a test application router whose completion requests go to
/// `completion_api_hostname`, usually a `mockito` server.
pub fn test_app(completion_api_hostname: &str) -> Router {
    let app_state = AppState::new(test_config(completion_api_hostname));
    app(Arc::new(RwLock::new(app_state)))
}

/// Creates a test application router with stand-in collaborators.
pub fn test_app_with(extractor: BoxedPdfExtractor, completion: BoxedCompletionApi) -> Router {
    let app_state =
        AppState::with_collaborators(test_config("http://127.0.0.1:1"), extractor, completion);
    app(Arc::new(RwLock::new(app_state)))
}

fn test_config(completion_api_hostname: &str) -> AppConfig {
    AppConfig {
        completion_api_hostname: completion_api_hostname.to_string(),
        completion_api_key: String::from("test-api-key"),
        completion_model: String::from(TEST_MODEL),
        extractor_url: None,
        max_request_bytes: 8 * 1024 * 1024,
        generation: GenerationConfig::default(),
    }
}

/// The path mockito should expect completion requests on.
pub fn completion_path() -> String {
    format!("/v1beta/models/{}:generateContent", TEST_MODEL)
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not utf8")
}

pub async fn body_to_json(body: Body) -> Value {
    serde_json::from_str(&body_to_string(body).await).expect("Body is not json")
}

/// A data URL the way a browser's `FileReader` produces it.
pub fn data_url(bytes: &[u8]) -> String {
    format!("data:application/pdf;base64,{}", STANDARD.encode(bytes))
}

/// Builds a PDF with one line of text per page. Integration tests
/// can't reach the `cfg(test)` builder in `src/pdf/extract.rs`, keep
/// the two in step.
pub fn sample_pdf(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}
