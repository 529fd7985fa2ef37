//! Router for the PDF extraction API. Always parses in process; this
//! is the endpoint a remote extractor points at.

use axum::{
    Json, Router,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};

use super::public::{ParsePdfError, ParsePdfRequest, ParsePdfResponse};
use crate::api::state::SharedState;
use crate::pdf::{LopdfExtractor, PdfExtractor};

async fn parse_pdf(payload: Result<Json<ParsePdfRequest>, JsonRejection>) -> Response {
    let pdf_buffer = match payload {
        Ok(Json(request)) => request.pdf_buffer,
        Err(rejection) => {
            tracing::debug!("Rejected parse-pdf body: {}", rejection);
            None
        }
    };
    let Some(pdf_buffer) = pdf_buffer else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ParsePdfError::new("No PDF buffer provided", None)),
        )
            .into_response();
    };

    match LopdfExtractor.extract(pdf_buffer).await {
        Ok(text) => Json(ParsePdfResponse { text }).into_response(),
        Err(e) => {
            tracing::error!("Error parsing PDF: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ParsePdfError::new(
                    "Failed to parse PDF",
                    Some(format!("{:#}", e)),
                )),
            )
                .into_response()
        }
    }
}

async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ParsePdfError::new("Method Not Allowed", None)),
    )
        .into_response()
}

/// Create the PDF router
pub fn router() -> Router<SharedState> {
    Router::new().route("/", post(parse_pdf).fallback(method_not_allowed))
}
