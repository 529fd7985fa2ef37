//! PDF text extraction, either in process or through a remote
//! `/api/parse-pdf` endpoint.
pub mod extract;

pub use extract::{
    BoxedPdfExtractor, LopdfExtractor, PdfExtractor, RemoteExtractor, extract_text,
};

pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Whether a declared MIME type is the PDF media type.
pub fn is_pdf_mime_type(mime_type: &str) -> bool {
    mime_type.trim().eq_ignore_ascii_case(PDF_MIME_TYPE)
}

/// Pick the extractor for the configured deployment.
pub fn extractor_for(extractor_url: Option<&str>) -> BoxedPdfExtractor {
    match extractor_url {
        Some(url) => std::sync::Arc::new(RemoteExtractor::new(url)),
        None => std::sync::Arc::new(LopdfExtractor),
    }
}
