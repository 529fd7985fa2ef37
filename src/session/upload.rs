//! Accepts a user selected file, validates it and turns it into
//! document text for the conversation.
use std::io;
use std::path::{Path, PathBuf};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use thiserror::Error;

use super::{BusyFlag, Message, Session};
use crate::pdf::{BoxedPdfExtractor, PDF_MIME_TYPE, is_pdf_mime_type};

/// Where the bytes of an upload come from. Reading is a single
/// awaitable that yields the whole file or an I/O error.
#[derive(Clone, Debug)]
pub enum FileSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
    // Plain base64 or a `data:` URL as produced by browsers
    Base64(String),
    // The client could not deliver the file contents
    Missing,
}

impl FileSource {
    pub async fn read(self) -> io::Result<Vec<u8>> {
        match self {
            FileSource::Path(path) => tokio::fs::read(path).await,
            FileSource::Bytes(bytes) => Ok(bytes),
            FileSource::Base64(data) => {
                let encoded = match data.split_once("base64,") {
                    Some((_, rest)) => rest,
                    None => data.as_str(),
                };
                STANDARD
                    .decode(encoded.trim())
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
            }
            FileSource::Missing => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "file contents were not received",
            )),
        }
    }
}

#[derive(Clone, Debug)]
pub struct UploadFile {
    pub name: String,
    pub mime_type: String,
    pub source: FileSource,
}

impl UploadFile {
    pub fn new(name: &str, mime_type: &str, source: FileSource) -> Self {
        Self {
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            source,
        }
    }

    /// A local file with its MIME type guessed from the extension.
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = match path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .as_deref()
        {
            Some("pdf") => PDF_MIME_TYPE,
            Some("txt") => "text/plain",
            _ => "application/octet-stream",
        };
        Self::new(&name, mime_type, FileSource::Path(path.to_path_buf()))
    }
}

/// Why an upload did not produce document text. The display text is
/// what the user sees in the error banner.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("A PDF is already being processed.")]
    Busy,
    #[error("Please upload a PDF file.")]
    InvalidFileType,
    #[error("Error reading the file. Please try again.")]
    ReadFailed,
    #[error("Failed to parse the PDF. The file might be corrupted or password-protected.")]
    ExtractionFailed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadOutcome {
    pub file_name: String,
    pub characters: usize,
}

#[derive(Clone)]
pub struct UploadController {
    session: Session,
    extractor: BoxedPdfExtractor,
}

impl UploadController {
    pub fn new(session: Session, extractor: BoxedPdfExtractor) -> Self {
        Self { session, extractor }
    }

    /// Validate, read and extract `file`. Only one upload per session
    /// may be in flight; a second one is rejected with
    /// `UploadError::Busy` and leaves the state untouched.
    pub async fn submit_upload(&self, file: UploadFile) -> Result<UploadOutcome, UploadError> {
        let UploadFile {
            name,
            mime_type,
            source,
        } = file;

        self.session.update(|s| {
            if s.upload.processing {
                return Err(UploadError::Busy);
            }
            if !is_pdf_mime_type(&mime_type) {
                s.upload.error = Some(UploadError::InvalidFileType.to_string());
                return Err(UploadError::InvalidFileType);
            }
            s.upload.processing = true;
            s.upload.error = None;
            Ok(())
        })?;

        // From here on `processing` must be cleared on every exit path
        let _processing = self.session.release_on_drop(BusyFlag::Processing);
        tracing::info!("Processing upload {} for session {}", name, self.session.id());

        let bytes = match source.read().await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!("Error reading file {}: {}", name, e);
                return Err(self.record_failure(UploadError::ReadFailed));
            }
        };

        match self.extractor.extract(bytes).await {
            Ok(text) => {
                let characters = text.chars().count();
                self.session.update(|s| {
                    s.upload.extracted_text = Some(text);
                    s.conversation.push(Message::upload_processed(&name));
                    s.upload.processing = false;
                });
                tracing::info!("Extracted {} characters from {}", characters, name);
                Ok(UploadOutcome {
                    file_name: name,
                    characters,
                })
            }
            Err(e) => {
                tracing::error!("Error parsing PDF {}: {:#}", name, e);
                Err(self.record_failure(UploadError::ExtractionFailed))
            }
        }
    }

    /// Show `err` in the banner and end processing. Also used when the
    /// upload task died without reaching either outcome. Previously
    /// extracted text is left in place.
    pub fn record_failure(&self, err: UploadError) -> UploadError {
        self.session.update(|s| {
            s.upload.error = Some(err.to_string());
            s.upload.processing = false;
        });
        err
    }
}
