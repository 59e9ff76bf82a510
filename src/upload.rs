//! Uploaded-document validation.
//!
//! [`UploadedDocument`] is the request-scoped view of the multipart `file`
//! field: raw bytes plus whatever the client declared about them. It is never
//! written to disk or any store; it lives for the duration of one request and
//! is dropped once the extraction call completes.
//!
//! Validation is layered. The declared media type and filename are checked
//! first (cheap, catches honest mistakes), then the magic bytes (catches a
//! `.txt` renamed to `.pdf`), then the size bounds. The transport-level body
//! limit in the router rejects grossly oversized requests before the bytes
//! are ever buffered here.

use crate::error::ExtractError;
use axum::body::Bytes;

/// PDF files start with `%PDF-` followed by the version.
const PDF_MAGIC: &[u8] = b"%PDF-";

/// One uploaded file, as received from the multipart form.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    /// Raw file bytes.
    pub bytes: Bytes,
    /// Declared `Content-Type` of the part, when the client sent one.
    pub content_type: Option<String>,
    /// Original filename, when the client sent one.
    pub filename: Option<String>,
}

impl UploadedDocument {
    /// Validate that this upload is a usable PDF.
    ///
    /// Checks, in order: declared media type, non-emptiness, magic bytes,
    /// size cap. Returns the first violation.
    pub fn validate(&self, max_bytes: usize) -> Result<(), ExtractError> {
        if let Some(ct) = self.content_type.as_deref() {
            if !declared_type_is_pdf(ct, self.filename.as_deref()) {
                return Err(ExtractError::UnsupportedMediaType {
                    detail: format!("declared content type '{ct}'"),
                });
            }
        } else if let Some(name) = self.filename.as_deref() {
            if !has_pdf_extension(name) {
                return Err(ExtractError::UnsupportedMediaType {
                    detail: format!("filename '{name}' has no .pdf extension"),
                });
            }
        }

        if self.bytes.is_empty() {
            return Err(ExtractError::InvalidInput {
                detail: "uploaded file is empty".into(),
            });
        }

        if !self.bytes.starts_with(PDF_MAGIC) {
            return Err(ExtractError::UnsupportedMediaType {
                detail: "file content is not a PDF (missing %PDF- header)".into(),
            });
        }

        if self.bytes.len() > max_bytes {
            return Err(ExtractError::InvalidInput {
                detail: format!(
                    "file size {} bytes exceeds limit of {max_bytes} bytes",
                    self.bytes.len()
                ),
            });
        }

        Ok(())
    }
}

/// Accept `application/pdf` outright; accept a generic octet stream only when
/// the filename still says `.pdf`.
fn declared_type_is_pdf(content_type: &str, filename: Option<&str>) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "application/pdf" => true,
        "application/octet-stream" => filename.map(has_pdf_extension).unwrap_or(false),
        _ => false,
    }
}

fn has_pdf_extension(filename: &str) -> bool {
    filename.to_ascii_lowercase().ends_with(".pdf")
}
