//! # nfse-extract
//!
//! Extract structured data from Brazilian electronic service invoices
//! (NFS-e) using Vision Language Models (VLMs).
//!
//! ## Why this crate?
//!
//! NFS-e layouts vary by municipality and issuer — template-based parsers
//! and positional OCR break on every new city hall. Instead this crate hands
//! the PDF, untouched, to a vision-capable model with a strict JSON schema
//! and lets it read the document as a human would. There is no extraction
//! algorithm here: the code is a thin HTTP adapter around one model call.
//!
//! ## Request Flow
//!
//! ```text
//! PDF upload
//!  │
//!  ├─ 1. Receive   multipart form, field `file`
//!  ├─ 2. Validate  media type, %PDF- magic bytes, size bounds
//!  ├─ 3. Forward   base64 data-URI → chat completions, strict JSON schema
//!  ├─ 4. Check     deserialise + semantic validation (dates, amounts)
//!  └─ 5. Respond   complete invoice JSON, or one structured error
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nfse_extract::{create_router, AppConfig, AppState};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Requires OPENAI_API_KEY in the environment.
//!     let config = AppConfig::from_env()?;
//!     let state = AppState::new(config)?;
//!     let app = create_router(state);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `nfse-server` and `nfse-batch` binaries (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when embedding only the library:
//! ```toml
//! nfse-extract = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extractor;
pub mod http;
pub mod invoice;
pub mod prompts;
pub mod state;
pub mod upload;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{AppConfig, AppConfigBuilder};
pub use error::{ErrorBody, ExtractError};
pub use extractor::{InvoiceExtractor, OpenAiExtractor};
pub use http::create_router;
pub use invoice::{NfseData, NfseItem};
pub use state::AppState;
pub use upload::UploadedDocument;
