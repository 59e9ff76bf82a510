//! Shared application state.
//!
//! Constructed once at startup and handed to every request by reference.
//! Both members are read-only after construction — there is no cache, queue,
//! or counter shared between requests, so no locking discipline is needed.

use crate::config::AppConfig;
use crate::error::ExtractError;
use crate::extractor::{InvoiceExtractor, OpenAiExtractor};
use std::sync::Arc;

/// State shared by all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Startup configuration (credential, model, bounds).
    pub config: AppConfig,
    /// Extraction backend. Trait object so tests can swap in a stub.
    pub extractor: Arc<dyn InvoiceExtractor>,
}

impl AppState {
    /// Build the production state: config plus an [`OpenAiExtractor`].
    pub fn new(config: AppConfig) -> Result<Self, ExtractError> {
        let extractor = Arc::new(OpenAiExtractor::new(config.clone())?);
        Ok(Self { config, extractor })
    }

    /// Build state around a caller-supplied extractor.
    pub fn with_extractor(config: AppConfig, extractor: Arc<dyn InvoiceExtractor>) -> Self {
        Self { config, extractor }
    }
}
