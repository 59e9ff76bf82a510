//! Service configuration.
//!
//! Everything the service needs at runtime lives in one [`AppConfig`], built
//! via its [`AppConfigBuilder`] or read from the environment once at startup
//! with [`AppConfig::from_env`]. The struct is read-only after construction
//! and shared across requests through [`crate::state::AppState`]; there are
//! no ambient globals to mutate.
//!
//! The only hard requirement is the upstream API credential. A missing key
//! fails process startup — never an individual request.

use crate::error::ExtractError;
use serde::{Deserialize, Serialize};
use std::env;

/// Environment variable holding the upstream API credential.
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Default chat-completions endpoint base.
pub const DEFAULT_API_BASE_URL: &str = "https://api.openai.com/v1";

/// Default extraction model.
pub const DEFAULT_MODEL: &str = "gpt-5-nano-2025-08-07";

/// Configuration for the extraction service.
///
/// # Example
/// ```rust
/// use nfse_extract::AppConfig;
///
/// let config = AppConfig::builder()
///     .api_key("sk-test")
///     .api_timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "gpt-5-nano-2025-08-07");
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Upstream API credential. Never logged or serialised.
    #[serde(skip)]
    pub api_key: String,

    /// Base URL of the OpenAI-compatible API. Default: [`DEFAULT_API_BASE_URL`].
    ///
    /// Overridable so tests can point the client at a local stub and
    /// deployments can route through a gateway.
    pub api_base_url: String,

    /// Model identifier sent with every extraction call. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Per-call timeout for the upstream API in seconds. Default: 60.
    ///
    /// Vision calls on multi-page PDFs routinely take 10–30 s; 60 s covers
    /// the slow tail while still bounding how long a client can be held.
    pub api_timeout_secs: u64,

    /// Maximum accepted upload size in bytes. Default: 10 MiB.
    ///
    /// Also enforced at the transport layer via axum's body limit, so
    /// oversized bodies are rejected before the handler buffers them.
    pub max_upload_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_timeout_secs: 60,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    // Manual impl so the credential cannot leak through a debug log line.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .field("model", &self.model)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

impl AppConfig {
    /// Create a new builder.
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder {
            config: Self::default(),
        }
    }

    /// Read the configuration from the environment.
    ///
    /// | Variable | Meaning | Default |
    /// |----------|---------|---------|
    /// | `OPENAI_API_KEY` | upstream credential | **required** |
    /// | `NFSE_API_BASE_URL` | OpenAI-compatible base URL | `https://api.openai.com/v1` |
    /// | `NFSE_MODEL` | extraction model | `gpt-5-nano-2025-08-07` |
    /// | `NFSE_API_TIMEOUT_SECS` | upstream call timeout | `60` |
    /// | `NFSE_MAX_UPLOAD_BYTES` | upload size cap | `10485760` |
    ///
    /// # Errors
    /// [`ExtractError::MissingApiKey`] when the credential is absent or empty;
    /// [`ExtractError::InvalidConfig`] when a numeric override does not parse.
    pub fn from_env() -> Result<Self, ExtractError> {
        let api_key = env::var(API_KEY_VAR)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or(ExtractError::MissingApiKey { var: API_KEY_VAR })?;

        let mut builder = Self::builder().api_key(api_key);

        if let Ok(url) = env::var("NFSE_API_BASE_URL") {
            if !url.is_empty() {
                builder = builder.api_base_url(url);
            }
        }
        if let Ok(model) = env::var("NFSE_MODEL") {
            if !model.is_empty() {
                builder = builder.model(model);
            }
        }
        if let Ok(raw) = env::var("NFSE_API_TIMEOUT_SECS") {
            let secs = raw.parse::<u64>().map_err(|_| {
                ExtractError::InvalidConfig(format!(
                    "NFSE_API_TIMEOUT_SECS must be an integer, got '{raw}'"
                ))
            })?;
            builder = builder.api_timeout_secs(secs);
        }
        if let Ok(raw) = env::var("NFSE_MAX_UPLOAD_BYTES") {
            let bytes = raw.parse::<usize>().map_err(|_| {
                ExtractError::InvalidConfig(format!(
                    "NFSE_MAX_UPLOAD_BYTES must be an integer, got '{raw}'"
                ))
            })?;
            builder = builder.max_upload_bytes(bytes);
        }

        builder.build()
    }

    /// Full URL of the chat-completions endpoint.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base_url.trim_end_matches('/'))
    }
}

/// Builder for [`AppConfig`].
#[derive(Debug)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AppConfig, ExtractError> {
        let c = &self.config;
        if c.api_key.is_empty() {
            return Err(ExtractError::MissingApiKey { var: API_KEY_VAR });
        }
        if c.api_timeout_secs == 0 {
            return Err(ExtractError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.max_upload_bytes == 0 {
            return Err(ExtractError::InvalidConfig(
                "Upload size cap must be ≥ 1 byte".into(),
            ));
        }
        if !c.api_base_url.starts_with("http://") && !c.api_base_url.starts_with("https://") {
            return Err(ExtractError::InvalidConfig(format!(
                "API base URL must be http(s), got '{}'",
                c.api_base_url
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let config = AppConfig::builder().api_key("sk-test").build().unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.api_timeout_secs, 60);
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn builder_rejects_missing_key() {
        let err = AppConfig::builder().build().unwrap_err();
        assert!(matches!(err, ExtractError::MissingApiKey { .. }));
    }

    #[test]
    fn builder_rejects_zero_timeout() {
        let err = AppConfig::builder()
            .api_key("sk-test")
            .api_timeout_secs(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, ExtractError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_non_http_base_url() {
        let err = AppConfig::builder()
            .api_key("sk-test")
            .api_base_url("ftp://example.com")
            .build()
            .unwrap_err();
        assert!(matches!(err, ExtractError::InvalidConfig(_)));
    }

    #[test]
    fn completions_url_strips_trailing_slash() {
        let config = AppConfig::builder()
            .api_key("sk-test")
            .api_base_url("http://localhost:9999/v1/")
            .build()
            .unwrap();
        assert_eq!(
            config.completions_url(),
            "http://localhost:9999/v1/chat/completions"
        );
    }

    #[test]
    fn debug_redacts_credential() {
        let config = AppConfig::builder().api_key("sk-secret").build().unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
