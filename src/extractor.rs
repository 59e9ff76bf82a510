//! Upstream client: one PDF in, one validated invoice out.
//!
//! The handler talks to [`InvoiceExtractor`], a one-method trait, rather than
//! to a concrete HTTP client, so tests can substitute a canned implementation
//! and exercise the endpoint without network access.
//!
//! [`OpenAiExtractor`] is the production implementation. It sends the PDF as
//! a base64 data-URI file part in a single chat-completions call with a
//! strict JSON-schema `response_format` — the API reads the document natively,
//! no rasterisation step. One attempt per request: a failed call surfaces as
//! an error to the caller instead of being retried.

use crate::config::AppConfig;
use crate::error::ExtractError;
use crate::invoice::NfseData;
use crate::prompts;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Published price per 1M input tokens for the default model, USD.
const COST_PER_1M_INPUT: f64 = 0.05;
/// Published price per 1M output tokens for the default model, USD.
const COST_PER_1M_OUTPUT: f64 = 0.40;

/// The single seam between the HTTP handler and the extraction backend.
#[async_trait]
pub trait InvoiceExtractor: Send + Sync {
    /// Extract structured invoice data from raw PDF bytes.
    async fn extract(&self, pdf: &[u8]) -> Result<NfseData, ExtractError>;
}

/// Production extractor backed by an OpenAI-compatible chat-completions API.
pub struct OpenAiExtractor {
    client: reqwest::Client,
    config: AppConfig,
}

impl OpenAiExtractor {
    /// Build an extractor from the given configuration.
    ///
    /// The `reqwest::Client` is constructed once and reused; the per-call
    /// timeout is applied per request so the config value can be honoured
    /// exactly.
    pub fn new(config: AppConfig) -> Result<Self, ExtractError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ExtractError::InvalidConfig(format!("HTTP client: {e}")))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl InvoiceExtractor for OpenAiExtractor {
    async fn extract(&self, pdf: &[u8]) -> Result<NfseData, ExtractError> {
        let start = Instant::now();
        let pdf_base64 = BASE64.encode(pdf);
        let body = build_request_body(&pdf_base64, &self.config.model);

        info!(
            model = %self.config.model,
            pdf_kb = pdf.len() / 1024,
            "Sending PDF to extraction API"
        );

        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .timeout(Duration::from_secs(self.config.api_timeout_secs))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExtractError::UpstreamTimeout {
                        secs: self.config.api_timeout_secs,
                    }
                } else {
                    ExtractError::UpstreamFailure {
                        detail: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(%status, "Extraction API returned an error status");
            return Err(ExtractError::UpstreamFailure {
                detail: format!("HTTP {status}: {}", truncate(&text, 300)),
            });
        }

        let completion: CompletionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ExtractError::UpstreamTimeout {
                    secs: self.config.api_timeout_secs,
                }
            } else {
                ExtractError::MalformedUpstreamResponse {
                    detail: format!("completion envelope: {e}"),
                }
            }
        })?;

        if let Some(usage) = &completion.usage {
            info!(
                input_tokens = usage.prompt_tokens,
                output_tokens = usage.completion_tokens,
                est_cost_usd = %format!(
                    "{:.6}",
                    estimate_cost_usd(usage.prompt_tokens, usage.completion_tokens)
                ),
                "Extraction API responded in {:?}",
                start.elapsed()
            );
        } else {
            info!("Extraction API responded in {:?}", start.elapsed());
        }

        let content = completion
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .ok_or_else(|| ExtractError::MalformedUpstreamResponse {
                detail: "completion carried no message content".into(),
            })?;
        debug!(raw = %truncate(content, 500), "Raw extraction content");

        let data = parse_content(content)?;
        data.validate()?;
        Ok(data)
    }
}

/// Assemble the chat-completions request body.
///
/// Layout: one system message carrying the task description and embedded
/// schema, one user message with the instruction text plus the PDF as a
/// `file` content part, and a strict `json_schema` response format so the
/// API refuses to answer outside the schema.
pub fn build_request_body(pdf_base64: &str, model: &str) -> Value {
    json!({
        "model": model,
        "messages": [
            { "role": "system", "content": prompts::system_prompt() },
            {
                "role": "user",
                "content": [
                    { "type": "text", "text": prompts::USER_PROMPT },
                    {
                        "type": "file",
                        "file": {
                            "filename": prompts::UPLOAD_FILENAME,
                            "file_data": format!("data:application/pdf;base64,{pdf_base64}")
                        }
                    }
                ]
            }
        ],
        "response_format": {
            "type": "json_schema",
            "json_schema": {
                "name": prompts::SCHEMA_NAME,
                "schema": prompts::response_schema(),
                "strict": true
            }
        }
    })
}

/// Parse the model's message content into a validated-shape invoice.
///
/// Strict mode should yield bare JSON, but models occasionally wrap output in
/// markdown code fences anyway; those are stripped before parsing.
pub fn parse_content(content: &str) -> Result<NfseData, ExtractError> {
    let cleaned = strip_code_fences(content);
    serde_json::from_str(cleaned).map_err(|e| ExtractError::MalformedUpstreamResponse {
        detail: e.to_string(),
    })
}

/// Remove a surrounding ```json … ``` (or plain ```) fence, if present.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

/// Estimated call cost in USD from the token counts the API reports.
pub fn estimate_cost_usd(input_tokens: u64, output_tokens: u64) -> f64 {
    (input_tokens as f64 / 1_000_000.0) * COST_PER_1M_INPUT
        + (output_tokens as f64 / 1_000_000.0) * COST_PER_1M_OUTPUT
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// ── Completion envelope ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_CONTENT: &str = r#"{
        "numero_nota": "1234",
        "data_emissao": "2023-10-27",
        "prestador_cnpj": "00.000.000/0001-00",
        "valor_total": 1500.00,
        "itens_servico": []
    }"#;

    #[test]
    fn request_body_carries_pdf_and_schema() {
        let body = build_request_body("QkFTRTY0", "gpt-5-nano-2025-08-07");
        assert_eq!(body["model"], "gpt-5-nano-2025-08-07");
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["strict"], true);

        let file_data = body["messages"][1]["content"][1]["file"]["file_data"]
            .as_str()
            .unwrap();
        assert!(file_data.starts_with("data:application/pdf;base64,QkFTRTY0"));
    }

    #[test]
    fn parse_plain_json() {
        let data = parse_content(VALID_CONTENT).unwrap();
        assert_eq!(data.numero_nota, "1234");
        assert_eq!(data.valor_total, 1500.0);
    }

    #[test]
    fn parse_fenced_json() {
        let fenced = format!("```json\n{VALID_CONTENT}\n```");
        let data = parse_content(&fenced).unwrap();
        assert_eq!(data.numero_nota, "1234");

        let bare_fence = format!("```\n{VALID_CONTENT}\n```");
        assert!(parse_content(&bare_fence).is_ok());
    }

    #[test]
    fn parse_rejects_missing_required_field() {
        let content = r#"{"numero_nota": "1", "data_emissao": "2023-10-27"}"#;
        let err = parse_content(content).unwrap_err();
        assert!(matches!(err, ExtractError::MalformedUpstreamResponse { .. }));
    }

    #[test]
    fn parse_rejects_non_json() {
        let err = parse_content("Desculpe, não consegui ler o documento.").unwrap_err();
        assert!(matches!(err, ExtractError::MalformedUpstreamResponse { .. }));
    }

    #[test]
    fn cost_estimate_matches_price_table() {
        // 1M input + 1M output = $0.05 + $0.40
        let cost = estimate_cost_usd(1_000_000, 1_000_000);
        assert!((cost - 0.45).abs() < 1e-9);
        assert_eq!(estimate_cost_usd(0, 0), 0.0);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("Emissão", 6), "Emissã");
        assert_eq!(truncate("abc", 10), "abc");
    }
}
