//! Invoice data model: the structured result of one extraction.
//!
//! [`NfseData`] is the wire contract of the `/extract` endpoint. Five fields
//! are required and deserialisation fails loudly when the upstream model
//! omits any of them — missing data must surface as an upstream error, never
//! be coerced into a default and returned as a partial success. Everything
//! else the model can read off an NFS-e (taker details, tax withholdings,
//! service codes) is optional and serialised only when present.
//!
//! Field names follow the Brazilian document they describe; the upstream
//! schema in [`crate::prompts`] uses the same names, so the model's output
//! deserialises directly into this struct.

use crate::error::ExtractError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One service line item on an NFS-e.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NfseItem {
    /// Full description of the billed service.
    pub descricao: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantidade: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valor_unitario: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valor_total: Option<f64>,
}

/// Structured data extracted from one NFS-e PDF.
///
/// The first five fields are the fixed response contract; deserialisation
/// errors on their absence. `itens_servico` may be empty but must be present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NfseData {
    // ── Contract fields (required) ────────────────────────────────────────
    /// Invoice number.
    pub numero_nota: String,
    /// Issue date, ISO `YYYY-MM-DD`.
    pub data_emissao: String,
    /// Service provider tax id (CNPJ), as printed on the document.
    pub prestador_cnpj: String,
    /// Total invoice value.
    pub valor_total: f64,
    /// Service line items. Empty when the document lists none.
    pub itens_servico: Vec<NfseItem>,

    // ── Header ────────────────────────────────────────────────────────────
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codigo_verificacao: Option<String>,

    // ── Provider ──────────────────────────────────────────────────────────
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prestador_razao_social: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prestador_inscricao_municipal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prestador_endereco: Option<String>,

    // ── Taker ─────────────────────────────────────────────────────────────
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tomador_cnpj: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tomador_razao_social: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tomador_inscricao_municipal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tomador_endereco: Option<String>,

    // ── Values and municipal tax ──────────────────────────────────────────
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valor_servicos: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valor_iss: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aliquota_iss: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_calculo: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss_retido: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valor_liquido: Option<f64>,

    // ── Federal withholdings ──────────────────────────────────────────────
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valor_pis: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valor_cofins: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valor_ir: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valor_csll: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valor_inss: Option<f64>,

    // ── Service detail ────────────────────────────────────────────────────
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminacao_servicos: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codigo_servico: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cnae: Option<String>,

    // ── Other ─────────────────────────────────────────────────────────────
    #[serde(skip_serializing_if = "Option::is_none")]
    pub municipio_prestacao: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outras_informacoes: Option<String>,
}

impl NfseData {
    /// Semantic checks that serde's structural pass cannot express.
    ///
    /// Invariants:
    /// * `data_emissao` is a real calendar date in ISO `YYYY-MM-DD` form;
    /// * every monetary amount, top-level and per item, is a finite number.
    ///
    /// Violations mean the upstream model produced unusable content, so the
    /// error kind is [`ExtractError::MalformedUpstreamResponse`].
    pub fn validate(&self) -> Result<(), ExtractError> {
        NaiveDate::parse_from_str(&self.data_emissao, "%Y-%m-%d").map_err(|_| {
            ExtractError::MalformedUpstreamResponse {
                detail: format!(
                    "data_emissao '{}' is not a valid YYYY-MM-DD date",
                    self.data_emissao
                ),
            }
        })?;

        let mut amounts: Vec<(&str, Option<f64>)> = vec![
            ("valor_total", Some(self.valor_total)),
            ("valor_servicos", self.valor_servicos),
            ("valor_iss", self.valor_iss),
            ("aliquota_iss", self.aliquota_iss),
            ("base_calculo", self.base_calculo),
            ("valor_liquido", self.valor_liquido),
            ("valor_pis", self.valor_pis),
            ("valor_cofins", self.valor_cofins),
            ("valor_ir", self.valor_ir),
            ("valor_csll", self.valor_csll),
            ("valor_inss", self.valor_inss),
        ];
        for item in &self.itens_servico {
            amounts.push(("itens_servico.quantidade", item.quantidade));
            amounts.push(("itens_servico.valor_unitario", item.valor_unitario));
            amounts.push(("itens_servico.valor_total", item.valor_total));
        }
        for (name, value) in amounts {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(ExtractError::MalformedUpstreamResponse {
                        detail: format!("{name} is not a finite number"),
                    });
                }
            }
        }

        Ok(())
    }
}
