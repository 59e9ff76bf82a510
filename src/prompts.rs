//! Prompts and response schema for the NFS-e extraction call.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — the instruction text and the JSON schema
//!    enforced on the model's output are defined in one place, next to each
//!    other, so they cannot drift apart silently.
//!
//! 2. **Testability** — unit tests can inspect the schema and the assembled
//!    system prompt without making an API call.
//!
//! The schema follows the upstream strict-mode rules: every object carries
//! `additionalProperties: false` and lists **all** of its properties as
//! required; optionality is expressed through nullable union types. The
//! required-and-non-nullable subset matches the required fields of
//! [`crate::invoice::NfseData`] exactly.

use serde_json::{json, Value};

/// Name reported to the API for the enforced schema.
pub const SCHEMA_NAME: &str = "nfse_extraction";

/// Filename attached to the PDF content part. The model only sees this as a
/// label; the actual document travels as a base64 data-URI.
pub const UPLOAD_FILENAME: &str = "nfse.pdf";

/// User-turn instruction. The document itself rides along in the same
/// message as a file content part.
pub const USER_PROMPT: &str = "Extraia os dados desta NFS-e conforme o schema fornecido.";

/// JSON schema the upstream API enforces on the extraction output.
///
/// `data_emissao` is constrained to ISO `YYYY-MM-DD` both here (description)
/// and in the system prompt; [`crate::invoice::NfseData::validate`] rejects
/// anything else that slips through.
pub fn response_schema() -> Value {
    // Strict mode expresses optionality as a nullable type, not by omission.
    fn nullable(ty: &str) -> Value {
        json!({ "type": [ty, "null"] })
    }
    let nullable_string = || nullable("string");
    let nullable_number = || nullable("number");

    json!({
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "numero_nota": { "type": "string", "description": "Número da Nota Fiscal" },
            "data_emissao": { "type": "string", "description": "Data de emissão no formato YYYY-MM-DD" },
            "prestador_cnpj": { "type": "string", "description": "CNPJ do prestador, como impresso no documento" },
            "valor_total": { "type": "number", "description": "Valor total da nota" },
            "itens_servico": {
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {
                        "descricao": { "type": "string" },
                        "quantidade": nullable_number(),
                        "valor_unitario": nullable_number(),
                        "valor_total": nullable_number()
                    },
                    "required": ["descricao", "quantidade", "valor_unitario", "valor_total"]
                }
            },
            "codigo_verificacao": nullable_string(),
            "prestador_razao_social": nullable_string(),
            "prestador_inscricao_municipal": nullable_string(),
            "prestador_endereco": nullable_string(),
            "tomador_cnpj": nullable_string(),
            "tomador_razao_social": nullable_string(),
            "tomador_inscricao_municipal": nullable_string(),
            "tomador_endereco": nullable_string(),
            "valor_servicos": nullable_number(),
            "valor_iss": nullable_number(),
            "aliquota_iss": nullable_number(),
            "base_calculo": nullable_number(),
            "iss_retido": { "type": ["boolean", "null"] },
            "valor_liquido": nullable_number(),
            "valor_pis": nullable_number(),
            "valor_cofins": nullable_number(),
            "valor_ir": nullable_number(),
            "valor_csll": nullable_number(),
            "valor_inss": nullable_number(),
            "discriminacao_servicos": nullable_string(),
            "codigo_servico": nullable_string(),
            "cnae": nullable_string(),
            "municipio_prestacao": nullable_string(),
            "outras_informacoes": nullable_string()
        },
        "required": [
            "numero_nota", "data_emissao", "prestador_cnpj", "valor_total", "itens_servico",
            "codigo_verificacao", "prestador_razao_social", "prestador_inscricao_municipal",
            "prestador_endereco", "tomador_cnpj", "tomador_razao_social",
            "tomador_inscricao_municipal", "tomador_endereco", "valor_servicos", "valor_iss",
            "aliquota_iss", "base_calculo", "iss_retido", "valor_liquido", "valor_pis",
            "valor_cofins", "valor_ir", "valor_csll", "valor_inss", "discriminacao_servicos",
            "codigo_servico", "cnae", "municipio_prestacao", "outras_informacoes"
        ]
    })
}

/// Build the system prompt, embedding the enforced schema verbatim.
pub fn system_prompt() -> String {
    let schema = serde_json::to_string_pretty(&response_schema())
        .unwrap_or_else(|_| "{}".to_string());
    format!(
        r#"Você é um assistente especializado em extração de dados de Notas Fiscais de Serviço Eletrônicas (NFS-e) brasileiras.
Sua tarefa é analisar o documento PDF fornecido e extrair TODOS os dados estruturados possíveis.

Você DEVE seguir rigorosamente este schema JSON para a saída:
{schema}

Instruções Adicionais:
1. Identifique os dados do Prestador e Tomador (CNPJ, Razão Social, Endereço).
2. Extraia valores monetários como números decimais.
3. Se um campo opcional não for encontrado, use null.
4. Para datas, utilize SEMPRE o formato YYYY-MM-DD.
5. A discriminação dos serviços deve ser o texto completo descrevendo o serviço.
6. Liste todos os itens de serviço visíveis; use uma lista vazia quando a nota não discriminar itens."#
    )
}
