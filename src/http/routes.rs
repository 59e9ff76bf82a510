//! Router assembly.

use crate::http::{extract, middleware};
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

/// Headroom above the file cap for multipart boundaries and part headers, so
/// a file exactly at the cap still reaches the handler's own size check.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the application router around the given state.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD;

    Router::new()
        .route("/extract", post(extract::extract_invoice))
        .route("/health", get(health))
        .route("/docs", get(docs))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum::middleware::from_fn(middleware::request_context))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `GET /health` — liveness probe.
async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().timestamp(),
    }))
}

/// `GET /docs` — static API description. Interactive documentation is out of
/// scope; this page exists so the route answers something useful.
async fn docs() -> Html<&'static str> {
    Html(DOCS_HTML)
}

const DOCS_HTML: &str = r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
  <meta charset="utf-8">
  <title>API de Extração de NFS-e</title>
  <style>
    body { font-family: sans-serif; max-width: 46rem; margin: 2rem auto; padding: 0 1rem; }
    code, pre { background: #f4f4f4; padding: 0.1rem 0.3rem; border-radius: 3px; }
    pre { padding: 0.8rem; overflow-x: auto; }
    table { border-collapse: collapse; }
    td, th { border: 1px solid #ccc; padding: 0.3rem 0.6rem; text-align: left; }
  </style>
</head>
<body>
  <h1>API de Extração de NFS-e</h1>
  <p>Envie o PDF de uma Nota Fiscal de Serviço Eletrônica e receba os dados
  estruturados extraídos por um modelo de visão.</p>

  <h2>POST /extract</h2>
  <p>Corpo: <code>multipart/form-data</code> com o campo <code>file</code>
  contendo o PDF.</p>
  <pre>curl -F "file=@nota.pdf" http://localhost:8000/extract</pre>
  <p>Resposta 200:</p>
  <pre>{
  "numero_nota": "1234",
  "data_emissao": "2023-10-27",
  "prestador_cnpj": "00.000.000/0001-00",
  "valor_total": 1500.00,
  "itens_servico": []
}</pre>
  <p>Erros retornam <code>{"error": "mensagem"}</code>:</p>
  <table>
    <tr><th>Status</th><th>Causa</th></tr>
    <tr><td>400</td><td>campo <code>file</code> ausente, arquivo vazio ou não-PDF</td></tr>
    <tr><td>502</td><td>falha da API de extração ou resposta fora do schema</td></tr>
    <tr><td>504</td><td>tempo limite da API de extração excedido</td></tr>
  </table>

  <h2>GET /health</h2>
  <p>Retorna <code>{"status":"ok","timestamp":&lt;unix&gt;}</code>.</p>
</body>
</html>
"#;
