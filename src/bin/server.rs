//! HTTP server binary for nfse-extract.
//!
//! A thin shim over the library crate: load the environment, build the
//! configuration and router, serve until ctrl-c/SIGTERM.

use anyhow::{Context, Result};
use clap::Parser;
use nfse_extract::{create_router, AppConfig, AppState};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve on the default 0.0.0.0:8000
  nfse-server

  # Serve on a specific port
  nfse-server --port 9000

  # Extract an invoice
  curl -F "file=@nota.pdf" http://localhost:8000/extract

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          Upstream API key (required)
  NFSE_API_BASE_URL       OpenAI-compatible base URL (default: https://api.openai.com/v1)
  NFSE_MODEL              Extraction model (default: gpt-5-nano-2025-08-07)
  NFSE_API_TIMEOUT_SECS   Upstream call timeout (default: 60)
  NFSE_MAX_UPLOAD_BYTES   Upload size cap (default: 10485760)
  HOST / PORT             Bind address (default: 0.0.0.0:8000)
  RUST_LOG                Log filter (default: info)

SETUP:
  1. Set API key:   export OPENAI_API_KEY=sk-...
  2. Serve:         nfse-server
"#;

/// Serve the NFS-e extraction API.
#[derive(Parser, Debug)]
#[command(
    name = "nfse-server",
    version,
    about = "HTTP service extracting structured data from NFS-e PDFs via Vision LLMs",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Address to bind.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to bind.
    #[arg(short, long, env = "PORT", default_value_t = 8000)]
    port: u16,
}

/// Resolves when ctrl-c or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("signal received, starting graceful shutdown");
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; a missing file is not an error.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    // A missing credential must stop the process here, not fail requests later.
    let config = AppConfig::from_env().context("configuration")?;
    info!(?config, "Configuration loaded");

    let state = AppState::new(config).context("application state")?;
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", cli.host, cli.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server")?;

    Ok(())
}
