//! Batch client binary for nfse-extract.
//!
//! Feeds a directory of invoice PDFs to a running `nfse-server` with bounded
//! concurrency, writes one `result_<name>.json` beside each input, and prints
//! a final report. The service itself never batches; this client is just a
//! loop around the same single-document endpoint.

use anyhow::{bail, Context, Result};
use clap::Parser;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Process every PDF in a directory against a local server
  nfse-batch ./notas

  # Remote server, lower concurrency
  nfse-batch --server https://extractor.example.com --concurrency 4 ./notas

Each successful extraction is written beside its input as result_<name>.json.
"#;

/// Batch-extract a directory of NFS-e PDFs through a running nfse-server.
#[derive(Parser, Debug)]
#[command(
    name = "nfse-batch",
    version,
    about = "Batch client: POST every PDF in a directory to an nfse-server",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory containing the PDF files.
    input_dir: PathBuf,

    /// Base URL of the running nfse-server.
    #[arg(long, env = "NFSE_SERVER_URL", default_value = "http://localhost:8000")]
    server: String,

    /// Number of documents in flight at once.
    #[arg(short, long, env = "NFSE_BATCH_CONCURRENCY", default_value_t = 10)]
    concurrency: usize,

    /// Per-document request timeout in seconds.
    #[arg(long, env = "NFSE_BATCH_TIMEOUT_SECS", default_value_t = 120)]
    timeout_secs: u64,
}

/// Outcome of one document.
struct FileOutcome {
    name: String,
    error: Option<String>,
    elapsed: Duration,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if !cli.input_dir.is_dir() {
        bail!("input directory not found: {}", cli.input_dir.display());
    }

    let mut pdf_files: Vec<PathBuf> = std::fs::read_dir(&cli.input_dir)
        .with_context(|| format!("reading {}", cli.input_dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .map(|ext| ext.eq_ignore_ascii_case("pdf"))
                .unwrap_or(false)
        })
        .collect();
    pdf_files.sort();

    if pdf_files.is_empty() {
        bail!("no .pdf files found in {}", cli.input_dir.display());
    }

    eprintln!(
        "{} {}",
        bold(&format!("Processing {} PDF files", pdf_files.len())),
        dim(&format!(
            "({} in flight, {}s timeout each)",
            cli.concurrency.max(1),
            cli.timeout_secs
        ))
    );

    let client = reqwest::Client::new();
    let endpoint = format!("{}/extract", cli.server.trim_end_matches('/'));
    let timeout = Duration::from_secs(cli.timeout_secs);

    let bar = ProgressBar::new(pdf_files.len() as u64);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} [{bar:42.green/238}] {pos:>3}/{len} files  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  "),
    );

    let total_start = Instant::now();
    let outcomes: Vec<FileOutcome> = stream::iter(pdf_files.iter().map(|path| {
        let client = client.clone();
        let endpoint = endpoint.clone();
        let bar = bar.clone();
        async move {
            let outcome = process_file(&client, &endpoint, timeout, path).await;
            match &outcome.error {
                None => bar.println(format!(
                    "  {} {:<40} {}",
                    green("✓"),
                    outcome.name,
                    dim(&format!("{:.1}s", outcome.elapsed.as_secs_f64()))
                )),
                Some(err) => bar.println(format!("  {} {:<40} {}", red("✗"), outcome.name, red(err))),
            }
            bar.inc(1);
            outcome
        }
    }))
    .buffer_unordered(cli.concurrency.max(1))
    .collect()
    .await;
    bar.finish_and_clear();

    // ── Final report ─────────────────────────────────────────────────────
    let total = outcomes.len();
    let failures: Vec<&FileOutcome> = outcomes.iter().filter(|o| o.error.is_some()).collect();
    let successes = total - failures.len();
    let total_elapsed = total_start.elapsed();

    eprintln!();
    eprintln!("{}", bold("Batch report"));
    eprintln!("  files:     {total}");
    eprintln!("  succeeded: {}", green(&successes.to_string()));
    eprintln!("  failed:    {}", red(&failures.len().to_string()));
    eprintln!("  total:     {:.2}s", total_elapsed.as_secs_f64());
    eprintln!(
        "  per file:  {:.2}s",
        total_elapsed.as_secs_f64() / total as f64
    );

    if !failures.is_empty() {
        eprintln!();
        eprintln!("{}", bold("Failures:"));
        for o in &failures {
            eprintln!("  - {}: {}", o.name, o.error.as_deref().unwrap_or("?"));
        }
        std::process::exit(1);
    }

    Ok(())
}

/// Upload one PDF and write the extraction result beside it.
async fn process_file(
    client: &reqwest::Client,
    endpoint: &str,
    timeout: Duration,
    path: &Path,
) -> FileOutcome {
    let start = Instant::now();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let error = upload_one(client, endpoint, timeout, path).await.err();
    FileOutcome {
        name,
        error,
        elapsed: start.elapsed(),
    }
}

async fn upload_one(
    client: &reqwest::Client,
    endpoint: &str,
    timeout: Duration,
    path: &Path,
) -> std::result::Result<(), String> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| format!("read failed: {e}"))?;

    // Cheap local pre-check; the server would reject these anyway.
    if !bytes.starts_with(b"%PDF-") {
        return Err("not a PDF (missing %PDF- header)".into());
    }

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.pdf".into());
    let part = reqwest::multipart::Part::bytes(bytes)
        .file_name(filename)
        .mime_str("application/pdf")
        .map_err(|e| format!("multipart: {e}"))?;
    let form = reqwest::multipart::Form::new().part("file", part);

    let response = client
        .post(endpoint)
        .multipart(form)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                format!("timed out after {}s", timeout.as_secs())
            } else {
                format!("request failed: {e}")
            }
        })?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| format!("reading response: {e}"))?;
    if !status.is_success() {
        return Err(format!("HTTP {status}: {body}"));
    }

    // Pretty-print so the result files are diffable and reviewable.
    let parsed: serde_json::Value =
        serde_json::from_str(&body).map_err(|e| format!("response not JSON: {e}"))?;
    let pretty =
        serde_json::to_string_pretty(&parsed).map_err(|e| format!("serialise: {e}"))?;

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "result".into());
    let out_path = path.with_file_name(format!("result_{stem}.json"));
    tokio::fs::write(&out_path, pretty)
        .await
        .map_err(|e| format!("writing {}: {e}", out_path.display()))?;

    Ok(())
}
