//! HTTP server binary for edgequake-mom-extract.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig` / `ServerConfig` and serves the router.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_mom_extract::pipeline::extract::extract_text;
use edgequake_mom_extract::{
    build_router, ExtractionConfig, MomExtractor, PdfiumTextExtractor, ServerConfig,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve on the default address (0.0.0.0:8000)
  mom-extract-server --api-key "$AI_API_KEY"

  # Use a specific Azure deployment
  mom-extract-server --provider azure --model DataTeam-OAI

  # Print the text pdfium sees in a document (no LLM, no API key)
  mom-extract-server --inspect minutes.pdf

  # Call the service
  curl -H "X-API-Key: $AI_API_KEY" -F pdf_file=@minutes.pdf \
       http://localhost:8000/extract-all-tables/

ENVIRONMENT VARIABLES:
  AI_API_KEY                Secret expected in the X-API-Key header
  MOM_EXTRACT_BIND          Listen address
  AZURE_OPENAI_API_KEY      Azure OpenAI key (selects the azure provider)
  AZURE_OPENAI_ENDPOINT     Azure OpenAI endpoint
  EDGEQUAKE_LLM_PROVIDER    Override provider (azure, openai, anthropic, ...)
  EDGEQUAKE_MODEL           Override model / deployment name
  PDFIUM_LIB_PATH           Path to libpdfium (file or directory)
  RUST_LOG                  Log filter, overrides --verbose

  Variables are also read from a .env file in the working directory.
"#;

/// Extract Meeting Minutes tables from uploaded PDFs over HTTP.
#[derive(Parser, Debug)]
#[command(
    name = "mom-extract-server",
    version,
    about = "Extract Meeting Minutes (MOM) tables from uploaded PDFs as JSON",
    long_about = "HTTP service that extracts the text of an uploaded Meeting Minutes PDF \
and asks an LLM to transcribe its tables (meeting details, attendees, apologies, topics \
covered, required signatures) into JSON.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Socket address to listen on.
    #[arg(long, env = "MOM_EXTRACT_BIND", default_value = "0.0.0.0:8000")]
    bind: String,

    /// Secret clients must send in the X-API-Key header.
    #[arg(long, env = "AI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// LLM provider: azure, openai, anthropic, gemini, ollama.
    #[arg(
        long,
        env = "EDGEQUAKE_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set;\n\
          AZURE_OPENAI_API_KEY selects azure."
    )]
    provider: Option<String>,

    /// Model or Azure deployment name (default: DataTeam-OAI).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// Max LLM output tokens per request.
    #[arg(long, env = "MOM_EXTRACT_MAX_TOKENS", default_value_t = 16384)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "MOM_EXTRACT_TEMPERATURE", default_value_t = 0.0)]
    temperature: f32,

    /// LLM call timeout in seconds.
    #[arg(long, env = "MOM_EXTRACT_API_TIMEOUT", default_value_t = 300)]
    api_timeout: u64,

    /// Maximum upload size in MiB.
    #[arg(long, env = "MOM_EXTRACT_MAX_UPLOAD_MB", default_value_t = 50)]
    max_upload_mb: usize,

    /// Directory for staged uploads (default: the OS temp dir).
    #[arg(long, env = "MOM_EXTRACT_TEMP_DIR")]
    temp_dir: Option<PathBuf>,

    /// Path to libpdfium, or a directory containing it.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib_path: Option<PathBuf>,

    /// Print the extracted text of this PDF and exit.
    #[arg(long, value_name = "PDF")]
    inspect: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MOM_EXTRACT_VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Before parsing so .env values can satisfy `env = ...` flags.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect mode ─────────────────────────────────────────────────────
    if let Some(ref path) = cli.inspect {
        let extractor = Arc::new(PdfiumTextExtractor::new(cli.pdfium_lib_path.clone()));
        let text = extract_text(extractor, path)
            .await
            .with_context(|| format!("Failed to extract text from {}", path.display()))?;
        println!("{text}");
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let server_config = build_server_config(&cli)?;
    let extraction_config = build_extraction_config(&cli)?;

    // Fail fast on a missing library rather than on the first upload.
    if let Err(e) = PdfiumTextExtractor::new(cli.pdfium_lib_path.clone()).probe() {
        warn!("{e}; uploads will fail until pdfium is available");
    }

    let extractor =
        MomExtractor::from_config(extraction_config).context("Failed to configure LLM provider")?;
    let app = build_router(extractor, &server_config);

    // ── Serve ────────────────────────────────────────────────────────────
    let listener = TcpListener::bind(&server_config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", server_config.bind_addr))?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shut down cleanly");
    Ok(())
}

/// Map CLI args to `ServerConfig`.
fn build_server_config(cli: &Cli) -> Result<ServerConfig> {
    let api_key = cli
        .api_key
        .clone()
        .context("An API key is required: pass --api-key or set AI_API_KEY")?;

    ServerConfig::builder(api_key)
        .bind_addr(cli.bind.clone())
        .max_upload_bytes(cli.max_upload_mb.saturating_mul(1024 * 1024))
        .build()
        .context("Invalid server configuration")
}

/// Map CLI args to `ExtractionConfig`.
fn build_extraction_config(cli: &Cli) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref dir) = cli.temp_dir {
        builder = builder.temp_dir(dir.clone());
    }
    if let Some(ref path) = cli.pdfium_lib_path {
        builder = builder.pdfium_lib_path(path.clone());
    }

    builder.build().context("Invalid extraction configuration")
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received, draining in-flight requests");
}
