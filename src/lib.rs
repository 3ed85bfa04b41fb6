//! # edgequake-mom-extract
//!
//! Extract the tables of a Meeting Minutes (MOM) PDF as structured JSON.
//!
//! A MOM document carries five tabular sections: the meeting header,
//! attendees, apologies, topics covered and required signatures. This crate
//! pulls the embedded text out of the PDF with pdfium, asks an LLM to
//! transcribe those sections into a fixed JSON shape, and validates what
//! comes back. It ships both as a library and as an HTTP service.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload (multipart pdf_file)
//!  │
//!  ├─ 1. Stage    validate *.pdf, write to a self-deleting temp file
//!  ├─ 2. Extract  per-page text via pdfium (spawn_blocking)
//!  ├─ 3. Prompt   fixed system + user prompt around the text
//!  ├─ 4. LLM      one chat completion, temperature 0, bounded by a timeout
//!  ├─ 5. Clean    strip ```json fences
//!  └─ 6. Decode   parse JSON and check the section shape
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_mom_extract::{ExtractionConfig, MomExtractor, UploadedDocument};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider resolved from EDGEQUAKE_LLM_PROVIDER / AZURE_OPENAI_API_KEY / ...
//!     let extractor = MomExtractor::from_config(ExtractionConfig::default())?;
//!     let bytes = std::fs::read("minutes.pdf")?;
//!     let result = extractor
//!         .extract_all_tables(UploadedDocument::new("minutes.pdf", bytes))
//!         .await?;
//!     println!("{}", serde_json::to_string_pretty(&result)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `mom-extract-server` binary (clap + anyhow + dotenvy + tracing-subscriber) |
//!
//! Disable `cli` when embedding the router in another service:
//! ```toml
//! edgequake-mom-extract = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extractor;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder, ServerConfig, ServerConfigBuilder};
pub use error::MomExtractError;
pub use extractor::MomExtractor;
pub use output::{AllTablesResponse, ExtractionResult, Row, TopicsCoveredResponse};
pub use pipeline::extract::{PdfiumTextExtractor, TextExtractor};
pub use pipeline::llm::{Completion, CompletionBackend, ProviderBackend};
pub use pipeline::upload::UploadedDocument;
pub use prompts::{Prompt, PromptVariant};
pub use server::build_router;
