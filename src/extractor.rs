//! Request-level entry points: one upload in, one JSON result out.
//!
//! [`MomExtractor`] owns the two shared collaborators (completion backend and
//! text extractor) plus the config. It is cheap to clone and safe to share
//! across concurrent requests: nothing in it is mutated after construction.
//!
//! Every call walks the same stages:
//! `received → text-extracted → prompt-sent → response-cleaned →
//! json-decoded → done`. Any stage may fail; the first failure ends the
//! request and the staged temp file is dropped on the way out.

use crate::config::{ExtractionConfig, DEFAULT_MODEL, DEFAULT_PROVIDER};
use crate::error::MomExtractError;
use crate::output::{ExtractionResult, Row};
use crate::pipeline::extract::{self, PdfiumTextExtractor, TextExtractor};
use crate::pipeline::llm::{self, CompletionBackend, ProviderBackend};
use crate::pipeline::upload::{self, UploadedDocument};
use crate::pipeline::{postprocess, Stage};
use crate::prompts::{build_prompt, PromptVariant};
use edgequake_llm::{LLMProvider, ProviderFactory};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Shared extraction service.
#[derive(Clone)]
pub struct MomExtractor {
    backend: Arc<dyn CompletionBackend>,
    text_extractor: Arc<dyn TextExtractor>,
    config: ExtractionConfig,
}

impl MomExtractor {
    /// Wire explicit collaborators.
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        text_extractor: Arc<dyn TextExtractor>,
        config: ExtractionConfig,
    ) -> Self {
        Self {
            backend,
            text_extractor,
            config,
        }
    }

    /// Resolve the LLM provider from `config` / the environment and bind
    /// pdfium lazily per request.
    pub fn from_config(config: ExtractionConfig) -> Result<Self, MomExtractError> {
        let provider = resolve_provider(&config)?;
        let text_extractor = PdfiumTextExtractor::new(config.pdfium_lib_path.clone());
        Ok(Self::new(
            Arc::new(ProviderBackend::new(provider)),
            Arc::new(text_extractor),
            config,
        ))
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extract all five MOM sections.
    pub async fn extract_all_tables(
        &self,
        doc: UploadedDocument,
    ) -> Result<ExtractionResult, MomExtractError> {
        let value = self.run(doc, PromptVariant::FullDocument).await?;
        let result = postprocess::into_extraction_result(value)?;
        info!("Extracted {} rows across all sections", result.row_count());
        Ok(result)
    }

    /// Extract only the TOPICS COVERED rows.
    pub async fn extract_topics_covered(
        &self,
        doc: UploadedDocument,
    ) -> Result<Vec<Row>, MomExtractError> {
        let value = self.run(doc, PromptVariant::TopicsOnly).await?;
        let rows = postprocess::into_topic_rows(value)?;
        info!("Extracted {} topic rows", rows.len());
        Ok(rows)
    }

    /// Extract the raw document text without calling the LLM.
    pub async fn extract_text_only(&self, doc: UploadedDocument) -> Result<String, MomExtractError> {
        upload::validate_pdf_filename(&doc.filename)?;
        let staged = upload::stage_upload(doc, self.config.temp_dir.clone()).await?;
        extract::extract_text(Arc::clone(&self.text_extractor), staged.path()).await
    }

    async fn run(
        &self,
        doc: UploadedDocument,
        variant: PromptVariant,
    ) -> Result<Value, MomExtractError> {
        let start = Instant::now();
        info!(
            "Extracting {:?} from '{}' ({} bytes)",
            variant,
            doc.filename,
            doc.bytes.len()
        );
        upload::validate_pdf_filename(&doc.filename)?;
        debug!("stage: {}", Stage::Received);

        // Dropped at the end of this scope, whichever way it is left.
        let staged = upload::stage_upload(doc, self.config.temp_dir.clone()).await?;

        let text = extract::extract_text(Arc::clone(&self.text_extractor), staged.path()).await?;
        debug!("stage: {} ({} chars)", Stage::TextExtracted, text.len());

        let prompt = build_prompt(variant, &text);
        debug!("stage: {}", Stage::PromptSent);
        let completion = llm::request_completion(self.backend.as_ref(), &prompt, &self.config).await?;

        let cleaned = postprocess::strip_code_fences(&completion.content);
        debug!("stage: {}", Stage::ResponseCleaned);

        let value = postprocess::decode_json(&cleaned)?;
        debug!("stage: {}", Stage::JsonDecoded);

        info!(
            "stage: {} in {}ms ({} in / {} out tokens)",
            Stage::Done,
            start.elapsed().as_millis(),
            completion.prompt_tokens,
            completion.completion_tokens
        );
        Ok(value)
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, MomExtractError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        MomExtractError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific:
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider** (`config.provider_name`) with `config.model` or
///    [`DEFAULT_MODEL`].
/// 3. **Environment pair** `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`.
/// 4. **Azure default** when `AZURE_OPENAI_API_KEY` is set: the
///    [`DEFAULT_PROVIDER`] with the configured or default deployment.
/// 5. **Full auto-detection** via `ProviderFactory::from_env`.
fn resolve_provider(config: &ExtractionConfig) -> Result<Arc<dyn LLMProvider>, MomExtractError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);

    if let Some(ref name) = config.provider_name {
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            return create_provider(&prov, &env_model);
        }
    }

    if std::env::var("AZURE_OPENAI_API_KEY").is_ok_and(|k| !k.is_empty()) {
        return create_provider(DEFAULT_PROVIDER, model);
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| MomExtractError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set AZURE_OPENAI_API_KEY, OPENAI_API_KEY, or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::llm::Completion;
    use crate::prompts::Prompt;
    use futures::future::BoxFuture;
    use serde_json::json;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    /// Records the staged path it was handed and whether it existed then.
    struct RecordingExtractor {
        pages: Vec<Option<String>>,
        seen: Mutex<Option<(PathBuf, bool)>>,
    }

    impl TextExtractor for RecordingExtractor {
        fn page_texts(&self, path: &Path) -> Result<Vec<Option<String>>, MomExtractError> {
            *self.seen.lock().unwrap() = Some((path.to_path_buf(), path.exists()));
            Ok(self.pages.clone())
        }
    }

    struct EchoPromptBackend {
        reply: String,
        last_user: Mutex<Option<String>>,
    }

    impl CompletionBackend for EchoPromptBackend {
        fn complete<'a>(
            &'a self,
            prompt: &'a Prompt,
            _config: &'a ExtractionConfig,
        ) -> BoxFuture<'a, Result<Completion, MomExtractError>> {
            *self.last_user.lock().unwrap() = Some(prompt.user.clone());
            let content = self.reply.clone();
            Box::pin(async move {
                Ok(Completion {
                    content,
                    ..Default::default()
                })
            })
        }
    }

    fn fixture(reply: &str) -> (MomExtractor, Arc<RecordingExtractor>, Arc<EchoPromptBackend>) {
        let text = Arc::new(RecordingExtractor {
            pages: vec![Some("TOPICS COVERED\n".into()), None, Some("Budget".into())],
            seen: Mutex::new(None),
        });
        let backend = Arc::new(EchoPromptBackend {
            reply: reply.to_string(),
            last_user: Mutex::new(None),
        });
        let extractor = MomExtractor::new(
            backend.clone(),
            text.clone(),
            ExtractionConfig::default(),
        );
        (extractor, text, backend)
    }

    fn pdf(name: &str) -> UploadedDocument {
        UploadedDocument::new(name, b"%PDF-1.7\n".to_vec())
    }

    #[tokio::test]
    async fn all_tables_happy_path() {
        let (extractor, text, backend) =
            fixture("```json\n{\"topics_covered\": [{\"Topic\": \"Budget\"}]}\n```");

        let result = extractor.extract_all_tables(pdf("m.pdf")).await.unwrap();
        assert_eq!(result.topics_covered[0]["Topic"], json!("Budget"));
        assert!(result.attendees.is_empty());

        let user = backend.last_user.lock().unwrap().clone().unwrap();
        assert!(user.contains("TOPICS COVERED\nBudget"));

        let (path, existed) = text.seen.lock().unwrap().clone().unwrap();
        assert!(existed, "staged file must exist during extraction");
        assert!(!path.exists(), "staged file must be gone afterwards");
    }

    #[tokio::test]
    async fn topics_covered_returns_rows() {
        let (extractor, _, _) = fixture("[{\"Topic\": \"A\"}, {\"Topic\": \"B\"}]");
        let rows = extractor.extract_topics_covered(pdf("m.pdf")).await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn malformed_output_cleans_up_temp_file() {
        let (extractor, text, _) = fixture("I could not find any tables.");
        let err = extractor.extract_all_tables(pdf("m.pdf")).await.unwrap_err();
        assert!(matches!(err, MomExtractError::MalformedLlmOutput { .. }));

        let (path, _) = text.seen.lock().unwrap().clone().unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn non_pdf_filename_never_reaches_extractor() {
        let (extractor, text, _) = fixture("{}");
        let err = extractor
            .extract_all_tables(pdf("minutes.docx"))
            .await
            .unwrap_err();
        assert!(matches!(err, MomExtractError::InvalidFileKind { .. }));
        assert!(text.seen.lock().unwrap().is_none());
    }

    #[test]
    fn text_only_skips_llm() {
        let (extractor, _, backend) = fixture("unused");
        let text = tokio_test::block_on(extractor.extract_text_only(pdf("m.pdf"))).unwrap();
        assert_eq!(text, "TOPICS COVERED\nBudget");
        assert!(backend.last_user.lock().unwrap().is_none());
    }
}
