//! Completion gateway: send a prompt pair to the LLM and return its text.
//!
//! Prompt wording lives in [`crate::prompts`] and response cleanup in
//! [`crate::pipeline::postprocess`]; this module only sends and times.
//!
//! There is exactly one attempt per request. A failed or timed-out call is
//! terminal and surfaces as [`MomExtractError::LlmRequestFailure`].

use crate::config::ExtractionConfig;
use crate::error::MomExtractError;
use crate::prompts::Prompt;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Raw completion text plus token usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub content: String,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

/// One chat call for a system/user prompt pair.
///
/// Implemented by [`ProviderBackend`] for real providers; tests plug in
/// canned responses.
pub trait CompletionBackend: Send + Sync {
    fn complete<'a>(
        &'a self,
        prompt: &'a Prompt,
        config: &'a ExtractionConfig,
    ) -> BoxFuture<'a, Result<Completion, MomExtractError>>;
}

/// [`CompletionBackend`] over any `edgequake-llm` provider.
#[derive(Clone)]
pub struct ProviderBackend {
    provider: Arc<dyn LLMProvider>,
}

impl ProviderBackend {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }
}

impl CompletionBackend for ProviderBackend {
    fn complete<'a>(
        &'a self,
        prompt: &'a Prompt,
        config: &'a ExtractionConfig,
    ) -> BoxFuture<'a, Result<Completion, MomExtractError>> {
        Box::pin(async move {
            let messages = vec![
                ChatMessage::system(prompt.system.as_str()),
                ChatMessage::user(prompt.user.as_str()),
            ];
            let options = build_options(config);

            let response = self
                .provider
                .chat(&messages, Some(&options))
                .await
                .map_err(|e| MomExtractError::LlmRequestFailure {
                    message: format!("{}", e),
                })?;

            Ok(Completion {
                content: response.content,
                prompt_tokens: response.prompt_tokens as usize,
                completion_tokens: response.completion_tokens as usize,
            })
        })
    }
}

/// Build `CompletionOptions` from the extraction config.
fn build_options(config: &ExtractionConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

/// Run one completion, bounded by `config.api_timeout_secs`.
pub async fn request_completion(
    backend: &dyn CompletionBackend,
    prompt: &Prompt,
    config: &ExtractionConfig,
) -> Result<Completion, MomExtractError> {
    let start = Instant::now();
    let limit = Duration::from_secs(config.api_timeout_secs);

    let completion = match tokio::time::timeout(limit, backend.complete(prompt, config)).await {
        Ok(Ok(completion)) => completion,
        Ok(Err(e)) => {
            warn!("Completion failed after {:?}: {}", start.elapsed(), e);
            return Err(e);
        }
        Err(_) => {
            warn!("Completion timed out after {}s", config.api_timeout_secs);
            return Err(MomExtractError::LlmRequestFailure {
                message: format!("timed out after {}s", config.api_timeout_secs),
            });
        }
    };

    debug!(
        "{} input tokens, {} output tokens, {:?}",
        completion.prompt_tokens,
        completion.completion_tokens,
        start.elapsed()
    );
    Ok(completion)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Canned(Result<&'static str, &'static str>);

    impl CompletionBackend for Canned {
        fn complete<'a>(
            &'a self,
            _prompt: &'a Prompt,
            _config: &'a ExtractionConfig,
        ) -> BoxFuture<'a, Result<Completion, MomExtractError>> {
            Box::pin(async move {
                match self.0 {
                    Ok(text) => Ok(Completion {
                        content: text.to_string(),
                        ..Default::default()
                    }),
                    Err(msg) => Err(MomExtractError::LlmRequestFailure {
                        message: msg.to_string(),
                    }),
                }
            })
        }
    }

    struct Stalled;

    impl CompletionBackend for Stalled {
        fn complete<'a>(
            &'a self,
            _prompt: &'a Prompt,
            _config: &'a ExtractionConfig,
        ) -> BoxFuture<'a, Result<Completion, MomExtractError>> {
            Box::pin(async move {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Completion::default())
            })
        }
    }

    fn prompt() -> Prompt {
        Prompt {
            system: "sys".into(),
            user: "user".into(),
        }
    }

    #[test]
    fn build_options_defaults() {
        let config = ExtractionConfig::default();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.0));
        assert_eq!(opts.max_tokens, Some(16384));
    }

    #[tokio::test]
    async fn returns_completion_text() {
        let config = ExtractionConfig::default();
        let out = request_completion(&Canned(Ok("[]")), &prompt(), &config)
            .await
            .unwrap();
        assert_eq!(out.content, "[]");
    }

    #[tokio::test]
    async fn propagates_request_failure() {
        let config = ExtractionConfig::default();
        let err = request_completion(&Canned(Err("503")), &prompt(), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, MomExtractError::LlmRequestFailure { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_stalled_call() {
        let config = ExtractionConfig::builder().api_timeout_secs(5).build().unwrap();
        let err = request_completion(&Stalled, &prompt(), &config)
            .await
            .unwrap_err();
        match err {
            MomExtractError::LlmRequestFailure { message } => assert!(message.contains("5s")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
