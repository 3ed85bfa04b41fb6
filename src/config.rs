//! Configuration types for MOM extraction and the HTTP service.
//!
//! Library behaviour is controlled through [`ExtractionConfig`], the HTTP
//! surface through [`ServerConfig`]. Both are built via builders that validate
//! in `build()`, so a half-configured service fails at startup rather than on
//! the first upload.

use crate::error::MomExtractError;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Provider used when nothing else is configured. The MOM deployment runs on
/// Azure OpenAI.
pub const DEFAULT_PROVIDER: &str = "azure";

/// Azure deployment name used when no model is configured.
pub const DEFAULT_MODEL: &str = "DataTeam-OAI";

/// Configuration for the extraction pipeline.
///
/// # Example
/// ```rust
/// use edgequake_mom_extract::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .provider_name("openai")
///     .model("gpt-4.1-mini")
///     .api_timeout_secs(120)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_tokens, 16384);
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// LLM model identifier (Azure deployment name for the azure provider).
    /// If None, uses [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// LLM provider name (e.g. "azure", "openai", "ollama").
    /// If None along with `provider`, the provider is resolved from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.0.
    ///
    /// Extraction must be reproducible: the same minutes should yield the
    /// same rows on every upload.
    pub temperature: f32,

    /// Output-token ceiling for one completion. Default: 16384.
    ///
    /// Minutes with dozens of topic rows produce long JSON; a low ceiling
    /// truncates the array mid-object and the response no longer decodes.
    pub max_tokens: usize,

    /// Upper bound on a single completion call, in seconds. Default: 300.
    pub api_timeout_secs: u64,

    /// Directory for staged uploads. If None, uses the OS temp directory.
    pub temp_dir: Option<PathBuf>,

    /// Explicit path to the pdfium shared library (file or directory).
    /// If None, `PDFIUM_LIB_PATH`, then `./`, then the system library is tried.
    pub pdfium_lib_path: Option<PathBuf>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.0,
            max_tokens: 16384,
            api_timeout_secs: 300,
            temp_dir: None,
            pdfium_lib_path: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("temp_dir", &self.temp_dir)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.temp_dir = Some(dir.into());
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, MomExtractError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(MomExtractError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(MomExtractError::InvalidConfig(
                "api_timeout_secs must be ≥ 1".into(),
            ));
        }
        if let Some(ref dir) = c.temp_dir {
            if !dir.is_dir() {
                return Err(MomExtractError::InvalidConfig(format!(
                    "temp_dir '{}' is not a directory",
                    dir.display()
                )));
            }
        }
        Ok(self.config)
    }
}

/// Configuration for the HTTP surface.
#[derive(Clone)]
pub struct ServerConfig {
    /// Socket address to listen on. Default: `0.0.0.0:8000`.
    pub bind_addr: String,

    /// Secret expected in the `X-API-Key` header. Must be non-empty.
    pub api_key: String,

    /// Maximum accepted request body in bytes. Default: 50 MiB.
    pub max_upload_bytes: usize,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind_addr", &self.bind_addr)
            .field("api_key", &"<redacted>")
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

impl ServerConfig {
    /// Create a new builder. The API key has no default and must be set.
    pub fn builder(api_key: impl Into<String>) -> ServerConfigBuilder {
        ServerConfigBuilder {
            config: ServerConfig {
                bind_addr: "0.0.0.0:8000".to_string(),
                api_key: api_key.into(),
                max_upload_bytes: 50 * 1024 * 1024,
            },
        }
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.bind_addr = addr.into();
        self
    }

    pub fn max_upload_bytes(mut self, n: usize) -> Self {
        self.config.max_upload_bytes = n;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServerConfig, MomExtractError> {
        // An empty secret would let requests without the header through.
        if self.config.api_key.trim().is_empty() {
            return Err(MomExtractError::InvalidConfig(
                "API key must not be empty".into(),
            ));
        }
        if self.config.max_upload_bytes == 0 {
            return Err(MomExtractError::InvalidConfig(
                "max_upload_bytes must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_defaults_are_deterministic() {
        let config = ExtractionConfig::default();
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.max_tokens, 16384);
        assert_eq!(config.api_timeout_secs, 300);
        assert!(config.provider.is_none());
    }

    #[test]
    fn builder_clamps_temperature() {
        let config = ExtractionConfig::builder().temperature(5.0).build().unwrap();
        assert_eq!(config.temperature, 2.0);
    }

    #[test]
    fn builder_rejects_zero_tokens() {
        assert!(ExtractionConfig::builder().max_tokens(0).build().is_err());
    }

    #[test]
    fn builder_rejects_missing_temp_dir() {
        let err = ExtractionConfig::builder()
            .temp_dir("/definitely/not/a/dir")
            .build()
            .unwrap_err();
        assert!(matches!(err, MomExtractError::InvalidConfig(_)));
    }

    #[test]
    fn server_config_rejects_empty_key() {
        assert!(ServerConfig::builder("").build().is_err());
        assert!(ServerConfig::builder("   ").build().is_err());
    }

    #[test]
    fn server_config_debug_redacts_key() {
        let config = ServerConfig::builder("s3cret").build().unwrap();
        let dbg = format!("{:?}", config);
        assert!(!dbg.contains("s3cret"));
        assert_eq!(config.bind_addr, "0.0.0.0:8000");
    }
}
