//! Error types for the edgequake-mom-extract library.
//!
//! A single [`MomExtractError`] covers every way a request can fail. Each
//! variant keeps the internal cause for the operator log, while
//! [`MomExtractError::public_detail`] gives the short message that is safe to
//! hand back to an HTTP caller.
//!
//! Every failure is terminal for the request that hit it. Nothing in the
//! pipeline retries.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the edgequake-mom-extract library.
#[derive(Debug, Error)]
pub enum MomExtractError {
    // ── Request errors ────────────────────────────────────────────────────
    /// The uploaded filename does not carry a `.pdf` suffix.
    #[error("Only PDF files are allowed (got '{filename}')")]
    InvalidFileKind { filename: String },

    /// The `X-API-Key` header was missing or did not match.
    #[error("API key missing or invalid")]
    AuthFailure,

    /// The multipart body was unreadable or had no `pdf_file` field.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The request body exceeded the configured upload limit.
    #[error("Upload too large: {0}")]
    UploadTooLarge(String),

    // ── PDF errors ────────────────────────────────────────────────────────
    /// The document could not be opened or its text could not be read.
    #[error("Text extraction failed for '{path}': {detail}")]
    ExtractionFailure { path: PathBuf, detail: String },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider could not be created (missing key, bad name).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Network or API-level failure calling the completion service.
    #[error("LLM request failed: {message}")]
    LlmRequestFailure { message: String },

    /// The completion text was not valid JSON (after fence stripping) or did
    /// not have the expected shape.
    #[error("LLM returned malformed output: {reason}")]
    MalformedLlmOutput { reason: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (temp file I/O, task join failure).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MomExtractError {
    /// HTTP status code this error maps to.
    pub fn status_code(&self) -> u16 {
        match self {
            MomExtractError::InvalidFileKind { .. } => 400,
            MomExtractError::AuthFailure => 403,
            MomExtractError::InvalidRequest(_) => 422,
            MomExtractError::UploadTooLarge(_) => 413,
            _ => 500,
        }
    }

    /// Message returned to callers. Never contains the internal cause.
    pub fn public_detail(&self) -> String {
        match self {
            MomExtractError::InvalidFileKind { .. } => "Only PDF files are allowed.".into(),
            MomExtractError::AuthFailure => "Could not validate API KEY".into(),
            MomExtractError::InvalidRequest(detail) => detail.clone(),
            MomExtractError::UploadTooLarge(_) => "Uploaded file is too large.".into(),
            MomExtractError::ExtractionFailure { .. } => "Extraction failed".into(),
            MomExtractError::LlmRequestFailure { .. } => "LLM request failed".into(),
            MomExtractError::MalformedLlmOutput { .. } => {
                "Failed to parse JSON from LLM response.".into()
            }
            MomExtractError::ProviderNotConfigured { .. }
            | MomExtractError::InvalidConfig(_)
            | MomExtractError::Internal(_) => "Internal server error".into(),
        }
    }

    /// Short machine-readable name, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            MomExtractError::InvalidFileKind { .. } => "invalid_file_kind",
            MomExtractError::AuthFailure => "auth_failure",
            MomExtractError::InvalidRequest(_) => "invalid_request",
            MomExtractError::UploadTooLarge(_) => "upload_too_large",
            MomExtractError::ExtractionFailure { .. } => "extraction_failure",
            MomExtractError::ProviderNotConfigured { .. } => "provider_not_configured",
            MomExtractError::LlmRequestFailure { .. } => "llm_request_failure",
            MomExtractError::MalformedLlmOutput { .. } => "malformed_llm_output",
            MomExtractError::InvalidConfig(_) => "invalid_config",
            MomExtractError::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_file_kind_is_bad_request() {
        let e = MomExtractError::InvalidFileKind {
            filename: "notes.docx".into(),
        };
        assert_eq!(e.status_code(), 400);
        assert!(e.to_string().contains("notes.docx"));
        assert_eq!(e.public_detail(), "Only PDF files are allowed.");
    }

    #[test]
    fn auth_failure_is_forbidden() {
        let e = MomExtractError::AuthFailure;
        assert_eq!(e.status_code(), 403);
        assert_eq!(e.public_detail(), "Could not validate API KEY");
    }

    #[test]
    fn upload_too_large_is_payload_too_large() {
        let e = MomExtractError::UploadTooLarge("length limit exceeded".into());
        assert_eq!(e.status_code(), 413);
        assert_ne!(e.kind(), MomExtractError::InvalidRequest(String::new()).kind());
        assert_eq!(e.public_detail(), "Uploaded file is too large.");
    }

    #[test]
    fn extraction_failure_hides_cause() {
        let e = MomExtractError::ExtractionFailure {
            path: PathBuf::from("/tmp/abc.pdf"),
            detail: "xref table corrupt".into(),
        };
        assert_eq!(e.status_code(), 500);
        assert!(e.to_string().contains("xref table corrupt"));
        assert!(!e.public_detail().contains("xref"));
    }

    #[test]
    fn malformed_output_is_distinct_from_request_failure() {
        let malformed = MomExtractError::MalformedLlmOutput {
            reason: "expected value at line 1 column 1".into(),
        };
        let request = MomExtractError::LlmRequestFailure {
            message: "connection reset".into(),
        };
        assert_ne!(malformed.kind(), request.kind());
        assert_ne!(malformed.public_detail(), request.public_detail());
        assert_eq!(malformed.status_code(), 500);
        assert_eq!(request.status_code(), 500);
    }

    #[test]
    fn internal_errors_use_generic_detail() {
        let e = MomExtractError::Internal("tempfile: disk full".into());
        assert_eq!(e.public_detail(), "Internal server error");
    }
}
