//! Upload staging: validate the filename and park the bytes in a temp file.
//!
//! pdfium opens documents by path, so every upload is written to a
//! [`NamedTempFile`] first. The file lives exactly as long as the
//! [`StagedUpload`] guard: dropping the guard deletes it, on success, on any
//! `?` early return, on panic unwinding, and when axum drops a cancelled
//! request future. No code path removes the file by hand.

use crate::error::MomExtractError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};
use tracing::debug;

/// A PDF received from a client.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

/// Temp-file guard for one request. The file is removed on drop.
#[derive(Debug)]
pub struct StagedUpload {
    file: NamedTempFile,
}

impl StagedUpload {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Reject anything whose filename does not end in `.pdf`.
///
/// The check is case-sensitive and runs before any bytes touch the disk.
pub fn validate_pdf_filename(filename: &str) -> Result<(), MomExtractError> {
    if filename.ends_with(".pdf") {
        Ok(())
    } else {
        Err(MomExtractError::InvalidFileKind {
            filename: filename.to_string(),
        })
    }
}

/// Write `doc` to a fresh `.pdf` temp file in `temp_dir` (or the OS default).
pub async fn stage_upload(
    doc: UploadedDocument,
    temp_dir: Option<PathBuf>,
) -> Result<StagedUpload, MomExtractError> {
    tokio::task::spawn_blocking(move || stage_upload_blocking(&doc.bytes, temp_dir.as_deref()))
        .await
        .map_err(|e| MomExtractError::Internal(format!("Staging task panicked: {}", e)))?
}

fn stage_upload_blocking(
    bytes: &[u8],
    temp_dir: Option<&Path>,
) -> Result<StagedUpload, MomExtractError> {
    let mut builder = Builder::new();
    builder.prefix("mom-upload-").suffix(".pdf");

    let mut file = match temp_dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
    .map_err(|e| MomExtractError::Internal(format!("tempfile: {e}")))?;

    file.write_all(bytes)
        .and_then(|_| file.flush())
        .map_err(|e| MomExtractError::Internal(format!("tempfile write: {e}")))?;

    debug!("Staged {} bytes at {}", bytes.len(), file.path().display());
    Ok(StagedUpload { file })
}
