//! PDF text extraction via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and blocks while parsing. [`extract_text`] moves the work onto
//! tokio's blocking pool so request handlers on the worker threads keep
//! making progress while a large document is read.
//!
//! The [`TextExtractor`] trait is the seam to the PDF library: the pipeline
//! only needs "one optional string per page, in page order".

use crate::error::MomExtractError;
use once_cell::sync::OnceCell;
use pdfium_render::prelude::*;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Process-wide pdfium instance, bound on first use and never dropped.
///
/// Dropping a `Pdfium` calls `FPDF_DestroyLibrary`, which tears the library
/// down for every thread, so per-request instances cannot coexist. The mutex
/// keeps one document open at a time.
static PDFIUM: OnceCell<Mutex<Pdfium>> = OnceCell::new();

/// Produces the text of every page of a PDF, in page order.
///
/// A page without a text layer yields `None`; it is not an error.
pub trait TextExtractor: Send + Sync {
    fn page_texts(&self, pdf_path: &Path) -> Result<Vec<Option<String>>, MomExtractError>;
}

/// [`TextExtractor`] backed by the shared pdfium instance.
#[derive(Debug, Clone, Default)]
pub struct PdfiumTextExtractor {
    lib_path: Option<PathBuf>,
}

impl PdfiumTextExtractor {
    /// Bind to the library at `lib_path` (a file, or a directory holding the
    /// platform library). `None` falls back to `PDFIUM_LIB_PATH`, then `./`,
    /// then the system library.
    ///
    /// The first successful binding in the process is reused by every
    /// extractor; a later `lib_path` is ignored once pdfium is loaded.
    pub fn new(lib_path: Option<PathBuf>) -> Self {
        Self { lib_path }
    }

    fn shared(&self) -> Result<&'static Mutex<Pdfium>, String> {
        PDFIUM.get_or_try_init(|| {
            let pdfium = bind_library(self.lib_path.as_deref())?;
            info!("pdfium library bound");
            Ok(Mutex::new(pdfium))
        })
    }

    /// Bind pdfium now. Used at startup so a missing library fails fast
    /// instead of on the first upload.
    pub fn probe(&self) -> Result<(), MomExtractError> {
        self.shared().map(|_| ()).map_err(|detail| {
            MomExtractError::InvalidConfig(format!("Failed to bind to pdfium library: {detail}"))
        })
    }
}

fn bind_library(lib_path: Option<&Path>) -> Result<Pdfium, String> {
    let explicit = lib_path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from));

    let bindings = match explicit {
        Some(path) => {
            let path = if path.is_dir() {
                Pdfium::pdfium_platform_library_name_at_path(&path)
            } else {
                path
            };
            Pdfium::bind_to_library(&path).map_err(|e| format!("{}: {:?}", path.display(), e))?
        }
        None => Pdfium::bind_to_library(&Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| format!("{:?}", e))?,
    };

    Ok(Pdfium::new(bindings))
}

impl TextExtractor for PdfiumTextExtractor {
    fn page_texts(&self, pdf_path: &Path) -> Result<Vec<Option<String>>, MomExtractError> {
        let shared = self.shared().map_err(|detail| MomExtractError::ExtractionFailure {
            path: pdf_path.to_path_buf(),
            detail: format!("pdfium unavailable: {detail}"),
        })?;
        // A panic mid-extraction leaves no state behind the lock worth discarding.
        let pdfium = shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let document = pdfium.load_pdf_from_file(pdf_path, None).map_err(|e| {
            MomExtractError::ExtractionFailure {
                path: pdf_path.to_path_buf(),
                detail: format!("{:?}", e),
            }
        })?;

        let pages = document.pages();
        info!("PDF loaded: {} pages", pages.len());

        let mut texts = Vec::with_capacity(pages.len() as usize);
        for (idx, page) in pages.iter().enumerate() {
            match page.text() {
                Ok(text) => texts.push(Some(text.all())),
                Err(e) => {
                    warn!("Page {}: no text layer ({:?})", idx + 1, e);
                    texts.push(None);
                }
            }
        }

        Ok(texts)
    }
}

/// Join per-page text in page order with no separator; `None` contributes "".
pub fn concat_pages(pages: Vec<Option<String>>) -> String {
    pages.into_iter().flatten().collect()
}

/// Fail unless the file starts with the `%PDF` magic bytes.
pub fn check_pdf_header(pdf_path: &Path) -> Result<(), MomExtractError> {
    let mut magic = [0u8; 4];
    let read = std::fs::File::open(pdf_path).and_then(|mut f| f.read_exact(&mut magic));

    match read {
        Ok(()) if &magic == b"%PDF" => Ok(()),
        Ok(()) => Err(MomExtractError::ExtractionFailure {
            path: pdf_path.to_path_buf(),
            detail: format!("not a PDF, first bytes: {:?}", magic),
        }),
        Err(e) => Err(MomExtractError::ExtractionFailure {
            path: pdf_path.to_path_buf(),
            detail: format!("cannot read header: {e}"),
        }),
    }
}

/// Extract the full text of the PDF at `pdf_path`.
pub async fn extract_text(
    extractor: Arc<dyn TextExtractor>,
    pdf_path: &Path,
) -> Result<String, MomExtractError> {
    let path = pdf_path.to_path_buf();

    let pages = tokio::task::spawn_blocking(move || {
        check_pdf_header(&path)?;
        extractor.page_texts(&path)
    })
    .await
    .map_err(|e| MomExtractError::Internal(format!("Extraction task panicked: {}", e)))??;

    let page_count = pages.len();
    let text = concat_pages(pages);
    debug!("Extracted {} chars from {} pages", text.len(), page_count);
    Ok(text)
}
