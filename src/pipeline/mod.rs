//! Pipeline stages for MOM extraction.
//!
//! Each submodule implements exactly one step, so each is testable alone and
//! the PDF or LLM backend can be swapped without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! upload ──▶ extract ──▶ llm ──▶ postprocess
//! (temp file) (pdfium)   (chat)  (fences, JSON, shape)
//! ```
//!
//! 1. [`upload`]: validate the filename and stage the bytes in a temp file
//!    that is deleted when its guard drops
//! 2. [`extract`]: read per-page text via pdfium on the blocking pool
//! 3. [`llm`]: one bounded chat-completion call; the only network I/O
//! 4. [`postprocess`]: strip code fences, decode JSON, check the shape

use std::fmt;

pub mod extract;
pub mod llm;
pub mod postprocess;
pub mod upload;

/// Where a request is in the pipeline. Logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    TextExtracted,
    PromptSent,
    ResponseCleaned,
    JsonDecoded,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::TextExtracted => "text-extracted",
            Stage::PromptSent => "prompt-sent",
            Stage::ResponseCleaned => "response-cleaned",
            Stage::JsonDecoded => "json-decoded",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}
