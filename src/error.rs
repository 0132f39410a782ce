//! Error types for the report-summarizer library.
//!
//! Every failure terminates the current document's pipeline and is reported
//! as a [`ReportError`]. There is no retry layer: given the same document and
//! the same model, failures are deterministic.
//!
//! [`ErrorClass`] groups the variants by the stage that produced them, which
//! is what a presentation layer usually wants to branch on ("the PDF is
//! broken" vs. "the model is down" vs. "type a message first").
//!
//! A summarization failure is always an `Err`; it is never rendered as if it
//! were summary text.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the report-summarizer library.
#[derive(Debug, Error)]
pub enum ReportError {
    // ── Input / extraction errors ─────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The upload is not a PDF at all.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The selected PDF engine could not be initialised.
    #[error(
        "PDF engine '{engine}' is unavailable: {detail}\n\
Set PDFIUM_LIB_PATH to a libpdfium build, or use --engine native."
    )]
    PdfEngineUnavailable { engine: String, detail: String },

    // ── Document errors ───────────────────────────────────────────────────
    /// Extraction succeeded but produced no visible text (scanned images,
    /// blank pages). Reported before the model is ever called.
    #[error("No text could be extracted from the document ({pages} pages)")]
    EmptyDocument { pages: usize },

    // ── Model errors ──────────────────────────────────────────────────────
    /// The tokenizer could not be loaded or failed on the input.
    #[error("Tokenizer for '{model}' is unavailable: {detail}")]
    TokenizerUnavailable { model: String, detail: String },

    /// The generation backend is not configured (missing API key etc.).
    #[error("Summarization backend '{backend}' is not configured.\n{hint}")]
    ModelNotConfigured { backend: String, hint: String },

    /// Tokenization or generation failed.
    #[error("Summarization with '{model}' failed: {detail}")]
    SummarizationFailed { model: String, detail: String },

    /// Generation did not finish within the configured timeout.
    #[error("Summarization with '{model}' timed out after {secs}s")]
    GenerationTimeout { model: String, secs: u64 },

    // ── Interaction errors ────────────────────────────────────────────────
    /// A message was sent before any document was summarized.
    #[error("No summary available yet; upload a report first")]
    NoSummary,

    /// The user message is empty or whitespace only.
    #[error("Message is empty")]
    EmptyMessage,

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the scratch copy of an upload.
    #[error("Failed to stage upload in a temporary file: {source}")]
    TempFile {
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder or config-file validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`ReportError`] by pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// The PDF could not be read or parsed.
    Extraction,
    /// The PDF parsed but contained no text.
    EmptyDocument,
    /// The model failed to produce a summary.
    Summarization,
    /// The user interaction was out of order or empty.
    Interaction,
    /// Configuration, scratch files or internal faults.
    Setup,
}

impl ReportError {
    /// The stage this error belongs to.
    pub fn class(&self) -> ErrorClass {
        match self {
            ReportError::FileNotFound { .. }
            | ReportError::PermissionDenied { .. }
            | ReportError::NotAPdf { .. }
            | ReportError::CorruptPdf { .. }
            | ReportError::PasswordRequired { .. }
            | ReportError::WrongPassword { .. }
            | ReportError::PdfEngineUnavailable { .. } => ErrorClass::Extraction,
            ReportError::EmptyDocument { .. } => ErrorClass::EmptyDocument,
            ReportError::TokenizerUnavailable { .. }
            | ReportError::ModelNotConfigured { .. }
            | ReportError::SummarizationFailed { .. }
            | ReportError::GenerationTimeout { .. } => ErrorClass::Summarization,
            ReportError::NoSummary | ReportError::EmptyMessage => ErrorClass::Interaction,
            ReportError::TempFile { .. }
            | ReportError::InvalidConfig(_)
            | ReportError::Internal(_) => ErrorClass::Setup,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_pdf_is_extraction_class() {
        let e = ReportError::CorruptPdf {
            path: PathBuf::from("/tmp/a.pdf"),
            detail: "xref".into(),
        };
        assert_eq!(e.class(), ErrorClass::Extraction);
        assert!(e.to_string().contains("corrupt"));
    }

    #[test]
    fn empty_document_display() {
        let e = ReportError::EmptyDocument { pages: 3 };
        assert_eq!(e.class(), ErrorClass::EmptyDocument);
        assert!(e.to_string().contains("3 pages"), "got: {e}");
    }

    #[test]
    fn summarization_failure_is_not_summary_text() {
        let e = ReportError::SummarizationFailed {
            model: "facebook/bart-large-cnn".into(),
            detail: "HTTP 503".into(),
        };
        assert_eq!(e.class(), ErrorClass::Summarization);
        assert!(e.to_string().contains("bart-large-cnn"));
        assert!(e.to_string().contains("HTTP 503"));
    }

    #[test]
    fn timeout_display() {
        let e = ReportError::GenerationTimeout {
            model: "m".into(),
            secs: 120,
        };
        assert!(e.to_string().contains("120s"));
    }

    #[test]
    fn interaction_errors() {
        assert_eq!(ReportError::NoSummary.class(), ErrorClass::Interaction);
        assert_eq!(ReportError::EmptyMessage.class(), ErrorClass::Interaction);
    }

    #[test]
    fn error_class_serialises_snake_case() {
        let json = serde_json::to_string(&ErrorClass::EmptyDocument).unwrap();
        assert_eq!(json, "\"empty_document\"");
    }
}
