//! # report-summarizer
//!
//! Summarize PDF health reports with a pretrained sequence-to-sequence model
//! and answer questions about the summary with a fixed template.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      validate a path, or stage uploaded bytes in a temp file
//!  ├─ 2. Extract    per-page text via lopdf / pdfium (spawn_blocking)
//!  ├─ 3. Truncate   head of the text within 1024 model tokens
//!  ├─ 4. Summarize  beam search on facebook/bart-large-cnn (or a chat LLM)
//!  ├─ 5. Clip       strip special tokens, cap at 150 tokens
//!  └─ 6. Respond    "You asked: …\nBased on the summary: …"
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use report_summarizer::{summarize_pdf, ModelHandle, ReportConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ReportConfig::default();
//!     // Downloads tokenizer.json on first use; HF_TOKEN is sent if set.
//!     let handle = ModelHandle::load(&config).await?;
//!     let output = summarize_pdf("report.pdf", &handle, &config).await?;
//!     println!("{}", output.summary);
//!     handle.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `report-chat` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! report-summarizer = { version = "0.3", default-features = false }
//! ```
//!
//! ## Backends
//!
//! | Backend | Model | Generation |
//! |---------|-------|------------|
//! | `inference` (default) | any hub summarization model, `facebook/bart-large-cnn` by default | beam search, all parameters forwarded |
//! | `llm` | any `edgequake-llm` chat provider | temperature 0, `max_tokens` cap, bounds in the prompt |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod report;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    FileConfig, PageSeparator, PdfEngine, ReportConfig, ReportConfigBuilder, SummaryBackend,
};
pub use error::{ErrorClass, ReportError};
pub use model::{GenerationParams, ModelError, ModelHandle, SummaryModel};
pub use output::{ExtractedText, ReportOutput, ReportStats, Summary};
pub use progress::{NoopProgressCallback, ProgressCallback, ReportProgressCallback, Step};
pub use report::{extract_pdf, summarize_bytes, summarize_pdf, summarize_pdf_sync};
pub use session::{ReportSession, Stage};
