//! Pipeline stages for report summarization.
//!
//! Each submodule implements exactly one transformation step and is
//! testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ summarize ──▶ respond
//! (path/bytes) (lopdf/pdfium) (tokenize + model) (template)
//! ```
//!
//! 1. [`input`]  : validate a local path or stage uploaded bytes in a
//!    scoped temp file
//! 2. [`extract`]: per-page text in document order; runs in `spawn_blocking`
//! 3. [`postprocess`]: deterministic cleanup of page text and model output
//! 4. [`tokenize`]: input truncation and output clipping by token count
//! 5. [`summarize`]: the only stage with network I/O
//! 6. [`respond`]: fixed reply template

pub mod extract;
pub mod input;
pub mod postprocess;
pub mod respond;
pub mod summarize;
pub mod tokenize;
