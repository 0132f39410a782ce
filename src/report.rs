//! One-shot entry points: PDF in, [`ReportOutput`] out.
//!
//! For the interactive upload → summary → messages flow use
//! [`crate::session::ReportSession`] instead; it calls the same stages.

use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::model::ModelHandle;
use crate::output::{ExtractedText, ReportOutput, ReportStats, Summary};
use crate::pipeline::input::{self, ResolvedInput};
use crate::pipeline::{extract, summarize};
use crate::progress::Step;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Summarize a PDF on disk.
///
/// # Errors
/// Every failure is fatal for the document:
/// - extraction errors (missing file, not a PDF, corrupt, encrypted)
/// - [`ReportError::EmptyDocument`] when no text was found
/// - summarization errors (tokenizer, backend, timeout)
pub async fn summarize_pdf(
    path: impl AsRef<Path>,
    handle: &ModelHandle,
    config: &ReportConfig,
) -> Result<ReportOutput, ReportError> {
    let start = Instant::now();
    let path = path.as_ref();
    info!("Summarizing report: {}", path.display());

    let resolved = input::resolve_local(path)?;
    summarize_resolved(resolved, handle, config, start).await
}

/// Summarize PDF bytes held in memory.
///
/// The bytes are written to a temp file (under `config.temp_dir` when set)
/// that is removed as soon as the text has been extracted, or on error.
pub async fn summarize_bytes(
    bytes: &[u8],
    handle: &ModelHandle,
    config: &ReportConfig,
) -> Result<ReportOutput, ReportError> {
    let start = Instant::now();
    let resolved = stage(bytes, "upload.pdf", config)?;
    summarize_resolved(resolved, handle, config, start).await
}

/// Blocking wrapper around [`summarize_pdf`] for non-async callers.
///
/// Loads a [`ModelHandle`] for this one call and shuts it down afterwards.
pub fn summarize_pdf_sync(
    path: impl AsRef<Path>,
    config: &ReportConfig,
) -> Result<ReportOutput, ReportError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ReportError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(async {
            let handle = ModelHandle::load(config).await?;
            let result = summarize_pdf(path, &handle, config).await;
            handle.shutdown().await;
            result
        })
}

/// Extract text from a PDF without summarizing it.
///
/// Needs no model, tokenizer, or network access.
pub async fn extract_pdf(
    path: impl AsRef<Path>,
    config: &ReportConfig,
) -> Result<ExtractedText, ReportError> {
    let resolved = input::resolve_local(path.as_ref())?;
    run_extract(&resolved, config).await
}

// ── Internals shared with the session ────────────────────────────────────────

pub(crate) fn stage(
    bytes: &[u8],
    name: &str,
    config: &ReportConfig,
) -> Result<ResolvedInput, ReportError> {
    with_step(config, Step::Upload, || {
        input::stage_bytes(bytes, name, config.temp_dir.as_deref())
    })
    .map(|resolved| {
        complete(config, Step::Upload, &format!("{} bytes", bytes.len()));
        resolved
    })
}

pub(crate) async fn run_extract(
    resolved: &ResolvedInput,
    config: &ReportConfig,
) -> Result<ExtractedText, ReportError> {
    start_step(config, Step::Extract);
    match extract::extract_text(resolved, config).await {
        Ok(text) => {
            complete(
                config,
                Step::Extract,
                &format!("{} pages, {} chars", text.page_count(), text.char_count()),
            );
            Ok(text)
        }
        Err(e) => Err(fail(config, Step::Extract, e)),
    }
}

pub(crate) async fn run_summarize(
    text: &ExtractedText,
    handle: &ModelHandle,
    config: &ReportConfig,
) -> Result<Summary, ReportError> {
    start_step(config, Step::Summarize);
    match summarize::summarize_text(&text.text, text.page_count(), handle, config).await {
        Ok(summary) => {
            complete(
                config,
                Step::Summarize,
                &format!("{} tokens", summary.tokens),
            );
            Ok(summary)
        }
        Err(e) => Err(fail(config, Step::Summarize, e)),
    }
}

async fn summarize_resolved(
    resolved: ResolvedInput,
    handle: &ModelHandle,
    config: &ReportConfig,
    start: Instant,
) -> Result<ReportOutput, ReportError> {
    let extract_start = Instant::now();
    let text = run_extract(&resolved, config).await?;
    // A staged upload is deleted here, before the model runs.
    drop(resolved);
    let extraction_ms = extract_start.elapsed().as_millis() as u64;

    let summarize_start = Instant::now();
    let summary = run_summarize(&text, handle, config).await?;
    let summarization_ms = summarize_start.elapsed().as_millis() as u64;

    let stats = build_stats(
        &text,
        &summary,
        extraction_ms,
        summarization_ms,
        start.elapsed().as_millis() as u64,
    );
    info!(
        "Report summarized: {} pages → {} summary tokens in {}ms",
        stats.pages, stats.summary_tokens, stats.total_ms
    );

    Ok(ReportOutput {
        summary: summary.text,
        response: None,
        stats,
    })
}

pub(crate) fn build_stats(
    text: &ExtractedText,
    summary: &Summary,
    extraction_ms: u64,
    summarization_ms: u64,
    total_ms: u64,
) -> ReportStats {
    ReportStats {
        pages: text.page_count(),
        chars: text.char_count(),
        input_tokens: summary.input_tokens,
        truncated: summary.truncated,
        summary_tokens: summary.tokens,
        extraction_ms,
        summarization_ms,
        total_ms,
    }
}

fn start_step(config: &ReportConfig, step: Step) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_step_start(step);
    }
}

fn complete(config: &ReportConfig, step: Step, detail: &str) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_step_complete(step, detail);
    }
}

fn fail(config: &ReportConfig, step: Step, err: ReportError) -> ReportError {
    if let Some(ref cb) = config.progress_callback {
        cb.on_step_error(step, &err.to_string());
    }
    err
}

fn with_step<T>(
    config: &ReportConfig,
    step: Step,
    f: impl FnOnce() -> Result<T, ReportError>,
) -> Result<T, ReportError> {
    start_step(config, step);
    f().map_err(|e| fail(config, step, e))
}
