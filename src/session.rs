//! Single-user interaction: upload a report, then ask about its summary.
//!
//! ```text
//! NoDocument ─upload─▶ DocumentUploaded ─▶ TextExtracted ─▶ Summarized
//!      ▲                                                        │
//!      └──────────── any failure / new upload                   ▼
//!                                   Responded ◀─respond─ AwaitingMessage
//!                                      └──respond──┘
//! ```
//!
//! A session holds at most one summary. Each upload starts over from
//! [`Stage::NoDocument`]; responses carry no memory of earlier messages.

use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::model::ModelHandle;
use crate::output::{ReportOutput, ReportStats, Summary};
use crate::pipeline::input::{self, ResolvedInput};
use crate::pipeline::respond;
use crate::progress::Step;
use crate::report;
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::debug;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    NoDocument,
    DocumentUploaded,
    TextExtracted,
    Summarized,
    AwaitingMessage,
    Responded,
}

/// Upload → summarize → respond loop over one shared [`ModelHandle`].
pub struct ReportSession {
    handle: ModelHandle,
    config: ReportConfig,
    stage: Stage,
    summary: Option<Summary>,
    stats: Option<ReportStats>,
}

impl ReportSession {
    pub fn new(handle: ModelHandle, config: ReportConfig) -> Self {
        Self {
            handle,
            config,
            stage: Stage::NoDocument,
            summary: None,
            stats: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The current summary, once a document has been summarized.
    pub fn summary(&self) -> Option<&Summary> {
        self.summary.as_ref()
    }

    /// Size and timing figures of the current summary.
    pub fn stats(&self) -> Option<&ReportStats> {
        self.stats.as_ref()
    }

    /// The current summary as a [`ReportOutput`], with an optional reply.
    pub fn output(&self, response: Option<String>) -> Option<ReportOutput> {
        let summary = self.summary.as_ref()?;
        Some(ReportOutput {
            summary: summary.text.clone(),
            response,
            stats: self.stats.clone().unwrap_or_default(),
        })
    }

    /// Forget the current document.
    pub fn reset(&mut self) {
        self.summary = None;
        self.stats = None;
        self.transition(Stage::NoDocument);
    }

    /// Upload PDF bytes and summarize them.
    ///
    /// The bytes live in a scratch file only for the duration of this call.
    pub async fn upload_bytes(&mut self, bytes: &[u8], name: &str) -> Result<Summary, ReportError> {
        self.reset();
        let staged = report::stage(bytes, name, &self.config);
        self.process(staged).await
    }

    /// Upload a PDF already on disk and summarize it.
    pub async fn upload_file(&mut self, path: impl AsRef<Path>) -> Result<Summary, ReportError> {
        self.reset();
        let resolved = input::resolve_local(path.as_ref());
        self.process(resolved).await
    }

    /// Reply to `message` about the current summary.
    ///
    /// Fails with [`ReportError::NoSummary`] before a summary exists, and with
    /// [`ReportError::EmptyMessage`] for blank input; neither changes the stage.
    pub fn respond(&mut self, message: &str) -> Result<String, ReportError> {
        let summary = match (self.stage, &self.summary) {
            (Stage::AwaitingMessage | Stage::Responded, Some(s)) => s,
            _ => return Err(ReportError::NoSummary),
        };
        let callback = self.config.progress_callback.as_ref();
        if let Some(cb) = callback {
            cb.on_step_start(Step::Respond);
        }
        let reply = match respond::respond(summary, message) {
            Ok(reply) => reply,
            Err(e) => {
                if let Some(cb) = callback {
                    cb.on_step_error(Step::Respond, &e.to_string());
                }
                return Err(e);
            }
        };
        if let Some(cb) = callback {
            cb.on_step_complete(Step::Respond, &format!("{} chars", reply.len()));
        }
        self.transition(Stage::Responded);
        Ok(reply)
    }

    async fn process(
        &mut self,
        resolved: Result<ResolvedInput, ReportError>,
    ) -> Result<Summary, ReportError> {
        match self.run(resolved).await {
            Ok((summary, stats)) => {
                self.summary = Some(summary.clone());
                self.stats = Some(stats);
                self.transition(Stage::AwaitingMessage);
                Ok(summary)
            }
            Err(e) => {
                self.reset();
                Err(e)
            }
        }
    }

    async fn run(
        &mut self,
        resolved: Result<ResolvedInput, ReportError>,
    ) -> Result<(Summary, ReportStats), ReportError> {
        let start = Instant::now();
        let resolved = resolved?;
        self.transition(Stage::DocumentUploaded);

        let text = report::run_extract(&resolved, &self.config).await?;
        drop(resolved);
        let extraction_ms = start.elapsed().as_millis() as u64;
        self.transition(Stage::TextExtracted);

        let summarize_start = Instant::now();
        let summary = report::run_summarize(&text, &self.handle, &self.config).await?;
        self.transition(Stage::Summarized);

        let stats = report::build_stats(
            &text,
            &summary,
            extraction_ms,
            summarize_start.elapsed().as_millis() as u64,
            start.elapsed().as_millis() as u64,
        );
        Ok((summary, stats))
    }

    fn transition(&mut self, to: Stage) {
        if self.stage != to {
            debug!("Session {:?} → {:?}", self.stage, to);
            self.stage = to;
        }
    }
}
