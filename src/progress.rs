//! Progress-callback trait for per-step pipeline events.
//!
//! Inject an [`Arc<dyn ReportProgressCallback>`] via
//! [`crate::config::ReportConfigBuilder::progress_callback`] to receive
//! events as a document moves through upload, extraction, summarization and
//! response.
//!
//! Callers can forward events to a terminal spinner, a log, or a UI status
//! line without the library knowing how the host application presents them.
//!
//! # Example
//!
//! ```rust
//! use report_summarizer::{ReportConfig, ReportProgressCallback, Step};
//! use std::sync::Arc;
//!
//! struct StatusLines;
//!
//! impl ReportProgressCallback for StatusLines {
//!     fn on_step_start(&self, step: Step) {
//!         eprintln!("{}", step.status_line());
//!     }
//! }
//!
//! let config = ReportConfig::builder()
//!     .progress_callback(Arc::new(StatusLines) as Arc<dyn ReportProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// One step of the per-document pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Staging the uploaded bytes in a scratch file.
    Upload,
    /// Reading text out of the PDF.
    Extract,
    /// Running the summarization model.
    Summarize,
    /// Building the templated answer to a user message.
    Respond,
}

impl Step {
    /// Human-readable status line shown while the step runs.
    pub fn status_line(&self) -> &'static str {
        match self {
            Step::Upload => "Receiving the PDF...",
            Step::Extract => "Extracting text from the PDF...",
            Step::Summarize => "Summarizing the health report...",
            Step::Respond => "Preparing a response...",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Step::Upload => "upload",
            Step::Extract => "extract",
            Step::Summarize => "summarize",
            Step::Respond => "respond",
        };
        f.pad(s)
    }
}

/// Called by the pipeline as it processes a document.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Extraction runs on a blocking worker thread, so
/// `on_page_extracted` may fire from a thread other than the caller's.
pub trait ReportProgressCallback: Send + Sync {
    /// Called when `step` begins.
    fn on_step_start(&self, step: Step) {
        let _ = step;
    }

    /// Called after each page's text has been read.
    ///
    /// # Arguments
    /// * `page_num`   : 1-indexed page number
    /// * `total_pages`: total pages in the document
    /// * `chars`      : characters extracted from this page
    fn on_page_extracted(&self, page_num: usize, total_pages: usize, chars: usize) {
        let _ = (page_num, total_pages, chars);
    }

    /// Called when `step` finished. `detail` is a short summary such as
    /// "3 pages, 4210 chars".
    fn on_step_complete(&self, step: Step, detail: &str) {
        let _ = (step, detail);
    }

    /// Called when `step` failed; the pipeline stops after this.
    fn on_step_error(&self, step: Step, error: &str) {
        let _ = (step, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl ReportProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ReportConfig`].
pub type ProgressCallback = Arc<dyn ReportProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl ReportProgressCallback for Recorder {
        fn on_step_start(&self, step: Step) {
            self.events.lock().unwrap().push(format!("start:{step}"));
        }

        fn on_page_extracted(&self, page_num: usize, total_pages: usize, _chars: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("page:{page_num}/{total_pages}"));
        }

        fn on_step_complete(&self, step: Step, _detail: &str) {
            self.events.lock().unwrap().push(format!("done:{step}"));
        }

        fn on_step_error(&self, step: Step, _error: &str) {
            self.events.lock().unwrap().push(format!("error:{step}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_step_start(Step::Extract);
        cb.on_page_extracted(1, 2, 42);
        cb.on_step_complete(Step::Extract, "2 pages");
        cb.on_step_error(Step::Summarize, "timeout");
    }

    #[test]
    fn recorder_sees_events_in_order() {
        let rec = Recorder::default();
        rec.on_step_start(Step::Extract);
        rec.on_page_extracted(1, 2, 10);
        rec.on_page_extracted(2, 2, 12);
        rec.on_step_complete(Step::Extract, "2 pages");
        rec.on_step_start(Step::Summarize);
        rec.on_step_error(Step::Summarize, "HTTP 503");

        let events = rec.events.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                "start:extract",
                "page:1/2",
                "page:2/2",
                "done:extract",
                "start:summarize",
                "error:summarize",
            ]
        );
    }

    #[test]
    fn status_lines_match_ui_copy() {
        assert_eq!(
            Step::Extract.status_line(),
            "Extracting text from the PDF..."
        );
        assert_eq!(
            Step::Summarize.status_line(),
            "Summarizing the health report..."
        );
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_step_start(Step::Upload);
        cb.on_step_complete(Step::Upload, "1 KiB");
    }
}
