//! The summarization model: a tokenizer plus a generation backend.
//!
//! [`ModelHandle`] is loaded once by the composition root and shared by
//! cloning (all state is behind `Arc`). Generation goes through a semaphore
//! sized by `max_concurrent_generations` and is bounded by
//! `request_timeout_secs`.
//!
//! ```text
//!  ReportConfig ──load──▶ ModelHandle { tokenizer, Arc<dyn SummaryModel>, permits }
//!                               │
//!                 generate(text, params) ──▶ inference │ llm
//! ```
//!
//! Backends implement [`SummaryModel`]. Tests inject their own through
//! [`ModelHandle::from_parts`].

pub mod inference;
pub mod llm;

use crate::config::{ReportConfig, SummaryBackend};
use crate::error::ReportError;
use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokenizers::Tokenizer;
use tokio::sync::Semaphore;
use tracing::{debug, info};

/// Decoding parameters forwarded to the backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationParams {
    /// Maximum summary length in tokens.
    pub max_length: usize,
    /// Minimum summary length in tokens.
    pub min_length: usize,
    pub length_penalty: f32,
    pub num_beams: u32,
    pub early_stopping: bool,
}

/// Failure reported by a [`SummaryModel`].
#[derive(Debug, Error)]
pub enum ModelError {
    /// The request never produced a response (connection, DNS, TLS…).
    #[error("request failed: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The response could not be understood.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// The backend answered successfully but with no text.
    #[error("model returned an empty summary")]
    EmptyOutput,

    /// Any other backend-specific failure.
    #[error("{0}")]
    Backend(String),
}

/// A pretrained text-to-text generation model.
#[async_trait]
pub trait SummaryModel: Send + Sync {
    /// Identifier shown in logs and errors.
    fn name(&self) -> &str;

    /// Generate a summary of `input`, which is already truncated to the
    /// input budget. Returns the decoded text, possibly still containing
    /// special tokens.
    async fn generate(&self, input: &str, params: &GenerationParams)
        -> Result<String, ModelError>;
}

/// Loaded model resources, shared read-only between pipeline runs.
#[derive(Clone)]
pub struct ModelHandle {
    model: Arc<dyn SummaryModel>,
    tokenizer: Arc<Tokenizer>,
    permits: Arc<Semaphore>,
    max_permits: usize,
    timeout: Duration,
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("model", &self.model.name())
            .field("max_permits", &self.max_permits)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ModelHandle {
    /// Load the tokenizer and construct the configured backend.
    ///
    /// The tokenizer comes from `config.tokenizer_path`, or is downloaded
    /// from the model hub on first use and read from the local cache after.
    pub async fn load(config: &ReportConfig) -> Result<Self, ReportError> {
        let tokenizer = load_tokenizer(config).await?;

        let model: Arc<dyn SummaryModel> = match config.backend {
            SummaryBackend::Inference => Arc::new(inference::InferenceModel::new(config)?),
            SummaryBackend::Llm => Arc::new(llm::LlmModel::new(config)?),
        };
        info!(
            "Model ready: {} (tokenizer vocab {})",
            model.name(),
            tokenizer.get_vocab_size(true)
        );

        Ok(Self::from_parts(model, tokenizer, config))
    }

    /// Assemble a handle from an already-built backend and tokenizer.
    pub fn from_parts(
        model: Arc<dyn SummaryModel>,
        tokenizer: Tokenizer,
        config: &ReportConfig,
    ) -> Self {
        let max_permits = config.max_concurrent_generations.max(1);
        Self {
            model,
            tokenizer: Arc::new(tokenizer),
            permits: Arc::new(Semaphore::new(max_permits)),
            max_permits,
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    pub fn name(&self) -> &str {
        self.model.name()
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Run one generation, waiting for a free slot first.
    pub async fn generate(
        &self,
        input: &str,
        params: &GenerationParams,
    ) -> Result<String, ReportError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| self.failed("model handle has been shut down".into()))?;

        debug!(
            "Generating with {} (beams={}, length {}..={})",
            self.name(),
            params.num_beams,
            params.min_length,
            params.max_length
        );

        match tokio::time::timeout(self.timeout, self.model.generate(input, params)).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(self.failed(e.to_string())),
            Err(_) => Err(ReportError::GenerationTimeout {
                model: self.name().to_string(),
                secs: self.timeout.as_secs(),
            }),
        }
    }

    /// Wait for in-flight generations, then refuse new ones on every clone.
    pub async fn shutdown(self) {
        let permits = u32::try_from(self.max_permits).unwrap_or(u32::MAX);
        if let Ok(all) = self.permits.acquire_many(permits).await {
            all.forget();
        }
        self.permits.close();
        debug!("Model handle for {} shut down", self.model.name());
    }

    fn failed(&self, detail: String) -> ReportError {
        ReportError::SummarizationFailed {
            model: self.name().to_string(),
            detail,
        }
    }
}

// ── Tokenizer loading ────────────────────────────────────────────────────────

async fn load_tokenizer(config: &ReportConfig) -> Result<Tokenizer, ReportError> {
    let model_name = config.model_name.clone();
    let explicit = config.tokenizer_path.clone();

    tokio::task::spawn_blocking(move || {
        let unavailable = |detail: String| ReportError::TokenizerUnavailable {
            model: model_name.clone(),
            detail,
        };

        let path = match explicit {
            Some(p) => p,
            None => {
                let file = hub_cache::HubFile::new(&model_name, "tokenizer.json")
                    .map_err(|e| unavailable(e.to_string()))?;
                if hub_cache::cached_path(&file).is_none() {
                    info!("Downloading tokenizer for {}", model_name);
                }
                hub_cache::ensure_file(&file, None).map_err(|e| unavailable(e.to_string()))?
            }
        };
        tokenizer_from_file(&path).map_err(unavailable)
    })
    .await
    .map_err(|e| ReportError::Internal(format!("Tokenizer task panicked: {}", e)))?
}

fn tokenizer_from_file(path: &Path) -> Result<Tokenizer, String> {
    debug!("Loading tokenizer from {}", path.display());
    Tokenizer::from_file(path).map_err(|e| format!("{}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub(crate) fn word_level_tokenizer() -> Tokenizer {
        let json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [],
            "normalizer": null,
            "pre_tokenizer": { "type": "Whitespace" },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": { "<unk>": 0, "a": 1, "b": 2 },
                "unk_token": "<unk>"
            }
        });
        Tokenizer::from_bytes(json.to_string().as_bytes()).unwrap()
    }

    struct SlowModel {
        delay: Duration,
        running: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl SummaryModel for SlowModel {
        fn name(&self) -> &str {
            "slow"
        }

        async fn generate(&self, input: &str, _: &GenerationParams) -> Result<String, ModelError> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.running.fetch_sub(1, Ordering::SeqCst);
            Ok(input.to_string())
        }
    }

    fn slow(delay_ms: u64) -> Arc<SlowModel> {
        Arc::new(SlowModel {
            delay: Duration::from_millis(delay_ms),
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        })
    }

    fn params() -> GenerationParams {
        ReportConfig::default().generation_params()
    }

    #[tokio::test]
    async fn generations_are_serialised_by_default() {
        let model = slow(20);
        let handle = ModelHandle::from_parts(
            model.clone(),
            word_level_tokenizer(),
            &ReportConfig::default(),
        );

        let p = params();
        let (a, b, c) = tokio::join!(
            handle.generate("a", &p),
            handle.generate("b", &p),
            handle.generate("c", &p)
        );
        assert_eq!(a.unwrap(), "a");
        assert_eq!(b.unwrap(), "b");
        assert_eq!(c.unwrap(), "c");
        assert_eq!(model.peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn timeout_maps_to_generation_timeout() {
        let config = ReportConfig::builder()
            .request_timeout_secs(1)
            .build()
            .unwrap();
        let handle = ModelHandle::from_parts(slow(1_500), word_level_tokenizer(), &config);
        let err = handle.generate("a", &params()).await.unwrap_err();
        assert!(matches!(err, ReportError::GenerationTimeout { secs: 1, .. }));
    }

    #[tokio::test]
    async fn shutdown_refuses_further_work_on_clones() {
        let handle =
            ModelHandle::from_parts(slow(1), word_level_tokenizer(), &ReportConfig::default());
        let clone = handle.clone();
        handle.shutdown().await;
        let err = clone.generate("a", &params()).await.unwrap_err();
        assert!(matches!(err, ReportError::SummarizationFailed { .. }));
    }

    #[tokio::test]
    async fn explicit_tokenizer_path_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokenizer.json");
        word_level_tokenizer().save(&path, false).unwrap();

        let config = ReportConfig::builder()
            .tokenizer_path(&path)
            .build()
            .unwrap();
        let tok = load_tokenizer(&config).await.unwrap();
        assert_eq!(tok.token_to_id("b"), Some(2));
    }

    #[tokio::test]
    async fn unreadable_tokenizer_is_typed() {
        let config = ReportConfig::builder()
            .tokenizer_path("/no/such/tokenizer.json")
            .build()
            .unwrap();
        let err = load_tokenizer(&config).await.unwrap_err();
        assert!(matches!(err, ReportError::TokenizerUnavailable { .. }));
    }
}
