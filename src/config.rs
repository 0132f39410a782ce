//! Configuration types for report summarization.
//!
//! All pipeline behaviour is controlled through [`ReportConfig`], built via
//! [`ReportConfigBuilder`]. The defaults reproduce the reference deployment:
//! `facebook/bart-large-cnn`, a 1024-token input budget, 30–150 summary
//! tokens, 4 beams, length penalty 2.0 and early stopping.
//!
//! A [`FileConfig`] can be loaded from TOML and applied on top of the
//! defaults; the CLI then applies its own flags on top of that.
//!
//! ```toml
//! [summarizer]
//! model_name = "facebook/bart-large-cnn"
//! max_summary_tokens = 120
//! beam_width = 4
//!
//! [extraction]
//! engine = "native"
//! page_separator = "newline"
//! ```

use crate::error::ReportError;
use crate::model::GenerationParams;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Pretrained weights used when no model is configured.
pub const DEFAULT_MODEL: &str = "facebook/bart-large-cnn";

/// Base URL of the hosted inference service; the model id is appended.
pub const DEFAULT_INFERENCE_ENDPOINT: &str = "https://router.huggingface.co/hf-inference/models";

/// Smallest accepted input budget. BART adds two special tokens, and a
/// budget that leaves no room for content would summarize nothing.
const MIN_INPUT_TOKENS: usize = 16;

/// Configuration for one extraction → summarization → response pipeline.
///
/// Built via [`ReportConfig::builder()`] or using [`ReportConfig::default()`].
///
/// # Example
/// ```rust
/// use report_summarizer::ReportConfig;
///
/// let config = ReportConfig::builder()
///     .max_summary_tokens(120)
///     .beam_width(2)
///     .build()
///     .unwrap();
/// assert_eq!(config.min_summary_tokens, 30);
/// ```
#[derive(Clone)]
pub struct ReportConfig {
    // ── Summarizer ────────────────────────────────────────────────────────
    /// Model id selecting the pretrained weights and the tokenizer.
    /// Default: `facebook/bart-large-cnn`.
    pub model_name: String,

    /// Truncation bound for the model input, special tokens included.
    /// Default: 1024. Text past this budget never reaches the model.
    pub max_input_tokens: usize,

    /// Upper bound on generated summary length in tokens. Default: 150.
    pub max_summary_tokens: usize,

    /// Lower bound on generated summary length in tokens. Default: 30.
    ///
    /// Forwarded to the model; a shorter summary is still accepted because
    /// early stopping can legitimately end generation sooner.
    pub min_summary_tokens: usize,

    /// Beam search width. Default: 4.
    pub beam_width: u32,

    /// Beam scoring length penalty; values above 1.0 favour longer output.
    /// Default: 2.0.
    pub length_penalty: f32,

    /// Stop beam search once every beam has produced an end token.
    /// Default: true.
    pub early_stopping: bool,

    /// Which generation backend serves the model. Default: [`SummaryBackend::Inference`].
    pub backend: SummaryBackend,

    /// Base URL of the inference service. Default: [`DEFAULT_INFERENCE_ENDPOINT`].
    pub endpoint: String,

    /// Bearer token for the inference service. Falls back to `HF_TOKEN`.
    pub api_token: Option<String>,

    /// Local `tokenizer.json`. If None, it is fetched from the hub and cached.
    pub tokenizer_path: Option<PathBuf>,

    /// Chat provider name for [`SummaryBackend::Llm`] (e.g. "openai", "ollama").
    pub provider_name: Option<String>,

    /// Chat model for [`SummaryBackend::Llm`]. Default: provider default.
    pub llm_model: Option<String>,

    /// Pre-constructed chat provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Per-generation timeout in seconds. Default: 120.
    pub request_timeout_secs: u64,

    /// Generations allowed to run at once on the shared model. Default: 1.
    pub max_concurrent_generations: usize,

    // ── Extraction ────────────────────────────────────────────────────────
    /// PDF parser engine. Default: [`PdfEngine::Native`].
    pub engine: PdfEngine,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Text inserted between pages. Default: [`PageSeparator::Newline`].
    pub page_separator: PageSeparator,

    /// Directory for scratch copies of uploads. Default: the system temp dir.
    pub temp_dir: Option<PathBuf>,

    /// Stage progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_MODEL.to_string(),
            max_input_tokens: 1024,
            max_summary_tokens: 150,
            min_summary_tokens: 30,
            beam_width: 4,
            length_penalty: 2.0,
            early_stopping: true,
            backend: SummaryBackend::default(),
            endpoint: DEFAULT_INFERENCE_ENDPOINT.to_string(),
            api_token: None,
            tokenizer_path: None,
            provider_name: None,
            llm_model: None,
            provider: None,
            request_timeout_secs: 120,
            max_concurrent_generations: 1,
            engine: PdfEngine::default(),
            password: None,
            page_separator: PageSeparator::default(),
            temp_dir: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ReportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportConfig")
            .field("model_name", &self.model_name)
            .field("max_input_tokens", &self.max_input_tokens)
            .field("max_summary_tokens", &self.max_summary_tokens)
            .field("min_summary_tokens", &self.min_summary_tokens)
            .field("beam_width", &self.beam_width)
            .field("length_penalty", &self.length_penalty)
            .field("early_stopping", &self.early_stopping)
            .field("backend", &self.backend)
            .field("endpoint", &self.endpoint)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("tokenizer_path", &self.tokenizer_path)
            .field("provider_name", &self.provider_name)
            .field("llm_model", &self.llm_model)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_concurrent_generations", &self.max_concurrent_generations)
            .field("engine", &self.engine)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("page_separator", &self.page_separator)
            .field("temp_dir", &self.temp_dir)
            .finish()
    }
}

impl ReportConfig {
    /// Create a new builder for `ReportConfig`.
    pub fn builder() -> ReportConfigBuilder {
        ReportConfigBuilder {
            config: Self::default(),
        }
    }

    /// The generation knobs forwarded to the model backend.
    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            max_length: self.max_summary_tokens,
            min_length: self.min_summary_tokens,
            length_penalty: self.length_penalty,
            num_beams: self.beam_width,
            early_stopping: self.early_stopping,
        }
    }
}

/// Builder for [`ReportConfig`].
#[derive(Debug)]
pub struct ReportConfigBuilder {
    config: ReportConfig,
}

impl ReportConfigBuilder {
    pub fn model_name(mut self, name: impl Into<String>) -> Self {
        self.config.model_name = name.into();
        self
    }

    pub fn max_input_tokens(mut self, n: usize) -> Self {
        self.config.max_input_tokens = n;
        self
    }

    pub fn max_summary_tokens(mut self, n: usize) -> Self {
        self.config.max_summary_tokens = n;
        self
    }

    pub fn min_summary_tokens(mut self, n: usize) -> Self {
        self.config.min_summary_tokens = n;
        self
    }

    pub fn beam_width(mut self, n: u32) -> Self {
        self.config.beam_width = n;
        self
    }

    pub fn length_penalty(mut self, p: f32) -> Self {
        self.config.length_penalty = p;
        self
    }

    pub fn early_stopping(mut self, v: bool) -> Self {
        self.config.early_stopping = v;
        self
    }

    pub fn backend(mut self, backend: SummaryBackend) -> Self {
        self.config.backend = backend;
        self
    }

    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.config.api_token = Some(token.into());
        self
    }

    pub fn tokenizer_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.tokenizer_path = Some(path.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn llm_model(mut self, model: impl Into<String>) -> Self {
        self.config.llm_model = Some(model.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn max_concurrent_generations(mut self, n: usize) -> Self {
        self.config.max_concurrent_generations = n.max(1);
        self
    }

    pub fn engine(mut self, engine: PdfEngine) -> Self {
        self.config.engine = engine;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn page_separator(mut self, sep: PageSeparator) -> Self {
        self.config.page_separator = sep;
        self
    }

    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.temp_dir = Some(dir.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ReportConfig, ReportError> {
        let c = &self.config;
        if c.model_name.trim().is_empty() {
            return Err(ReportError::InvalidConfig("model_name must not be empty".into()));
        }
        if c.max_input_tokens < MIN_INPUT_TOKENS {
            return Err(ReportError::InvalidConfig(format!(
                "max_input_tokens must be ≥ {MIN_INPUT_TOKENS}, got {}",
                c.max_input_tokens
            )));
        }
        if c.max_summary_tokens == 0 {
            return Err(ReportError::InvalidConfig(
                "max_summary_tokens must be ≥ 1".into(),
            ));
        }
        if c.min_summary_tokens > c.max_summary_tokens {
            return Err(ReportError::InvalidConfig(format!(
                "min_summary_tokens ({}) exceeds max_summary_tokens ({})",
                c.min_summary_tokens, c.max_summary_tokens
            )));
        }
        if c.beam_width == 0 {
            return Err(ReportError::InvalidConfig("beam_width must be ≥ 1".into()));
        }
        if !c.length_penalty.is_finite() {
            return Err(ReportError::InvalidConfig(format!(
                "length_penalty must be finite, got {}",
                c.length_penalty
            )));
        }
        if c.request_timeout_secs == 0 {
            return Err(ReportError::InvalidConfig(
                "request_timeout_secs must be ≥ 1".into(),
            ));
        }
        if c.backend == SummaryBackend::Inference && c.endpoint.trim().is_empty() {
            return Err(ReportError::InvalidConfig(
                "endpoint must be set for the inference backend".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Service that runs the pretrained generation model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryBackend {
    /// Hosted text-to-text inference endpoint serving `model_name`
    /// with beam search parameters forwarded verbatim. (default)
    #[default]
    Inference,
    /// A chat provider from `edgequake-llm`, prompted to summarize.
    Llm,
}

/// PDF parser used by the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PdfEngine {
    /// Pure-Rust `lopdf`; needs no runtime library. (default)
    #[default]
    Native,
    /// `libpdfium` via `pdfium-render`, bound at runtime.
    Pdfium,
}

impl PdfEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            PdfEngine::Native => "native",
            PdfEngine::Pdfium => "pdfium",
        }
    }
}

/// How to separate pages in the extracted text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSeparator {
    /// Pages are concatenated back to back, page boundaries invisible.
    None,
    /// A single newline between pages. (default)
    #[default]
    Newline,
    /// Custom string inserted between pages.
    Custom(String),
}

impl PageSeparator {
    /// The literal text placed between two pages.
    pub fn as_str(&self) -> &str {
        match self {
            PageSeparator::None => "",
            PageSeparator::Newline => "\n",
            PageSeparator::Custom(s) => s,
        }
    }

    /// Parse the CLI / config-file spelling: `none`, `newline`, or anything
    /// else as a custom separator (`\n` escapes are honoured).
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "none" | "" => PageSeparator::None,
            "newline" | "nl" => PageSeparator::Newline,
            _ => PageSeparator::Custom(s.replace("\\n", "\n")),
        }
    }
}

// ── Config file ──────────────────────────────────────────────────────────

/// `[summarizer]` table of the config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SummarizerSection {
    pub model_name: Option<String>,
    pub max_input_tokens: Option<usize>,
    pub max_summary_tokens: Option<usize>,
    pub min_summary_tokens: Option<usize>,
    pub beam_width: Option<u32>,
    pub length_penalty: Option<f32>,
    pub early_stopping: Option<bool>,
    pub backend: Option<SummaryBackend>,
    pub endpoint: Option<String>,
    pub tokenizer_path: Option<PathBuf>,
    pub provider_name: Option<String>,
    pub llm_model: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub max_concurrent_generations: Option<usize>,
}

/// `[extraction]` table of the config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtractionSection {
    pub engine: Option<PdfEngine>,
    pub page_separator: Option<String>,
    pub temp_dir: Option<PathBuf>,
}

/// On-disk configuration. Secrets (API tokens, PDF passwords) are not read
/// from the file; they come from the environment or CLI flags.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub summarizer: SummarizerSection,
    #[serde(default)]
    pub extraction: ExtractionSection,
}

impl FileConfig {
    /// Load and parse a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ReportError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ReportError::InvalidConfig(format!("cannot read '{}': {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ReportError> {
        toml::from_str(content).map_err(|e| ReportError::InvalidConfig(e.to_string()))
    }

    /// Overlay every value present in the file onto `builder`.
    pub fn apply(self, mut b: ReportConfigBuilder) -> ReportConfigBuilder {
        let s = self.summarizer;
        if let Some(v) = s.model_name {
            b = b.model_name(v);
        }
        if let Some(v) = s.max_input_tokens {
            b = b.max_input_tokens(v);
        }
        if let Some(v) = s.max_summary_tokens {
            b = b.max_summary_tokens(v);
        }
        if let Some(v) = s.min_summary_tokens {
            b = b.min_summary_tokens(v);
        }
        if let Some(v) = s.beam_width {
            b = b.beam_width(v);
        }
        if let Some(v) = s.length_penalty {
            b = b.length_penalty(v);
        }
        if let Some(v) = s.early_stopping {
            b = b.early_stopping(v);
        }
        if let Some(v) = s.backend {
            b = b.backend(v);
        }
        if let Some(v) = s.endpoint {
            b = b.endpoint(v);
        }
        if let Some(v) = s.tokenizer_path {
            b = b.tokenizer_path(v);
        }
        if let Some(v) = s.provider_name {
            b = b.provider_name(v);
        }
        if let Some(v) = s.llm_model {
            b = b.llm_model(v);
        }
        if let Some(v) = s.request_timeout_secs {
            b = b.request_timeout_secs(v);
        }
        if let Some(v) = s.max_concurrent_generations {
            b = b.max_concurrent_generations(v);
        }

        let e = self.extraction;
        if let Some(v) = e.engine {
            b = b.engine(v);
        }
        if let Some(v) = e.page_separator {
            b = b.page_separator(PageSeparator::parse(&v));
        }
        if let Some(v) = e.temp_dir {
            b = b.temp_dir(v);
        }
        b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_deployment() {
        let c = ReportConfig::default();
        assert_eq!(c.model_name, "facebook/bart-large-cnn");
        assert_eq!(c.max_input_tokens, 1024);
        assert_eq!(c.max_summary_tokens, 150);
        assert_eq!(c.min_summary_tokens, 30);
        assert_eq!(c.beam_width, 4);
        assert_eq!(c.length_penalty, 2.0);
        assert!(c.early_stopping);
        assert_eq!(c.page_separator, PageSeparator::Newline);
    }

    #[test]
    fn generation_params_follow_config() {
        let c = ReportConfig::builder()
            .max_summary_tokens(100)
            .min_summary_tokens(10)
            .beam_width(2)
            .length_penalty(1.0)
            .early_stopping(false)
            .build()
            .unwrap();
        let p = c.generation_params();
        assert_eq!(p.max_length, 100);
        assert_eq!(p.min_length, 10);
        assert_eq!(p.num_beams, 2);
        assert_eq!(p.length_penalty, 1.0);
        assert!(!p.early_stopping);
    }

    #[test]
    fn min_above_max_is_rejected() {
        let err = ReportConfig::builder()
            .min_summary_tokens(200)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("min_summary_tokens"));
    }

    #[test]
    fn zero_beams_rejected() {
        assert!(ReportConfig::builder().beam_width(0).build().is_err());
    }

    #[test]
    fn tiny_input_budget_rejected() {
        assert!(ReportConfig::builder().max_input_tokens(2).build().is_err());
    }

    #[test]
    fn non_finite_penalty_rejected() {
        assert!(ReportConfig::builder()
            .length_penalty(f32::NAN)
            .build()
            .is_err());
    }

    #[test]
    fn concurrency_clamped_to_one() {
        let c = ReportConfig::builder()
            .max_concurrent_generations(0)
            .build()
            .unwrap();
        assert_eq!(c.max_concurrent_generations, 1);
    }

    #[test]
    fn debug_redacts_secrets() {
        let c = ReportConfig::builder()
            .api_token("hf_secret")
            .password("hunter2")
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hf_secret"));
        assert!(!dbg.contains("hunter2"));
    }

    #[test]
    fn separator_parse() {
        assert_eq!(PageSeparator::parse("none"), PageSeparator::None);
        assert_eq!(PageSeparator::parse("newline"), PageSeparator::Newline);
        assert_eq!(
            PageSeparator::parse("\\n---\\n"),
            PageSeparator::Custom("\n---\n".into())
        );
        assert_eq!(PageSeparator::None.as_str(), "");
    }

    #[test]
    fn file_config_overlays_builder() {
        let file = FileConfig::from_toml_str(
            r#"
            [summarizer]
            model_name = "sshleifer/distilbart-cnn-12-6"
            beam_width = 2
            backend = "llm"

            [extraction]
            engine = "pdfium"
            page_separator = "none"
            "#,
        )
        .unwrap();
        let c = file.apply(ReportConfig::builder()).build().unwrap();
        assert_eq!(c.model_name, "sshleifer/distilbart-cnn-12-6");
        assert_eq!(c.beam_width, 2);
        assert_eq!(c.backend, SummaryBackend::Llm);
        assert_eq!(c.engine, PdfEngine::Pdfium);
        assert_eq!(c.page_separator, PageSeparator::None);
        assert_eq!(c.max_summary_tokens, 150, "untouched fields keep defaults");
    }

    #[test]
    fn file_config_rejects_unknown_keys() {
        let err = FileConfig::from_toml_str("[summarizer]\nnum_beams = 4\n").unwrap_err();
        assert!(matches!(err, ReportError::InvalidConfig(_)));
    }
}
