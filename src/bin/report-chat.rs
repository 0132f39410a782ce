//! CLI binary for report-summarizer.
//!
//! A thin shim over the library crate: maps CLI flags (and an optional TOML
//! file) to `ReportConfig`, summarizes one PDF, then answers messages.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use report_summarizer::{
    FileConfig, ModelHandle, PageSeparator, PdfEngine, ProgressCallback, ReportConfig,
    ReportError, ReportProgressCallback, ReportSession, Step, SummaryBackend,
};
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner that shows the current step's status line and logs each finished
/// step above it.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(style);
        Arc::new(Self { bar })
    }
}

impl ReportProgressCallback for CliProgressCallback {
    fn on_step_start(&self, step: Step) {
        // Replies are printed directly; no spinner for them.
        if step == Step::Respond {
            return;
        }
        self.bar.reset();
        self.bar.enable_steady_tick(Duration::from_millis(80));
        self.bar.set_message(step.status_line());
    }

    fn on_page_extracted(&self, page_num: usize, total_pages: usize, _chars: usize) {
        self.bar.set_message(format!(
            "{}  {}",
            Step::Extract.status_line(),
            dim(&format!("page {page_num}/{total_pages}"))
        ));
    }

    fn on_step_complete(&self, step: Step, detail: &str) {
        if step == Step::Respond {
            return;
        }
        self.bar.println(format!("  {} {:<10} {}", green("✓"), step, dim(detail)));
        self.bar.finish_and_clear();
    }

    fn on_step_error(&self, step: Step, error: &str) {
        if step == Step::Respond {
            return;
        }
        let msg = match error.lines().next() {
            Some(first) if first.chars().count() > 100 => {
                format!("{}\u{2026}", first.chars().take(99).collect::<String>())
            }
            Some(first) => first.to_string(),
            None => String::new(),
        };
        self.bar.println(format!("  {} {:<10} {}", red("✗"), step, red(&msg)));
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Summarize a report, then chat about it
  report-chat blood-test.pdf

  # One-shot question, JSON output
  report-chat --json -m "Is my cholesterol ok?" blood-test.pdf

  # Smaller / faster model, shorter summary
  report-chat --model sshleifer/distilbart-cnn-12-6 --max-summary-tokens 80 report.pdf

  # Summarize with a chat LLM instead of the hosted seq2seq model
  report-chat --backend llm --provider openai --llm-model gpt-4.1-mini report.pdf

  # Encrypted PDF via pdfium
  PDFIUM_LIB_PATH=/opt/pdfium/lib report-chat --engine pdfium --password s3cret report.pdf

CONFIG FILE (--config):
  [summarizer]
  model_name = "facebook/bart-large-cnn"
  max_summary_tokens = 150
  min_summary_tokens = 30
  beam_width = 4
  length_penalty = 2.0

  [extraction]
  engine = "native"
  page_separator = "newline"

  Command-line flags override file values.

ENVIRONMENT VARIABLES:
  HF_TOKEN                       Token for the inference endpoint and hub downloads
  HF_ENDPOINT                    Alternative hub URL for tokenizer downloads
  REPORT_SUMMARIZER_CACHE_DIR    Override the tokenizer cache directory
  PDFIUM_LIB_PATH                libpdfium file or directory (--engine pdfium)
  OPENAI_API_KEY, ANTHROPIC_API_KEY, GEMINI_API_KEY
                                 Chat provider keys (--backend llm)
  EDGEQUAKE_LLM_PROVIDER, EDGEQUAKE_MODEL
                                 Provider/model pair for --backend llm
"#;

/// Summarize a PDF health report and answer questions about it.
#[derive(Parser, Debug)]
#[command(
    name = "report-chat",
    version,
    about = "Summarize a PDF health report and answer questions about it",
    long_about = "Extracts the text of a PDF health report, summarizes it with a pretrained \
sequence-to-sequence model (facebook/bart-large-cnn by default) and answers your messages \
with the summary.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF file to summarize.
    input: PathBuf,

    /// TOML config file with [summarizer] and [extraction] tables.
    #[arg(long, env = "REPORT_CHAT_CONFIG")]
    config: Option<PathBuf>,

    /// Summarization model id on the hub.
    #[arg(long, env = "REPORT_CHAT_MODEL")]
    model: Option<String>,

    /// Generation backend: inference or llm.
    #[arg(long, env = "REPORT_CHAT_BACKEND", value_enum)]
    backend: Option<BackendArg>,

    /// Inference endpoint base URL; the model id is appended.
    #[arg(long, env = "REPORT_CHAT_ENDPOINT")]
    endpoint: Option<String>,

    /// Chat provider for --backend llm (openai, anthropic, gemini, ollama).
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Chat model for --backend llm.
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    llm_model: Option<String>,

    /// Local tokenizer.json instead of downloading it.
    #[arg(long, env = "REPORT_CHAT_TOKENIZER")]
    tokenizer: Option<PathBuf>,

    /// Input budget in tokens; the rest of the document is dropped.
    #[arg(long, env = "REPORT_CHAT_MAX_INPUT_TOKENS")]
    max_input_tokens: Option<usize>,

    /// Maximum summary length in tokens.
    #[arg(long, env = "REPORT_CHAT_MAX_SUMMARY_TOKENS")]
    max_summary_tokens: Option<usize>,

    /// Minimum summary length in tokens.
    #[arg(long, env = "REPORT_CHAT_MIN_SUMMARY_TOKENS")]
    min_summary_tokens: Option<usize>,

    /// Beam search width.
    #[arg(long, env = "REPORT_CHAT_BEAMS")]
    beams: Option<u32>,

    /// Beam length penalty (> 1.0 favours longer summaries).
    #[arg(long, env = "REPORT_CHAT_LENGTH_PENALTY")]
    length_penalty: Option<f32>,

    /// Keep searching after every beam has finished.
    #[arg(long)]
    no_early_stopping: bool,

    /// Per-generation timeout in seconds.
    #[arg(long, env = "REPORT_CHAT_TIMEOUT")]
    timeout: Option<u64>,

    /// PDF engine: native or pdfium.
    #[arg(long, env = "REPORT_CHAT_ENGINE", value_enum)]
    engine: Option<EngineArg>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "REPORT_CHAT_PASSWORD")]
    password: Option<String>,

    /// Page separator: none, newline, or a custom string.
    #[arg(long, env = "REPORT_CHAT_SEPARATOR")]
    separator: Option<String>,

    /// Answer this message and exit (repeatable). Without it, chat on stdin.
    #[arg(short, long = "message")]
    messages: Vec<String>,

    /// Output JSON (one ReportOutput per line) instead of text.
    #[arg(long, env = "REPORT_CHAT_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "REPORT_CHAT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "REPORT_CHAT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and replies.
    #[arg(short, long, env = "REPORT_CHAT_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum BackendArg {
    Inference,
    Llm,
}

impl From<BackendArg> for SummaryBackend {
    fn from(v: BackendArg) -> Self {
        match v {
            BackendArg::Inference => SummaryBackend::Inference,
            BackendArg::Llm => SummaryBackend::Llm,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum EngineArg {
    Native,
    Pdfium,
}

impl From<EngineArg> for PdfEngine {
    fn from(v: EngineArg) -> Self {
        match v {
            EngineArg::Native => PdfEngine::Native,
            EngineArg::Pdfium => PdfEngine::Pdfium,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // INFO-level library logs are redundant while the spinner is showing.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && io::stderr().is_terminal();
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ReportProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Load model ───────────────────────────────────────────────────────
    let loading = if show_progress {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_message(format!("Loading {}…", config.model_name));
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    } else {
        None
    };
    let handle = ModelHandle::load(&config).await;
    if let Some(bar) = loading {
        bar.finish_and_clear();
    }
    let handle = handle.context("Failed to load summarization model")?;

    // ── Summarize ────────────────────────────────────────────────────────
    let mut session = ReportSession::new(handle.clone(), config);
    let summary = session
        .upload_file(&cli.input)
        .await
        .with_context(|| format!("Could not summarize '{}'", cli.input.display()))?;

    if cli.json {
        if cli.messages.is_empty() {
            print_json(&session, None)?;
        }
    } else {
        if !cli.quiet {
            eprintln!();
            eprintln!("{}", bold("Summary"));
        }
        println!("{}", summary.text);
        if !cli.quiet {
            if let Some(stats) = session.stats() {
                eprintln!(
                    "{}",
                    dim(&format!(
                        "{} pages · {} chars · {} input tokens{} · {} summary tokens · {}ms",
                        stats.pages,
                        stats.chars,
                        stats.input_tokens,
                        if stats.truncated { " (truncated)" } else { "" },
                        stats.summary_tokens,
                        stats.total_ms
                    ))
                );
            }
        }
    }

    // ── Respond ──────────────────────────────────────────────────────────
    if !cli.messages.is_empty() {
        for message in &cli.messages {
            let reply = session.respond(message).context("Could not answer message")?;
            if cli.json {
                print_json(&session, Some(reply))?;
            } else {
                println!();
                println!("{reply}");
            }
        }
    } else if !cli.json {
        chat_loop(&mut session, cli.quiet).await?;
    }

    handle.shutdown().await;
    Ok(())
}

/// Read messages from stdin until EOF, `exit` or `quit`.
async fn chat_loop(session: &mut ReportSession, quiet: bool) -> Result<()> {
    let interactive = io::stdin().is_terminal();
    if interactive && !quiet {
        eprintln!();
        eprintln!(
            "{} {}",
            cyan("◆"),
            dim("Ask about the report (exit or Ctrl-D to quit)")
        );
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if interactive {
            eprint!("{} ", cyan(">"));
            io::stderr().flush().ok();
        }
        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            break;
        };
        let trimmed = line.trim();
        if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
            break;
        }
        match session.respond(&line) {
            Ok(reply) => println!("{reply}\n"),
            Err(ReportError::EmptyMessage) => continue,
            Err(e) => return Err(e).context("Could not answer message"),
        }
    }
    Ok(())
}

fn print_json(session: &ReportSession, response: Option<String>) -> Result<()> {
    let output = session
        .output(response)
        .context("No summary available to serialise")?;
    let json = serde_json::to_string(&output).context("Failed to serialise output")?;
    println!("{json}");
    Ok(())
}

/// Map the config file and CLI args to `ReportConfig`. Flags win.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ReportConfig> {
    let mut builder = ReportConfig::builder();

    if let Some(ref path) = cli.config {
        let file = FileConfig::load(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        builder = file.apply(builder);
    }

    if let Some(ref m) = cli.model {
        builder = builder.model_name(m);
    }
    if let Some(b) = cli.backend {
        builder = builder.backend(b.into());
    }
    if let Some(ref e) = cli.endpoint {
        builder = builder.endpoint(e);
    }
    if let Some(ref p) = cli.provider {
        builder = builder.provider_name(p);
    }
    if let Some(ref m) = cli.llm_model {
        builder = builder.llm_model(m);
    }
    if let Some(ref t) = cli.tokenizer {
        builder = builder.tokenizer_path(t);
    }
    if let Some(n) = cli.max_input_tokens {
        builder = builder.max_input_tokens(n);
    }
    if let Some(n) = cli.max_summary_tokens {
        builder = builder.max_summary_tokens(n);
    }
    if let Some(n) = cli.min_summary_tokens {
        builder = builder.min_summary_tokens(n);
    }
    if let Some(n) = cli.beams {
        builder = builder.beam_width(n);
    }
    if let Some(p) = cli.length_penalty {
        builder = builder.length_penalty(p);
    }
    if cli.no_early_stopping {
        builder = builder.early_stopping(false);
    }
    if let Some(secs) = cli.timeout {
        builder = builder.request_timeout_secs(secs);
    }
    if let Some(e) = cli.engine {
        builder = builder.engine(e.into());
    }
    if let Some(ref p) = cli.password {
        builder = builder.password(p);
    }
    if let Some(ref s) = cli.separator {
        builder = builder.page_separator(PageSeparator::parse(s));
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
