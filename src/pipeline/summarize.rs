//! Summarization: bound the input, run the model, bound the output.

use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::model::ModelHandle;
use crate::output::Summary;
use crate::pipeline::postprocess::clean_summary;
use crate::pipeline::tokenize::{clip_to_tokens, truncate_head};
use tracing::{debug, info};

/// Summarize `text` with `handle`.
///
/// Whitespace-only text fails with [`ReportError::EmptyDocument`] before the
/// model is called. Text past `max_input_tokens` is dropped. The result never
/// exceeds `max_summary_tokens` tokens.
pub async fn summarize_text(
    text: &str,
    pages: usize,
    handle: &ModelHandle,
    config: &ReportConfig,
) -> Result<Summary, ReportError> {
    if text.trim().is_empty() {
        return Err(ReportError::EmptyDocument { pages });
    }

    let model = handle.name();
    let head = truncate_head(handle.tokenizer(), text, config.max_input_tokens, model)?;
    if head.truncated {
        info!(
            "Input truncated to {} tokens ({} of {} chars kept)",
            head.tokens,
            head.text.len(),
            text.len()
        );
    }

    let params = config.generation_params();
    let raw = handle.generate(head.text, &params).await?;
    let cleaned = clean_summary(&raw);
    if cleaned.is_empty() {
        return Err(ReportError::SummarizationFailed {
            model: model.to_string(),
            detail: "model output contained only special tokens".into(),
        });
    }

    let (text, tokens) = clip_to_tokens(
        handle.tokenizer(),
        &cleaned,
        config.max_summary_tokens,
        model,
    )?;
    if tokens < config.min_summary_tokens {
        debug!(
            "Summary has {} tokens, below the {} minimum (early stop)",
            tokens, config.min_summary_tokens
        );
    }

    Ok(Summary {
        text,
        tokens,
        input_tokens: head.tokens,
        truncated: head.truncated,
    })
}
