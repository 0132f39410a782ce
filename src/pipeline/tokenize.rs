//! Token-budget helpers built on the model's own tokenizer.
//!
//! Truncation cuts the *original* string at the byte offset where the last
//! token inside the budget ends, so the model receives a verbatim prefix of
//! the document rather than a decode of token ids.

use crate::error::ReportError;
use tokenizers::Tokenizer;

/// Head of a document that fits the input budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Truncated<'a> {
    pub text: &'a str,
    /// Tokens of `text` including the special tokens the model adds.
    pub tokens: usize,
    pub truncated: bool,
}

/// Keep the head of `text` that fits in `max_tokens`, special tokens included.
pub fn truncate_head<'a>(
    tokenizer: &Tokenizer,
    text: &'a str,
    max_tokens: usize,
    model: &str,
) -> Result<Truncated<'a>, ReportError> {
    let encoding = tokenizer
        .encode(text, true)
        .map_err(|e| tokenize_failed(model, e))?;

    let mask = encoding.get_special_tokens_mask();
    let offsets = encoding.get_offsets();
    let specials = mask.iter().filter(|&&m| m == 1).count();
    let content = encoding.len() - specials;
    let budget = max_tokens.saturating_sub(specials);

    if content <= budget {
        return Ok(Truncated {
            text,
            tokens: encoding.len(),
            truncated: false,
        });
    }

    // Offset end of the budget-th content token.
    let end = mask
        .iter()
        .zip(offsets)
        .filter(|(m, _)| **m == 0)
        .nth(budget.saturating_sub(1))
        .filter(|_| budget > 0)
        .map(|(_, (_, end))| *end)
        .unwrap_or(0);

    Ok(Truncated {
        text: &text[..floor_char_boundary(text, end)],
        tokens: budget + specials,
        truncated: true,
    })
}

/// Number of tokens in `text`, special tokens excluded.
pub fn count_tokens(tokenizer: &Tokenizer, text: &str, model: &str) -> Result<usize, ReportError> {
    tokenizer
        .encode(text, false)
        .map(|e| e.len())
        .map_err(|e| tokenize_failed(model, e))
}

/// Cut `text` after its first `max_tokens` tokens. Returns the kept text and
/// its token count.
pub fn clip_to_tokens(
    tokenizer: &Tokenizer,
    text: &str,
    max_tokens: usize,
    model: &str,
) -> Result<(String, usize), ReportError> {
    let encoding = tokenizer
        .encode(text, false)
        .map_err(|e| tokenize_failed(model, e))?;
    if encoding.len() <= max_tokens {
        return Ok((text.to_string(), encoding.len()));
    }
    let end = match max_tokens {
        0 => 0,
        n => encoding.get_offsets()[n - 1].1,
    };
    let kept = text[..floor_char_boundary(text, end)].trim_end().to_string();
    Ok((kept, max_tokens))
}

fn floor_char_boundary(text: &str, mut idx: usize) -> usize {
    idx = idx.min(text.len());
    while !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn tokenize_failed(model: &str, e: impl std::fmt::Display) -> ReportError {
    ReportError::SummarizationFailed {
        model: model.to_string(),
        detail: format!("tokenization failed: {e}"),
    }
}
