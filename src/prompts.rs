//! Prompts for the chat-provider summarization backend.
//!
//! Chat APIs expose neither beam search nor a minimum length, so the length
//! bounds of [`GenerationParams`] are stated in the prompt and `max_tokens`
//! is enforced by the provider. The hosted seq2seq backend does not use
//! anything in this module.

use crate::model::GenerationParams;

/// System prompt for abstractive summarization of a health report.
pub const SUMMARY_SYSTEM_PROMPT: &str = r#"You are a careful medical summarizer. You receive the raw text extracted from a patient's health report.

Write a short abstractive summary of the report:

1. CONTENT
   - State the key findings, measurements and any values flagged as abnormal
   - Keep numbers and units exactly as written in the report
   - Do not add diagnoses, advice or information that is not in the text

2. STYLE
   - One paragraph of plain prose
   - No headings, bullet points, Markdown or code fences
   - Do not start with "Summary:" or any other label

3. OUTPUT
   - Output ONLY the summary text"#;

/// Build the user turn: the length bounds followed by the report text.
pub fn summary_request(report_text: &str, params: &GenerationParams) -> String {
    format!(
        "Summarize the following report in roughly {min} to {max} tokens.\n\n\"\"\"{text}\"\"\"",
        min = params.min_length,
        max = params.max_length,
        text = report_text
    )
}
