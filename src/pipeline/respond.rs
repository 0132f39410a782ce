//! Templated reply to a user message about a summary.

use crate::error::ReportError;
use crate::output::Summary;

/// Answer `message` with the fixed template. No model is involved.
pub fn respond(summary: &Summary, message: &str) -> Result<String, ReportError> {
    if message.trim().is_empty() {
        return Err(ReportError::EmptyMessage);
    }
    Ok(format!(
        "You asked: {message}\nBased on the summary: {}",
        summary.text
    ))
}
