//! Values produced by the pipeline.
//!
//! Everything here is transient and in-memory; nothing is persisted. The
//! [`ReportOutput`] shape is what `report-chat --json` prints.

use serde::Serialize;

/// Plain text of a whole document, pages in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedText {
    /// All pages joined by the configured separator.
    pub text: String,
    /// Characters contributed by each page (separator excluded).
    pub page_chars: Vec<usize>,
    /// Characters in the separator placed between pages.
    pub separator_chars: usize,
}

impl ExtractedText {
    pub fn page_count(&self) -> usize {
        self.page_chars.len()
    }

    pub fn char_count(&self) -> usize {
        self.page_chars.iter().sum::<usize>()
            + self.separator_chars * self.page_chars.len().saturating_sub(1)
    }

    /// True when the text holds nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Length in characters of the text after each page was appended.
    ///
    /// Non-decreasing by construction; the last entry equals [`Self::char_count`].
    pub fn cumulative_lengths(&self) -> Vec<usize> {
        let mut total = 0;
        self.page_chars
            .iter()
            .enumerate()
            .map(|(i, n)| {
                if i > 0 {
                    total += self.separator_chars;
                }
                total += n;
                total
            })
            .collect()
    }
}

/// A generated summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub text: String,
    /// Token count of `text` under the model's tokenizer.
    pub tokens: usize,
    /// Tokens of the (possibly truncated) input the model saw.
    pub input_tokens: usize,
    /// Whether the document was longer than the input budget.
    pub truncated: bool,
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Timing and size figures for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportStats {
    pub pages: usize,
    pub chars: usize,
    pub input_tokens: usize,
    pub truncated: bool,
    pub summary_tokens: usize,
    pub extraction_ms: u64,
    pub summarization_ms: u64,
    pub total_ms: u64,
}

/// Result of summarizing one report, optionally with a templated reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportOutput {
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    pub stats: ReportStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExtractedText {
        ExtractedText {
            text: "abc\nde\n\nfghi".into(),
            page_chars: vec![3, 2, 0, 4],
            separator_chars: 1,
        }
    }

    #[test]
    fn cumulative_lengths_are_monotonic_and_end_at_total() {
        let t = sample();
        let cum = t.cumulative_lengths();
        assert_eq!(cum, vec![3, 6, 7, 12]);
        assert!(cum.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*cum.last().unwrap(), t.char_count());
        assert_eq!(t.char_count(), t.text.chars().count());
    }

    #[test]
    fn blank_detection() {
        let t = ExtractedText {
            text: " \n ".into(),
            page_chars: vec![1, 1],
            separator_chars: 1,
        };
        assert!(t.is_blank());
        assert!(!sample().is_blank());
    }

    #[test]
    fn report_output_json_shape() {
        let out = ReportOutput {
            summary: "All values normal.".into(),
            response: None,
            stats: ReportStats {
                pages: 2,
                ..Default::default()
            },
        };
        let v = serde_json::to_value(&out).unwrap();
        assert_eq!(v["summary"], "All values normal.");
        assert!(v.get("response").is_none());
        assert_eq!(v["stats"]["pages"], 2);
    }
}
