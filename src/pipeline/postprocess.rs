//! Post-processing: deterministic cleanup of extracted page text and of
//! generated summaries.
//!
//! Every rule is a pure `&str → String` function. Page rules only delete
//! characters that render as nothing (control characters, trailing spaces,
//! surplus blank lines) and never reorder text, so extracted text can only
//! grow as more pages are appended.
//!
//! ## Rule Order
//!
//! Line endings are normalised before trimming so `\r` never survives as
//! trailing whitespace; invisible characters are removed before blank-line
//! collapsing so a line holding only a zero-width space counts as blank.

use once_cell::sync::Lazy;
use regex::Regex;

// ── Page text ────────────────────────────────────────────────────────────────

/// Clean the raw text of one PDF page.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF / CR → LF)
/// 2. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens, NUL)
/// 3. Trim trailing whitespace per line
/// 4. Collapse 3+ consecutive newlines down to one blank line
/// 5. Drop leading and trailing blank lines
pub fn clean_page_text(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    s.trim_start_matches('\n').trim_end().to_string()
}

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{0000}',
        ],
        "",
    )
}

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").to_string()
}

// ── Summary text ─────────────────────────────────────────────────────────────

/// Clean decoded model output into a plain one-paragraph summary.
///
/// 1. Strip an outer code fence (chat backends sometimes add one)
/// 2. Remove special tokens: `<s>`, `</s>`, `<pad>`, `<unk>`, `<mask>`
/// 3. Drop a leading "Summary:" label
/// 4. Collapse all whitespace runs to single spaces and trim
pub fn clean_summary(input: &str) -> String {
    let s = strip_outer_fence(input);
    let s = RE_SPECIAL_TOKENS.replace_all(&s, " ");
    let s = RE_SUMMARY_LABEL.replace(s.trim_start(), "");
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

static RE_OUTER_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[a-zA-Z]*\n(.*)\n```\s*$").unwrap());

static RE_SPECIAL_TOKENS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</?s>|<pad>|<unk>|<mask>").unwrap());

static RE_SUMMARY_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^summary\s*:\s*").unwrap());

fn strip_outer_fence(input: &str) -> String {
    match RE_OUTER_FENCE.captures(input.trim()) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_line_endings() {
        assert_eq!(clean_page_text("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_page_trailing_whitespace() {
        assert_eq!(clean_page_text("Patient is healthy.   \n"), "Patient is healthy.");
    }

    #[test]
    fn test_page_blank_lines_collapsed() {
        assert_eq!(clean_page_text("a\n\n\n\n\nb"), "a\n\nb");
        assert_eq!(clean_page_text("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_page_invisible_chars() {
        assert_eq!(clean_page_text("Hb\u{200B}A1c\u{00AD}"), "HbA1c");
    }

    #[test]
    fn test_page_leading_blank_lines() {
        assert_eq!(clean_page_text("\n\n  indented"), "  indented");
    }

    #[test]
    fn test_whitespace_only_page_is_empty() {
        assert_eq!(clean_page_text(" \n\t\n\u{FEFF}\n"), "");
    }

    #[test]
    fn test_page_cleaning_is_idempotent() {
        let raw = "Glucose: 5.4 mmol/L  \r\n\r\n\r\n\r\nLDL: 2.1\u{200B}\n";
        let once = clean_page_text(raw);
        assert_eq!(clean_page_text(&once), once);
    }

    #[test]
    fn test_summary_special_tokens() {
        assert_eq!(
            clean_summary("<s> The patient is healthy.</s><pad><pad>"),
            "The patient is healthy."
        );
    }

    #[test]
    fn test_summary_whitespace() {
        assert_eq!(
            clean_summary("  Blood   pressure is\nnormal. \n\n"),
            "Blood pressure is normal."
        );
    }

    #[test]
    fn test_summary_fence_and_label() {
        assert_eq!(
            clean_summary("```text\nSummary: All values in range.\n```"),
            "All values in range."
        );
    }

    #[test]
    fn test_summary_keeps_angle_brackets_in_content() {
        assert_eq!(clean_summary("CRP <5 mg/L"), "CRP <5 mg/L");
    }
}
