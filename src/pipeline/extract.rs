//! PDF text extraction: read every page's text in document order.
//!
//! Two engines are available (see [`PdfEngine`]):
//!
//! - **native** uses `lopdf` and needs nothing at runtime.
//! - **pdfium** uses `pdfium-render`, bound when extraction starts to the
//!   library at `PDFIUM_LIB_PATH` (a file, or a directory holding the
//!   platform library) or to the system-wide `libpdfium`.
//!
//! Both block and run inside `tokio::task::spawn_blocking`.
//!
//! Any page that fails to yield text fails the whole document.

use crate::config::{PageSeparator, PdfEngine, ReportConfig};
use crate::error::ReportError;
use crate::output::ExtractedText;
use crate::pipeline::input::ResolvedInput;
use crate::pipeline::postprocess::clean_page_text;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Extract the text of every page of `input`.
pub async fn extract_text(
    input: &ResolvedInput,
    config: &ReportConfig,
) -> Result<ExtractedText, ReportError> {
    let path = input.path().to_path_buf();
    let display = input.display_path().to_path_buf();
    let engine = config.engine;
    let password = config.password.clone();
    let callback = config.progress_callback.clone();

    let raw_pages = tokio::task::spawn_blocking(move || {
        let on_page = |page: usize, total: usize, chars: usize| {
            if let Some(cb) = &callback {
                cb.on_page_extracted(page, total, chars);
            }
        };
        match engine {
            PdfEngine::Native => {
                extract_native_blocking(&path, &display, password.as_deref(), &on_page)
            }
            PdfEngine::Pdfium => {
                extract_pdfium_blocking(&path, &display, password.as_deref(), &on_page)
            }
        }
    })
    .await
    .map_err(|e| ReportError::Internal(format!("Extraction task panicked: {}", e)))??;

    let extracted = assemble_pages(&raw_pages, &config.page_separator);
    info!(
        "Extracted {} chars from {} pages ({} engine)",
        extracted.char_count(),
        extracted.page_count(),
        engine.as_str()
    );
    Ok(extracted)
}

/// Clean each page and join them with `separator`.
pub fn assemble_pages(raw_pages: &[String], separator: &PageSeparator) -> ExtractedText {
    let pages: Vec<String> = raw_pages.iter().map(|p| clean_page_text(p)).collect();
    let sep = separator.as_str();
    ExtractedText {
        text: pages.join(sep),
        page_chars: pages.iter().map(|p| p.chars().count()).collect(),
        separator_chars: sep.chars().count(),
    }
}

// ── Native engine (lopdf) ────────────────────────────────────────────────────

fn extract_native_blocking(
    pdf_path: &Path,
    display: &Path,
    password: Option<&str>,
    on_page: &dyn Fn(usize, usize, usize),
) -> Result<Vec<String>, ReportError> {
    let mut doc = lopdf::Document::load(pdf_path).map_err(|e| {
        let err_str = e.to_string();
        if err_str.contains("encrypt") || err_str.contains("password") {
            ReportError::PasswordRequired {
                path: display.to_path_buf(),
            }
        } else {
            corrupt(display, err_str)
        }
    })?;

    if doc.is_encrypted() {
        match password {
            Some(pwd) => doc.decrypt(pwd).map_err(|e| {
                let err_str = e.to_string();
                if err_str.contains("password") || err_str.contains("decrypt") {
                    ReportError::WrongPassword {
                        path: display.to_path_buf(),
                    }
                } else {
                    corrupt(display, format!("Decryption failed: {}", e))
                }
            })?,
            None => {
                return Err(ReportError::PasswordRequired {
                    path: display.to_path_buf(),
                })
            }
        }
    }

    let pages = doc.get_pages();
    let total = pages.len();
    if total == 0 {
        return Err(corrupt(display, "document has no pages".into()));
    }
    info!("PDF loaded: {} pages", total);

    let mut out = Vec::with_capacity(total);
    for (i, page_num) in pages.keys().enumerate() {
        let text = doc
            .extract_text(&[*page_num])
            .map_err(|e| corrupt(display, format!("page {}: {}", page_num, e)))?;
        debug!("Page {} → {} chars", i + 1, text.chars().count());
        on_page(i + 1, total, text.chars().count());
        out.push(text);
    }
    Ok(out)
}

// ── pdfium engine ────────────────────────────────────────────────────────────

fn bind_pdfium() -> Result<Pdfium, ReportError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(p) if !p.is_empty() => {
            let path = PathBuf::from(&p);
            let lib = if path.is_dir() {
                Pdfium::pdfium_platform_library_name_at_path(&path)
            } else {
                path
            };
            debug!("Binding pdfium from {}", lib.display());
            Pdfium::bind_to_library(lib)
        }
        _ => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| ReportError::PdfEngineUnavailable {
        engine: PdfEngine::Pdfium.as_str().to_string(),
        detail: e.to_string(),
    })?;
    Ok(Pdfium::new(bindings))
}

fn extract_pdfium_blocking(
    pdf_path: &Path,
    display: &Path,
    password: Option<&str>,
    on_page: &dyn Fn(usize, usize, usize),
) -> Result<Vec<String>, ReportError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                ReportError::WrongPassword {
                    path: display.to_path_buf(),
                }
            } else {
                ReportError::PasswordRequired {
                    path: display.to_path_buf(),
                }
            }
        } else {
            corrupt(display, err_str)
        }
    })?;

    let pages = document.pages();
    let total = pages.len() as usize;
    if total == 0 {
        return Err(corrupt(display, "document has no pages".into()));
    }
    info!("PDF loaded: {} pages", total);

    let mut out = Vec::with_capacity(total);
    for (i, page) in pages.iter().enumerate() {
        let text = page
            .text()
            .map_err(|e| corrupt(display, format!("page {}: {:?}", i + 1, e)))?
            .all();
        debug!("Page {} → {} chars", i + 1, text.chars().count());
        on_page(i + 1, total, text.chars().count());
        out.push(text);
    }
    Ok(out)
}

fn corrupt(path: &Path, detail: String) -> ReportError {
    ReportError::CorruptPdf {
        path: path.to_path_buf(),
        detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn two_healthy_pages_join_with_newline() {
        let raw = pages(&["Patient is healthy.\n", "Patient is healthy.\n"]);
        let t = assemble_pages(&raw, &PageSeparator::Newline);
        assert_eq!(t.text, "Patient is healthy.\nPatient is healthy.");
        assert_eq!(t.page_count(), 2);
    }

    #[test]
    fn no_separator_concatenates() {
        let raw = pages(&["Patient is healthy.", "Patient is healthy."]);
        let t = assemble_pages(&raw, &PageSeparator::None);
        assert_eq!(t.text, "Patient is healthy.Patient is healthy.");
    }

    #[test]
    fn custom_separator() {
        let raw = pages(&["one", "two", "three"]);
        let t = assemble_pages(&raw, &PageSeparator::Custom("\n---\n".into()));
        assert_eq!(t.text, "one\n---\ntwo\n---\nthree");
        assert_eq!(t.char_count(), t.text.chars().count());
    }

    #[test]
    fn blank_pages_keep_their_slot() {
        let raw = pages(&["a", "  \n", "b"]);
        let t = assemble_pages(&raw, &PageSeparator::Newline);
        assert_eq!(t.text, "a\n\nb");
        assert_eq!(t.page_chars, vec![1, 0, 1]);
    }

    #[test]
    fn length_never_decreases_with_more_pages() {
        let raw = pages(&["Hb 140 g/L", "", "WBC 6.1", "Platelets 250"]);
        let mut last = 0;
        for n in 1..=raw.len() {
            let len = assemble_pages(&raw[..n], &PageSeparator::Newline)
                .text
                .chars()
                .count();
            assert!(len >= last, "{len} < {last} after {n} pages");
            last = len;
        }
    }
}
