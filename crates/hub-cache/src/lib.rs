//! # hub-cache
//!
//! Fetch single files of a pretrained model (`tokenizer.json`,
//! `config.json`, …) from a Hugging Face style hub and keep them in a local
//! cache, so that callers can load a tokenizer by model id without shipping
//! the file themselves.
//!
//! ## How it works
//!
//! On a call to [`ensure_file`]:
//!
//! 1. Checks `{cache_root}/{org}--{name}/{revision}/{filename}`.
//! 2. If absent, downloads `{endpoint}/{repo}/resolve/{revision}/{filename}`
//!    to a `.part` file next to the destination.
//! 3. Renames the `.part` file into place, so an interrupted download never
//!    leaves a truncated file that later looks cached.
//!
//! Subsequent calls skip the network entirely.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use hub_cache::{ensure_file, HubFile};
//!
//! let file = HubFile::new("facebook/bart-large-cnn", "tokenizer.json").unwrap();
//! let path = ensure_file(&file, None).expect("download failed");
//! println!("tokenizer at {}", path.display());
//! ```
//!
//! ## Environment variable overrides
//!
//! - `REPORT_SUMMARIZER_CACHE_DIR`: override the default cache directory.
//! - `HF_ENDPOINT`: alternative hub base URL (mirrors, air-gapped proxies).
//! - `HF_TOKEN`: bearer token for gated or private repositories.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

// ── Public constants ─────────────────────────────────────────────────────────

/// Hub base URL used when `HF_ENDPOINT` is not set.
pub const DEFAULT_ENDPOINT: &str = "https://huggingface.co";

/// Revision fetched when the caller does not pin one.
pub const DEFAULT_REVISION: &str = "main";

/// Directory name created below the platform cache dir.
const CACHE_NAMESPACE: &str = "report-summarizer";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by hub-cache operations.
#[derive(Error, Debug)]
pub enum HubCacheError {
    /// The repository id is not of the form `org/name` (or a bare `name`).
    #[error("Invalid repository id '{0}': expected 'org/name'")]
    InvalidRepo(String),

    /// Could not create or write the local cache directory.
    #[error("Cache directory error: {0}")]
    CacheDir(#[source] std::io::Error),

    /// Network download failed.
    #[error("Download failed: {0}")]
    Download(String),

    /// The hub answered, but not with the file (401, 404, …).
    #[error("HTTP {status} fetching '{url}'")]
    Status { status: u16, url: String },
}

// ── File descriptor ──────────────────────────────────────────────────────────

/// One file inside one revision of a hub repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubFile {
    repo_id: String,
    filename: String,
    revision: String,
}

impl HubFile {
    /// Describe `filename` in `repo_id` at the default revision.
    pub fn new(repo_id: &str, filename: &str) -> Result<Self, HubCacheError> {
        validate_repo_id(repo_id)?;
        Ok(Self {
            repo_id: repo_id.to_string(),
            filename: filename.to_string(),
            revision: DEFAULT_REVISION.to_string(),
        })
    }

    /// Pin a branch, tag or commit hash.
    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = revision.into();
        self
    }

    pub fn repo_id(&self) -> &str {
        &self.repo_id
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn revision(&self) -> &str {
        &self.revision
    }

    /// Download URL relative to `endpoint`.
    pub fn url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}/resolve/{}/{}",
            endpoint.trim_end_matches('/'),
            self.repo_id,
            self.revision,
            self.filename
        )
    }

    /// Location of this file below `root`.
    pub fn cached_path_in(&self, root: &Path) -> PathBuf {
        root.join(self.repo_id.replace('/', "--"))
            .join(&self.revision)
            .join(&self.filename)
    }
}

fn validate_repo_id(repo_id: &str) -> Result<(), HubCacheError> {
    let parts: Vec<&str> = repo_id.split('/').collect();
    let valid = !repo_id.is_empty()
        && parts.len() <= 2
        && parts.iter().all(|p| {
            !p.is_empty()
                && *p != "."
                && *p != ".."
                && p.chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        });
    if valid {
        Ok(())
    } else {
        Err(HubCacheError::InvalidRepo(repo_id.to_string()))
    }
}

// ── Cache directory resolution ───────────────────────────────────────────────

/// Returns the root of the on-disk model cache.
///
/// Default locations:
/// - **macOS**: `~/Library/Caches/report-summarizer/hub/`
/// - **Linux**: `~/.cache/report-summarizer/hub/`
/// - **Windows**: `%LOCALAPPDATA%\report-summarizer\hub\`
///
/// Override by setting `REPORT_SUMMARIZER_CACHE_DIR`.
pub fn cache_root() -> PathBuf {
    cache_root_from(std::env::var("REPORT_SUMMARIZER_CACHE_DIR").ok().as_deref())
}

fn cache_root_from(override_dir: Option<&str>) -> PathBuf {
    if let Some(dir) = override_dir.filter(|d| !d.is_empty()) {
        return PathBuf::from(dir).join("hub");
    }

    let base = dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir);

    base.join(CACHE_NAMESPACE).join("hub")
}

/// Hub base URL, honouring `HF_ENDPOINT`.
pub fn endpoint() -> String {
    std::env::var("HF_ENDPOINT")
        .ok()
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
}

// ── Public API ───────────────────────────────────────────────────────────────

/// Returns the cached path of `file`, or `None` if it was never downloaded.
pub fn cached_path(file: &HubFile) -> Option<PathBuf> {
    let p = file.cached_path_in(&cache_root());
    p.exists().then_some(p)
}

/// Ensures `file` is present in the local cache and returns its path.
///
/// `on_progress` receives `(bytes_downloaded, total_size_option)` during
/// the download. Pass `None` to suppress progress callbacks.
pub fn ensure_file(
    file: &HubFile,
    on_progress: Option<&dyn Fn(u64, Option<u64>)>,
) -> Result<PathBuf, HubCacheError> {
    ensure_file_in(file, &cache_root(), &endpoint(), on_progress)
}

/// [`ensure_file`] with an explicit cache root and hub endpoint.
pub fn ensure_file_in(
    file: &HubFile,
    root: &Path,
    endpoint: &str,
    on_progress: Option<&dyn Fn(u64, Option<u64>)>,
) -> Result<PathBuf, HubCacheError> {
    let dest = file.cached_path_in(root);
    if dest.exists() {
        return Ok(dest);
    }

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(HubCacheError::CacheDir)?;
    }

    let bytes = download_bytes(&file.url(endpoint), on_progress)?;

    let part = dest.with_extension("part");
    let mut out = std::fs::File::create(&part).map_err(HubCacheError::CacheDir)?;
    out.write_all(&bytes).map_err(HubCacheError::CacheDir)?;
    out.sync_all().map_err(HubCacheError::CacheDir)?;
    std::fs::rename(&part, &dest).map_err(HubCacheError::CacheDir)?;

    Ok(dest)
}

// ── Internal helpers ─────────────────────────────────────────────────────────

/// Streams a URL into a `Vec<u8>`, calling `on_progress` every 64 KiB.
fn download_bytes(
    url: &str,
    on_progress: Option<&dyn Fn(u64, Option<u64>)>,
) -> Result<Vec<u8>, HubCacheError> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("hub-cache/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| HubCacheError::Download(e.to_string()))?;

    let mut request = client.get(url);
    if let Ok(token) = std::env::var("HF_TOKEN") {
        if !token.is_empty() {
            request = request.bearer_auth(token);
        }
    }

    let response = request
        .send()
        .map_err(|e| HubCacheError::Download(format!("GET {url}: {e}")))?;

    if !response.status().is_success() {
        return Err(HubCacheError::Status {
            status: response.status().as_u16(),
            url: url.to_string(),
        });
    }

    let total = response.content_length();
    let mut buf = Vec::with_capacity(total.unwrap_or(1024 * 1024) as usize);

    let mut stream = response;
    let mut chunk = vec![0u8; 64 * 1024];
    let mut downloaded: u64 = 0;

    loop {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                downloaded += n as u64;
                if let Some(cb) = on_progress {
                    cb(downloaded, total);
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(HubCacheError::Download(format!("Read error: {e}")));
            }
        }
    }

    Ok(buf)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_root_is_deterministic() {
        let d1 = cache_root_from(None);
        let d2 = cache_root_from(None);
        assert_eq!(d1, d2);
        assert!(d1.to_str().unwrap().contains(CACHE_NAMESPACE));
    }

    #[test]
    fn cache_root_override() {
        let d = cache_root_from(Some("/tmp/report_summarizer_override"));
        assert_eq!(d, PathBuf::from("/tmp/report_summarizer_override/hub"));
    }

    #[test]
    fn empty_override_falls_back_to_default() {
        assert_eq!(cache_root_from(Some("")), cache_root_from(None));
    }

    #[test]
    fn url_layout() {
        let f = HubFile::new("facebook/bart-large-cnn", "tokenizer.json").unwrap();
        assert_eq!(
            f.url("https://huggingface.co/"),
            "https://huggingface.co/facebook/bart-large-cnn/resolve/main/tokenizer.json"
        );
        let pinned = f.with_revision("v1.0");
        assert!(pinned.url(DEFAULT_ENDPOINT).contains("/resolve/v1.0/"));
    }

    #[test]
    fn cached_path_flattens_repo_id() {
        let f = HubFile::new("facebook/bart-large-cnn", "tokenizer.json").unwrap();
        let p = f.cached_path_in(Path::new("/cache"));
        assert_eq!(
            p,
            PathBuf::from("/cache/facebook--bart-large-cnn/main/tokenizer.json")
        );
    }

    #[test]
    fn rejects_path_traversal_and_empty_ids() {
        assert!(HubFile::new("", "tokenizer.json").is_err());
        assert!(HubFile::new("../etc", "tokenizer.json").is_err());
        assert!(HubFile::new("a/b/c", "tokenizer.json").is_err());
        assert!(HubFile::new("org/", "tokenizer.json").is_err());
        assert!(HubFile::new("t5-small", "tokenizer.json").is_ok());
    }

    #[test]
    fn existing_file_skips_network() {
        let root = tempfile::tempdir().unwrap();
        let f = HubFile::new("acme/tiny", "tokenizer.json").unwrap();
        let dest = f.cached_path_in(root.path());
        std::fs::create_dir_all(dest.parent().unwrap()).unwrap();
        std::fs::write(&dest, b"{}").unwrap();

        // The endpoint is unroutable; success proves no request was made.
        let got = ensure_file_in(&f, root.path(), "http://127.0.0.1:9", None).unwrap();
        assert_eq!(got, dest);
    }
}
