//! Input resolution: turn a local path or an uploaded byte buffer into a
//! PDF file on disk the extractor can open.
//!
//! Uploads are written to a [`NamedTempFile`] that lives inside
//! [`ResolvedInput::Staged`]. The file is removed when the value is dropped,
//! whether or not the pipeline succeeded. Both paths validate the
//! `%PDF` magic bytes so callers get [`ReportError::NotAPdf`] rather than an
//! opaque parser failure.

use crate::error::ReportError;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// A PDF ready to be opened by path.
#[derive(Debug)]
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was an in-memory upload written to a scratch file.
    /// The `NamedTempFile` is kept alive until extraction is done.
    Staged {
        name: PathBuf,
        file: NamedTempFile,
    },
}

impl ResolvedInput {
    /// Filesystem path to open.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Staged { file, .. } => file.path(),
        }
    }

    /// Name to show in errors and logs: the local path, or the upload name.
    pub fn display_path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Staged { name, .. } => name,
        }
    }
}

/// Resolve a local file path, validating existence, permissions and magic bytes.
pub fn resolve_local(path: &Path) -> Result<ResolvedInput, ReportError> {
    let path = path.to_path_buf();

    if !path.exists() {
        return Err(ReportError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(f) => {
            let mut head = Vec::with_capacity(4);
            f.take(4)
                .read_to_end(&mut head)
                .map_err(|e| ReportError::CorruptPdf {
                    path: path.clone(),
                    detail: e.to_string(),
                })?;
            check_magic(&head, &path)?;
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ReportError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(ReportError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

/// Write an uploaded PDF to a scratch file under `temp_dir` (or the system
/// temp dir). `name` is only used for messages.
pub fn stage_bytes(
    bytes: &[u8],
    name: &str,
    temp_dir: Option<&Path>,
) -> Result<ResolvedInput, ReportError> {
    let name = PathBuf::from(name);
    check_magic(bytes, &name)?;

    let mut builder = tempfile::Builder::new();
    builder.prefix("report-").suffix(".pdf");
    let mut file = match temp_dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
    .map_err(|source| ReportError::TempFile { source })?;

    file.write_all(bytes)
        .and_then(|_| file.flush())
        .map_err(|source| ReportError::TempFile { source })?;

    debug!(
        "Staged upload '{}' ({} bytes) at {}",
        name.display(),
        bytes.len(),
        file.path().display()
    );
    Ok(ResolvedInput::Staged { name, file })
}

fn check_magic(head: &[u8], path: &Path) -> Result<(), ReportError> {
    if head.len() >= 4 && &head[..4] == PDF_MAGIC {
        return Ok(());
    }
    let mut magic = [0u8; 4];
    let n = head.len().min(4);
    magic[..n].copy_from_slice(&head[..n]);
    Err(ReportError::NotAPdf {
        path: path.to_path_buf(),
        magic,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_not_found() {
        let err = resolve_local(Path::new("/definitely/not/here.pdf")).unwrap_err();
        assert!(matches!(err, ReportError::FileNotFound { .. }));
    }

    #[test]
    fn local_pdf_resolves_to_its_own_path() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("report.pdf");
        std::fs::write(&p, b"%PDF-1.7\n%%EOF\n").unwrap();
        let resolved = resolve_local(&p).unwrap();
        assert!(matches!(resolved, ResolvedInput::Local(_)));
        assert_eq!(resolved.path(), p.as_path());
        drop(resolved);
        assert!(p.exists());
    }

    #[test]
    fn non_pdf_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("notes.pdf");
        std::fs::write(&p, b"hello world").unwrap();
        match resolve_local(&p).unwrap_err() {
            ReportError::NotAPdf { magic, .. } => assert_eq!(&magic, b"hell"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn tiny_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("a.pdf");
        std::fs::write(&p, b"%P").unwrap();
        assert!(matches!(
            resolve_local(&p).unwrap_err(),
            ReportError::NotAPdf { .. }
        ));
    }

    #[test]
    fn staged_file_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let staged = stage_bytes(b"%PDF-1.5\n%%EOF\n", "upload.pdf", Some(dir.path())).unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());
        assert!(path.starts_with(dir.path()));
        assert_eq!(staged.display_path(), Path::new("upload.pdf"));

        drop(staged);
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn non_pdf_upload_never_touches_disk() {
        let dir = tempfile::tempdir().unwrap();
        let err = stage_bytes(b"GIF89a", "x.gif", Some(dir.path())).unwrap_err();
        assert!(matches!(err, ReportError::NotAPdf { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
