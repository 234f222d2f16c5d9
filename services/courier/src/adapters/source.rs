//! services/courier/src/adapters/source.rs
//!
//! Reads stored source files and manages the upload directory they live in.

use async_trait::async_trait;
use dailylit_core::domain::SourceKind;
use dailylit_core::ports::{PortError, PortResult, SourceReader};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Implements `SourceReader` over the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct FileSourceReader;

impl FileSourceReader {
    pub fn new() -> Self {
        Self
    }
}

fn io_error(path: &str, e: std::io::Error) -> PortError {
    match e.kind() {
        ErrorKind::NotFound => PortError::NotFound(format!("No such file: {}", path)),
        _ => PortError::Unavailable(format!("Failed to read {}: {}", path, e)),
    }
}

#[async_trait]
impl SourceReader for FileSourceReader {
    async fn read_text(&self, locator: &str, kind: SourceKind) -> PortResult<String> {
        let bytes = tokio::fs::read(locator)
            .await
            .map_err(|e| io_error(locator, e))?;
        debug!(locator, bytes = bytes.len(), kind = %kind, "Read source file.");

        match kind {
            // Invalid UTF-8 sequences become U+FFFD rather than failing the read.
            SourceKind::PlainText => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            SourceKind::Pdf => {
                let locator = locator.to_string();
                tokio::task::spawn_blocking(move || {
                    pdf_extract::extract_text_from_mem(&bytes).map_err(|e| {
                        PortError::Unsupported(format!(
                            "Failed to extract text from {}: {}",
                            locator, e
                        ))
                    })
                })
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))?
            }
        }
    }
}

//=========================================================================================
// Upload Directory
//=========================================================================================

/// Copies `source` into `upload_dir`, never overwriting an existing file.
///
/// A name clash gets a numeric suffix: `book.txt`, `book-1.txt`, `book-2.txt`.
pub async fn store_upload(upload_dir: &Path, source: &Path) -> std::io::Result<PathBuf> {
    let file_name = source.file_name().ok_or_else(|| {
        std::io::Error::new(
            ErrorKind::InvalidInput,
            format!("{} is not a file", source.display()),
        )
    })?;
    tokio::fs::create_dir_all(upload_dir).await?;

    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = Path::new(file_name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());

    let mut target = upload_dir.join(file_name);
    let mut counter = 1;
    while tokio::fs::try_exists(&target).await? {
        let name = match &extension {
            Some(ext) => format!("{}-{}.{}", stem, counter, ext),
            None => format!("{}-{}", stem, counter),
        };
        target = upload_dir.join(name);
        counter += 1;
    }

    tokio::fs::copy(source, &target).await?;
    Ok(target)
}

/// Removes a stored source file. A file that is already gone is not an error.
pub async fn remove_upload(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "Source file was already removed.");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn reads_plain_text_replacing_invalid_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("book.txt");
        std::fs::write(&path, b"Caf\xff au lait.").unwrap();

        let text = FileSourceReader::new()
            .read_text(path.to_str().unwrap(), SourceKind::PlainText)
            .await
            .unwrap();

        assert_eq!(text, "Caf\u{FFFD} au lait.");
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gone.txt");

        let result = FileSourceReader::new()
            .read_text(path.to_str().unwrap(), SourceKind::PlainText)
            .await;

        assert!(matches!(result, Err(PortError::NotFound(_))));
    }

    #[tokio::test]
    async fn garbage_pdf_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf at all").unwrap();

        let result = FileSourceReader::new()
            .read_text(path.to_str().unwrap(), SourceKind::Pdf)
            .await;

        assert!(matches!(result, Err(PortError::Unsupported(_))));
    }

    #[tokio::test]
    async fn uploads_never_overwrite_each_other() {
        let source_dir = TempDir::new().unwrap();
        let upload_dir = TempDir::new().unwrap();
        let source = source_dir.path().join("Book.TXT");
        std::fs::write(&source, "Some text.").unwrap();

        let first = store_upload(upload_dir.path(), &source).await.unwrap();
        let second = store_upload(upload_dir.path(), &source).await.unwrap();
        let third = store_upload(upload_dir.path(), &source).await.unwrap();

        assert_eq!(first, upload_dir.path().join("Book.TXT"));
        assert_eq!(second, upload_dir.path().join("Book-1.txt"));
        assert_eq!(third, upload_dir.path().join("Book-2.txt"));
        assert_eq!(std::fs::read_to_string(&third).unwrap(), "Some text.");
    }

    #[tokio::test]
    async fn removing_twice_is_harmless() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("book.txt");
        std::fs::write(&path, "x").unwrap();

        remove_upload(&path).await.unwrap();
        remove_upload(&path).await.unwrap();

        assert!(!path.exists());
    }
}
