//! PDF loader backed by `lopdf`.

use super::{DocumentLoader, LoadError, PageDocument, missing_file_error};
use async_trait::async_trait;
use lopdf::Document;
use std::path::{Path, PathBuf};

/// Loader that extracts text page by page from PDF files.
pub struct PdfLoader;

impl PdfLoader {
    /// Create a new PDF loader.
    pub const fn new() -> Self {
        Self
    }
}

impl Default for PdfLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentLoader for PdfLoader {
    async fn load(&self, path: &Path) -> Result<Vec<PageDocument>, LoadError> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(missing_file_error(path).await);
        }

        let bytes = tokio::fs::read(path).await.map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Read document");

        // Parsing is CPU-bound; keep it off the async workers.
        let owned = path.to_path_buf();
        tokio::task::spawn_blocking(move || extract_pages(&owned, &bytes))
            .await
            .map_err(|error| LoadError::Parse {
                path: path.to_path_buf(),
                reason: format!("extraction task failed: {error}"),
            })?
    }
}

fn extract_pages(path: &Path, bytes: &[u8]) -> Result<Vec<PageDocument>, LoadError> {
    let parse_error = |reason: String| LoadError::Parse {
        path: PathBuf::from(path),
        reason,
    };

    let document = Document::load_mem(bytes).map_err(|error| parse_error(error.to_string()))?;
    let pages = document.get_pages();
    if pages.is_empty() {
        return Err(parse_error("document contains no pages".into()));
    }

    let extracted = pages
        .keys()
        .enumerate()
        .map(|(page_index, page_number)| {
            let text = match document.extract_text(&[*page_number]) {
                Ok(text) => text,
                Err(error) => {
                    tracing::warn!(
                        path = %path.display(),
                        page_index,
                        error = %error,
                        "Page text extraction failed; treating page as empty"
                    );
                    String::new()
                }
            };
            PageDocument { page_index, text }
        })
        .collect::<Vec<_>>();

    tracing::debug!(path = %path.display(), pages = extracted.len(), "Extracted pages");
    Ok(extracted)
}
