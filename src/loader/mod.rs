//! Document loading: turn a file on disk into ordered page texts.

mod pdf;

pub use pdf::PdfLoader;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

const MAX_LISTED_SIBLINGS: usize = 50;

/// Text of a single page, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDocument {
    /// Zero-based page position within the source file.
    pub page_index: usize,
    /// Extracted page text.
    pub text: String,
}

/// Errors raised while loading a document.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Input file does not exist.
    #[error(
        "File not found: {} (contents of {}: [{}])",
        .path.display(),
        .directory.display(),
        .siblings.join(", ")
    )]
    NotFound {
        /// Path that was requested.
        path: PathBuf,
        /// Directory that was expected to contain the file.
        directory: PathBuf,
        /// Entries that do exist in that directory.
        siblings: Vec<String>,
    },
    /// File exists but is not a readable document.
    #[error("Failed to parse {}: {reason}", .path.display())]
    Parse {
        /// Path of the unreadable document.
        path: PathBuf,
        /// Parser diagnostic.
        reason: String,
    },
    /// File exists but could not be read.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Interface implemented by document loaders.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Read the document at `path` and return its pages in order.
    async fn load(&self, path: &Path) -> Result<Vec<PageDocument>, LoadError>;
}

/// Build a [`LoadError::NotFound`] for `path`, listing what its parent directory does contain.
pub async fn missing_file_error(path: &Path) -> LoadError {
    let directory = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let siblings = list_directory(&directory).await;
    LoadError::NotFound {
        path: path.to_path_buf(),
        directory,
        siblings,
    }
}

async fn list_directory(directory: &Path) -> Vec<String> {
    let mut entries = match tokio::fs::read_dir(directory).await {
        Ok(entries) => entries,
        Err(error) => {
            tracing::debug!(directory = %directory.display(), error = %error, "Unable to list directory");
            return Vec::new();
        }
    };

    let mut names = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    names.truncate(MAX_LISTED_SIBLINGS);
    names
}
