//! Corpus scanner: collects every log document under a directory tree.

use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

/// File extension recognized as a log document.
pub const LOG_EXTENSION: &str = "md";

/// A log file and its full text, read at index-build time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Stable identifier: the path as discovered under the logs root.
    pub path: String,
    pub text: String,
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to walk {root}: {source}")]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("path {0} cannot be stored in the path list")]
    UnsupportedPath(PathBuf),
}

/// Walk `root` recursively and read every `*.md` file, sorted by file name at
/// each directory level.
///
/// A missing root yields no documents. Any read failure aborts the scan so a
/// partial corpus is never indexed.
pub fn scan_documents(root: &Path) -> Result<Vec<Document>, ScanError> {
    if !root.exists() {
        tracing::debug!(root = %root.display(), "logs directory does not exist");
        return Ok(Vec::new());
    }

    let mut documents = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| ScanError::Walk {
            root: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() || !is_log_file(entry.path()) {
            continue;
        }

        let path = entry.path();
        let text = std::fs::read_to_string(path).map_err(|source| ScanError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        // one path per line in paths.txt
        let id = path
            .to_str()
            .filter(|p| !p.contains('\n'))
            .ok_or_else(|| ScanError::UnsupportedPath(path.to_path_buf()))?
            .to_string();

        documents.push(Document { path: id, text });
    }

    tracing::info!(root = %root.display(), count = documents.len(), "scanned log documents");
    Ok(documents)
}

fn is_log_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(LOG_EXTENSION)
}
