//! Retrieval: build a vector index over the log corpus and look up the single
//! best-matching document for a query.
//!
//! The persisted state is two files in the index directory:
//! [`INDEX_FILE`] (vectors) and [`PATHS_FILE`] (one document path per line,
//! line `i` belonging to vector `i`).

pub mod corpus;
pub mod index;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::embedding::EmbeddingProvider;
use corpus::ScanError;
use index::{FlatIndex, IndexError};

pub const INDEX_FILE: &str = "index.bin";
pub const PATHS_FILE: &str = "paths.txt";

/// Texts per encoder call; padding makes inference memory grow with batch size.
pub const EMBED_BATCH_SIZE: usize = 32;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("embedding failed: {0:#}")]
    EncodingFailure(anyhow::Error),
    #[error("index not built ({reason}). Run `second-me index` first.")]
    IndexMissing { reason: String },
    #[error("query has {actual} dimensions but the index was built with {expected}. Re-run `second-me index`.")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("indexed document {} no longer exists. Re-run `second-me index`.", path.display())]
    StaleIndex { path: PathBuf },
    #[error(transparent)]
    Index(IndexError),
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<IndexError> for RetrievalError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::Missing { .. } | IndexError::Corrupt { .. } => Self::IndexMissing {
                reason: err.to_string(),
            },
            IndexError::DimensionMismatch { expected, actual } => {
                Self::DimensionMismatch { expected, actual }
            }
            other => Self::Index(other),
        }
    }
}

/// Result of an index build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildReport {
    Indexed { count: usize, location: PathBuf },
    /// The logs directory held no documents; nothing was written.
    NoLogs,
}

/// The best-matching document for a query.
#[derive(Debug, Clone)]
pub struct RetrievedContext {
    pub path: String,
    pub text: String,
    pub distance: f32,
}

/// A loaded index together with its positionally aligned path list.
#[derive(Debug, Clone)]
pub struct IndexedCorpus {
    pub index: FlatIndex,
    pub paths: Vec<String>,
}

impl IndexedCorpus {
    /// Pair an index with its path list; lengths must match.
    pub fn new(index: FlatIndex, paths: Vec<String>) -> Result<Self, RetrievalError> {
        if index.len() != paths.len() {
            return Err(RetrievalError::IndexMissing {
                reason: format!(
                    "{} vectors but {} paths",
                    index.len(),
                    paths.len()
                ),
            });
        }
        Ok(Self { index, paths })
    }

    /// Load both files from `dir`. A missing or unusable pair reports
    /// [`RetrievalError::IndexMissing`].
    pub fn load(dir: &Path) -> Result<Self, RetrievalError> {
        let index = FlatIndex::load(&dir.join(INDEX_FILE))?;

        let paths_path = dir.join(PATHS_FILE);
        let paths = match std::fs::read_to_string(&paths_path) {
            Ok(contents) => contents.lines().map(str::to_string).collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RetrievalError::IndexMissing {
                    reason: format!("path list {} not found", paths_path.display()),
                })
            }
            Err(source) => {
                return Err(RetrievalError::Io {
                    path: paths_path,
                    source,
                })
            }
        };

        Self::new(index, paths)
    }

    /// Write both files into `dir`, replacing any previous index.
    pub fn persist(&self, dir: &Path) -> Result<(), RetrievalError> {
        self.index.persist(&dir.join(INDEX_FILE))?;

        let paths_path = dir.join(PATHS_FILE);
        let tmp_path = paths_path.with_extension("tmp");
        let io_err = |source| RetrievalError::Io {
            path: paths_path.clone(),
            source,
        };
        std::fs::write(&tmp_path, self.paths.join("\n")).map_err(io_err)?;
        std::fs::rename(&tmp_path, &paths_path).map_err(io_err)?;
        Ok(())
    }

    /// Nearest document to `query`.
    pub fn nearest(&self, query: &[f32]) -> Result<(&str, f32), RetrievalError> {
        let hit = self
            .index
            .search(query, 1)?
            .into_iter()
            .next()
            .ok_or(RetrievalError::Index(IndexError::Empty))?;
        Ok((self.paths[hit.position].as_str(), hit.distance))
    }
}

/// Orchestrates the scanner, embedding provider, and index.
pub struct Retriever<'a> {
    embedder: &'a dyn EmbeddingProvider,
    logs_dir: PathBuf,
    index_dir: PathBuf,
}

impl<'a> Retriever<'a> {
    pub fn new(
        embedder: &'a dyn EmbeddingProvider,
        logs_dir: impl Into<PathBuf>,
        index_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            embedder,
            logs_dir: logs_dir.into(),
            index_dir: index_dir.into(),
        }
    }

    /// Scan, embed and persist the whole corpus, replacing any existing index.
    pub fn build_index(&self) -> Result<BuildReport, RetrievalError> {
        let documents = corpus::scan_documents(&self.logs_dir)?;
        if documents.is_empty() {
            tracing::info!(logs = %self.logs_dir.display(), "no logs found, index left untouched");
            return Ok(BuildReport::NoLogs);
        }

        let texts: Vec<&str> = documents.iter().map(|d| d.text.as_str()).collect();
        let vectors = self.encode(&texts)?;

        let index = FlatIndex::build(&vectors)?;
        let paths = documents.into_iter().map(|d| d.path).collect();
        let corpus = IndexedCorpus::new(index, paths)?;
        corpus.persist(&self.index_dir)?;

        let count = corpus.paths.len();
        tracing::info!(
            count,
            dimensions = corpus.index.dimensions(),
            location = %self.index_dir.display(),
            "index built"
        );
        Ok(BuildReport::Indexed {
            count,
            location: self.index_dir.join(INDEX_FILE),
        })
    }

    /// Find the document nearest to `query` and return its full text.
    pub fn lookup(&self, query: &str) -> Result<RetrievedContext, RetrievalError> {
        let corpus = IndexedCorpus::load(&self.index_dir)?;
        self.lookup_in(&corpus, query)
    }

    /// Same as [`lookup`](Self::lookup) against an already loaded corpus.
    pub fn lookup_in(
        &self,
        corpus: &IndexedCorpus,
        query: &str,
    ) -> Result<RetrievedContext, RetrievalError> {
        let expected = corpus.index.dimensions();
        if self.embedder.dimensions() != expected {
            return Err(RetrievalError::DimensionMismatch {
                expected,
                actual: self.embedder.dimensions(),
            });
        }

        let query_vec = self
            .encode(&[query])?
            .pop()
            .ok_or_else(|| RetrievalError::EncodingFailure(anyhow::anyhow!("no query vector")))?;

        if query_vec.len() != expected {
            return Err(RetrievalError::DimensionMismatch {
                expected,
                actual: query_vec.len(),
            });
        }

        let (path, distance) = corpus.nearest(&query_vec)?;
        tracing::debug!(path, distance, "nearest document");

        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RetrievalError::StaleIndex { path: path.into() })
            }
            Err(source) => {
                return Err(RetrievalError::Io {
                    path: path.into(),
                    source,
                })
            }
        };

        Ok(RetrievedContext {
            path: path.to_string(),
            text,
            distance,
        })
    }

    fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, RetrievalError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(EMBED_BATCH_SIZE) {
            tracing::debug!(
                batch = batch.len(),
                done = vectors.len(),
                total = texts.len(),
                "encoding texts"
            );
            let embedded = self
                .embedder
                .embed_batch(batch)
                .map_err(RetrievalError::EncodingFailure)?;
            if embedded.len() != batch.len() {
                return Err(RetrievalError::EncodingFailure(anyhow::anyhow!(
                    "encoder returned {} vectors for {} texts",
                    embedded.len(),
                    batch.len()
                )));
            }
            vectors.extend(embedded);
        }
        Ok(vectors)
    }
}
