//! Flat (exhaustive) L2 vector index with a small binary file format.
//!
//! Layout of `index.bin`, all integers little-endian:
//!
//! | bytes | field |
//! |-------|-------|
//! | 4     | magic `SMVI` |
//! | 4     | format version (`u32`) |
//! | 4     | dimensions (`u32`) |
//! | 8     | vector count (`u64`) |
//! | 4·n·d | `f32` values, row-major |

use std::io::Write;
use std::path::{Path, PathBuf};

use ndarray::{Array2, ArrayView1};
use thiserror::Error;

const MAGIC: &[u8; 4] = b"SMVI";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 4 + 4 + 4 + 8;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("no documents to index")]
    NoVectors,
    #[error("vectors must have at least one dimension")]
    ZeroDimension,
    #[error("dimension mismatch: index has {expected} dimensions, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("index is empty")]
    Empty,
    #[error("no index at {}", path.display())]
    Missing { path: PathBuf },
    #[error("index at {} is corrupt: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },
    #[error("index I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One search hit: the stored position and its L2 distance to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

/// Dense vectors stored as rows; row `i` is the vector at position `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    vectors: Array2<f32>,
}

impl FlatIndex {
    /// Build an index from `vectors`, which must be non-empty and share one dimensionality.
    pub fn build(vectors: &[Vec<f32>]) -> Result<Self, IndexError> {
        let first = vectors.first().ok_or(IndexError::NoVectors)?;
        let dim = first.len();
        if dim == 0 {
            return Err(IndexError::ZeroDimension);
        }

        if let Some(v) = vectors.iter().find(|v| v.len() != dim) {
            return Err(IndexError::DimensionMismatch {
                expected: dim,
                actual: v.len(),
            });
        }

        let mut matrix = Array2::<f32>::zeros((vectors.len(), dim));
        for (mut row, v) in matrix.rows_mut().into_iter().zip(vectors) {
            row.assign(&ArrayView1::from(v.as_slice()));
        }
        tracing::debug!(count = matrix.nrows(), dimensions = dim, "built flat index");
        Ok(Self { vectors: matrix })
    }

    pub fn len(&self) -> usize {
        self.vectors.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dimensions(&self) -> usize {
        self.vectors.ncols()
    }

    /// Return up to `k` nearest vectors by L2 distance, closest first.
    ///
    /// Equal distances are ordered by ascending position.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, IndexError> {
        if self.is_empty() {
            return Err(IndexError::Empty);
        }
        if query.len() != self.dimensions() {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimensions(),
                actual: query.len(),
            });
        }

        let query = ArrayView1::from(query);
        let mut hits: Vec<Neighbor> = self
            .vectors
            .rows()
            .into_iter()
            .enumerate()
            .map(|(position, row)| {
                let distance = (&row - &query).mapv(|d| d * d).sum().sqrt();
                Neighbor { position, distance }
            })
            .collect();

        // sort_by is stable and positions arrive ascending
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(hits)
    }

    /// Write the index to `path` via a temporary file and rename.
    pub fn persist(&self, path: &Path) -> Result<(), IndexError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut bytes = Vec::with_capacity(HEADER_LEN + self.vectors.len() * 4);
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&(self.dimensions() as u32).to_le_bytes());
        bytes.extend_from_slice(&(self.len() as u64).to_le_bytes());
        for x in self.vectors.iter() {
            bytes.extend_from_slice(&x.to_le_bytes());
        }

        let tmp_path = path.with_extension("tmp");
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        drop(file);
        std::fs::rename(&tmp_path, path)?;

        tracing::info!(path = %path.display(), count = self.len(), "index persisted");
        Ok(())
    }

    /// Read an index written by [`persist`](Self::persist).
    ///
    /// A missing file is [`IndexError::Missing`]; anything unreadable as an
    /// index is [`IndexError::Corrupt`].
    pub fn load(path: &Path) -> Result<Self, IndexError> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(IndexError::Missing {
                    path: path.to_path_buf(),
                })
            }
            Err(e) => return Err(IndexError::Io(e)),
        };
        let corrupt = |reason: String| IndexError::Corrupt {
            path: path.to_path_buf(),
            reason,
        };

        if bytes.len() < HEADER_LEN {
            return Err(corrupt(format!("file is {} bytes, shorter than header", bytes.len())));
        }
        if &bytes[0..4] != MAGIC {
            return Err(corrupt("bad magic".into()));
        }
        let version = read_u32(&bytes[4..8]);
        if version != FORMAT_VERSION {
            return Err(corrupt(format!("unsupported format version {version}")));
        }
        let dim = read_u32(&bytes[8..12]) as usize;
        let count = read_u64(&bytes[12..20]) as usize;
        if dim == 0 || count == 0 {
            return Err(corrupt(format!("header declares {count} vectors of {dim} dimensions")));
        }

        let expected_len = count
            .checked_mul(dim)
            .and_then(|n| n.checked_mul(4))
            .and_then(|n| n.checked_add(HEADER_LEN))
            .ok_or_else(|| corrupt("header sizes overflow".into()))?;
        if bytes.len() != expected_len {
            return Err(corrupt(format!(
                "expected {expected_len} bytes, found {}",
                bytes.len()
            )));
        }

        let flat: Vec<f32> = bytes[HEADER_LEN..]
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        let vectors =
            Array2::from_shape_vec((count, dim), flat).map_err(|e| corrupt(e.to_string()))?;

        tracing::debug!(path = %path.display(), count, dimensions = dim, "index loaded");
        Ok(Self { vectors })
    }
}

fn read_u32(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

fn read_u64(b: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&b[..8]);
    u64::from_le_bytes(buf)
}
