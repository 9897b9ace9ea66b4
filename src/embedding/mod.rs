//! Text-to-vector embedding pipeline.
//!
//! Provides the [`EmbeddingProvider`] trait and a local implementation running a
//! sentence-transformers model through ONNX Runtime. The provider is created via
//! [`create_provider`] from configuration.

pub mod local;

use anyhow::Result;

/// Trait for embedding text into vectors.
///
/// Implementations produce L2-normalized vectors whose length is reported by
/// [`dimensions`](EmbeddingProvider::dimensions). A single query and a corpus
/// batch go through the same path, so both land in the same vector space.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text string into a vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text])?;
        anyhow::ensure!(
            vectors.len() == 1,
            "provider returned {} vectors for one input",
            vectors.len()
        );
        Ok(vectors.remove(0))
    }

    /// Embed a batch of text strings, preserving order and cardinality.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Return the number of dimensions this provider produces.
    fn dimensions(&self) -> usize;
}

/// Create an embedding provider from config.
///
/// Currently only `"local"` is supported (ONNX Runtime).
/// Returns an error if model files are not found — run `second-me model download` first.
pub fn create_provider(
    config: &crate::config::EmbeddingConfig,
) -> Result<Box<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "local" => {
            let provider = local::LocalEmbeddingProvider::new(config)?;
            Ok(Box::new(provider))
        }
        other => anyhow::bail!("unknown embedding provider: {other}. Supported: local"),
    }
}

/// L2-normalize a vector. Returns the input unchanged if its norm is zero.
pub fn l2_normalize(v: &[f32]) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter().map(|x| x / norm).collect()
    } else {
        v.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l2_normalize() {
        let v = vec![3.0, 4.0];
        let normalized = l2_normalize(&v);
        assert!((normalized[0] - 0.6).abs() < 1e-6);
        assert!((normalized[1] - 0.8).abs() < 1e-6);
        let norm: f32 = normalized.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_l2_normalize_zero_vector() {
        let v = vec![0.0, 0.0, 0.0];
        assert_eq!(l2_normalize(&v), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let config = crate::config::EmbeddingConfig {
            provider: "remote".into(),
            ..Default::default()
        };
        let err = create_provider(&config).err().unwrap();
        assert!(err.to_string().contains("unknown embedding provider"));
    }
}
