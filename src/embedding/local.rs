//! Local ONNX Runtime embedding provider.
//!
//! Implements [`EmbeddingProvider`] for sentence-transformers models exported to
//! ONNX, via `ort`. Handles tokenization, inference, pooling, and L2 normalization.

use std::sync::Mutex;

use anyhow::{Context, Result};
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;

use super::{l2_normalize, EmbeddingProvider};
use crate::config::{EmbeddingConfig, Pooling};

/// BERT-family position embedding limit.
const MAX_SEQ_LEN: usize = 512;

/// Local ONNX-based embedding provider.
pub struct LocalEmbeddingProvider {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    pooling: Pooling,
    dim: usize,
}

// Safety: Tokenizer is Send+Sync. Session is behind a Mutex.
// The Mutex guarantees exclusive access during run().
unsafe impl Send for LocalEmbeddingProvider {}
unsafe impl Sync for LocalEmbeddingProvider {}

impl LocalEmbeddingProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model_dir = config.model_dir();
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        anyhow::ensure!(
            model_path.exists(),
            "ONNX model not found at {}. Run `second-me model download` first.",
            model_path.display()
        );
        anyhow::ensure!(
            tokenizer_path.exists(),
            "Tokenizer not found at {}. Run `second-me model download` first.",
            tokenizer_path.display()
        );

        let session = Session::builder()?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(&model_path)
            .context("failed to load ONNX model")?;

        tracing::info!(model = %model_path.display(), "ONNX model loaded");

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("failed to load tokenizer: {e}"))?;

        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: MAX_SEQ_LEN,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("failed to set truncation: {e}"))?;

        tokenizer.with_padding(Some(tokenizers::PaddingParams {
            strategy: tokenizers::PaddingStrategy::BatchLongest,
            ..Default::default()
        }));

        let mut provider = Self {
            session: Mutex::new(session),
            tokenizer,
            pooling: config.pooling,
            dim: 0,
        };

        // The hidden size is a property of the exported graph; read it off one inference.
        let probe = provider.embed_batch(&["dimension probe"])?;
        provider.dim = probe.first().map(Vec::len).unwrap_or(0);
        anyhow::ensure!(provider.dim > 0, "model produced zero-dimensional embeddings");

        tracing::info!(
            model = %config.model,
            dimensions = provider.dim,
            pooling = ?provider.pooling,
            "embedding provider ready"
        );

        Ok(provider)
    }
}

impl EmbeddingProvider for LocalEmbeddingProvider {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        // Step 1: Tokenize
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("tokenization failed: {e}"))?;

        let batch_size = encodings.len();
        let seq_len = encodings[0].get_ids().len();

        // Step 2: Build flat input tensors as i64
        let mut input_ids_flat = Vec::with_capacity(batch_size * seq_len);
        let mut attention_mask_flat = Vec::with_capacity(batch_size * seq_len);

        for encoding in &encodings {
            for &id in encoding.get_ids() {
                input_ids_flat.push(id as i64);
            }
            for &mask in encoding.get_attention_mask() {
                attention_mask_flat.push(mask as i64);
            }
        }

        let shape = vec![batch_size as i64, seq_len as i64];
        let input_ids_tensor =
            Tensor::from_array((shape.clone(), input_ids_flat.into_boxed_slice()))?;
        let attention_mask_tensor =
            Tensor::from_array((shape.clone(), attention_mask_flat.clone().into_boxed_slice()))?;
        // token_type_ids: all zeros (single sentence, no segment B)
        let token_type_ids = vec![0i64; batch_size * seq_len];
        let token_type_ids_tensor =
            Tensor::from_array((shape, token_type_ids.into_boxed_slice()))?;

        // Step 3: Run ONNX inference
        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("session lock poisoned: {e}"))?;

        let outputs = session.run(ort::inputs! {
            "input_ids" => input_ids_tensor,
            "attention_mask" => attention_mask_tensor,
            "token_type_ids" => token_type_ids_tensor,
        })?;

        // Step 4: Extract token embeddings — shape [batch, seq_len, hidden]
        // The output name varies by ONNX export. Try common names, fall back to index 0.
        let token_emb_value = outputs
            .get("token_embeddings")
            .or_else(|| outputs.get("last_hidden_state"))
            .unwrap_or_else(|| &outputs[0]);

        let (shape, data) = token_emb_value
            .try_extract_tensor::<f32>()
            .context("failed to extract token embeddings tensor")?;

        let dims: &[i64] = &shape;
        anyhow::ensure!(
            dims.len() == 3 && dims[0] as usize == batch_size && dims[1] as usize == seq_len,
            "unexpected token embeddings shape: {dims:?}, expected [{batch_size}, {seq_len}, hidden]"
        );
        let hidden_dim = dims[2] as usize;
        if self.dim > 0 {
            anyhow::ensure!(
                hidden_dim == self.dim,
                "model hidden size changed from {} to {hidden_dim}",
                self.dim
            );
        }

        // Step 5: Pool, then L2 normalize
        let mut results = Vec::with_capacity(batch_size);
        for b in 0..batch_size {
            let pooled = match self.pooling {
                Pooling::Cls => {
                    let offset = b * seq_len * hidden_dim;
                    data[offset..offset + hidden_dim].to_vec()
                }
                Pooling::Mean => mean_pool(
                    &data[b * seq_len * hidden_dim..(b + 1) * seq_len * hidden_dim],
                    &attention_mask_flat[b * seq_len..(b + 1) * seq_len],
                    hidden_dim,
                ),
            };
            results.push(l2_normalize(&pooled));
        }

        Ok(results)
    }

    fn dimensions(&self) -> usize {
        self.dim
    }
}

/// Attention-masked mean over one sequence's token embeddings.
fn mean_pool(tokens: &[f32], mask: &[i64], hidden_dim: usize) -> Vec<f32> {
    let mut sum = vec![0.0f32; hidden_dim];
    let mut count = 0.0f32;

    for (s, &m) in mask.iter().enumerate() {
        if m > 0 {
            let row = &tokens[s * hidden_dim..(s + 1) * hidden_dim];
            for (acc, x) in sum.iter_mut().zip(row) {
                *acc += x;
            }
            count += 1.0;
        }
    }

    if count > 0.0 {
        for x in &mut sum {
            *x /= count;
        }
    }
    sum
}
