//! Client for a streaming text-generation service (Ollama `/api/generate` style).
//!
//! The request is `{model, prompt, stream: true}`; the reply is newline-delimited
//! JSON reassembled by [`StreamAssembler`]. No timeout and no retries: a slow
//! service blocks the caller, a failing one surfaces immediately.

pub mod stream;

use serde::Serialize;
use thiserror::Error;

use crate::config::GenerationConfig;
pub use stream::StreamAssembler;

/// Chunk fields known to carry text, in priority order.
pub const DEFAULT_FRAGMENT_FIELDS: &[&str] = &["response", "output_text"];

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("could not reach generation service at {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("generation service returned HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("generation stream interrupted: {0}")]
    Stream(#[source] reqwest::Error),
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Clone)]
pub struct GenerationClient {
    http: reqwest::Client,
    url: String,
    fragment_fields: Vec<String>,
}

impl GenerationClient {
    pub fn new(config: &GenerationConfig) -> Self {
        let fragment_fields = if config.fragment_fields.is_empty() {
            DEFAULT_FRAGMENT_FIELDS.iter().map(|f| f.to_string()).collect()
        } else {
            config.fragment_fields.clone()
        };
        Self {
            http: reqwest::Client::new(),
            url: config.url.clone(),
            fragment_fields,
        }
    }

    /// Send `prompt` to `model` and return the reassembled, trimmed answer.
    ///
    /// Reading stops at the first chunk flagged `done`, even if the connection
    /// would deliver more.
    pub async fn generate(&self, prompt: &str, model: &str) -> Result<String, GenerationError> {
        tracing::info!(
            url = %self.url,
            model,
            prompt_chars = prompt.chars().count(),
            "requesting generation"
        );

        let mut response = self
            .http
            .post(&self.url)
            .json(&GenerateRequest {
                model,
                prompt,
                stream: true,
            })
            .send()
            .await
            .map_err(|source| GenerationError::Connection {
                url: self.url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status { status, body });
        }

        let mut assembler = StreamAssembler::new(&self.fragment_fields);
        while let Some(chunk) = response.chunk().await.map_err(GenerationError::Stream)? {
            if assembler.push(&chunk) {
                break;
            }
        }

        if !assembler.is_done() {
            tracing::warn!("generation stream ended without a completion chunk");
        }
        let skipped = assembler.skipped();
        let answer = assembler.finish();
        tracing::info!(answer_chars = answer.chars().count(), skipped, "generation complete");
        Ok(answer)
    }
}
