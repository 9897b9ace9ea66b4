#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use second_me::embedding::{l2_normalize, EmbeddingProvider};
use serde_json::Value;

pub const TEST_DIM: usize = 64;

/// Deterministic bag-of-words embedder: each lowercase token is hashed
/// (FNV-1a) into one of `dim` buckets, then the counts are L2-normalized.
/// Identical texts always map to identical vectors.
pub struct HashEmbedder {
    pub dim: usize,
}

impl HashEmbedder {
    pub fn new() -> Self {
        Self { dim: TEST_DIM }
    }
}

impl EmbeddingProvider for HashEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut v = vec![0.0f32; self.dim];
                for token in text.split_whitespace() {
                    v[fnv1a(&token.to_lowercase()) as usize % self.dim] += 1.0;
                }
                l2_normalize(&v)
            })
            .collect())
    }

    fn dimensions(&self) -> usize {
        self.dim
    }
}

/// [`HashEmbedder`] that records the size of every batch it is given.
/// Uses a wide space so large corpora stay collision-free.
pub struct RecordingEmbedder {
    inner: HashEmbedder,
    batches: Mutex<Vec<usize>>,
}

impl RecordingEmbedder {
    pub fn new() -> Self {
        Self {
            inner: HashEmbedder { dim: 4096 },
            batches: Mutex::new(Vec::new()),
        }
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().clone()
    }
}

impl EmbeddingProvider for RecordingEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.batches.lock().unwrap().push(texts.len());
        self.inner.embed_batch(texts)
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}

/// Embedder whose backend is unavailable.
pub struct FailingEmbedder;

impl EmbeddingProvider for FailingEmbedder {
    fn embed_batch(&self, _texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        anyhow::bail!("model backend unavailable")
    }

    fn dimensions(&self) -> usize {
        TEST_DIM
    }
}

fn fnv1a(s: &str) -> u64 {
    s.bytes().fold(0xcbf29ce484222325, |h, b| {
        (h ^ b as u64).wrapping_mul(0x100000001b3)
    })
}

/// Write `text` to `root/rel`, creating parent directories.
pub fn write_log(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, text).unwrap();
}

/// A small corpus of distinct logs across two days.
pub fn seed_corpus(logs: &Path) -> Vec<(&'static str, &'static str)> {
    let docs = vec![
        (
            "2024-05-01/02_thoughts.md",
            "Rust borrow checker finally clicked after rewriting the parser",
        ),
        (
            "2024-05-01/03_tasks.md",
            "buy groceries: eggs milk bread coffee beans",
        ),
        (
            "2024-05-02/02_thoughts.md",
            "Went hiking on the mountain trail, saw a deer near the lake",
        ),
        (
            "2024-05-02/03_tasks.md",
            "renew passport and book flights to Osaka in October",
        ),
    ];
    for (rel, text) in &docs {
        write_log(logs, rel, text);
    }
    docs
}

/// In-process stand-in for the generation service.
pub struct MockService {
    pub url: String,
    pub requests: Arc<Mutex<Vec<Value>>>,
}

impl MockService {
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }
}

/// Serve `reply(request_body)` on `127.0.0.1:<random>/api/generate`.
pub async fn spawn_service<F>(reply: F) -> MockService
where
    F: Fn(&Value) -> (StatusCode, String) + Send + Sync + 'static,
{
    let reply = Arc::new(reply);
    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&requests);

    let app = Router::new().route(
        "/api/generate",
        post(move |Json(body): Json<Value>| {
            let reply = Arc::clone(&reply);
            let seen = Arc::clone(&seen);
            async move {
                seen.lock().unwrap().push(body.clone());
                reply(&body)
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockService {
        url: format!("http://{addr}/api/generate"),
        requests,
    }
}

/// Serve a fixed newline-delimited body with HTTP 200.
pub async fn spawn_ndjson(body: &str) -> MockService {
    let body = body.to_string();
    spawn_service(move |_| (StatusCode::OK, body.clone())).await
}

/// Reply with the prompt it was given, split across two fragments.
pub async fn spawn_echo() -> MockService {
    spawn_service(|req| {
        let prompt = req["prompt"].as_str().unwrap_or_default();
        let mid = prompt.char_indices().nth(prompt.chars().count() / 2).map_or(0, |(i, _)| i);
        let body = format!(
            "{}\n{}\n{}\n",
            serde_json::json!({ "response": &prompt[..mid] }),
            serde_json::json!({ "output_text": &prompt[mid..] }),
            serde_json::json!({ "done": true }),
        );
        (StatusCode::OK, body)
    })
    .await
}

/// Raw HTTP/1.1 server that sends `lines` as chunked NDJSON, then keeps the
/// connection open without the terminating zero-length chunk.
pub async fn spawn_unterminated_stream(lines: &[&str]) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let chunks: Vec<String> = lines.iter().map(|line| format!("{line}\n")).collect();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        // consume the request: headers, then Content-Length bytes of body
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        let header_end = loop {
            let n = socket.read(&mut buf).await.unwrap();
            assert!(n > 0, "client closed before sending a request");
            request.extend_from_slice(&buf[..n]);
            if let Some(pos) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let headers = String::from_utf8_lossy(&request[..header_end]).to_lowercase();
        let content_length: usize = headers
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .map_or(0, |v| v.trim().parse().unwrap());
        while request.len() < header_end + content_length {
            let n = socket.read(&mut buf).await.unwrap();
            assert!(n > 0, "client closed mid-request");
            request.extend_from_slice(&buf[..n]);
        }

        let mut response = String::from(
            "HTTP/1.1 200 OK\r\nContent-Type: application/x-ndjson\r\nTransfer-Encoding: chunked\r\n\r\n",
        );
        for chunk in &chunks {
            response.push_str(&format!("{:x}\r\n{chunk}\r\n", chunk.len()));
        }
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.flush().await.unwrap();

        // `socket` stays open for as long as the runtime runs
        std::future::pending::<()>().await;
    });

    format!("http://{addr}/api/generate")
}

/// A URL on which nothing is listening.
pub async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/api/generate")
}

pub fn generation_config(url: &str) -> second_me::config::GenerationConfig {
    second_me::config::GenerationConfig {
        url: url.to_string(),
        ..Default::default()
    }
}
