//! Second Me — a personal note assistant over dated plain-text logs.
//!
//! Logs live under `logs/<YYYY-MM-DD>/<NN>_<name>.md`. The assistant embeds
//! every log file into a flat L2 vector index, answers a question by handing
//! the single nearest log to a locally hosted language model as context, and
//! appends each question/answer pair to the day's chat log.
//!
//! # Pipelines
//!
//! | Operation | Flow |
//! |-----------|------|
//! | index | [`retrieval::corpus`] → [`embedding`] → [`retrieval::index`] → `index/` |
//! | ask | [`embedding`] → [`retrieval::index`] → [`generation`] → [`session`] |
//! | summarize | [`session`] → [`generation`] → `00_summary.md` |
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`embedding`] — Text-to-vector embedding via ONNX Runtime
//! - [`retrieval`] — Corpus scanning, the vector index, and nearest-document lookup
//! - [`generation`] — Streaming client for the text-generation service
//! - [`session`] — Per-day chat logs, templates, and summaries
//! - [`assistant`] — The end-to-end `ask` pipeline

pub mod assistant;
pub mod config;
pub mod embedding;
pub mod generation;
pub mod retrieval;
pub mod session;
