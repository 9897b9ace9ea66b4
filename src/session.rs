//! Per-day log layout: `logs/<YYYY-MM-DD>/<NN>_<name>.md`.
//!
//! The chat log (`01_chat.md`) is append-only. The summary (`00_summary.md`) is
//! derived from it and rewritten on every `summarize`.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;

use crate::generation::{GenerationClient, GenerationError};

pub const CHAT_LOG: &str = "01_chat.md";
pub const SUMMARY: &str = "00_summary.md";

/// Files created by `init`, as `(prefix, name)`.
pub const TEMPLATES: &[(&str, &str)] = &[("01", "chat"), ("02", "thoughts"), ("03", "tasks")];

const SUMMARY_INSTRUCTION: &str =
    "Summarize the following log and list three key points, three TODOs, and three insights.";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session log I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    Written { path: PathBuf },
    /// No chat log exists for the day; nothing was written.
    NothingToSummarize,
}

/// The log directory for one calendar day.
#[derive(Debug, Clone)]
pub struct DayLog {
    date: NaiveDate,
    dir: PathBuf,
}

impl DayLog {
    pub fn for_date(logs_dir: &Path, date: NaiveDate) -> Self {
        Self {
            date,
            dir: logs_dir.join(date.format("%Y-%m-%d").to_string()),
        }
    }

    /// Today's log in local time.
    pub fn today(logs_dir: &Path) -> Self {
        Self::for_date(logs_dir, chrono::Local::now().date_naive())
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn chat_path(&self) -> PathBuf {
        self.dir.join(CHAT_LOG)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.dir.join(SUMMARY)
    }

    /// Create the day's directory and any missing template files.
    /// Returns the files that were created; existing ones are left alone.
    pub fn init_templates(&self) -> Result<Vec<PathBuf>, SessionError> {
        self.ensure_dir()?;

        let mut created = Vec::new();
        for (prefix, name) in TEMPLATES {
            let path = self.dir.join(format!("{prefix}_{name}.md"));
            let file = std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path);
            let mut file = match file {
                Ok(file) => file,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(source) => return Err(SessionError::Io { path, source }),
            };
            let heading = format!("# {} ({})\n\n", title_case(name), self.date.format("%Y-%m-%d"));
            file.write_all(heading.as_bytes())
                .map_err(|source| SessionError::Io {
                    path: path.clone(),
                    source,
                })?;
            created.push(path);
        }

        tracing::info!(dir = %self.dir.display(), created = created.len(), "log templates initialized");
        Ok(created)
    }

    /// Append one Q/A block to the chat log.
    pub fn record_exchange(&self, question: &str, answer: &str) -> Result<(), SessionError> {
        self.ensure_dir()?;

        let path = self.chat_path();
        let io_err = |source| SessionError::Io {
            path: path.clone(),
            source,
        };
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_err)?;
        write!(file, "Q: {question}\nA: {answer}\n\n").map_err(io_err)?;

        tracing::debug!(path = %path.display(), "exchange recorded");
        Ok(())
    }

    /// Summarize the day's chat log through `client` and overwrite the summary file.
    pub async fn summarize(
        &self,
        client: &GenerationClient,
        model: &str,
    ) -> Result<SummaryOutcome, SessionError> {
        let chat_path = self.chat_path();
        let log = match std::fs::read_to_string(&chat_path) {
            Ok(log) => log,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %chat_path.display(), "no chat log to summarize");
                return Ok(SummaryOutcome::NothingToSummarize);
            }
            Err(source) => {
                return Err(SessionError::Io {
                    path: chat_path,
                    source,
                })
            }
        };

        let summary = client.generate(&summary_prompt(&log), model).await?;

        let path = self.summary_path();
        std::fs::write(&path, summary).map_err(|source| SessionError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::info!(path = %path.display(), "summary written");
        Ok(SummaryOutcome::Written { path })
    }

    fn ensure_dir(&self) -> Result<(), SessionError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| SessionError::Io {
            path: self.dir.clone(),
            source,
        })
    }
}

pub fn summary_prompt(log: &str) -> String {
    format!("{SUMMARY_INSTRUCTION}\n{log}")
}

fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
