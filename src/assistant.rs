//! The `ask` pipeline: retrieve context, generate an answer, log the exchange.
//!
//! Stages run strictly in order. A failure at any stage returns immediately, so
//! an exchange is only written to the chat log once an answer exists.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

use crate::generation::{GenerationClient, GenerationError};
use crate::retrieval::{IndexedCorpus, RetrievalError, RetrievedContext, Retriever};
use crate::session::{DayLog, SessionError};

#[derive(Debug, Error)]
pub enum AskError {
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// A completed question/answer round.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub question: String,
    pub answer: String,
    /// Path of the document used as context.
    pub context_path: String,
}

pub fn answer_prompt(context: &str, question: &str) -> String {
    format!("Answer using the following information as reference:\n{context}\nQuestion: {question}")
}

pub struct Assistant<'a> {
    retriever: Retriever<'a>,
    client: GenerationClient,
    model: String,
    logs_dir: PathBuf,
    date: Option<NaiveDate>,
}

impl<'a> Assistant<'a> {
    pub fn new(
        retriever: Retriever<'a>,
        client: GenerationClient,
        model: impl Into<String>,
        logs_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            retriever,
            client,
            model: model.into(),
            logs_dir: logs_dir.into(),
            date: None,
        }
    }

    /// Log exchanges under `date` instead of today.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub async fn ask(&self, question: &str) -> Result<Exchange, AskError> {
        let context = self.retriever.lookup(question)?;
        self.answer(question, context).await
    }

    /// Same as [`ask`](Self::ask) against an already loaded corpus.
    pub async fn ask_in(
        &self,
        corpus: &IndexedCorpus,
        question: &str,
    ) -> Result<Exchange, AskError> {
        let context = self.retriever.lookup_in(corpus, question)?;
        self.answer(question, context).await
    }

    async fn answer(
        &self,
        question: &str,
        context: RetrievedContext,
    ) -> Result<Exchange, AskError> {
        let RetrievedContext { path, text, distance } = context;
        tracing::info!(context = %path, distance, "context retrieved");

        let answer = self
            .client
            .generate(&answer_prompt(&text, question), &self.model)
            .await?;

        let day = match self.date {
            Some(date) => DayLog::for_date(&self.logs_dir, date),
            None => DayLog::today(&self.logs_dir),
        };
        day.record_exchange(question, &answer)?;

        Ok(Exchange {
            question: question.to_string(),
            answer,
            context_path: path,
        })
    }
}
