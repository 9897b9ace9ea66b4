mod helpers;

use axum::http::StatusCode;
use chrono::NaiveDate;
use helpers::{dead_url, generation_config, seed_corpus, spawn_echo, spawn_service, HashEmbedder};
use second_me::assistant::{answer_prompt, AskError, Assistant};
use second_me::generation::{GenerationClient, GenerationError};
use second_me::retrieval::{IndexedCorpus, RetrievalError, Retriever};
use second_me::session::DayLog;
use tempfile::TempDir;

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 3).unwrap()
}

#[tokio::test]
async fn ask_grounds_prompt_in_nearest_log_and_records_exchange() {
    let tmp = TempDir::new().unwrap();
    let logs = tmp.path().join("logs");
    let index = tmp.path().join("index");
    seed_corpus(&logs);
    let embedder = HashEmbedder::new();
    Retriever::new(&embedder, &logs, &index).build_index().unwrap();

    let service = spawn_echo().await;
    let assistant = Assistant::new(
        Retriever::new(&embedder, &logs, &index),
        GenerationClient::new(&generation_config(&service.url)),
        "mistral",
        &logs,
    )
    .with_date(date());

    let question = "when do I book flights to Osaka";
    let exchange = assistant.ask(question).await.unwrap();

    let context = "renew passport and book flights to Osaka in October";
    assert!(exchange.context_path.ends_with("2024-05-02/03_tasks.md"));
    assert_eq!(exchange.answer, answer_prompt(context, question));

    let requests = service.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["model"], "mistral");
    assert_eq!(requests[0]["prompt"], answer_prompt(context, question));

    let chat = std::fs::read_to_string(DayLog::for_date(&logs, date()).chat_path()).unwrap();
    assert_eq!(chat, format!("Q: {question}\nA: {}\n\n", exchange.answer));
}

#[tokio::test]
async fn ask_without_index_fails_before_generation() {
    let tmp = TempDir::new().unwrap();
    let logs = tmp.path().join("logs");
    let embedder = HashEmbedder::new();
    let service = spawn_echo().await;
    let assistant = Assistant::new(
        Retriever::new(&embedder, &logs, tmp.path().join("index")),
        GenerationClient::new(&generation_config(&service.url)),
        "mistral",
        &logs,
    )
    .with_date(date());

    let err = assistant.ask("anything").await.unwrap_err();
    assert!(matches!(
        err,
        AskError::Retrieval(RetrievalError::IndexMissing { .. })
    ));
    assert!(service.requests().is_empty());
    assert!(!DayLog::for_date(&logs, date()).chat_path().exists());
}

#[tokio::test]
async fn generation_failure_leaves_chat_log_untouched() {
    let tmp = TempDir::new().unwrap();
    let logs = tmp.path().join("logs");
    let index = tmp.path().join("index");
    seed_corpus(&logs);
    let embedder = HashEmbedder::new();
    Retriever::new(&embedder, &logs, &index).build_index().unwrap();

    let service =
        spawn_service(|_| (StatusCode::SERVICE_UNAVAILABLE, "loading model".to_string())).await;
    let assistant = Assistant::new(
        Retriever::new(&embedder, &logs, &index),
        GenerationClient::new(&generation_config(&service.url)),
        "mistral",
        &logs,
    )
    .with_date(date());

    let err = assistant.ask("hiking").await.unwrap_err();
    assert!(matches!(
        err,
        AskError::Generation(GenerationError::Status { .. })
    ));
    assert!(!DayLog::for_date(&logs, date()).chat_path().exists());
}

#[tokio::test]
async fn unreachable_service_is_reported() {
    let tmp = TempDir::new().unwrap();
    let logs = tmp.path().join("logs");
    let index = tmp.path().join("index");
    seed_corpus(&logs);
    let embedder = HashEmbedder::new();
    Retriever::new(&embedder, &logs, &index).build_index().unwrap();

    let url = dead_url().await;
    let assistant = Assistant::new(
        Retriever::new(&embedder, &logs, &index),
        GenerationClient::new(&generation_config(&url)),
        "mistral",
        &logs,
    )
    .with_date(date());

    let err = assistant.ask("groceries").await.unwrap_err();
    assert!(matches!(
        err,
        AskError::Generation(GenerationError::Connection { .. })
    ));
}

#[tokio::test]
async fn ask_in_uses_preloaded_corpus() {
    let tmp = TempDir::new().unwrap();
    let logs = tmp.path().join("logs");
    let index = tmp.path().join("index");
    seed_corpus(&logs);
    let embedder = HashEmbedder::new();
    Retriever::new(&embedder, &logs, &index).build_index().unwrap();
    let corpus = IndexedCorpus::load(&index).unwrap();
    // the loaded corpus is used even after the files are gone
    std::fs::remove_dir_all(&index).unwrap();

    let service = spawn_echo().await;
    let assistant = Assistant::new(
        Retriever::new(&embedder, &logs, &index),
        GenerationClient::new(&generation_config(&service.url)),
        "mistral",
        &logs,
    )
    .with_date(date());

    let exchange = assistant.ask_in(&corpus, "went hiking on the mountain trail").await.unwrap();
    assert!(exchange.context_path.ends_with("2024-05-02/02_thoughts.md"));
    assert!(DayLog::for_date(&logs, date()).chat_path().exists());
}
