use anyhow::{Context, Result};

use second_me::assistant::Assistant;
use second_me::config::SecondMeConfig;
use second_me::embedding;
use second_me::generation::GenerationClient;
use second_me::retrieval::{IndexedCorpus, Retriever};

/// Answer `question` with the best-matching log as context.
pub async fn ask(config: &SecondMeConfig, question: &str) -> Result<()> {
    // Index first: without one there is nothing to answer from.
    let corpus = IndexedCorpus::load(&config.index_dir())?;

    let provider = embedding::create_provider(&config.embedding)
        .context("failed to create embedding provider")?;
    let retriever = Retriever::new(provider.as_ref(), config.logs_dir(), config.index_dir());
    let client = GenerationClient::new(&config.generation);

    let assistant = Assistant::new(
        retriever,
        client,
        config.generation.model.clone(),
        config.logs_dir(),
    );
    let exchange = assistant.ask_in(&corpus, question).await?;

    println!("{}", exchange.answer);
    Ok(())
}
