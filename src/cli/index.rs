//! CLI `index` command — rebuild the vector index from every log file.

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use std::time::Duration;

use second_me::config::SecondMeConfig;
use second_me::embedding;
use second_me::retrieval::{BuildReport, Retriever};

pub fn index(config: &SecondMeConfig) -> Result<()> {
    let provider = embedding::create_provider(&config.embedding)
        .context("failed to create embedding provider")?;
    let retriever = Retriever::new(provider.as_ref(), config.logs_dir(), config.index_dir());

    let spinner = ProgressBar::new_spinner();
    spinner.set_message(format!("Embedding logs under {}", config.logs_dir().display()));
    spinner.enable_steady_tick(Duration::from_millis(120));
    let report = retriever.build_index();
    spinner.finish_and_clear();

    match report? {
        BuildReport::Indexed { count, location } => {
            println!("Indexed {count} log files into {}", location.display());
        }
        BuildReport::NoLogs => {
            println!("No logs found. Run `second-me init` or add logs first.");
        }
    }
    Ok(())
}
