use anyhow::Result;

use second_me::config::SecondMeConfig;
use second_me::generation::GenerationClient;
use second_me::session::{DayLog, SummaryOutcome};

/// Summarize today's chat log into `00_summary.md`.
pub async fn summarize(config: &SecondMeConfig) -> Result<()> {
    let day = DayLog::today(&config.logs_dir());
    let client = GenerationClient::new(&config.generation);

    match day.summarize(&client, &config.generation.model).await? {
        SummaryOutcome::Written { path } => println!("Summary saved to {}", path.display()),
        SummaryOutcome::NothingToSummarize => println!("No chat log for today to summarize."),
    }
    Ok(())
}
