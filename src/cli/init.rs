//! CLI `init` command — create today's log templates.

use anyhow::Result;

use second_me::config::SecondMeConfig;
use second_me::session::DayLog;

pub fn init(config: &SecondMeConfig) -> Result<()> {
    let day = DayLog::today(&config.logs_dir());
    let created = day.init_templates()?;

    for path in &created {
        println!("  created {}", path.display());
    }
    println!("Initialized log templates under {}/", day.dir().display());
    Ok(())
}
