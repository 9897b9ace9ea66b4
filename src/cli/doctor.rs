//! CLI `doctor` command — report configuration, model files, index and log state.

use anyhow::Result;

use second_me::config::SecondMeConfig;
use second_me::retrieval::{IndexedCorpus, RetrievalError};
use second_me::session::DayLog;

pub fn doctor(config: &SecondMeConfig) -> Result<()> {
    println!("Second Me Health Report");
    println!("=======================");
    println!();
    println!("Logs directory:    {}", config.logs_dir().display());
    println!("Index directory:   {}", config.index_dir().display());
    println!();

    let model_dir = config.embedding.model_dir();
    println!("Embedding model:   {} ({:?} pooling)", config.embedding.model, config.embedding.pooling);
    for file in ["model.onnx", "tokenizer.json"] {
        let path = model_dir.join(file);
        let status = if path.exists() { "OK" } else { "MISSING" };
        println!("  {file:<16} {status}  {}", path.display());
    }
    if !model_dir.join("model.onnx").exists() {
        println!("  Run `second-me model download` to fetch it.");
    }
    println!();

    println!("Generation:        {} @ {}", config.generation.model, config.generation.url);
    println!("  Fragment fields: {}", config.generation.fragment_fields.join(", "));
    println!();

    match IndexedCorpus::load(&config.index_dir()) {
        Ok(corpus) => {
            println!("Index:             OK");
            println!("  Documents:       {}", corpus.paths.len());
            println!("  Dimensions:      {}", corpus.index.dimensions());
            let missing = corpus
                .paths
                .iter()
                .filter(|p| !std::path::Path::new(p).exists())
                .count();
            if missing > 0 {
                println!("  WARNING: {missing} indexed file(s) no longer exist. Run `second-me index`.");
            }
        }
        Err(RetrievalError::IndexMissing { reason }) => {
            println!("Index:             not built ({reason})");
            println!("  Run `second-me index` to build it.");
        }
        Err(e) => println!("Index:             ERROR ({e})"),
    }
    println!();

    let today = DayLog::today(&config.logs_dir());
    let exists = |p: &std::path::Path| if p.exists() { "present" } else { "absent" };
    println!("Today ({}):", today.date());
    println!("  Chat log:        {}", exists(today.chat_path().as_path()));
    println!("  Summary:         {}", exists(today.summary_path().as_path()));

    Ok(())
}
