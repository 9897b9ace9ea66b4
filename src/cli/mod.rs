pub mod ask;
pub mod doctor;
pub mod index;
pub mod init;
pub mod summarize;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tokio::io::AsyncWriteExt;

const HF_BASE_URL: &str = "https://huggingface.co";

/// Download the ONNX embedding model and tokenizer into the model directory.
pub async fn model_download(config: &second_me::config::EmbeddingConfig) -> Result<()> {
    let model_dir = config.model_dir();
    std::fs::create_dir_all(&model_dir)
        .with_context(|| format!("failed to create model dir: {}", model_dir.display()))?;

    let files = [
        ("model.onnx", format!("{HF_BASE_URL}/{}/resolve/main/onnx/model.onnx", config.model)),
        ("tokenizer.json", format!("{HF_BASE_URL}/{}/resolve/main/tokenizer.json", config.model)),
    ];

    for (name, url) in &files {
        let dest = model_dir.join(name);
        if dest.exists() {
            println!("{name} already exists at {}", dest.display());
            continue;
        }
        println!("Downloading {name} for {}...", config.model);
        download_file(url, &dest).await?;
        println!("Saved to {}", dest.display());
    }

    println!("Model download complete. Ready for use.");
    Ok(())
}

/// Download a file from a URL with progress bar. Uses atomic write (tmp + rename).
async fn download_file(url: &str, dest: &Path) -> Result<()> {
    let mut response = reqwest::get(url)
        .await
        .with_context(|| format!("HTTP request failed for {url}"))?;

    anyhow::ensure!(
        response.status().is_success(),
        "download failed with HTTP {}",
        response.status()
    );

    let pb = match response.content_length() {
        Some(size) => {
            let pb = ProgressBar::new(size);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("  {bar:40.cyan/blue} {bytes}/{total_bytes} ({eta})")?
                    .progress_chars("##-"),
            );
            pb
        }
        None => ProgressBar::new_spinner(),
    };

    let tmp_path = dest.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp_path)
        .await
        .with_context(|| format!("failed to create temp file: {}", tmp_path.display()))?;

    while let Some(chunk) = response.chunk().await.context("error reading response")? {
        file.write_all(&chunk)
            .await
            .context("error writing to file")?;
        pb.inc(chunk.len() as u64);
    }

    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp_path, dest)
        .await
        .context("failed to rename temp file")?;

    pb.finish_and_clear();
    Ok(())
}
