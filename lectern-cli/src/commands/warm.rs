//! Warm command implementation

use super::AppContext;
use anyhow::{bail, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

fn is_epub(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("epub"))
        .unwrap_or(false)
}

/// Expand directories into the EPUB files they contain
fn collect(inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        let path = Path::new(input);
        if path.is_dir() {
            let mut found: Vec<_> = fs::read_dir(path)?
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.is_file() && is_epub(p))
                .collect();
            found.sort();
            files.extend(found);
        } else if path.is_file() {
            files.push(path.to_path_buf());
        } else {
            bail!("Book not found: {}", input);
        }
    }
    Ok(files)
}

/// Build and cache books ahead of time
pub async fn warm(ctx: &AppContext, inputs: &[String], jobs: usize) -> Result<()> {
    let files = collect(inputs)?;
    if files.is_empty() {
        println!("No books found");
        return Ok(());
    }

    println!("Warming {} books", files.len());

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")?
            .progress_chars("##-"),
    );

    let cache = Arc::new(ctx.cache());
    let permits = Arc::new(Semaphore::new(jobs));
    let mut tasks = JoinSet::new();

    for file in files {
        let cache = cache.clone();
        let permits = permits.clone();
        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await;
            let result = cache.get(&file).await;
            (file, result)
        });
    }

    let mut success = 0usize;
    let mut errors = 0usize;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((_, Ok(book))) => {
                success += 1;
                pb.set_message(book.title().to_string());
            }
            Ok((file, Err(e))) => {
                errors += 1;
                tracing::error!("Failed to build {:?}: {}", file, e);
            }
            Err(e) => {
                errors += 1;
                tracing::error!("Build task failed: {}", e);
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();

    println!("Warm complete:");
    println!("  Cached: {}", success);
    println!("  Errors: {}", errors);

    if errors > 0 {
        bail!("Warm completed with {} errors", errors);
    }

    Ok(())
}
