//! Progress and migrate command implementations

use super::{book_path, AppContext};
use anyhow::{Context, Result};
use lectern_core::progress::{migrate as migrations, open_pool};
use lectern_core::{BookId, ProgressStore, ReadingProgress};
use std::path::{Path, PathBuf};

fn describe(progress: &ReadingProgress) -> String {
    let saved = progress
        .updated_at
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());
    format!(
        "chapter {}, scroll {} (saved {})",
        progress.chapter_index, progress.scroll_position, saved
    )
}

/// Show the saved position for a book
pub async fn progress_show(ctx: &AppContext, input: &str) -> Result<()> {
    let id = BookId::from_path(Path::new(input));
    let store = ctx.progress_store().await?;
    let progress = store.load(&id).await;
    println!("{}: {}", input, describe(&progress));
    Ok(())
}

/// Store a position for a book
pub async fn progress_set(ctx: &AppContext, input: &str, chapter: u32, scroll: u64) -> Result<()> {
    let path = book_path(input)?;
    let store = ctx.progress_store().await?;
    let progress = store
        .save(&BookId::from_path(path), chapter, scroll)
        .await
        .context("Failed to save progress")?;
    println!("{}: {}", input, describe(&progress));
    Ok(())
}

/// List every saved position
pub async fn progress_list(ctx: &AppContext, json: bool) -> Result<()> {
    let store = ctx.progress_store().await?;
    let rows = store.list().await.context("Failed to list progress")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No saved progress");
        return Ok(());
    }
    for progress in &rows {
        println!("{}  {}", progress.book_id, describe(progress));
    }
    Ok(())
}

/// Forget the saved position, optionally dropping the cached build too
pub async fn progress_reset(ctx: &AppContext, input: &str, cache: bool) -> Result<()> {
    let path = Path::new(input);
    let store = ctx.progress_store().await?;
    let removed = store
        .remove(&BookId::from_path(path))
        .await
        .context("Failed to reset progress")?;

    if removed {
        println!("Progress reset for {}", input);
    } else {
        println!("No saved progress for {}", input);
    }

    if cache {
        ctx.cache()
            .invalidate(path)
            .await
            .context("Failed to drop cache entry")?;
        println!("Cache entry dropped for {}", input);
    }
    Ok(())
}

/// Add the scroll-position column to an existing database
pub async fn migrate(ctx: &AppContext, database: Option<PathBuf>) -> Result<()> {
    let path = database.unwrap_or_else(|| ctx.config.database_path().to_path_buf());
    let pool = open_pool(&path, false)
        .await
        .with_context(|| format!("Failed to open database: {}", path.display()))?;

    let outcome = migrations::migrate_scroll_position(&pool).await;
    pool.close().await;
    let outcome = outcome.context("Migration failed")?;

    println!("{}: {}", path.display(), outcome);
    Ok(())
}
