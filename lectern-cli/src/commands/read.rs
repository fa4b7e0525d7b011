//! Read command implementation

use super::{book_path, AppContext};
use anyhow::{bail, Context, Result};
use lectern_core::ReadingSession;
use std::sync::Arc;

/// Navigation applied before printing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Stay,
    Next,
    Previous,
    GoTo(usize),
}

/// Print a chapter and save the position
pub async fn read(ctx: &AppContext, input: &str, step: Step, html: bool) -> Result<()> {
    let path = book_path(input)?;
    let cache = ctx.cache();
    let store = Arc::new(ctx.progress_store().await?);

    let mut session = ReadingSession::open(&cache, store, path)
        .await
        .with_context(|| format!("Failed to open {}", input))?;

    let moved = match step {
        Step::Stay => true,
        Step::Next => session.next().await?,
        Step::Previous => session.previous().await?,
        Step::GoTo(index) => {
            if !session.go_to(index).await? {
                bail!(
                    "Chapter {} is out of range (book has {} chapters)",
                    index,
                    session.book().len()
                );
            }
            true
        }
    };
    if !moved {
        tracing::info!("Already at the edge of the book");
    }

    let chapter = session
        .current_chapter()
        .context("Current chapter missing from book")?;

    println!(
        "== [{}/{}] {} ==",
        session.chapter_index() + 1,
        session.book().len(),
        chapter.title
    );
    println!();
    if html {
        println!("{}", chapter.to_html());
    } else {
        println!("{}", chapter.plain_text());
    }

    Ok(())
}
