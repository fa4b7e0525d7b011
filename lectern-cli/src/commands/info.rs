//! Info and toc command implementations

use super::{book_path, AppContext};
use anyhow::{Context, Result};
use lectern_core::{Book, TocEntry};
use serde::Serialize;

/// Book info output
#[derive(Serialize)]
struct BookInfo {
    title: String,
    authors: Vec<String>,
    language: Option<String>,
    identifier: Option<String>,
    date: Option<String>,
    description: Option<String>,
    publisher: Option<String>,
    subjects: Vec<String>,
    chapters: usize,
    degraded_chapters: Vec<String>,
    toc_entries: usize,
    images: usize,
    cover: Option<String>,
}

impl From<&Book> for BookInfo {
    fn from(book: &Book) -> Self {
        let metadata = &book.metadata;
        Self {
            title: book.title().to_string(),
            authors: metadata.authors.clone(),
            language: metadata.language.clone(),
            identifier: metadata.identifier.clone(),
            date: metadata.date.clone(),
            description: metadata.description.clone(),
            publisher: metadata.publisher.clone(),
            subjects: metadata.subjects.clone(),
            chapters: book.len(),
            degraded_chapters: book.degraded_chapters().map(|c| c.href.clone()).collect(),
            toc_entries: book.toc_entries().len(),
            images: book.images.len(),
            cover: book.cover.as_ref().map(|c| c.href.clone()),
        }
    }
}

async fn load(ctx: &AppContext, input: &str) -> Result<std::sync::Arc<Book>> {
    let path = book_path(input)?;
    ctx.cache()
        .get(path)
        .await
        .with_context(|| format!("Failed to open {}", input))
}

/// Display information about a book
pub async fn info(ctx: &AppContext, input: &str, json: bool) -> Result<()> {
    let book = load(ctx, input).await?;
    let info = BookInfo::from(book.as_ref());

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("Title:       {}", info.title);
    if !info.authors.is_empty() {
        println!("Authors:     {}", info.authors.join(", "));
    }
    if let Some(language) = &info.language {
        println!("Language:    {}", language);
    }
    if let Some(date) = &info.date {
        println!("Date:        {}", date);
    }
    if let Some(desc) = &info.description {
        println!("Description: {}", desc);
    }
    if let Some(publisher) = &info.publisher {
        println!("Publisher:   {}", publisher);
    }
    if !info.subjects.is_empty() {
        println!("Subjects:    {}", info.subjects.join(", "));
    }
    println!("Chapters:    {}", info.chapters);
    println!("TOC entries: {}", info.toc_entries);
    println!("Images:      {}", info.images);
    if let Some(cover) = &info.cover {
        println!("Cover:       {}", cover);
    }
    if !info.degraded_chapters.is_empty() {
        println!("Degraded:    {}", info.degraded_chapters.join(", "));
    }

    Ok(())
}

#[derive(Serialize)]
struct TocLine {
    depth: usize,
    title: String,
    target: String,
    chapter: Option<usize>,
}

fn flatten(book: &Book, entries: &[TocEntry], depth: usize, out: &mut Vec<TocLine>) {
    for entry in entries {
        out.push(TocLine {
            depth,
            title: entry.title.clone(),
            target: entry.target.to_string(),
            chapter: book.resolve(&entry.target),
        });
        flatten(book, &entry.children, depth + 1, out);
    }
}

/// Print the table of contents
pub async fn toc(ctx: &AppContext, input: &str, json: bool) -> Result<()> {
    let book = load(ctx, input).await?;
    let mut lines = Vec::new();
    flatten(&book, &book.toc, 0, &mut lines);

    if json {
        println!("{}", serde_json::to_string_pretty(&lines)?);
        return Ok(());
    }

    for line in &lines {
        let chapter = line
            .chapter
            .map(|c| format!("[{}]", c))
            .unwrap_or_else(|| "[-]".to_string());
        println!("{}{} {}", "  ".repeat(line.depth), chapter, line.title);
    }

    Ok(())
}
