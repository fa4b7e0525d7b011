//! Debug commands: image listing and cache entry dumps

use super::{book_path, AppContext};
use anyhow::{Context, Result};
use lectern_core::cache::{self, codec, SourceSignature};
use lectern_core::storage::{LocalStorage, StorageProvider};
use lectern_core::ContainerLoader;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "svg"];

fn has_image_extension(href: &str) -> bool {
    href.rsplit_once('.')
        .map(|(_, ext)| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn rule(title: &str) {
    println!("{}", title);
    println!("{}", "-".repeat(60));
}

/// List the image resources of a book
pub fn images(ctx: &AppContext, input: &str) -> Result<()> {
    let path = book_path(input)?;
    let package = ContainerLoader::with_limits(ctx.config.limits.clone())
        .load(path)
        .with_context(|| format!("Failed to open {}", input))?;

    rule("Image resources:");
    for (href, resource) in &package.images {
        println!("  {}", href);
        println!("    Size: {} bytes", resource.len());
    }

    println!();
    rule("Manifest items with image extensions:");
    for item in package.manifest.iter().filter(|i| has_image_extension(&i.href)) {
        println!("  {}", item.href);
        println!("    Kind: {:?} ({})", item.kind, item.media_type);
        match package.images.get(&item.href) {
            Some(resource) => println!("    Size: {} bytes", resource.len()),
            None => println!("    Size: not loaded"),
        }
    }

    println!();
    rule("Cover:");
    match &package.cover {
        Some(cover) => {
            println!("  {}", cover.href);
            println!("    Size: {} bytes", cover.resource.len());
        }
        None => println!("  (none)"),
    }

    Ok(())
}

/// Print the cache entry stored for a book without modifying it
pub async fn dump_cache(ctx: &AppContext, input: &str, spine: usize) -> Result<()> {
    let path = book_path(input)?;
    let entry = cache::entry_path(path);
    let storage = LocalStorage::new(ctx.config.cache_dir());

    if !storage.exists(&entry).await? {
        println!("No cache entry for {}", input);
        println!("  Expected at {}", storage.root().join(&entry).display());
        return Ok(());
    }

    let bytes = storage.read(&entry).await?;
    let layout = codec::layout(&bytes).context("Unreadable cache entry")?;

    println!("Entry:    {}", storage.root().join(&entry).display());
    println!("Size:     {} bytes", bytes.len());
    println!(
        "Version:  {}{}",
        layout.version,
        if layout.version == codec::FORMAT_VERSION {
            ""
        } else {
            " (unsupported)"
        }
    );
    for section in &layout.sections {
        println!("Section:  tag {} ({} bytes)", section.tag, section.data.len());
    }

    let current = SourceSignature::of(path).await?;
    match layout
        .section(codec::TAG_SIGNATURE)
        .and_then(SourceSignature::from_bytes)
    {
        Some(stored) => {
            println!(
                "Source:   {} bytes, modified {} ns",
                stored.size, stored.modified_ns
            );
            println!(
                "Fresh:    {}",
                if stored == current { "yes" } else { "no" }
            );
        }
        None => println!("Source:   (missing signature)"),
    }

    match codec::decode(&bytes) {
        Ok((_, book)) => {
            println!();
            println!("Title:    {}", book.title());
            match &book.cover {
                Some(cover) => println!("Cover:    {}", cover.href),
                None => println!("Cover:    (none)"),
            }
            println!("First {} spine items:", spine.min(book.spine.len()));
            for item in book.spine.iter().take(spine) {
                println!("  {}: {}", item.ordinal, item.href);
            }
        }
        Err(e) => println!("Book:     not decodable ({})", e),
    }

    Ok(())
}
