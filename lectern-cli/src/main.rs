//! Lectern CLI - read, inspect and cache EPUB books from the command line

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Parse and validate jobs argument (must be at least 1)
fn parse_jobs(s: &str) -> Result<usize, String> {
    let n: usize = s.parse().map_err(|_| format!("'{}' is not a valid number", s))?;
    if n < 1 {
        Err("jobs must be at least 1".to_string())
    } else {
        Ok(n)
    }
}

#[derive(Parser)]
#[command(name = "lectern")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Data directory (overrides LECTERN_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display information about a book
    Info {
        /// Book file path
        input: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the table of contents
    Toc {
        /// Book file path
        input: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a chapter and remember the position
    Read {
        /// Book file path
        input: String,

        /// Spine ordinal to open (defaults to the saved position)
        #[arg(short, long, conflicts_with_all = ["next", "previous"])]
        chapter: Option<usize>,

        /// Advance to the next chapter first
        #[arg(long, conflicts_with = "previous")]
        next: bool,

        /// Go back to the previous chapter first
        #[arg(long)]
        previous: bool,

        /// Print normalized HTML instead of plain text
        #[arg(long)]
        html: bool,
    },

    /// Show or change saved reading progress
    Progress {
        #[command(subcommand)]
        action: ProgressAction,
    },

    /// Add the scroll-position column to an existing progress database
    Migrate {
        /// Database file (defaults to the configured one)
        #[arg(long)]
        database: Option<PathBuf>,
    },

    /// Build and cache books ahead of time
    Warm {
        /// Book files or directories containing them
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Number of concurrent builds (must be at least 1)
        #[arg(short, long, default_value = "4", value_parser = parse_jobs)]
        jobs: usize,
    },

    /// List the image resources of a book
    Images {
        /// Book file path
        input: String,
    },

    /// Print the cache entry stored for a book
    DumpCache {
        /// Book file path
        input: String,

        /// Number of spine items to show
        #[arg(long, default_value = "3")]
        spine: usize,
    },

    /// Ask for a short explanation of a passage
    Explain {
        /// Text to explain
        text: String,

        /// Surrounding text
        #[arg(long, default_value = "")]
        context: String,
    },

    /// Ask for a discussion of a passage
    Discuss {
        /// Text to discuss
        text: String,

        /// Surrounding text
        #[arg(long, default_value = "")]
        context: String,
    },
}

#[derive(Subcommand)]
enum ProgressAction {
    /// Show the saved position for a book
    Show {
        /// Book file path
        input: String,
    },

    /// Store a position for a book
    Set {
        /// Book file path
        input: String,

        /// Spine ordinal
        chapter: u32,

        /// Scroll offset within the chapter
        #[arg(default_value = "0")]
        scroll: u64,
    },

    /// List every saved position, most recent first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Forget the saved position for a book
    Reset {
        /// Book file path
        input: String,

        /// Also drop the cached build of the book
        #[arg(long)]
        cache: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "lectern_cli=debug,lectern_core=debug"
    } else {
        "lectern_cli=info,lectern_core=warn"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let ctx = commands::AppContext::new(cli.data_dir);

    match cli.command {
        Commands::Info { input, json } => commands::info(&ctx, &input, json).await,

        Commands::Toc { input, json } => commands::toc(&ctx, &input, json).await,

        Commands::Read {
            input,
            chapter,
            next,
            previous,
            html,
        } => {
            let step = if next {
                commands::Step::Next
            } else if previous {
                commands::Step::Previous
            } else if let Some(index) = chapter {
                commands::Step::GoTo(index)
            } else {
                commands::Step::Stay
            };
            commands::read(&ctx, &input, step, html).await
        }

        Commands::Progress { action } => match action {
            ProgressAction::Show { input } => commands::progress_show(&ctx, &input).await,
            ProgressAction::Set {
                input,
                chapter,
                scroll,
            } => commands::progress_set(&ctx, &input, chapter, scroll).await,
            ProgressAction::List { json } => commands::progress_list(&ctx, json).await,
            ProgressAction::Reset { input, cache } => {
                commands::progress_reset(&ctx, &input, cache).await
            }
        },

        Commands::Migrate { database } => commands::migrate(&ctx, database).await,

        Commands::Warm { inputs, jobs } => commands::warm(&ctx, &inputs, jobs).await,

        Commands::Images { input } => commands::images(&ctx, &input),

        Commands::DumpCache { input, spine } => commands::dump_cache(&ctx, &input, spine).await,

        Commands::Explain { text, context } => commands::explain(&text, &context).await,

        Commands::Discuss { text, context } => commands::discuss(&text, &context).await,
    }
}
