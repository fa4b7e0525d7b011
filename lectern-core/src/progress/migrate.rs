//! Progress table schema and its migrations
//!
//! Table creation and the column migrations are driven by the same column
//! list, so a freshly created table and a migrated one are identical.

use crate::error::StoreError;
use sqlx::SqlitePool;
use tracing::{debug, info};

pub const TABLE: &str = "reading_progress";

/// `(name, definition)` for every column, in creation order
pub(crate) const COLUMNS: &[(&str, &str)] = &[
    ("book_id", "TEXT PRIMARY KEY"),
    ("chapter_index", "INTEGER NOT NULL DEFAULT 0"),
    ("scroll_position", "INTEGER NOT NULL DEFAULT 0"),
    ("updated_at", "TEXT NOT NULL"),
];

const SCROLL_POSITION: &str = "scroll_position";

/// What a column migration did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// The column was added
    Added,
    /// The column already existed; nothing changed
    AlreadyPresent,
    /// The progress table does not exist; nothing changed
    TableMissing,
}

impl std::fmt::Display for MigrationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            MigrationOutcome::Added => "column added",
            MigrationOutcome::AlreadyPresent => "column already present",
            MigrationOutcome::TableMissing => "table missing",
        };
        f.write_str(text)
    }
}

fn create_table_sql() -> String {
    let columns: Vec<String> = COLUMNS
        .iter()
        .map(|(name, definition)| format!("{} {}", name, definition))
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        TABLE,
        columns.join(", ")
    )
}

fn column_definition(name: &str) -> Option<&'static str> {
    COLUMNS
        .iter()
        .find(|(column, _)| *column == name)
        .map(|(_, definition)| *definition)
}

async fn existing_columns(pool: &SqlitePool) -> Result<Vec<String>, StoreError> {
    let columns = sqlx::query_scalar::<_, String>("SELECT name FROM pragma_table_info(?1)")
        .bind(TABLE)
        .fetch_all(pool)
        .await?;
    Ok(columns)
}

/// Add the scroll-position column to an existing progress table.
///
/// Idempotent. On a database without the table this reports
/// [`MigrationOutcome::TableMissing`] and changes nothing.
pub async fn migrate_scroll_position(pool: &SqlitePool) -> Result<MigrationOutcome, StoreError> {
    let columns = existing_columns(pool).await?;
    if columns.is_empty() {
        debug!(table = TABLE, "Progress table missing, nothing to migrate");
        return Ok(MigrationOutcome::TableMissing);
    }
    if columns.iter().any(|c| c == SCROLL_POSITION) {
        return Ok(MigrationOutcome::AlreadyPresent);
    }

    let definition = column_definition(SCROLL_POSITION).ok_or_else(|| {
        StoreError::Unavailable(format!("no definition for column {}", SCROLL_POSITION))
    })?;
    let sql = format!(
        "ALTER TABLE {} ADD COLUMN {} {}",
        TABLE, SCROLL_POSITION, definition
    );
    sqlx::query(&sql).execute(pool).await?;
    info!(table = TABLE, column = SCROLL_POSITION, "Added column");
    Ok(MigrationOutcome::Added)
}

/// Create the progress table if needed, then bring older tables up to date
pub async fn migrate(pool: &SqlitePool) -> Result<MigrationOutcome, StoreError> {
    sqlx::query(&create_table_sql()).execute(pool).await?;
    migrate_scroll_position(pool).await
}
