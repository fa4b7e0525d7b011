//! Explain and discuss command implementations

use anyhow::{Context, Result};
use lectern_core::{InsightClient, InsightConfig};

fn client() -> Result<InsightClient> {
    let config = InsightConfig::from_env()
        .context("Set LECTERN_INSIGHT_API_KEY to use explain and discuss")?;
    Ok(InsightClient::new(config)?)
}

/// Ask for a short explanation of a passage
pub async fn explain(text: &str, context: &str) -> Result<()> {
    let answer = client()?.explain(text, context).await;
    println!("{}", answer);
    Ok(())
}

/// Ask for a discussion of a passage
pub async fn discuss(text: &str, context: &str) -> Result<()> {
    let answer = client()?.discuss(text, context).await;
    println!("{}", answer);
    Ok(())
}
