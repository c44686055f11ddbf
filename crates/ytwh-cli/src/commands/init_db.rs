//! `ytwh init-db` command implementation

use colored::Colorize;
use tracing::info;

use super::open_repository;
use crate::error::Result;

pub async fn run(database_url: &str) -> Result<()> {
    let repository = open_repository(database_url).await?;
    repository.close().await;

    info!(database_url = %database_url, "Schema ensured");
    println!("{} Warehouse schema ready at {}", "✓".green(), database_url.cyan());
    Ok(())
}
