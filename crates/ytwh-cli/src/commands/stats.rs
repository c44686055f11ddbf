//! `ytwh stats` command implementation

use super::open_repository;
use crate::error::Result;
use crate::output::format_counts;
use crate::SummaryFormat;

pub async fn run(database_url: &str, format: SummaryFormat) -> Result<()> {
    let repository = open_repository(database_url).await?;
    let counts = repository.counts().await?;
    repository.close().await;

    print!("{}", format_counts(&counts, format)?);
    Ok(())
}
