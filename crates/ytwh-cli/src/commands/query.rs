//! `ytwh query` command implementation

use colored::Colorize;
use tracing::{debug, info};
use ytwh_ingest::query::MAX_RESULT_ROWS;

use super::open_repository;
use crate::error::Result;
use crate::output::format_results;
use crate::OutputFormat;

pub async fn run(database_url: &str, sql: &str, format: OutputFormat, no_header: bool) -> Result<()> {
    info!("Running query command");

    let repository = open_repository(database_url).await?;
    debug!(sql = %sql, "Executing query");
    let results = repository.execute_read_query(sql).await;
    repository.close().await;
    let results = results?;

    print!("{}", format_results(&results, format, no_header)?);

    if results.truncated {
        eprintln!(
            "{} Output truncated to the first {} rows; add a LIMIT clause.",
            "⚠".yellow(),
            MAX_RESULT_ROWS
        );
    } else if results.is_empty() && format == OutputFormat::Table {
        eprintln!("{}", "No rows.".dimmed());
    }

    Ok(())
}
