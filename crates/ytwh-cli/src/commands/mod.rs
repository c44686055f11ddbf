//! CLI command implementations
//!
//! Each subcommand has its own module with a `run` function.

pub mod ingest;
pub mod init_db;
pub mod query;
pub mod stats;

use tracing::debug;
use ytwh_ingest::Repository;

use crate::error::Result;

/// Open the warehouse and make sure its tables exist
pub async fn open_repository(database_url: &str) -> Result<Repository> {
    let repository = Repository::connect(database_url).await?;
    repository.ensure_schema().await?;
    debug!(database_url = %database_url, "Warehouse ready");
    Ok(repository)
}
