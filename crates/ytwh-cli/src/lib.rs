//! ytwh CLI Library
//!
//! Command-line front end for the YouTube warehouse harvester.
//!
//! - **Ingestion**: pull a channel, its videos and their comments (`ytwh ingest`)
//! - **Querying**: run a read-only SQL query against the warehouse (`ytwh query`)
//! - **Schema**: create the warehouse tables (`ytwh init-db`)
//! - **Statistics**: row counts per table (`ytwh stats`)

pub mod commands;
pub mod error;
pub mod output;

pub use error::{CliError, Result};

use clap::{Parser, Subcommand, ValueEnum};
use ytwh_ingest::DEFAULT_DATABASE_URL;

/// ytwh - YouTube channel warehouse
#[derive(Parser, Debug)]
#[command(name = "ytwh")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Warehouse database (e.g. sqlite:ytwh.db or sqlite::memory:)
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL, global = true)]
    pub database_url: String,

    /// YouTube Data API key
    #[arg(long, env = "YOUTUBE_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// YouTube Data API base URL
    #[arg(long, env = "YOUTUBE_API_BASE_URL", global = true)]
    pub api_base_url: Option<String>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest a channel with all its videos and comments
    Ingest {
        /// Channel id (e.g. UC_x5XG1OV2P6uZZ5FSM9Ttw)
        channel_id: String,

        /// Output format for the run summary
        #[arg(short, long, value_enum, default_value_t = SummaryFormat::Table)]
        format: SummaryFormat,
    },

    /// Run a read-only SQL query against the warehouse
    Query {
        /// A single SELECT (or EXPLAIN) statement
        sql: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Omit the header row (csv, tsv)
        #[arg(long)]
        no_header: bool,
    },

    /// Create the warehouse tables if they do not exist
    InitDb,

    /// Show row counts per table
    Stats {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = SummaryFormat::Table)]
        format: SummaryFormat,
    },
}

/// Formats for query results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
    Tsv,
}

/// Formats for run summaries and statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SummaryFormat {
    Table,
    Json,
}
