//! ytwh Common Library
//!
//! Shared error handling and logging for the ytwh workspace members.
//!
//! # Example
//!
//! ```no_run
//! use ytwh_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> ytwh_common::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     let _guard = init_logging(&config)?;
//!     tracing::info!("harvester started");
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod error;
pub mod logging;

pub use error::{HarvestError, Result};
