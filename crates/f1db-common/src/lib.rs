//! f1db Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared row types and logging setup for the f1db workspace.
//!
//! - **Types**: the relational row shapes for sessions and laps
//! - **Logging**: `tracing` subscriber configuration used by every binary
//!
//! # Example
//!
//! ```no_run
//! use f1db_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_logging(&LogConfig::from_env()?)?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```

pub mod logging;
pub mod types;

pub use types::{LapKey, LapRow, NewSession};
