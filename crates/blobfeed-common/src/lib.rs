//! Blobfeed Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error handling and logging setup for the Blobfeed workspace.
//!
//! # Overview
//!
//! This crate provides the pieces every Blobfeed component needs:
//!
//! - **Error Handling**: the [`FeedError`] taxonomy and [`Result`] alias
//! - **Logging**: `tracing`-based logging initialization with console/file
//!   output, text/JSON formats, and environment overrides
//!
//! # Example
//!
//! ```no_run
//! use blobfeed_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     init_logging(&config)?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{FeedError, Result};
