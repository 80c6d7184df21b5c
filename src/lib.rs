//! # photo-sorter
//!
//! Sorts photos into a `YYYY-MM` directory tree by the capture date stored in
//! their metadata, using the external `exiftool` binary.
//!
//! ## Design Philosophy
//!
//! photo-sorter is designed to be:
//! - **Non-destructive** - Sources are only read; images are copied, never moved
//! - **Fault-tolerant** - A failing batch or copy is reported, the rest of the run continues
//! - **Parallel** - Files are extracted in chunks by concurrent exiftool processes
//! - **Event-driven** - Consumers subscribe to progress events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use photo_sorter::{Config, PhotoSorter};
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.distribution.output_dir = PathBuf::from("/photos/sorted");
//!
//!     let sorter = PhotoSorter::new(config)?;
//!
//!     // Subscribe to events
//!     let mut events = sorter.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let summary = sorter.run_directory("/photos/inbox".as_ref()).await?;
//!     println!("{} dated, {} unsorted", summary.dated, summary.unsorted);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Capture-date classification
pub mod classify;
/// Configuration types
pub mod config;
/// Copying images into bucket directories
pub mod distribution;
/// Error types
pub mod error;
/// exiftool invocation and output parsing
pub mod exiftool;
/// Chunked parallel extraction
pub mod scheduler;
/// End-to-end sorting pipeline
pub mod sorter;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::{BatchConfig, Config, DistributionConfig, FileCollisionAction, ToolConfig};
pub use error::{Error, Result};
pub use exiftool::{ExifToolExtractor, MetadataExtractor};
pub use sorter::PhotoSorter;
pub use types::{ChunkFailure, CopyFailure, Event, ExifTag, ImageRecord, RunSummary};
