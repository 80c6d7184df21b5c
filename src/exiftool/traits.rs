//! Extraction seam between the batch scheduler and the metadata tool

use crate::types::ImageRecord;
use async_trait::async_trait;
use std::path::PathBuf;

/// Trait for extracting metadata from a batch of image files
///
/// One call handles one chunk. Implementations must keep every resource
/// (process, buffer, temp file) private to the call, since the scheduler runs
/// many calls concurrently.
///
/// # Examples
///
/// ```no_run
/// use photo_sorter::exiftool::{ExifToolExtractor, MetadataExtractor};
/// use photo_sorter::config::ToolConfig;
/// use std::path::PathBuf;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let extractor = ExifToolExtractor::from_config(&ToolConfig::default())?;
/// let records = extractor.extract(&[PathBuf::from("a.jpg")]).await?;
/// println!("{} record(s)", records.len());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait MetadataExtractor: Send + Sync {
    /// Extract metadata for `files`, in the tool's output order
    ///
    /// # Errors
    ///
    /// Any error fails only the chunk that was passed in.
    async fn extract(&self, files: &[PathBuf]) -> crate::Result<Vec<ImageRecord>>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
