//! exiftool-backed [`MetadataExtractor`]

use super::args_file::ArgsFileBuilder;
use super::invoker::ToolInvoker;
use super::parser::parse_metadata;
use super::traits::MetadataExtractor;
use crate::config::ToolConfig;
use crate::error::{Error, Result};
use crate::types::ImageRecord;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Extracts metadata by running exiftool once per batch
///
/// Each [`extract`](MetadataExtractor::extract) call writes its own args file,
/// spawns a fresh [`ToolInvoker`] and parses the response. The args file is
/// removed when the call ends, whether it succeeded or not.
#[derive(Clone, Debug)]
pub struct ExifToolExtractor {
    binary_path: PathBuf,
    args: ArgsFileBuilder,
    timeout: Duration,
}

impl ExifToolExtractor {
    /// Create an extractor with an explicit binary path
    pub fn new(binary_path: PathBuf, args: ArgsFileBuilder, timeout: Duration) -> Self {
        Self {
            binary_path,
            args,
            timeout,
        }
    }

    /// Build an extractor from configuration.
    ///
    /// The binary comes from `exiftool_path`, or from `PATH` when
    /// `search_path` is set. The args template must exist.
    pub fn from_config(config: &ToolConfig) -> Result<Self> {
        let binary_path = resolve_binary(config)?;
        let args = ArgsFileBuilder::new(&config.args_template, &config.temp_dir);
        args.ensure_template()?;
        Ok(Self::new(binary_path, args, config.timeout))
    }

    /// Path of the exiftool binary in use
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// The args file builder (used for the pre-run sweep)
    pub fn args_builder(&self) -> &ArgsFileBuilder {
        &self.args
    }

    /// Extract metadata for a single image
    pub async fn extract_one(&self, file: &Path) -> Result<Option<ImageRecord>> {
        let mut records = self.extract(&[file.to_path_buf()]).await?;
        Ok(records.pop())
    }
}

#[async_trait]
impl MetadataExtractor for ExifToolExtractor {
    async fn extract(&self, files: &[PathBuf]) -> Result<Vec<ImageRecord>> {
        let args_file = self.args.build(files)?;
        let invoker = ToolInvoker::new(&self.binary_path, self.timeout);
        let output = invoker.run(args_file.path()).await;

        let args_path = args_file.path().to_path_buf();
        if let Err(e) = args_file.close() {
            warn!(path = ?args_path, error = %e, "failed to remove args file");
        }

        let records = parse_metadata(&output?)?;
        debug!(files = files.len(), records = records.len(), "batch extracted");
        Ok(records)
    }

    fn name(&self) -> &'static str {
        "exiftool"
    }
}

/// Locate the exiftool binary: explicit path first, then `PATH`
fn resolve_binary(config: &ToolConfig) -> Result<PathBuf> {
    if let Some(path) = &config.exiftool_path {
        return Ok(path.clone());
    }
    if config.search_path
        && let Ok(path) = which::which("exiftool")
    {
        return Ok(path);
    }
    Err(Error::config(
        "exiftool not found: set exiftool_path or install exiftool in PATH",
        "exiftool_path",
    ))
}
