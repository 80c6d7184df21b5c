//! Configuration types for photo-sorter

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// External tool settings: binary location, args template, temp dir, timeout
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Path to the exiftool executable (auto-detected if None)
    #[serde(default)]
    pub exiftool_path: Option<PathBuf>,

    /// Whether to search PATH for exiftool if no explicit path is set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,

    /// Template with fixed tool flags, one per line (default: "input.arg")
    #[serde(default = "default_args_template")]
    pub args_template: PathBuf,

    /// Directory where per-invocation argument files are created (default: ".")
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Maximum time a single invocation may run (default: 300 seconds)
    #[serde(default = "default_tool_timeout", with = "duration_serde")]
    pub timeout: Duration,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            exiftool_path: None,
            search_path: true,
            args_template: default_args_template(),
            temp_dir: default_temp_dir(),
            timeout: default_tool_timeout(),
        }
    }
}

/// Chunking and fan-out settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of files handed to one tool invocation (1-65535, default: 100)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u16,

    /// Maximum concurrent invocations (None = available hardware concurrency)
    #[serde(default)]
    pub parallelism: Option<usize>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            parallelism: None,
        }
    }
}

impl BatchConfig {
    /// Effective parallelism, falling back to the number of available CPUs
    pub fn effective_parallelism(&self) -> usize {
        self.parallelism.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

/// Output tree settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DistributionConfig {
    /// Root of the sorted output tree (default: "sorted")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Bucket for images without a usable capture date (default: "Unsorted")
    #[serde(default = "default_unsorted_dir_name")]
    pub unsorted_dir_name: String,

    /// File collision handling
    #[serde(default)]
    pub file_collision: FileCollisionAction,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            unsorted_dir_name: default_unsorted_dir_name(),
            file_collision: FileCollisionAction::default(),
        }
    }
}

/// Main configuration for [`PhotoSorter`](crate::PhotoSorter)
///
/// Sub-configs are flattened, so the serialized form is a single flat object.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// External tool settings
    #[serde(flatten)]
    pub tool: ToolConfig,

    /// Chunking and parallelism
    #[serde(flatten)]
    pub batch: BatchConfig,

    /// Output tree settings
    #[serde(flatten)]
    pub distribution: DistributionConfig,

    /// Image file extensions picked up by directory discovery (case-insensitive)
    #[serde(default = "default_known_extensions")]
    pub known_extensions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tool: ToolConfig::default(),
            batch: BatchConfig::default(),
            distribution: DistributionConfig::default(),
            known_extensions: default_known_extensions(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("cannot read config file {}: {}", path.display(), e),
            key: None,
        })?;
        serde_json::from_str(&content).map_err(|e| Error::Config {
            message: format!("invalid config file {}: {}", path.display(), e),
            key: None,
        })
    }

    /// Check values that would otherwise only fail once a run is under way
    pub fn validate(&self) -> Result<()> {
        if self.batch.chunk_size == 0 {
            return Err(Error::config(
                "chunk_size must be a positive integer",
                "chunk_size",
            ));
        }
        if self.batch.parallelism == Some(0) {
            return Err(Error::config(
                "parallelism must be at least 1",
                "parallelism",
            ));
        }
        if self.tool.timeout.is_zero() {
            return Err(Error::config("timeout must be non-zero", "timeout"));
        }
        if self.known_extensions.iter().all(|ext| ext.trim().is_empty()) {
            return Err(Error::config(
                "at least one image extension is required",
                "known_extensions",
            ));
        }
        let unsorted = self.distribution.unsorted_dir_name.trim();
        if unsorted.is_empty() || unsorted.contains(['/', '\\']) {
            return Err(Error::config(
                "unsorted_dir_name must be a single non-empty path component",
                "unsorted_dir_name",
            ));
        }
        Ok(())
    }
}

/// File collision handling strategy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCollisionAction {
    /// Append (1), (2), etc. to filename (default)
    #[default]
    Rename,
    /// Overwrite existing file
    Overwrite,
    /// Skip the file, keep existing
    Skip,
}

fn default_true() -> bool {
    true
}

fn default_args_template() -> PathBuf {
    PathBuf::from("input.arg")
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_tool_timeout() -> Duration {
    Duration::from_secs(300) // 5 minutes
}

fn default_chunk_size() -> u16 {
    100
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("sorted")
}

fn default_unsorted_dir_name() -> String {
    "Unsorted".to_string()
}

fn default_known_extensions() -> Vec<String> {
    ["jpg", "jpeg", "png", "tif", "tiff", "heic", "cr2", "nef", "arw", "dng"]
        .into_iter()
        .map(String::from)
        .collect()
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
