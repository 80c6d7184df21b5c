//! Core types and events for photo-sorter

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// A single metadata tag reported by exiftool
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExifTag {
    /// Numeric tag id (e.g. 36867 for DateTimeOriginal)
    pub id: i64,
    /// Tag name, unique within a record
    pub name: String,
    /// Tag value in the tool's native string form
    pub value: String,
}

/// Metadata of one image plus the classification derived from it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Path of the image as reported by the tool (never empty)
    pub source_path: PathBuf,
    /// Tags keyed by name; every key equals its tag's `name`
    pub tags: HashMap<String, ExifTag>,
    /// Capture date, set by the classifier
    pub classified_date: Option<NaiveDateTime>,
    /// Bucket directory, set by the distribution planner
    pub destination_dir: Option<PathBuf>,
}

impl ImageRecord {
    /// Create a record with no tags and no classification
    pub fn new(source_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            tags: HashMap::new(),
            classified_date: None,
            destination_dir: None,
        }
    }

    /// Insert a tag, replacing any previous tag with the same name
    pub fn insert_tag(&mut self, tag: ExifTag) {
        self.tags.insert(tag.name.clone(), tag);
    }

    /// Builder-style variant of [`insert_tag`](Self::insert_tag)
    #[must_use]
    pub fn with_tag(mut self, id: i64, name: &str, value: &str) -> Self {
        self.insert_tag(ExifTag {
            id,
            name: name.to_string(),
            value: value.to_string(),
        });
        self
    }

    /// Look up a tag by name
    pub fn tag(&self, name: &str) -> Option<&ExifTag> {
        self.tags.get(name)
    }
}

/// An ordered, bounded slice of the input file list handed to one invocation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    /// Position of the chunk in the partition (0-based)
    pub index: usize,
    /// File paths in input order
    pub files: Vec<PathBuf>,
}

/// A chunk whose invocation or parse failed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkFailure {
    /// Position of the chunk in the partition
    pub chunk: usize,
    /// Files that were in the chunk
    pub files: Vec<PathBuf>,
    /// Human-readable failure reason
    pub reason: String,
}

/// Per-chunk outcome: records on success, a failure descriptor otherwise
pub type BatchResult = std::result::Result<Vec<ImageRecord>, ChunkFailure>;

/// A file that could not be copied into its bucket
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyFailure {
    /// The file being copied
    pub source_path: PathBuf,
    /// Intended destination path
    pub dest_path: PathBuf,
    /// Human-readable failure reason
    pub reason: String,
}

/// Outcome of a full run
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Number of input files
    pub total_files: usize,
    /// Records successfully extracted
    pub records_succeeded: usize,
    /// Chunks that failed, with reasons
    pub chunk_failures: Vec<ChunkFailure>,
    /// Records routed to a year-month bucket
    pub dated: usize,
    /// Records routed to the unsorted bucket
    pub unsorted: usize,
    /// Files copied into the output tree
    pub files_copied: usize,
    /// Files left out because of the Skip collision policy
    pub skipped: usize,
    /// Files whose copy failed
    pub copy_failures: Vec<CopyFailure>,
}

impl RunSummary {
    /// True when no chunk and no copy failed
    pub fn is_clean(&self) -> bool {
        self.chunk_failures.is_empty() && self.copy_failures.is_empty()
    }
}

/// Events emitted during a run
///
/// Consumers subscribe via [`PhotoSorter::subscribe`](crate::PhotoSorter::subscribe).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Metadata extraction started
    ExtractionStarted {
        /// Number of files to process
        total_files: usize,
        /// Number of chunks the files were split into
        chunks: usize,
    },

    /// Extraction progress update (0.0 to 1.0, non-decreasing)
    ExtractionProgress {
        /// Fraction of files processed
        fraction: f64,
    },

    /// A chunk failed; its files are missing from the merged records
    ChunkFailed {
        /// Position of the chunk in the partition
        chunk: usize,
        /// Number of files in the chunk
        files: usize,
        /// Failure reason
        reason: String,
    },

    /// Distribution progress update (0.0 to 1.0, non-decreasing)
    DistributionProgress {
        /// Fraction of planned copies attempted
        fraction: f64,
    },

    /// The run finished
    Finished {
        /// Final run summary
        summary: RunSummary,
    },
}
