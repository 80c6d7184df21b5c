//! Chunked, parallel metadata extraction.
//!
//! The input file list is split into fixed-size chunks. Each chunk is handed to
//! the [`MetadataExtractor`] on its own tokio task, with at most `parallelism`
//! chunks in flight. A chunk whose invocation or parse fails is recorded as a
//! [`ChunkFailure`] and the remaining chunks carry on. Configuration and
//! argument errors are not chunk-scoped and abort the whole run.
//!
//! # Example
//!
//! ```no_run
//! use photo_sorter::exiftool::ExifToolExtractor;
//! use photo_sorter::config::ToolConfig;
//! use photo_sorter::scheduler::BatchScheduler;
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let extractor = Arc::new(ExifToolExtractor::from_config(&ToolConfig::default())?);
//! let scheduler = BatchScheduler::new(extractor, 100, 4);
//!
//! let files = vec![PathBuf::from("a.jpg"), PathBuf::from("b.jpg")];
//! let outcome = scheduler.run(&files).await?;
//! println!("{} records, {} failed chunks", outcome.records.len(), outcome.failures.len());
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use crate::exiftool::MetadataExtractor;
use crate::types::{BatchResult, Chunk, ChunkFailure, Event, ImageRecord};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Split `files` into consecutive chunks of `chunk_size`; the last may be shorter
pub fn partition(files: &[PathBuf], chunk_size: usize) -> Result<Vec<Chunk>> {
    if chunk_size == 0 {
        return Err(Error::config(
            "chunk_size must be a positive integer",
            "chunk_size",
        ));
    }
    Ok(files
        .chunks(chunk_size)
        .enumerate()
        .map(|(index, files)| Chunk {
            index,
            files: files.to_vec(),
        })
        .collect())
}

/// Shared progress counter reporting `processed / total` as a fraction in [0, 1]
///
/// Clones share the same counter.
#[derive(Clone, Debug)]
pub struct Progress {
    processed: Arc<AtomicU64>,
    total: u64,
}

impl Progress {
    /// Create a counter for `total` units of work
    pub fn new(total: usize) -> Self {
        Self {
            processed: Arc::new(AtomicU64::new(0)),
            total: total as u64,
        }
    }

    /// Record `units` more processed units and return the new fraction
    pub fn advance(&self, units: usize) -> f64 {
        let processed = self.processed.fetch_add(units as u64, Ordering::Relaxed) + units as u64;
        self.ratio(processed)
    }

    /// Units processed so far
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// Current fraction; an empty workload counts as complete
    pub fn fraction(&self) -> f64 {
        self.ratio(self.processed())
    }

    fn ratio(&self, processed: u64) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (processed as f64 / self.total as f64).min(1.0)
    }
}

/// Merged result of all chunks
#[derive(Debug, Default)]
pub struct ExtractionOutcome {
    /// Records from every successful chunk
    pub records: Vec<ImageRecord>,
    /// Failed chunks, ordered by chunk index
    pub failures: Vec<ChunkFailure>,
}

/// Runs a [`MetadataExtractor`] over chunks of a file list concurrently
pub struct BatchScheduler {
    extractor: Arc<dyn MetadataExtractor>,
    chunk_size: u16,
    parallelism: usize,
    event_tx: Option<broadcast::Sender<Event>>,
}

impl BatchScheduler {
    /// Create a scheduler
    ///
    /// # Arguments
    ///
    /// * `extractor` - Extracts one chunk; shared by all workers
    /// * `chunk_size` - Files per chunk (must be positive)
    /// * `parallelism` - Maximum chunks in flight (must be positive)
    pub fn new(extractor: Arc<dyn MetadataExtractor>, chunk_size: u16, parallelism: usize) -> Self {
        Self {
            extractor,
            chunk_size,
            parallelism,
            event_tx: None,
        }
    }

    /// Emit progress and chunk failure events on `event_tx`
    #[must_use]
    pub fn with_events(mut self, event_tx: broadcast::Sender<Event>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    /// Extract metadata for all `files`.
    ///
    /// Invalid settings, and any extractor error that is not
    /// [chunk-scoped](Error::is_chunk_scoped), fail the whole call; chunk
    /// errors are collected in [`ExtractionOutcome::failures`]. Records of different chunks arrive in
    /// completion order; within a chunk the tool's order is kept.
    pub async fn run(&self, files: &[PathBuf]) -> Result<ExtractionOutcome> {
        if self.parallelism == 0 {
            return Err(Error::config(
                "parallelism must be at least 1",
                "parallelism",
            ));
        }
        let chunks = partition(files, usize::from(self.chunk_size))?;
        let progress = Progress::new(files.len());

        info!(
            files = files.len(),
            chunks = chunks.len(),
            parallelism = self.parallelism,
            extractor = self.extractor.name(),
            "starting metadata extraction"
        );
        self.emit(Event::ExtractionStarted {
            total_files: files.len(),
            chunks: chunks.len(),
        });

        let results: Vec<BatchResult> = stream::iter(chunks)
            .map(|chunk| self.process_chunk(chunk, progress.clone()))
            .buffer_unordered(self.parallelism)
            .try_collect()
            .await?;

        let mut outcome = ExtractionOutcome::default();
        for result in results {
            match result {
                Ok(records) => outcome.records.extend(records),
                Err(failure) => outcome.failures.push(failure),
            }
        }
        outcome.failures.sort_by_key(|f| f.chunk);

        info!(
            records = outcome.records.len(),
            failed_chunks = outcome.failures.len(),
            "metadata extraction finished"
        );
        Ok(outcome)
    }

    /// Run one chunk on its own task and account for it in `progress`.
    ///
    /// The outer error is reserved for failures that must stop the run.
    async fn process_chunk(&self, chunk: Chunk, progress: Progress) -> Result<BatchResult> {
        let Chunk { index, files } = chunk;
        let extractor = Arc::clone(&self.extractor);
        let task_files = files.clone();

        debug!(chunk = index, files = files.len(), "extracting chunk");
        let handle = tokio::spawn(async move { extractor.extract(&task_files).await });
        let result = match handle.await {
            Ok(Ok(records)) => Ok(records),
            Ok(Err(e)) if !e.is_chunk_scoped() => {
                warn!(chunk = index, error = %e, "extraction aborted");
                return Err(e);
            }
            Ok(Err(e)) => Err(e.to_string()),
            Err(e) => Err(format!("extraction task failed: {e}")),
        };

        let fraction = progress.advance(files.len());
        self.emit(Event::ExtractionProgress { fraction });

        match result {
            Ok(records) => {
                debug!(chunk = index, records = records.len(), "chunk extracted");
                Ok(Ok(records))
            }
            Err(reason) => {
                warn!(chunk = index, files = files.len(), error = %reason, "chunk failed");
                self.emit(Event::ChunkFailed {
                    chunk: index,
                    files: files.len(),
                    reason: reason.clone(),
                });
                Ok(Err(ChunkFailure {
                    chunk: index,
                    files,
                    reason,
                }))
            }
        }
    }

    fn emit(&self, event: Event) {
        if let Some(tx) = &self.event_tx {
            tx.send(event).ok();
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
