//! The [`PhotoSorter`] entry point tying extraction, classification and
//! distribution together

use crate::classify::classify_all;
use crate::config::Config;
use crate::distribution::{DistributionExecutor, DistributionPlanner};
use crate::error::Result;
use crate::exiftool::{ArgsFileBuilder, ExifToolExtractor, MetadataExtractor, check_paths};
use crate::scheduler::BatchScheduler;
use crate::types::{Event, RunSummary};
use crate::utils::discover_images;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Capacity of the event channel; slow subscribers lag instead of blocking a run
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Sorts images into `YYYY-MM` buckets by their capture date
///
/// # Example
///
/// ```no_run
/// use photo_sorter::{Config, PhotoSorter};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let sorter = PhotoSorter::new(Config::default())?;
///
/// let mut events = sorter.subscribe();
/// tokio::spawn(async move {
///     while let Ok(event) = events.recv().await {
///         println!("Event: {:?}", event);
///     }
/// });
///
/// let summary = sorter.run_directory("/photos/inbox".as_ref()).await?;
/// println!("copied {} files", summary.files_copied);
/// # Ok(())
/// # }
/// ```
pub struct PhotoSorter {
    config: Arc<Config>,
    extractor: Arc<dyn MetadataExtractor>,
    args: ArgsFileBuilder,
    event_tx: broadcast::Sender<Event>,
}

impl PhotoSorter {
    /// Create a sorter backed by exiftool.
    ///
    /// Fails before any work is done when the configuration is invalid, the
    /// binary cannot be found or the args template is missing.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let extractor = ExifToolExtractor::from_config(&config.tool)?;
        info!(
            binary = ?extractor.binary_path(),
            template = ?extractor.args_builder().template(),
            "using exiftool"
        );
        Ok(Self::with_extractor(config, Arc::new(extractor)))
    }

    /// Create a sorter with a custom extractor
    pub fn with_extractor(config: Config, extractor: Arc<dyn MetadataExtractor>) -> Self {
        let args = ArgsFileBuilder::new(&config.tool.args_template, &config.tool.temp_dir);
        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            config: Arc::new(config),
            extractor,
            args,
            event_tx,
        }
    }

    /// Subscribe to run events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// The configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Remove argument files left behind by an interrupted earlier run
    pub fn sweep_temp_files(&self) -> Result<usize> {
        let removed = self.args.sweep()?;
        if removed > 0 {
            info!(removed, dir = ?self.args.temp_dir(), "removed stale argument files");
        }
        Ok(removed)
    }

    /// Sort every image below `root` whose extension is listed in `known_extensions`
    pub async fn run_directory(&self, root: &Path) -> Result<RunSummary> {
        let files = discover_images(root, &self.config.known_extensions)?;
        info!(root = ?root, files = files.len(), "discovered images");
        self.run(&files).await
    }

    /// Extract, classify and copy `files` into the output tree.
    ///
    /// Only pre-run problems return an error: a blank or non-UTF-8 path, a
    /// missing args template, invalid settings or an unusable temp directory.
    /// They are detected before any chunk is scheduled. Failed chunks and
    /// failed copies are reported in the returned [`RunSummary`].
    pub async fn run(&self, files: &[PathBuf]) -> Result<RunSummary> {
        check_paths(files)?;
        self.args.ensure_template()?;
        self.sweep_temp_files()?;

        let scheduler = BatchScheduler::new(
            Arc::clone(&self.extractor),
            self.config.batch.chunk_size,
            self.config.batch.effective_parallelism(),
        )
        .with_events(self.event_tx.clone());
        let outcome = scheduler.run(files).await?;

        let mut records = outcome.records;
        let dated = classify_all(&mut records);

        let planner = DistributionPlanner::from_config(&self.config.distribution);
        let plan = planner.plan(&mut records);
        let report = DistributionExecutor::new(self.config.distribution.file_collision)
            .with_events(self.event_tx.clone())
            .execute(&plan)
            .await;

        let mut copy_failures = plan.rejected().to_vec();
        copy_failures.extend(report.failures);

        let summary = RunSummary {
            total_files: files.len(),
            records_succeeded: records.len(),
            chunk_failures: outcome.failures,
            dated,
            unsorted: records.len() - dated,
            files_copied: report.copied.len(),
            skipped: plan.skipped().len() + report.skipped,
            copy_failures,
        };

        if summary.is_clean() {
            info!(
                files = summary.total_files,
                dated = summary.dated,
                unsorted = summary.unsorted,
                copied = summary.files_copied,
                "run finished"
            );
        } else {
            warn!(
                files = summary.total_files,
                copied = summary.files_copied,
                failed_chunks = summary.chunk_failures.len(),
                failed_copies = summary.copy_failures.len(),
                "run finished with failures"
            );
        }
        self.event_tx
            .send(Event::Finished {
                summary: summary.clone(),
            })
            .ok();

        Ok(summary)
    }
}
