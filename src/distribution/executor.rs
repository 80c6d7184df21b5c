//! Directory creation and file copying for a [`DistributionPlan`]

use super::planner::DistributionPlan;
use crate::config::FileCollisionAction;
use crate::error::Error;
use crate::scheduler::Progress;
use crate::types::{CopyFailure, Event};
use crate::utils::get_unique_path;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Outcome of executing a plan
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DistributionReport {
    /// Directories created or found already present
    pub directories: usize,
    /// Copies that completed, as (source, destination)
    pub copied: Vec<(PathBuf, PathBuf)>,
    /// Files skipped because the destination already existed (Skip policy)
    pub skipped: usize,
    /// Copies that failed
    pub failures: Vec<CopyFailure>,
}

/// Executes a [`DistributionPlan`] against the filesystem
#[derive(Clone, Debug)]
pub struct DistributionExecutor {
    collision: FileCollisionAction,
    event_tx: Option<broadcast::Sender<Event>>,
}

impl DistributionExecutor {
    /// Create an executor that resolves on-disk collisions with `collision`
    pub fn new(collision: FileCollisionAction) -> Self {
        Self {
            collision,
            event_tx: None,
        }
    }

    /// Emit distribution progress events on `event_tx`
    #[must_use]
    pub fn with_events(mut self, event_tx: broadcast::Sender<Event>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    /// Create every planned directory once, then copy the files into them.
    ///
    /// Failures are collected per file with source and destination; nothing
    /// already copied is rolled back.
    pub async fn execute(&self, plan: &DistributionPlan) -> DistributionReport {
        let mut report = DistributionReport::default();
        let progress = Progress::new(plan.file_count());

        for entry in plan.entries() {
            let (dir, files) = (entry.destination_dir, entry.files);
            if let Err(e) = fs::create_dir_all(dir).await {
                warn!(?dir, error = %e, "failed to create destination directory");
                for file in files {
                    report.failures.push(CopyFailure {
                        source_path: file.source.clone(),
                        dest_path: dir.join(&file.target_file_name),
                        reason: format!("cannot create directory: {e}"),
                    });
                    self.advance(&progress);
                }
                continue;
            }
            report.directories += 1;

            for file in files {
                let target = dir.join(&file.target_file_name);
                match self.copy_one(&file.source, &target).await {
                    Ok(Some(dest)) => {
                        debug!(source = ?file.source, ?dest, "copied");
                        report.copied.push((file.source.clone(), dest));
                    }
                    Ok(None) => {
                        debug!(source = ?file.source, ?target, "destination exists, skipped");
                        report.skipped += 1;
                    }
                    Err(e) => {
                        warn!(source = ?file.source, ?target, error = %e, "copy failed");
                        report.failures.push(CopyFailure {
                            source_path: file.source.clone(),
                            dest_path: target,
                            reason: e.to_string(),
                        });
                    }
                }
                self.advance(&progress);
            }
        }

        info!(
            directories = report.directories,
            copied = report.copied.len(),
            skipped = report.skipped,
            failed = report.failures.len(),
            "distribution finished"
        );
        report
    }

    /// Copy one file; `Ok(None)` means the Skip policy left an existing file alone
    async fn copy_one(&self, source: &Path, target: &Path) -> crate::Result<Option<PathBuf>> {
        let dest = match get_unique_path(target, self.collision) {
            Ok(dest) => dest,
            Err(Error::FileCollision { .. }) if self.collision == FileCollisionAction::Skip => {
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        fs::copy(source, &dest)
            .await
            .map_err(|source_err| Error::Copy {
                source_path: source.to_path_buf(),
                dest_path: dest.clone(),
                source: source_err,
            })?;
        Ok(Some(dest))
    }

    fn advance(&self, progress: &Progress) {
        let fraction = progress.advance(1);
        if let Some(tx) = &self.event_tx {
            tx.send(Event::DistributionProgress { fraction }).ok();
        }
    }
}
