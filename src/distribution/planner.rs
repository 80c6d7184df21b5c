//! Routing of records to bucket directories

use crate::classify::bucket_name;
use crate::config::{DistributionConfig, FileCollisionAction};
use crate::types::{CopyFailure, ImageRecord};
use crate::utils::unique_file_name;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One file to copy into a destination directory
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedCopy {
    /// The original image
    pub source: PathBuf,
    /// File name inside the destination directory
    pub target_file_name: String,
}

/// A destination directory and the files bound for it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlanEntry<'a> {
    /// Directory to create
    pub destination_dir: &'a Path,
    /// Files to copy into it, in record order
    pub files: &'a [PlannedCopy],
}

/// The full set of directories and copies for a run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DistributionPlan {
    entries: BTreeMap<PathBuf, Vec<PlannedCopy>>,
    skipped: Vec<PathBuf>,
    rejected: Vec<CopyFailure>,
}

impl DistributionPlan {
    /// Destination directories with their files, ordered by directory
    pub fn entries(&self) -> impl Iterator<Item = PlanEntry<'_>> {
        self.entries.iter().map(|(dir, files)| PlanEntry {
            destination_dir: dir.as_path(),
            files: files.as_slice(),
        })
    }

    /// Distinct destination directories
    pub fn directories(&self) -> impl Iterator<Item = &Path> {
        self.entries.keys().map(PathBuf::as_path)
    }

    /// Planned copies for one directory
    pub fn files_in(&self, dir: &Path) -> &[PlannedCopy] {
        self.entries.get(dir).map(Vec::as_slice).unwrap_or_default()
    }

    /// Total number of planned copies
    pub fn file_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Sources left out because their name was already taken (Skip policy)
    pub fn skipped(&self) -> &[PathBuf] {
        &self.skipped
    }

    /// Records that cannot be copied at all (no usable file name)
    pub fn rejected(&self) -> &[CopyFailure] {
        &self.rejected
    }
}

/// Builds a [`DistributionPlan`] from classified records
#[derive(Clone, Debug)]
pub struct DistributionPlanner {
    output_root: PathBuf,
    unsorted_dir_name: String,
    collision: FileCollisionAction,
}

impl DistributionPlanner {
    /// Create a planner writing below `output_root`
    pub fn new(output_root: impl Into<PathBuf>, collision: FileCollisionAction) -> Self {
        Self {
            output_root: output_root.into(),
            unsorted_dir_name: "Unsorted".to_string(),
            collision,
        }
    }

    /// Create a planner from the distribution settings
    pub fn from_config(config: &DistributionConfig) -> Self {
        Self {
            output_root: config.output_dir.clone(),
            unsorted_dir_name: config.unsorted_dir_name.clone(),
            collision: config.file_collision,
        }
    }

    /// Destination directory for a record: `root/YYYY-MM` or `root/Unsorted`
    pub fn destination_for(&self, record: &ImageRecord) -> PathBuf {
        match &record.classified_date {
            Some(date) => self.output_root.join(bucket_name(date)),
            None => self.output_root.join(&self.unsorted_dir_name),
        }
    }

    /// Route every record and set its `destination_dir`.
    ///
    /// Two sources with the same file name bound for the same directory are
    /// settled by the collision policy: Rename numbers the later ones, Skip
    /// keeps only the first, Overwrite plans both under the same name so the
    /// last copy wins. Names are compared case-insensitively.
    pub fn plan(&self, records: &mut [ImageRecord]) -> DistributionPlan {
        let mut plan = DistributionPlan::default();
        let mut taken: BTreeMap<PathBuf, HashSet<String>> = BTreeMap::new();

        for record in records.iter_mut() {
            let destination = self.destination_for(record);
            record.destination_dir = Some(destination.clone());

            let Some(file_name) = record.source_path.file_name().and_then(|n| n.to_str()) else {
                plan.rejected.push(CopyFailure {
                    source_path: record.source_path.clone(),
                    dest_path: destination,
                    reason: "source path has no UTF-8 file name".to_string(),
                });
                continue;
            };

            let names = taken.entry(destination.clone()).or_default();
            let target = match self.collision {
                FileCollisionAction::Overwrite => Some(file_name.to_string()),
                FileCollisionAction::Skip if names.contains(&file_name.to_lowercase()) => {
                    debug!(source = ?record.source_path, ?destination, "name taken, skipping");
                    plan.skipped.push(record.source_path.clone());
                    continue;
                }
                FileCollisionAction::Skip => Some(file_name.to_string()),
                FileCollisionAction::Rename => {
                    unique_file_name(file_name, |candidate| names.contains(&candidate.to_lowercase()))
                }
            };
            let Some(target) = target else {
                plan.rejected.push(CopyFailure {
                    source_path: record.source_path.clone(),
                    dest_path: destination.join(file_name),
                    reason: "could not find a unique file name".to_string(),
                });
                continue;
            };

            names.insert(target.to_lowercase());
            plan.entries.entry(destination).or_default().push(PlannedCopy {
                source: record.source_path.clone(),
                target_file_name: target,
            });
        }

        debug!(
            directories = plan.entries.len(),
            files = plan.file_count(),
            skipped = plan.skipped.len(),
            rejected = plan.rejected.len(),
            "distribution planned"
        );
        plan
    }
}
