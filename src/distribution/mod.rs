//! Distribution of classified images into bucket directories
//!
//! Distribution runs in two steps:
//!
//! 1. [`DistributionPlanner::plan`] routes each record to `output/YYYY-MM` or
//!    `output/Unsorted`, deduplicates directories and settles file names that
//!    collide within the run
//! 2. [`DistributionExecutor::execute`] creates each directory once and copies
//!    the files, resolving collisions with files already on disk
//!
//! Sources are only ever read. A failed copy is reported and does not undo
//! earlier copies.

mod executor;
mod planner;

pub use executor::{DistributionExecutor, DistributionReport};
pub use planner::{DistributionPlan, DistributionPlanner, PlanEntry, PlannedCopy};
