//! Sort a directory of photos by capture date
//!
//! This example demonstrates the core functionality of photo-sorter:
//! - Building a configuration
//! - Creating a sorter instance
//! - Subscribing to events
//! - Sorting a directory and reading the summary
//!
//! Usage: `cargo run --example sort_photos -- <input dir> <output dir>`

use photo_sorter::config::{BatchConfig, Config, DistributionConfig, FileCollisionAction};
use photo_sorter::{Event, PhotoSorter};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let input = PathBuf::from(args.next().unwrap_or_else(|| "photos".to_string()));
    let output = PathBuf::from(args.next().unwrap_or_else(|| "sorted".to_string()));

    // Build configuration
    let config = Config {
        batch: BatchConfig {
            chunk_size: 50,
            parallelism: Some(4),
        },
        distribution: DistributionConfig {
            output_dir: output,
            file_collision: FileCollisionAction::Rename,
            ..Default::default()
        },
        ..Default::default()
    };

    // Create sorter instance (fails fast if exiftool or input.arg is missing)
    let sorter = PhotoSorter::new(config)?;

    // Subscribe to events
    let mut events = sorter.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::ExtractionStarted { total_files, chunks } => {
                    println!("Reading metadata of {} files in {} chunks", total_files, chunks);
                }
                Event::ExtractionProgress { fraction } => {
                    println!("  extraction {:.0}%", fraction * 100.0);
                }
                Event::ChunkFailed { chunk, files, reason } => {
                    println!("  chunk #{} ({} files) failed: {}", chunk, files, reason);
                }
                Event::DistributionProgress { fraction } => {
                    println!("  copying {:.0}%", fraction * 100.0);
                }
                Event::Finished { .. } => break,
            }
        }
    });

    let summary = sorter.run_directory(&input).await?;

    println!();
    println!("Files:        {}", summary.total_files);
    println!("Dated:        {}", summary.dated);
    println!("Unsorted:     {}", summary.unsorted);
    println!("Copied:       {}", summary.files_copied);
    println!("Skipped:      {}", summary.skipped);
    for failure in &summary.chunk_failures {
        println!("Chunk #{} failed: {}", failure.chunk, failure.reason);
    }
    for failure in &summary.copy_failures {
        println!(
            "Copy {} -> {} failed: {}",
            failure.source_path.display(),
            failure.dest_path.display(),
            failure.reason
        );
    }

    Ok(())
}
