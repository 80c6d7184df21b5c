//! End-to-end runs of the sorting pipeline against a fake exiftool
#![cfg(unix)]
// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{Sandbox, file_names};
use photo_sorter::config::FileCollisionAction;
use photo_sorter::{Error, Event, PhotoSorter};
use std::fs;

#[tokio::test]
async fn sorts_a_directory_into_month_buckets() {
    let sandbox = Sandbox::new();
    sandbox.image("a.jpg", "2020:05:14 10:00:00");
    sandbox.image("b.jpg", "2020:05:01 08:30:00");
    sandbox.image("trip/c.JPG", "2021:12:31 23:59:59");
    sandbox.image("d.jpg", "");
    sandbox.image("e.jpg", "2020:13:45 99:99:99");
    sandbox.image("notes.txt", "2020:05:14 10:00:00");

    let sorter = PhotoSorter::new(sandbox.config(2, 2)).unwrap();
    let summary = sorter.run_directory(&sandbox.input).await.unwrap();

    assert!(summary.is_clean(), "{summary:?}");
    assert_eq!(summary.total_files, 5);
    assert_eq!(summary.records_succeeded, 5);
    assert_eq!(summary.dated, 3);
    assert_eq!(summary.unsorted, 2);
    assert_eq!(summary.files_copied, 5);

    assert_eq!(file_names(&sandbox.output.join("2020-05")), vec!["a.jpg", "b.jpg"]);
    assert_eq!(file_names(&sandbox.output.join("2021-12")), vec!["c.JPG"]);
    assert_eq!(file_names(&sandbox.output.join("Unsorted")), vec!["d.jpg", "e.jpg"]);
    assert!(sandbox.input.join("a.jpg").is_file(), "sources are copied, not moved");
    assert!(sandbox.leftover_args_files().is_empty());
}

#[tokio::test]
async fn failing_chunks_do_not_stop_the_run() {
    let sandbox = Sandbox::new();
    let files = vec![
        sandbox.image("a_may.jpg", "2020:05:14 10:00:00"),
        sandbox.image("b_plain.jpg", ""),
        sandbox.image("c_hang.jpg", ""),
        sandbox.image("d_lost.jpg", "2019:01:01 00:00:00"),
        sandbox.image("e_jun.jpg", "2021:06:02 12:00:00"),
        sandbox.image("f_corrupt.jpg", ""),
    ];

    let sorter = PhotoSorter::new(sandbox.config(2, 3)).unwrap();
    let summary = sorter.run(&files).await.unwrap();

    assert_eq!(summary.total_files, 6);
    let failed: Vec<usize> = summary.chunk_failures.iter().map(|f| f.chunk).collect();
    assert_eq!(failed, vec![1, 2]);
    assert!(
        summary.chunk_failures[0].reason.contains("did not finish"),
        "{}",
        summary.chunk_failures[0].reason
    );
    assert!(
        summary.chunk_failures[1].reason.contains("File format error"),
        "{}",
        summary.chunk_failures[1].reason
    );
    assert_eq!(summary.chunk_failures[0].files, files[2..4].to_vec());

    assert_eq!(summary.records_succeeded, 2);
    assert_eq!(file_names(&sandbox.output.join("2020-05")), vec!["a_may.jpg"]);
    assert_eq!(file_names(&sandbox.output.join("Unsorted")), vec!["b_plain.jpg"]);
    assert!(!sandbox.output.join("2019-01").exists());
    assert!(!sandbox.output.join("2021-06").exists());
    assert!(sandbox.leftover_args_files().is_empty());
}

#[tokio::test]
async fn rerun_renames_instead_of_overwriting() {
    let sandbox = Sandbox::new();
    sandbox.image("a.jpg", "2020:05:14 10:00:00");

    let sorter = PhotoSorter::new(sandbox.config(10, 1)).unwrap();
    sorter.run_directory(&sandbox.input).await.unwrap();
    let second = sorter.run_directory(&sandbox.input).await.unwrap();

    assert_eq!(second.files_copied, 1);
    assert_eq!(
        file_names(&sandbox.output.join("2020-05")),
        vec!["a (1).jpg", "a.jpg"]
    );
}

#[tokio::test]
async fn skip_policy_leaves_existing_files_alone() {
    let sandbox = Sandbox::new();
    sandbox.image("a.jpg", "");
    let unsorted = sandbox.output.join("Unsorted");
    fs::create_dir_all(&unsorted).unwrap();
    fs::write(unsorted.join("a.jpg"), "already here").unwrap();

    let mut config = sandbox.config(10, 1);
    config.distribution.file_collision = FileCollisionAction::Skip;
    let summary = PhotoSorter::new(config)
        .unwrap()
        .run_directory(&sandbox.input)
        .await
        .unwrap();

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.files_copied, 0);
    assert_eq!(
        fs::read_to_string(unsorted.join("a.jpg")).unwrap(),
        "already here"
    );
}

#[tokio::test]
async fn stale_argument_files_are_swept_before_the_run() {
    let sandbox = Sandbox::new();
    let stale = sandbox.temp.join("input.arg.tmp_leftover1234");
    let unrelated = sandbox.temp.join("keep-me.txt");
    fs::write(&stale, "-json\n/old/path.jpg\n").unwrap();
    fs::write(&unrelated, "x").unwrap();

    let sorter = PhotoSorter::new(sandbox.config(10, 1)).unwrap();
    sorter.run(&[]).await.unwrap();

    assert!(!stale.exists());
    assert!(unrelated.exists());
}

#[tokio::test]
async fn events_cover_extraction_distribution_and_finish() {
    let sandbox = Sandbox::new();
    let files = vec![
        sandbox.image("a.jpg", "2020:05:14 10:00:00"),
        sandbox.image("b.jpg", ""),
        sandbox.image("c_corrupt.jpg", ""),
    ];

    let sorter = PhotoSorter::new(sandbox.config(1, 2)).unwrap();
    let mut events = sorter.subscribe();
    sorter.run(&files).await.unwrap();

    let mut started = false;
    let mut extraction = Vec::new();
    let mut distribution = Vec::new();
    let mut failed_chunks = Vec::new();
    let mut finished = false;
    while let Ok(event) = events.try_recv() {
        match event {
            Event::ExtractionStarted { total_files, chunks } => {
                assert_eq!((total_files, chunks), (3, 3));
                started = true;
            }
            Event::ExtractionProgress { fraction } => extraction.push(fraction),
            Event::ChunkFailed { chunk, .. } => failed_chunks.push(chunk),
            Event::DistributionProgress { fraction } => distribution.push(fraction),
            Event::Finished { summary } => {
                assert_eq!(summary.files_copied, 2);
                finished = true;
            }
        }
    }

    assert!(started && finished);
    assert_eq!(failed_chunks, vec![2]);
    assert_eq!(extraction.len(), 3);
    assert_eq!(extraction.last().copied(), Some(1.0));
    assert_eq!(distribution.len(), 2);
    assert_eq!(distribution.last().copied(), Some(1.0));
}

#[test]
fn missing_template_aborts_before_any_work() {
    let sandbox = Sandbox::new();
    let mut config = sandbox.config(10, 1);
    config.tool.args_template = sandbox.temp.join("does-not-exist.arg");

    match PhotoSorter::new(config) {
        Err(Error::Config { key, .. }) => assert_eq!(key.as_deref(), Some("args_template")),
        Err(other) => panic!("expected config error, got {other}"),
        Ok(_) => panic!("expected config error"),
    }
}
