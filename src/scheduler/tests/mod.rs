use super::*;
use async_trait::async_trait;
use std::sync::atomic::AtomicUsize;
use std::time::Duration;

/// Extractor that returns one record per file, fails chunks containing a file
/// named `timeout.jpg` and reports a configuration error for `no-template.jpg`
#[derive(Default)]
struct FakeExtractor {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay: Duration,
}

impl FakeExtractor {
    fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }
}

#[async_trait]
impl MetadataExtractor for FakeExtractor {
    async fn extract(&self, files: &[PathBuf]) -> crate::Result<Vec<ImageRecord>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if files.iter().any(|f| f.ends_with("no-template.jpg")) {
            return Err(crate::Error::config("template missing", "args_template"));
        }
        if files.iter().any(|f| f.ends_with("timeout.jpg")) {
            return Err(crate::Error::ToolTimeout {
                timeout: Duration::from_secs(1),
            });
        }
        Ok(files.iter().map(ImageRecord::new).collect())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

fn files(n: usize) -> Vec<PathBuf> {
    (0..n).map(|i| PathBuf::from(format!("img{i:04}.jpg"))).collect()
}

// --- partition ---

#[test]
fn partition_sizes_for_all_lengths_and_chunk_sizes() {
    for n in 0..40usize {
        for c in 1..12usize {
            let chunks = partition(&files(n), c).unwrap();

            assert_eq!(chunks.len(), n.div_ceil(c), "n={n} c={c}");
            if let Some((last, rest)) = chunks.split_last() {
                assert!(rest.iter().all(|chunk| chunk.files.len() == c));
                let expected_last = if n % c == 0 { c } else { n % c };
                assert_eq!(last.files.len(), expected_last, "n={n} c={c}");
            }
        }
    }
}

#[test]
fn partition_covers_input_in_order_without_overlap() {
    let input = files(23);
    let chunks = partition(&input, 5).unwrap();

    let flattened: Vec<PathBuf> = chunks.iter().flat_map(|c| c.files.clone()).collect();
    assert_eq!(flattened, input);
    let indices: Vec<usize> = chunks.iter().map(|c| c.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
}

#[test]
fn partition_rejects_zero_chunk_size() {
    assert!(matches!(
        partition(&files(3), 0),
        Err(crate::Error::Config { .. })
    ));
}

// --- progress ---

#[test]
fn progress_fraction_is_bounded_and_shared() {
    let progress = Progress::new(10);
    let clone = progress.clone();

    assert_eq!(progress.fraction(), 0.0);
    assert_eq!(clone.advance(4), 0.4);
    assert_eq!(progress.fraction(), 0.4);
    assert_eq!(progress.advance(6), 1.0);
    assert_eq!(progress.advance(3), 1.0, "never exceeds 1.0");
    assert_eq!(progress.processed(), 13);
}

#[test]
fn empty_progress_is_complete() {
    assert_eq!(Progress::new(0).fraction(), 1.0);
}

// --- scheduler ---

#[tokio::test]
async fn merges_records_from_all_chunks() {
    let scheduler = BatchScheduler::new(Arc::new(FakeExtractor::default()), 4, 3);
    let input = files(10);

    let outcome = scheduler.run(&input).await.unwrap();

    assert!(outcome.failures.is_empty());
    let mut paths: Vec<PathBuf> = outcome.records.into_iter().map(|r| r.source_path).collect();
    paths.sort();
    assert_eq!(paths, input);
}

#[tokio::test]
async fn one_failed_chunk_does_not_abort_the_others() {
    let scheduler = BatchScheduler::new(Arc::new(FakeExtractor::default()), 3, 2);
    let mut input = files(9);
    input[4] = PathBuf::from("timeout.jpg");

    let outcome = scheduler.run(&input).await.unwrap();

    assert_eq!(outcome.records.len(), 6, "two healthy chunks of three");
    assert_eq!(outcome.failures.len(), 1);
    let failure = &outcome.failures[0];
    assert_eq!(failure.chunk, 1);
    assert_eq!(failure.files, input[3..6].to_vec());
    assert!(failure.reason.contains("did not finish"), "reason: {}", failure.reason);
}

#[tokio::test]
async fn record_order_within_a_chunk_is_preserved() {
    let scheduler = BatchScheduler::new(Arc::new(FakeExtractor::default()), 50, 1);
    let input = files(50);

    let outcome = scheduler.run(&input).await.unwrap();

    let paths: Vec<PathBuf> = outcome.records.into_iter().map(|r| r.source_path).collect();
    assert_eq!(paths, input);
}

#[tokio::test]
async fn concurrency_is_bounded_by_parallelism() {
    let extractor = Arc::new(FakeExtractor::with_delay(Duration::from_millis(20)));
    let scheduler = BatchScheduler::new(extractor.clone(), 1, 3);

    scheduler.run(&files(12)).await.unwrap();

    let max = extractor.max_in_flight.load(Ordering::SeqCst);
    assert!(max <= 3, "at most 3 chunks in flight, saw {max}");
    assert!(max >= 2, "chunks should overlap, saw {max}");
}

#[tokio::test]
async fn progress_events_are_monotonic_and_reach_one() {
    let (tx, mut rx) = broadcast::channel(64);
    let scheduler = BatchScheduler::new(Arc::new(FakeExtractor::default()), 2, 4).with_events(tx);
    let mut input = files(7);
    input[0] = PathBuf::from("timeout.jpg");

    scheduler.run(&input).await.unwrap();

    let mut fractions = Vec::new();
    let mut failed = 0;
    while let Ok(event) = rx.try_recv() {
        match event {
            Event::ExtractionStarted { total_files, chunks } => {
                assert_eq!(total_files, 7);
                assert_eq!(chunks, 4);
            }
            Event::ExtractionProgress { fraction } => fractions.push(fraction),
            Event::ChunkFailed { chunk, files, .. } => {
                assert_eq!(chunk, 0);
                assert_eq!(files, 2);
                failed += 1;
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    assert_eq!(failed, 1);
    assert_eq!(fractions.len(), 4);
    assert!(fractions.windows(2).all(|w| w[0] <= w[1]), "{fractions:?}");
    assert_eq!(fractions.last().copied(), Some(1.0));
}

#[tokio::test]
async fn empty_input_yields_empty_outcome() {
    let scheduler = BatchScheduler::new(Arc::new(FakeExtractor::default()), 10, 2);
    let outcome = scheduler.run(&[]).await.unwrap();
    assert!(outcome.records.is_empty());
    assert!(outcome.failures.is_empty());
}

#[tokio::test]
async fn invalid_settings_abort_before_scheduling() {
    let extractor = Arc::new(FakeExtractor::default());

    let zero_chunk = BatchScheduler::new(extractor.clone(), 0, 2);
    assert!(matches!(
        zero_chunk.run(&files(3)).await,
        Err(crate::Error::Config { .. })
    ));

    let zero_parallel = BatchScheduler::new(extractor.clone(), 2, 0);
    assert!(matches!(
        zero_parallel.run(&files(3)).await,
        Err(crate::Error::Config { .. })
    ));
    assert_eq!(extractor.max_in_flight.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn configuration_error_aborts_the_run() {
    let scheduler = BatchScheduler::new(Arc::new(FakeExtractor::default()), 2, 2);
    let mut input = files(6);
    input[3] = PathBuf::from("no-template.jpg");

    match scheduler.run(&input).await {
        Err(crate::Error::Config { key, .. }) => assert_eq!(key.as_deref(), Some("args_template")),
        other => panic!("expected configuration error, got {other:?}"),
    }
}

#[tokio::test]
async fn argument_error_from_extractor_is_not_a_chunk_failure() {
    struct RejectingExtractor;

    #[async_trait]
    impl MetadataExtractor for RejectingExtractor {
        async fn extract(&self, _files: &[PathBuf]) -> crate::Result<Vec<ImageRecord>> {
            Err(crate::Error::InvalidArgument("image path batch is empty".into()))
        }

        fn name(&self) -> &'static str {
            "rejecting"
        }
    }

    let scheduler = BatchScheduler::new(Arc::new(RejectingExtractor), 2, 1);
    assert!(matches!(
        scheduler.run(&files(3)).await,
        Err(crate::Error::InvalidArgument(_))
    ));
}
