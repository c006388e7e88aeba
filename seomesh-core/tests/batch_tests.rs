// Tests for the bounded batch runner

use seomesh_core::SeoError;
use seomesh_core::batch::{BatchOptions, BatchOutcome, run_batch};
use seomesh_core::config::BatchPolicy;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn paths(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("/job-detail/{}", i)).collect()
}

fn options(concurrency: usize, timeout: Duration) -> BatchOptions {
    BatchOptions {
        concurrency,
        timeout,
        progress: None,
    }
}

#[tokio::test]
async fn test_results_keep_input_order() {
    let outcome = run_batch(paths(20), &options(4, Duration::from_secs(10)), |path: &str| {
        // Later pages finish first
        let idx: u64 = path.rsplit('/').next().unwrap().parse().unwrap();
        std::thread::sleep(Duration::from_millis(20 - idx));
        Ok(path.to_string())
    })
    .await;

    assert_eq!(outcome.results, paths(20));
    assert!(outcome.errors.is_empty());
    assert!(!outcome.timed_out);
}

#[tokio::test]
async fn test_failures_are_collected_per_page() {
    let outcome = run_batch(paths(5), &options(2, Duration::from_secs(10)), |path: &str| {
        if path.ends_with('3') {
            Err(SeoError::Other("boom".to_string()))
        } else {
            Ok(1usize)
        }
    })
    .await;

    assert_eq!(outcome.results.len(), 4);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].path, "/job-detail/3");
    assert!(outcome.errors[0].message.contains("boom"));
}

#[tokio::test]
async fn test_concurrency_is_bounded() {
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let (r, p) = (running.clone(), peak.clone());

    run_batch(paths(12), &options(3, Duration::from_secs(10)), move |_path: &str| {
        let now = r.fetch_add(1, Ordering::SeqCst) + 1;
        p.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(15));
        r.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    })
    .await;

    assert!(peak.load(Ordering::SeqCst) <= 3);
    assert!(peak.load(Ordering::SeqCst) >= 1);
}

#[tokio::test]
async fn test_timeout_returns_partial_results() {
    let outcome = run_batch(paths(4), &options(1, Duration::from_millis(100)), |path: &str| {
        if path.ends_with('0') {
            Ok(0)
        } else {
            std::thread::sleep(Duration::from_millis(300));
            Ok(1)
        }
    })
    .await;

    assert!(outcome.timed_out);
    // The fast page plus the one running when time ran out
    assert_eq!(outcome.results, vec![0, 1]);
}

#[tokio::test]
async fn test_no_work_finishes_after_a_timed_out_batch_returns() {
    let finished = Arc::new(AtomicUsize::new(0));
    let counter = finished.clone();

    let outcome = run_batch(paths(3), &options(1, Duration::from_millis(50)), move |_path: &str| {
        std::thread::sleep(Duration::from_millis(200));
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
    .await;

    let finished_at_return = finished.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert!(outcome.timed_out);
    assert_eq!(finished_at_return, 1);
    assert_eq!(outcome.results.len(), finished_at_return);
    assert_eq!(finished.load(Ordering::SeqCst), finished_at_return);
}

#[tokio::test]
async fn test_store_failures_are_tagged() {
    let outcome: BatchOutcome<()> = run_batch(paths(2), &options(2, Duration::from_secs(10)), |path: &str| {
        if path.ends_with('0') {
            Err(SeoError::Persistence(rusqlite::Error::QueryReturnedNoRows))
        } else {
            Err(SeoError::Other("bad page".to_string()))
        }
    })
    .await;

    assert_eq!(outcome.errors.len(), 2);
    assert!(outcome.errors[0].persistence);
    assert!(!outcome.errors[1].persistence);
    assert!(outcome.results.is_empty());
}

#[tokio::test]
async fn test_panicking_page_is_reported() {
    let outcome = run_batch(paths(3), &options(2, Duration::from_secs(10)), |path: &str| {
        if path.ends_with('1') {
            panic!("page handler crashed");
        }
        Ok(())
    })
    .await;

    assert_eq!(outcome.results.len(), 2);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].path, "/job-detail/1");
    assert!(outcome.errors[0].message.starts_with("Task join error"));
    assert!(!outcome.errors[0].persistence);
}

#[tokio::test]
async fn test_zero_concurrency_still_runs() {
    let outcome = run_batch(paths(3), &options(0, Duration::from_secs(10)), |_path: &str| Ok(())).await;
    assert_eq!(outcome.results.len(), 3);
}

#[tokio::test]
async fn test_progress_callback_sees_every_page() {
    let count = Arc::new(AtomicUsize::new(0));
    let sink = count.clone();
    let options = BatchOptions::from_policy(&BatchPolicy::default()).with_progress(Arc::new(
        move |msg: String| {
            assert!(msg.starts_with('['));
            sink.fetch_add(1, Ordering::SeqCst);
        },
    ));

    run_batch(paths(6), &options, |_path: &str| Ok(())).await;
    assert_eq!(count.load(Ordering::SeqCst), 6);
}

#[test]
fn test_options_follow_the_policy() {
    let policy = BatchPolicy {
        concurrency: 3,
        timeout_secs: 9,
    };
    let options = BatchOptions::from_policy(&policy);
    assert_eq!(options.concurrency, 3);
    assert_eq!(options.timeout, Duration::from_secs(9));
    assert!(options.progress.is_none());
}
