// Bounded parallel execution of per-page work

use crate::config::BatchPolicy;
use crate::error::{Result, SeoError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Callback for reporting batch progress
pub type ProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// A page that failed inside a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageError {
    pub path: String,
    pub message: String,
    /// The failure came from the store, not from the page itself.
    #[serde(default)]
    pub persistence: bool,
}

impl PageError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            persistence: false,
        }
    }

    pub fn from_error(path: impl Into<String>, error: &SeoError) -> Self {
        Self {
            path: path.into(),
            message: error.to_string(),
            persistence: error.is_persistence(),
        }
    }
}

/// Options for configuring a batch run
#[derive(Clone)]
pub struct BatchOptions {
    pub concurrency: usize,
    pub timeout: Duration,
    pub progress: Option<ProgressCallback>,
}

impl BatchOptions {
    pub fn from_policy(policy: &BatchPolicy) -> Self {
        Self {
            concurrency: policy.concurrency,
            timeout: policy.timeout(),
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }
}

#[derive(Debug)]
pub struct BatchOutcome<T> {
    /// Successful results in input order.
    pub results: Vec<T>,
    pub errors: Vec<PageError>,
    pub timed_out: bool,
}

/// Run `work` for every path on the blocking pool, at most
/// `options.concurrency` at a time. Failures are collected per page. Once
/// the timeout expires no further page starts; pages already running are
/// waited for and their results are included.
pub async fn run_batch<T, F>(paths: Vec<String>, options: &BatchOptions, work: F) -> BatchOutcome<T>
where
    T: Send + 'static,
    F: Fn(&str) -> Result<T> + Send + Sync + 'static,
{
    let total = paths.len();
    let work = Arc::new(work);
    let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let results: Arc<Mutex<Vec<(usize, T)>>> = Arc::new(Mutex::new(Vec::with_capacity(total)));
    let errors: Arc<Mutex<Vec<(usize, PageError)>>> = Arc::new(Mutex::new(Vec::new()));

    let mut tasks = JoinSet::new();
    for (idx, path) in paths.into_iter().enumerate() {
        let work = work.clone();
        let semaphore = semaphore.clone();
        let results = results.clone();
        let errors = errors.clone();
        let progress = options.progress.clone();

        tasks.spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return;
            };

            let job_path = path.clone();
            let outcome = tokio::task::spawn_blocking(move || (*work)(&job_path)).await;

            match outcome.map_err(SeoError::from) {
                Ok(Ok(value)) => results.lock().await.push((idx, value)),
                Ok(Err(e)) | Err(e) => {
                    warn!("Page {} failed: {}", path, e);
                    errors.lock().await.push((idx, PageError::from_error(&path, &e)));
                }
            }

            if let Some(ref progress) = progress {
                progress(format!("[{}/{}] {}", idx + 1, total, path));
            }
        });
    }

    let timed_out = tokio::time::timeout(options.timeout, drain(&mut tasks))
        .await
        .is_err();
    if timed_out {
        warn!(
            "Batch timed out after {:?}, waiting for pages in flight",
            options.timeout
        );
        // Pages still queued for a permit see a closed semaphore and skip.
        semaphore.close();
        drain(&mut tasks).await;
    }

    let mut results = std::mem::take(&mut *results.lock().await);
    let mut errors = std::mem::take(&mut *errors.lock().await);
    results.sort_by_key(|(idx, _)| *idx);
    errors.sort_by_key(|(idx, _)| *idx);

    debug!(
        "Batch finished: {} ok, {} failed, {} total",
        results.len(),
        errors.len(),
        total
    );

    BatchOutcome {
        results: results.into_iter().map(|(_, value)| value).collect(),
        errors: errors.into_iter().map(|(_, error)| error).collect(),
        timed_out,
    }
}

async fn drain(tasks: &mut JoinSet<()>) {
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            warn!("Batch task failed: {}", e);
        }
    }
}
