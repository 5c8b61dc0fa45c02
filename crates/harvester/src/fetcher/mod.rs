//! The repository-fetching pipeline.
//!
//! Each cycle enumerates the store once, queues every row on a bounded
//! channel, closes the channel, and lets a fixed pool of workers drain
//! it; workers exit naturally once the queue is empty, so the cycle needs
//! no explicit counting. Between cycles the pipeline sleeps for the
//! configured interval. The resume id read at startup bounds only the
//! first cycle.

pub mod progress;
pub mod task;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use sea_orm::DatabaseConnection;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::store::{self, RepoTask, StoreError};
use crate::throttle::{Status, StatusCallback, Throttle};

pub use task::{FetchError, TaskOptions, TaskReport};

/// The repository fetcher.
pub struct Fetcher {
    db: DatabaseConnection,
    clone_root: PathBuf,
    languages: Vec<String>,
    workers: usize,
    interval: Duration,
    options: TaskOptions,
    throttle: Arc<Throttle>,
    progress: mpsc::Sender<u64>,
    cancel: CancellationToken,
}

impl Fetcher {
    /// Build a fetcher from the daemon configuration.
    pub fn new(
        cfg: &Config,
        db: DatabaseConnection,
        throttle: Arc<Throttle>,
        progress: mpsc::Sender<u64>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            db,
            clone_root: cfg.clone_dir.clone(),
            languages: cfg.fetch_languages.clone(),
            workers: cfg.max_fetcher_workers,
            interval: cfg.fetch_time_interval,
            options: TaskOptions {
                tar_repos: cfg.tar_repositories,
                tmp_dir: cfg.scratch_dir().map(PathBuf::from),
                tmp_dir_file_size_limit: cfg.tmp_dir_file_size_limit,
            },
            throttle,
            progress,
            cancel,
        }
    }

    /// Run fetch cycles until shutdown.
    ///
    /// An enumeration failure is fatal and bubbles to the supervisor;
    /// per-task failures are recorded through the throttle and never end
    /// a cycle.
    pub async fn run(&self, resume_id: u64) -> Result<(), StoreError> {
        let mut resume_id = resume_id;

        loop {
            tracing::info!("starting the repositories fetcher");
            let tasks = store::repos_to_fetch(
                &self.db,
                resume_id as i64,
                &self.languages,
                &self.clone_root,
            )
            .await?;
            // Resume only applies to the first cycle after startup.
            resume_id = 0;

            self.run_cycle(tasks).await;

            tracing::info!(
                interval_secs = self.interval.as_secs(),
                "waiting before re-starting the fetcher"
            );
            tokio::select! {
                _ = self.cancel.cancelled() => return Ok(()),
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }

    /// Dispatch one cycle's tasks to the worker pool and wait for all
    /// workers to finish.
    async fn run_cycle(&self, tasks: Vec<RepoTask>) {
        let (tx, rx) = mpsc::channel(tasks.len().max(1));
        for task in tasks {
            tx.send(task).await.expect("queue sized for the enumeration");
        }
        // Close the queue before the workers start draining it; they
        // exit once it runs dry instead of waiting for more work.
        drop(tx);

        let rx = Arc::new(Mutex::new(rx));
        let mut workers = JoinSet::new();
        for _ in 0..self.workers.max(1) {
            let rx = Arc::clone(&rx);
            let worker = Worker {
                options: self.options.clone(),
                throttle: Arc::clone(&self.throttle),
                progress: self.progress.clone(),
                cancel: self.cancel.clone(),
            };
            workers.spawn(async move { worker.drain(rx).await });
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(err) = joined {
                tracing::error!(error = %err, "fetch worker failed");
            }
        }
    }
}

/// One member of the fetch pool.
struct Worker {
    options: TaskOptions,
    throttle: Arc<Throttle>,
    progress: mpsc::Sender<u64>,
    cancel: CancellationToken,
}

impl Worker {
    async fn drain(&self, queue: Arc<Mutex<mpsc::Receiver<RepoTask>>>) {
        loop {
            if self.cancel.is_cancelled() {
                return;
            }

            let next = { queue.lock().await.recv().await };
            let Some(task) = next else {
                return;
            };

            self.process_one(task).await;
        }
    }

    async fn process_one(&self, task: RepoTask) {
        let options = self.options.clone();
        let blocking_task = task.clone();
        let report =
            match tokio::task::spawn_blocking(move || task::process(&blocking_task, &options))
                .await
            {
                Ok(report) => report,
                Err(err) => {
                    tracing::error!(
                        repository_id = task.id,
                        error = %err,
                        "fetch task aborted"
                    );
                    return;
                }
            };

        // Feed every recoverable error to the throttle; when the window
        // fills, the record call itself holds this worker back.
        let callback = throttling_logger();
        for err in &report.recorded {
            self.throttle.record(Some(err), Some(callback.as_ref())).await;
        }

        if report.succeeded && self.progress.send(task.id as u64).await.is_err() {
            tracing::warn!(repository_id = task.id, "progress channel closed");
        }
    }
}

/// The status callback shared by all workers: surface throttling pauses
/// in the log, stay quiet otherwise.
fn throttling_logger() -> Box<StatusCallback> {
    Box::new(|status| {
        if let Status::Throttling { wait } = status {
            tracing::info!(
                wait_secs = wait.as_secs(),
                "too many errors received, waiting before resuming"
            );
        }
    })
}
