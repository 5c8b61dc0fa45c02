//! The top-level supervisor.
//!
//! Validates the environment, opens the store, builds one crawler per
//! configured provider and the shared throttle, then spawns the two
//! long-lived pipelines and waits on their join. The signal task owns the
//! shutdown flow: flip the cancellation token, let the progress writer
//! drain, deflate the throttle, exit 0.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::crawler::{self, Crawler, CrawlerError};
use crate::db;
use crate::fetcher::progress::{self, ID_CHANNEL_BUFFER_SIZE};
use crate::fetcher::Fetcher;
use crate::store::StoreError;
use crate::throttle::{Throttle, ThrottleError};

/// How long shutdown waits for the progress writer to drain before
/// exiting anyway.
const SHUTDOWN_DRAIN_WINDOW: Duration = Duration::from_secs(5);

/// Which pipelines to run.
#[derive(Debug, Clone, Copy, Default)]
pub struct DaemonOptions {
    pub disable_crawlers: bool,
    pub disable_fetcher: bool,
}

/// Startup and runtime failures that end the daemon with exit code 1.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("clone directory {path} is not usable: {reason}")]
    CloneDir { path: PathBuf, reason: String },

    #[error(transparent)]
    Database(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Crawler(#[from] CrawlerError),

    #[error(transparent)]
    Throttle(#[from] ThrottleError),

    #[error("cannot open progress file: {0}")]
    Progress(std::io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for daemon operations.
pub type Result<T> = std::result::Result<T, DaemonError>;

/// Run the daemon until a pipeline fails fatally or a signal ends the
/// process.
pub async fn run(cfg: Config, opts: DaemonOptions) -> Result<()> {
    check_clone_dir(&cfg.clone_dir)?;

    let db = db::connect(&cfg.database).await?;
    let cancel = CancellationToken::new();

    let mut pipelines: JoinSet<Result<()>> = JoinSet::new();

    if !opts.disable_crawlers {
        let mut crawlers: Vec<Arc<dyn Crawler>> = Vec::with_capacity(cfg.crawlers.len());
        for block in &cfg.crawlers {
            crawlers.push(Arc::from(crawler::new_crawler(
                block,
                db.clone(),
                cancel.clone(),
            )?));
        }

        let interval = cfg.crawling_time_interval;
        let crawl_cancel = cancel.clone();
        pipelines.spawn(async move {
            crawl_loop(crawlers, interval, crawl_cancel).await;
            Ok(())
        });
    }

    if !opts.disable_fetcher {
        let throttle = Arc::new(Throttle::new(
            cfg.throttler_wait_time,
            cfg.throttler_sliding_window_size,
            Duration::from_millis(cfg.throttler_leak_interval),
        )?);
        throttle.inflate();

        let resume_id = progress::read_resume_id(&cfg.clone_dir);
        let (id_tx, id_rx) = mpsc::channel(ID_CHANNEL_BUFFER_SIZE);
        let writer = progress::spawn_writer(&cfg.clone_dir, id_rx, cancel.clone())
            .await
            .map_err(DaemonError::Progress)?;

        spawn_signal_handler(cancel.clone(), writer, Arc::clone(&throttle));

        let fetcher = Fetcher::new(&cfg, db.clone(), throttle, id_tx, cancel.clone());
        pipelines.spawn(async move { fetcher.run(resume_id).await.map_err(DaemonError::from) });
    }

    // Wait until the cows come home, or a pipeline dies fatally.
    while let Some(joined) = pipelines.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(err)) => return Err(err),
            Err(err) => {
                tracing::error!(error = %err, "pipeline task failed");
            }
        }
    }

    Ok(())
}

/// Run all crawlers concurrently, sleep, repeat.
async fn crawl_loop(
    crawlers: Vec<Arc<dyn Crawler>>,
    interval: Duration,
    cancel: CancellationToken,
) {
    if crawlers.is_empty() {
        return;
    }

    loop {
        let mut passes = JoinSet::new();
        for crawler in &crawlers {
            tracing::info!(kind = crawler.kind(), "starting a crawling pass");
            let crawler = Arc::clone(crawler);
            passes.spawn(async move { crawler.crawl().await });
        }
        while passes.join_next().await.is_some() {}

        if cancel.is_cancelled() {
            return;
        }

        tracing::info!(
            interval_secs = interval.as_secs(),
            "waiting before re-starting the crawlers"
        );
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

/// Install the shutdown flow: on SIGINT/SIGTERM, cancel everything, give
/// the progress writer a drain window, deflate the throttle and exit 0.
fn spawn_signal_handler(
    cancel: CancellationToken,
    writer: JoinHandle<()>,
    throttle: Arc<Throttle>,
) {
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("caught signal, exiting now");

        cancel.cancel();

        // The writer flushes and closes the file on cancellation.
        if tokio::time::timeout(SHUTDOWN_DRAIN_WINDOW, writer)
            .await
            .is_err()
        {
            tracing::warn!("progress writer did not drain in time");
        }

        throttle.deflate().await;
        std::process::exit(0);
    });
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut interrupt = signal(SignalKind::interrupt()).expect("install SIGINT handler");
        let mut terminate = signal(SignalKind::terminate()).expect("install SIGTERM handler");

        tokio::select! {
            _ = interrupt.recv() => {}
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c()
        .await
        .expect("install Ctrl+C handler");
}

/// The clone root must exist, be a directory and be writable before any
/// pipeline starts.
fn check_clone_dir(path: &Path) -> Result<()> {
    let meta = std::fs::metadata(path).map_err(|err| DaemonError::CloneDir {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;

    if !meta.is_dir() {
        return Err(DaemonError::CloneDir {
            path: path.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }

    if let Err(err) = tempfile::tempfile_in(path) {
        return Err(DaemonError::CloneDir {
            path: path.to_path_buf(),
            reason: format!("not writable: {err}"),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_dir_must_exist() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let missing = tmp.path().join("does-not-exist");
        assert!(matches!(
            check_clone_dir(&missing),
            Err(DaemonError::CloneDir { .. })
        ));
    }

    #[test]
    fn clone_dir_must_be_a_directory() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let file = tmp.path().join("plain");
        std::fs::write(&file, "x").expect("write");
        assert!(matches!(
            check_clone_dir(&file),
            Err(DaemonError::CloneDir { .. })
        ));
    }

    #[test]
    fn writable_directory_is_accepted() {
        let tmp = tempfile::tempdir().expect("tempdir");
        check_clone_dir(tmp.path()).expect("usable clone dir");
    }
}
