//! Error-rate throttling for the fetch pipeline.
//!
//! [`Throttle`] is a leaky bucket over *errors*, not requests: callers
//! record every recoverable failure, and once the sliding window fills up
//! the recording call itself blocks for a configured pause. The window
//! size is the bucket capacity and the leak interval is its granularity.
//! This is independent of any provider-side rate limit.

use std::sync::Mutex;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Smallest accepted leak interval. Anything faster makes the window
/// drain quicker than errors can realistically accumulate, which defeats
/// throttling.
const MIN_LEAK_INTERVAL: Duration = Duration::from_millis(100);

/// Errors produced when constructing a [`Throttle`].
#[derive(Debug, Error)]
pub enum ThrottleError {
    #[error("setting wait_secs to 0 would prevent throttling")]
    ZeroWait,

    #[error("setting capacity to 0 would prevent throttling")]
    ZeroCapacity,

    #[error("leak interval must be at least 100 milliseconds")]
    LeakIntervalTooShort,
}

/// State observed by a [`Throttle::record`] callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The error was absorbed by the window.
    Ok,
    /// The window is full; the caller is being suspended for `wait`.
    Throttling { wait: Duration },
}

/// Callback invoked with the observed [`Status`] of a record operation.
pub type StatusCallback = dyn Fn(Status) + Send + Sync;

/// A leaky-bucket error throttle.
///
/// Create one with [`Throttle::new`], start its leaker with
/// [`Throttle::inflate`], and tear it down with [`Throttle::deflate`].
/// Recording on a deflated throttle is a programmer error and panics.
pub struct Throttle {
    wait: Duration,
    leak_interval: Duration,
    tokens: mpsc::Sender<()>,
    intake: Mutex<Option<mpsc::Receiver<()>>>,
    shutdown: CancellationToken,
    leaker: Mutex<Option<JoinHandle<()>>>,
}

impl Throttle {
    /// Create a new throttle.
    ///
    /// `wait_secs` is the suspension applied to callers once the window is
    /// full, `capacity` the number of errors the sliding window holds, and
    /// `leak_interval` the cadence at which recorded errors drain out.
    pub fn new(
        wait_secs: u64,
        capacity: usize,
        leak_interval: Duration,
    ) -> Result<Self, ThrottleError> {
        if wait_secs == 0 {
            return Err(ThrottleError::ZeroWait);
        }
        if capacity == 0 {
            return Err(ThrottleError::ZeroCapacity);
        }
        if leak_interval < MIN_LEAK_INTERVAL {
            return Err(ThrottleError::LeakIntervalTooShort);
        }

        let (tokens, intake) = mpsc::channel(capacity);

        Ok(Self {
            wait: Duration::from_secs(wait_secs),
            leak_interval,
            tokens,
            intake: Mutex::new(Some(intake)),
            shutdown: CancellationToken::new(),
            leaker: Mutex::new(None),
        })
    }

    /// Start the background leaker. Must be called once before recording;
    /// a throttle that is no longer needed shall be torn down with
    /// [`Throttle::deflate`].
    pub fn inflate(&self) {
        let Some(mut intake) = self.intake.lock().expect("intake lock").take() else {
            return;
        };

        let shutdown = self.shutdown.clone();
        let leak_interval = self.leak_interval;

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    token = intake.recv() => match token {
                        Some(()) => tokio::time::sleep(leak_interval).await,
                        None => break,
                    },
                }
            }

            // Close the queue and drain leftovers so that any record
            // attempt after deflate fails loudly instead of filling a
            // dead bucket.
            intake.close();
            while intake.try_recv().is_ok() {}
        });

        *self.leaker.lock().expect("leaker lock") = Some(handle);
    }

    /// Tear the throttle down: stop the leaker, drain the window and close
    /// the queue. Completes once the leaker has acknowledged termination.
    pub async fn deflate(&self) {
        self.shutdown.cancel();

        let handle = self.leaker.lock().expect("leaker lock").take();
        match handle {
            Some(handle) => {
                let _ = handle.await;
            }
            // Never inflated; dropping the receiver closes the queue.
            None => {
                self.intake.lock().expect("intake lock").take();
            }
        }
    }

    /// Record an error, if there is one.
    ///
    /// With room left in the window this returns immediately and reports
    /// [`Status::Ok`] through the callback. With the window full it
    /// reports [`Status::Throttling`] and suspends the calling task for
    /// the configured wait.
    ///
    /// # Panics
    /// Panics when called after [`Throttle::deflate`].
    pub async fn record(
        &self,
        err: Option<&(dyn std::error::Error + Send + Sync)>,
        on_status: Option<&StatusCallback>,
    ) {
        let Some(err) = err else {
            return;
        };

        match self.tokens.try_send(()) {
            Ok(()) => {
                if let Some(cb) = on_status {
                    cb(Status::Ok);
                }
            }
            Err(TrySendError::Full(())) => {
                tracing::debug!(
                    error = %err,
                    wait_secs = self.wait.as_secs(),
                    "error window full, suspending caller"
                );
                if let Some(cb) = on_status {
                    cb(Status::Throttling { wait: self.wait });
                }
                tokio::time::sleep(self.wait).await;
            }
            Err(TrySendError::Closed(())) => {
                panic!("Throttle::record called after deflate");
            }
        }
    }

    /// The suspension applied once the window is full.
    pub fn wait(&self) -> Duration {
        self.wait
    }
}
