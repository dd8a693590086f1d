//! Device geolocation capability and the normalized position feed
//!
//! The device side is a [`LocationSource`]: one-shot fetch plus a continuous
//! watch, both configured by accuracy/timeout/max-age. [`PositionFeed`]
//! normalizes a source into the stream the rest of the crate consumes, and
//! [`WatchHandle`] owns a running watch as an explicit resource: stopping is
//! idempotent and dropping the handle stops the watch on every exit path.

use crate::domain::types::Position;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

/// Buffer for in-flight watch deliveries
const WATCH_CHANNEL_CAPACITY: usize = 32;

/// Grace on top of the device-reported timeout before the adapter gives up
/// on a one-shot fetch whose source never answers
const ONESHOT_TIMEOUT_GRACE: Duration = Duration::from_secs(1);

/// Options for one-shot fetches and continuous watches
#[derive(Debug, Clone, PartialEq)]
pub struct GeoOptions {
    /// Trade battery for precision
    pub high_accuracy: bool,
    /// Abort threshold for a single fix
    pub timeout: Duration,
    /// Maximum acceptable age of a cached fix
    pub max_age: Duration,
}

impl Default for GeoOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(10),
            max_age: Duration::from_secs(5),
        }
    }
}

impl From<&crate::infra::config::SensorConfig> for GeoOptions {
    fn from(config: &crate::infra::config::SensorConfig) -> Self {
        Self {
            high_accuracy: config.high_accuracy,
            timeout: config.timeout(),
            max_age: config.max_position_age(),
        }
    }
}

/// Sensor failure kinds surfaced by a location source.
///
/// The adapter never retries on its own; each failed attempt surfaces
/// exactly once and retry policy belongs to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    /// Device sensor access refused
    #[error("location permission denied")]
    PermissionDenied,

    /// The device could not produce a fix
    #[error("position unavailable")]
    Unavailable,

    /// The device gave up within the configured timeout
    #[error("position request timed out")]
    Timeout,
}

/// A watch registered on a location source: the raw delivery channel plus
/// the cancellation hook the source handed out.
pub struct WatchSubscription {
    pub events: mpsc::Receiver<Result<Position, PositionError>>,
    pub canceller: Box<dyn FnOnce() + Send>,
}

/// Device location capability (browser-style geolocation boundary)
#[async_trait]
pub trait LocationSource: Send + Sync + 'static {
    /// Resolve a single fix or fail with one of the three sensor errors.
    async fn current_position(&self, options: &GeoOptions)
        -> Result<Position, PositionError>;

    /// Register a continuous watch delivering a reading (or an error) per
    /// device update until cancelled.
    fn start_watch(&self, options: &GeoOptions) -> Result<WatchSubscription, PositionError>;
}

/// Normalized position feed over a device location source
pub struct PositionFeed<S: LocationSource> {
    source: Arc<S>,
    options: GeoOptions,
}

impl<S: LocationSource> Clone for PositionFeed<S> {
    fn clone(&self) -> Self {
        Self { source: self.source.clone(), options: self.options.clone() }
    }
}

impl<S: LocationSource> PositionFeed<S> {
    pub fn new(source: S, options: GeoOptions) -> Self {
        Self { source: Arc::new(source), options }
    }

    pub fn from_arc(source: Arc<S>, options: GeoOptions) -> Self {
        Self { source, options }
    }

    pub fn options(&self) -> &GeoOptions {
        &self.options
    }

    /// One-shot fetch with the configured options.
    ///
    /// The source enforces its own timeout; the adapter adds a backstop for
    /// sources that never answer at all.
    pub async fn current(&self) -> Result<Position, PositionError> {
        self.current_with(&self.options).await
    }

    /// One-shot fetch with explicit options (e.g. zero max-age for an
    /// emergency fix).
    pub async fn current_with(&self, options: &GeoOptions) -> Result<Position, PositionError> {
        let backstop = options.timeout + ONESHOT_TIMEOUT_GRACE;
        let result =
            match tokio::time::timeout(backstop, self.source.current_position(options)).await {
                Ok(result) => result,
                Err(_) => Err(PositionError::Timeout),
            };
        if let Err(ref e) = result {
            warn!(error = %e, "position_fetch_failed");
        }
        result
    }

    /// Start a continuous watch, returning the owned handle.
    pub fn start_watch(&self) -> Result<WatchHandle, PositionError> {
        let subscription = self.source.start_watch(&self.options)?;
        Ok(WatchHandle::from_subscription(subscription))
    }
}

/// An owned, running position watch.
///
/// `stop` is idempotent and guarantees that no reading is delivered through
/// [`WatchHandle::next`] afterwards; dropping the handle stops the watch.
pub struct WatchHandle {
    events: mpsc::Receiver<Result<Position, PositionError>>,
    cancel: watch::Sender<bool>,
    stopped: bool,
}

impl WatchHandle {
    /// Wrap a raw source subscription into an owned handle.
    pub fn from_subscription(subscription: WatchSubscription) -> Self {
        let WatchSubscription { events: mut source_rx, canceller } = subscription;
        let (tx, rx) = mpsc::channel(WATCH_CHANNEL_CAPACITY);
        let (cancel_tx, mut cancel_rx) = watch::channel(false);

        // Forwarding task: relays readings until cancelled or the source
        // hangs up, and releases the source subscription on every exit path
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel_rx.changed() => break,
                    item = source_rx.recv() => {
                        match item {
                            Some(item) => {
                                if tx.send(item).await.is_err() {
                                    break;
                                }
                            }
                            None => break,
                        }
                    }
                }
            }
            canceller();
            debug!("position_watch_released");
        });

        Self { events: rx, cancel: cancel_tx, stopped: false }
    }

    /// Next reading or surfaced sensor error. Returns None once the watch
    /// is stopped or the source hangs up.
    pub async fn next(&mut self) -> Option<Result<Position, PositionError>> {
        if self.stopped {
            return None;
        }
        self.events.recv().await
    }

    /// Stop the watch. Safe to call twice; the second call is a no-op.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        let _ = self.cancel.send(true);
        self.events.close();
        debug!("position_watch_stopped");
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
