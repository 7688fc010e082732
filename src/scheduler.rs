use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::SyncError;

/// Default period for a feed when the caller does not override it.
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(10);

/// Type-erased refresh callback driven by the scheduler. The scheduler
/// never stops a feed on error; it logs the failure and keeps ticking, so
/// refresh functions are expected to be fail-soft themselves.
pub type RefreshFn = Arc<dyn Fn() -> BoxFuture<'static, Result<(), SyncError>> + Send + Sync>;

struct FeedHandle {
    cancel_tx: broadcast::Sender<()>,
    join: JoinHandle<()>,
}

impl FeedHandle {
    async fn stop(self, key: &str) {
        let _ = self.cancel_tx.send(());
        if let Err(err) = self.join.await {
            warn!(key, error = %err, "feed task did not shut down cleanly");
        }
    }
}

/// Registry of named periodic refresh feeds.
///
/// At most one live timer exists per key: starting a feed under a key that
/// is already running stops and joins the old task before the new one is
/// spawned, so two feeds never overlap for the same key. The registry is an
/// explicit instance handed to whoever needs it, not process-global state.
#[derive(Clone, Default)]
pub struct UpdateScheduler {
    feeds: Arc<Mutex<HashMap<String, FeedHandle>>>,
}

impl UpdateScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts (or restarts) the feed registered under `key`.
    ///
    /// The interval's first tick fires immediately, so `refresh` runs once
    /// up front and observers see data before the first full period
    /// elapses.
    pub async fn start_feed(&self, key: &str, refresh: RefreshFn, interval: Duration) {
        // Single critical section per key: the map lock is held across the
        // old feed's shutdown so a replace can never leave two timers live.
        let mut feeds = self.feeds.lock().await;
        if let Some(old) = feeds.remove(key) {
            old.stop(key).await;
        }

        let (cancel_tx, mut cancel_rx) = broadcast::channel(1);
        let feed_key = key.to_owned();
        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = cancel_rx.recv() => {
                        debug!(key = %feed_key, "feed shutdown requested");
                        break;
                    }
                    _ = ticker.tick() => {
                        if let Err(err) = refresh().await {
                            warn!(key = %feed_key, error = %err, "feed refresh failed");
                        }
                    }
                }
            }
        });

        feeds.insert(key.to_owned(), FeedHandle { cancel_tx, join });
    }

    /// Stops the feed registered under `key`; no-op when absent.
    pub async fn stop_feed(&self, key: &str) {
        let handle = self.feeds.lock().await.remove(key);
        if let Some(handle) = handle {
            handle.stop(key).await;
        }
    }

    /// Stops every registered feed; used at shutdown.
    pub async fn stop_all(&self) {
        let drained: Vec<(String, FeedHandle)> = self.feeds.lock().await.drain().collect();
        for (key, handle) in drained {
            handle.stop(&key).await;
        }
    }

    pub async fn is_running(&self, key: &str) -> bool {
        self.feeds.lock().await.contains_key(key)
    }
}
