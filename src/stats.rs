use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures_util::future::BoxFuture;
use tracing::warn;

use crate::activity::ActivityStatus;
use crate::config::SyncConfig;
use crate::controller::UserListController;
use crate::error::SyncError;
use crate::scheduler::{RefreshFn, UpdateScheduler};
use crate::source::StatsProvider;

/// Feed key of the periodic aggregate-stats refresh.
pub const ANALYTICS_KEY: &str = "analytics-stats";

/// Aggregate dashboard numbers: provider-reported totals plus the active
/// member count derived from the user controller's current view.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RosterStats {
    pub total_users: u64,
    pub active_users: u64,
    pub average_attendance: u32,
    pub todays_bookings: u32,
    pub peak_hour: u8,
}

pub type StatsObserver = Arc<dyn Fn(RosterStats) + Send + Sync>;

struct StatsState {
    stats: RosterStats,
    observer: Option<StatsObserver>,
}

/// Polls the stats provider on its own feed and caches the last known-good
/// snapshot, so a provider failure keeps showing the previous numbers.
#[derive(Clone)]
pub struct StatsController {
    provider: Arc<dyn StatsProvider>,
    users: UserListController,
    scheduler: UpdateScheduler,
    config: SyncConfig,
    state: Arc<Mutex<StatsState>>,
}

impl StatsController {
    pub fn new(
        provider: Arc<dyn StatsProvider>,
        users: UserListController,
        scheduler: UpdateScheduler,
        config: SyncConfig,
    ) -> Self {
        Self {
            provider,
            users,
            scheduler,
            config,
            state: Arc::new(Mutex::new(StatsState {
                stats: RosterStats::default(),
                observer: None,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, StatsState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Fetches a fresh snapshot, falling back to the cached numbers when
    /// the provider fails.
    pub async fn fetch_stats(&self) -> RosterStats {
        match self.provider.fetch_stats().await {
            Ok(snapshot) => {
                let active_users = self
                    .users
                    .current()
                    .iter()
                    .filter(|user| user.status == ActivityStatus::Active)
                    .count() as u64;
                let stats = RosterStats {
                    total_users: snapshot.total_users,
                    active_users,
                    average_attendance: snapshot.average_attendance,
                    todays_bookings: snapshot.todays_bookings,
                    peak_hour: snapshot.peak_hour,
                };
                self.state().stats = stats;
                stats
            }
            Err(error) => {
                warn!(error = %error, "failed to fetch stats, keeping last snapshot");
                self.state().stats
            }
        }
    }

    /// Registers `observer` and starts the periodic stats feed.
    pub async fn start_update(&self, observer: StatsObserver, interval: Option<Duration>) {
        self.state().observer = Some(observer);
        let interval = interval.unwrap_or_else(|| self.config.stats_interval());

        let controller = self.clone();
        let refresh: RefreshFn = Arc::new(move || -> BoxFuture<'static, Result<(), SyncError>> {
            let controller = controller.clone();
            Box::pin(async move {
                let stats = controller.fetch_stats().await;
                let observer = controller.state().observer.clone();
                if let Some(observer) = observer {
                    observer(stats);
                }
                Ok(())
            })
        });

        self.scheduler.start_feed(ANALYTICS_KEY, refresh, interval).await;
    }

    pub async fn stop_update(&self) {
        self.scheduler.stop_feed(ANALYTICS_KEY).await;
    }

    /// Last known-good snapshot.
    pub fn current(&self) -> RosterStats {
        self.state().stats
    }
}
