use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use futures_util::future::BoxFuture;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::scheduler::{RefreshFn, UpdateScheduler};
use crate::source::DataSource;
use crate::user::{AnnotatedUser, NewUser, UserPatch};
use crate::view::{derive_view, SortDirection, SortSpec};

/// Feed key of the periodic user-list refresh.
pub const USER_LIST_KEY: &str = "user-list";

/// Callback invoked with the derived view after every publish. Runs
/// synchronously on the publishing task and must not block.
pub type ViewObserver = Arc<dyn Fn(Vec<AnnotatedUser>) + Send + Sync>;

/// Outcome of a cache refresh. `Stale` still carries the last known-good
/// records so callers can keep rendering through a backend hiccup, while
/// remaining able to tell the two apart.
#[derive(Debug)]
pub enum Refresh {
    Fresh(Vec<AnnotatedUser>),
    Stale {
        current: Vec<AnnotatedUser>,
        error: SyncError,
    },
}

impl Refresh {
    pub fn is_fresh(&self) -> bool {
        matches!(self, Refresh::Fresh(_))
    }

    pub fn records(self) -> Vec<AnnotatedUser> {
        match self {
            Refresh::Fresh(records) => records,
            Refresh::Stale { current, .. } => current,
        }
    }
}

struct ControllerState {
    cache: Vec<AnnotatedUser>,
    published: Vec<AnnotatedUser>,
    query: String,
    sort: Option<SortSpec>,
    observer: Option<ViewObserver>,
    pending_search: Option<JoinHandle<()>>,
    // Bumped per search() call; a resolving search that no longer matches
    // has been superseded and must not touch the cache.
    search_seq: u64,
    // Monotonic generation guard: a fetch takes a generation before its
    // await point and its result is dropped if a newer one has already
    // been applied, so a slow poll cannot clobber fresher data.
    fetch_seq: u64,
    applied_seq: u64,
}

impl ControllerState {
    fn empty() -> Self {
        Self {
            cache: Vec::new(),
            published: Vec::new(),
            query: String::new(),
            sort: None,
            observer: None,
            pending_search: None,
            search_seq: 0,
            fetch_seq: 0,
            applied_seq: 0,
        }
    }
}

/// Owns the in-memory copy of the roster and keeps it in sync with the
/// backing data source under periodic refresh, debounced search, sorting,
/// and mutations.
///
/// All public operations are fail-soft towards the data source: a failed
/// call leaves the cache and the published view untouched, preferring
/// stale-but-present data over a blanked list.
#[derive(Clone)]
pub struct UserListController {
    source: Arc<dyn DataSource>,
    scheduler: UpdateScheduler,
    config: SyncConfig,
    state: Arc<Mutex<ControllerState>>,
}

impl UserListController {
    pub fn new(source: Arc<dyn DataSource>, scheduler: UpdateScheduler, config: SyncConfig) -> Self {
        Self {
            source,
            scheduler,
            config,
            state: Arc::new(Mutex::new(ControllerState::empty())),
        }
    }

    fn state(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Retrieves the full roster, annotates activity status, and replaces
    /// the cache wholesale. On failure the previous cache is kept and
    /// returned as [`Refresh::Stale`].
    pub async fn fetch_all(&self) -> Refresh {
        let generation = {
            let mut state = self.state();
            state.fetch_seq += 1;
            state.fetch_seq
        };

        match self.source.fetch_all_users().await {
            Ok(records) => {
                let now = Utc::now();
                let timeout = self.config.inactivity_timeout();
                let annotated: Vec<AnnotatedUser> = records
                    .into_iter()
                    .map(|record| AnnotatedUser::annotate(record, now, timeout))
                    .collect();

                let mut state = self.state();
                if generation > state.applied_seq {
                    state.applied_seq = generation;
                    state.cache = annotated;
                } else {
                    debug!(generation, applied = state.applied_seq, "dropping stale fetch result");
                }
                Refresh::Fresh(state.cache.clone())
            }
            Err(error) => {
                warn!(error = %error, "failed to fetch users, keeping cached roster");
                Refresh::Stale {
                    current: self.state().cache.clone(),
                    error,
                }
            }
        }
    }

    /// Registers `observer` and starts the periodic user-list feed. A feed
    /// already running under [`USER_LIST_KEY`] is replaced. The first
    /// refresh runs immediately; each tick re-fetches and republishes.
    pub async fn start_sync(&self, observer: ViewObserver, interval: Option<Duration>) {
        self.state().observer = Some(observer);
        let interval = interval.unwrap_or_else(|| self.config.update_interval());

        let controller = self.clone();
        let refresh: RefreshFn = Arc::new(move || -> BoxFuture<'static, Result<(), SyncError>> {
            let controller = controller.clone();
            Box::pin(async move {
                // fetch_all is fail-soft; stale data still gets published.
                let _ = controller.fetch_all().await;
                controller.publish();
                Ok(())
            })
        });

        self.scheduler.start_feed(USER_LIST_KEY, refresh, interval).await;
    }

    /// Stops the periodic feed. The observer stays registered so a later
    /// [`start_sync`](Self::start_sync) simply replaces it.
    pub async fn stop_sync(&self) {
        self.scheduler.stop_feed(USER_LIST_KEY).await;
    }

    /// Sets the search query.
    ///
    /// An empty or whitespace query clears the filter and republishes from
    /// the existing cache immediately, with no data-source round-trip. A
    /// non-empty query restarts the debounce window; only the most recent
    /// call survives it, and superseded searches never reach the source.
    pub fn search(&self, query: impl Into<String>) {
        let query = query.into();
        let needle = query.trim().to_owned();

        if needle.is_empty() {
            {
                let mut state = self.state();
                state.query.clear();
                state.search_seq += 1;
                if let Some(pending) = state.pending_search.take() {
                    pending.abort();
                }
            }
            self.publish();
            return;
        }

        let seq = {
            let mut state = self.state();
            state.query = query;
            state.search_seq += 1;
            if let Some(pending) = state.pending_search.take() {
                pending.abort();
            }
            state.search_seq
        };

        let controller = self.clone();
        let debounce = self.config.search_debounce();
        let task = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            controller.resolve_search(seq, needle).await;
        });
        self.state().pending_search = Some(task);
    }

    async fn resolve_search(&self, seq: u64, needle: String) {
        let generation = {
            let mut state = self.state();
            state.fetch_seq += 1;
            state.fetch_seq
        };

        match self.source.search_users(&needle).await {
            Ok(records) => {
                let now = Utc::now();
                let timeout = self.config.inactivity_timeout();
                let annotated: Vec<AnnotatedUser> = records
                    .into_iter()
                    .map(|record| AnnotatedUser::annotate(record, now, timeout))
                    .collect();

                {
                    let mut state = self.state();
                    if seq != state.search_seq {
                        debug!(seq, current = state.search_seq, "search superseded, dropping result");
                        return;
                    }
                    if generation > state.applied_seq {
                        state.applied_seq = generation;
                        state.cache = annotated;
                    }
                }
                self.publish();
            }
            Err(error) => {
                warn!(error = %error, query = %needle, "search failed, keeping cached roster");
            }
        }
    }

    /// Updates the sort settings and republishes from the existing cache.
    pub fn set_sort(&self, field: impl Into<String>, direction: SortDirection) {
        self.state().sort = Some(SortSpec {
            field: field.into(),
            direction,
        });
        self.publish();
    }

    /// Creates a member, then resynchronizes and republishes. Returns the
    /// created record with its status annotated.
    pub async fn create_user(&self, fields: NewUser) -> Result<AnnotatedUser, SyncError> {
        let created = self.source.create_user(fields).await?;
        let annotated =
            AnnotatedUser::annotate(created, Utc::now(), self.config.inactivity_timeout());
        let _ = self.fetch_all().await;
        self.publish();
        Ok(annotated)
    }

    /// Applies `patch` to a member. The cache is only touched after the
    /// write is confirmed: the source call runs first, then a full
    /// re-fetch and republish.
    pub async fn update_user(&self, id: &str, patch: UserPatch) -> Result<AnnotatedUser, SyncError> {
        let updated = self.source.update_user(id, patch).await?;
        let annotated =
            AnnotatedUser::annotate(updated, Utc::now(), self.config.inactivity_timeout());
        let _ = self.fetch_all().await;
        self.publish();
        Ok(annotated)
    }

    /// Deletes a member, then resynchronizes and republishes. On a source
    /// error the cache and published view are left untouched.
    pub async fn delete_user(&self, id: &str) -> Result<(), SyncError> {
        self.source.delete_user(id).await?;
        let _ = self.fetch_all().await;
        self.publish();
        Ok(())
    }

    /// Looks a single member up by id, annotated with the current status.
    pub async fn get_user(&self, id: &str) -> Result<AnnotatedUser, SyncError> {
        match self.source.fetch_user(id).await? {
            Some(record) => Ok(AnnotatedUser::annotate(
                record,
                Utc::now(),
                self.config.inactivity_timeout(),
            )),
            None => Err(SyncError::NotFound(id.to_owned())),
        }
    }

    /// Snapshot of the last published derived view.
    pub fn current(&self) -> Vec<AnnotatedUser> {
        self.state().published.clone()
    }

    /// Runs the cache through the derived-view pipeline, records the
    /// result, and hands it to the observer. The state lock is released
    /// before the observer runs, so an observer may call back into
    /// [`current`](Self::current).
    fn publish(&self) -> Vec<AnnotatedUser> {
        let (view, observer) = {
            let mut state = self.state();
            let view = derive_view(&state.cache, &state.query, state.sort.as_ref());
            state.published = view.clone();
            (view, state.observer.clone())
        };
        if let Some(observer) = observer {
            observer(view.clone());
        }
        view
    }
}
