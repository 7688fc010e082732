pub mod activity;
pub mod config;
pub mod controller;
pub mod error;
pub mod scheduler;
pub mod source;
pub mod stats;
pub mod user;
pub mod view;

pub use activity::{compute_status, readable_duration, ActivityStatus};
pub use config::SyncConfig;
pub use controller::{Refresh, UserListController, ViewObserver, USER_LIST_KEY};
pub use error::SyncError;
pub use scheduler::{RefreshFn, UpdateScheduler, DEFAULT_UPDATE_INTERVAL};
pub use source::{DataSource, StatsProvider, StatsSnapshot};
pub use stats::{RosterStats, StatsController, StatsObserver, ANALYTICS_KEY};
pub use user::{AnnotatedUser, NewUser, UserPatch, UserRecord};
pub use view::{derive_view, SortDirection, SortSpec};
