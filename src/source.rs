use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SyncError;
use crate::user::{NewUser, UserPatch, UserRecord};

/// Backing store for the roster. The controller is injected with one of
/// these and never talks to the network or database directly.
///
/// Every call may fail; failures surface as [`SyncError`], never a panic.
/// Implementations should map "record absent" on update/delete/get-by-id
/// to [`SyncError::NotFound`].
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch_all_users(&self) -> Result<Vec<UserRecord>, SyncError>;

    async fn fetch_user(&self, id: &str) -> Result<Option<UserRecord>, SyncError>;

    async fn create_user(&self, fields: NewUser) -> Result<UserRecord, SyncError>;

    async fn update_user(&self, id: &str, patch: UserPatch) -> Result<UserRecord, SyncError>;

    async fn delete_user(&self, id: &str) -> Result<(), SyncError>;

    /// Server-side search over the roster's searchable fields.
    async fn search_users(&self, query: &str) -> Result<Vec<UserRecord>, SyncError>;
}

/// Aggregate numbers as reported by the backing store. The queries behind
/// them are opaque to this crate.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct StatsSnapshot {
    pub total_users: u64,
    pub average_attendance: u32,
    pub todays_bookings: u32,
    pub peak_hour: u8,
}

#[async_trait]
pub trait StatsProvider: Send + Sync {
    async fn fetch_stats(&self) -> Result<StatsSnapshot, SyncError>;
}
