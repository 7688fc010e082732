#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use roster_core::{
    DataSource, NewUser, StatsProvider, StatsSnapshot, SyncError, UserPatch, UserRecord,
};

/// Scripted reply for one `fetch_all_users` call: wait, then answer.
pub struct ScriptedFetch {
    pub delay: Duration,
    pub records: Vec<UserRecord>,
}

/// In-memory stand-in for the backing store. Failure can be toggled per
/// instance, and `fetch_all_users` replies can be scripted with delays to
/// exercise overlapping fetches under the paused test clock.
#[derive(Default)]
pub struct MemorySource {
    pub users: Mutex<Vec<UserRecord>>,
    pub fail: AtomicBool,
    pub fetch_calls: AtomicUsize,
    pub search_calls: AtomicUsize,
    pub search_queries: Mutex<Vec<String>>,
    pub scripted_fetches: Mutex<VecDeque<ScriptedFetch>>,
}

impl MemorySource {
    pub fn with_users(users: Vec<UserRecord>) -> Self {
        Self {
            users: Mutex::new(users),
            ..Self::default()
        }
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn push_scripted_fetch(&self, delay: Duration, records: Vec<UserRecord>) {
        self.scripted_fetches
            .lock()
            .unwrap()
            .push_back(ScriptedFetch { delay, records });
    }

    fn check_fail(&self) -> Result<(), SyncError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(SyncError::DataSource("backend offline".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DataSource for MemorySource {
    async fn fetch_all_users(&self) -> Result<Vec<UserRecord>, SyncError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.scripted_fetches.lock().unwrap().pop_front();
        if let Some(scripted) = scripted {
            tokio::time::sleep(scripted.delay).await;
            return Ok(scripted.records);
        }
        self.check_fail()?;
        Ok(self.users.lock().unwrap().clone())
    }

    async fn fetch_user(&self, id: &str) -> Result<Option<UserRecord>, SyncError> {
        self.check_fail()?;
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|user| user.id == id)
            .cloned())
    }

    async fn create_user(&self, fields: NewUser) -> Result<UserRecord, SyncError> {
        self.check_fail()?;
        let mut users = self.users.lock().unwrap();
        let record = UserRecord {
            id: format!("u{}", users.len() + 1),
            name: fields.name,
            email: fields.email,
            role: fields.role,
            created_at: Utc::now(),
            last_activity: None,
        };
        users.push(record.clone());
        Ok(record)
    }

    async fn update_user(&self, id: &str, patch: UserPatch) -> Result<UserRecord, SyncError> {
        self.check_fail()?;
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|user| user.id == id)
            .ok_or_else(|| SyncError::NotFound(id.to_owned()))?;
        if let Some(name) = patch.name {
            user.name = name;
        }
        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(role) = patch.role {
            user.role = role;
        }
        Ok(user.clone())
    }

    async fn delete_user(&self, id: &str) -> Result<(), SyncError> {
        self.check_fail()?;
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|user| user.id != id);
        if users.len() == before {
            return Err(SyncError::NotFound(id.to_owned()));
        }
        Ok(())
    }

    async fn search_users(&self, query: &str) -> Result<Vec<UserRecord>, SyncError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.search_queries.lock().unwrap().push(query.to_owned());
        self.check_fail()?;
        let needle = query.to_lowercase();
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|user| {
                user.name.to_lowercase().contains(&needle)
                    || user.email.to_lowercase().contains(&needle)
                    || user.role.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect())
    }
}

/// In-memory stats provider with a failure toggle.
#[derive(Default)]
pub struct MemoryStats {
    pub snapshot: Mutex<StatsSnapshot>,
    pub fail: AtomicBool,
}

impl MemoryStats {
    pub fn with_snapshot(snapshot: StatsSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            ..Self::default()
        }
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl StatsProvider for MemoryStats {
    async fn fetch_stats(&self) -> Result<StatsSnapshot, SyncError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SyncError::DataSource("stats backend offline".into()));
        }
        Ok(*self.snapshot.lock().unwrap())
    }
}

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

pub fn member(id: &str, name: &str, last_activity: Option<DateTime<Utc>>) -> UserRecord {
    UserRecord {
        id: id.to_owned(),
        name: name.to_owned(),
        email: format!("{}@gym.test", name.to_lowercase()),
        role: "member".to_owned(),
        created_at: fixed_now(),
        last_activity,
    }
}
