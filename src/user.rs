use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::activity::{compute_status, ActivityStatus};

/// A roster member as stored by the backing data source. The controller
/// only ever holds a cached copy of these; the source owns the truth.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: Option<DateTime<Utc>>,
}

/// A [`UserRecord`] with its derived activity status attached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnnotatedUser {
    #[serde(flatten)]
    pub record: UserRecord,
    pub status: ActivityStatus,
}

impl AnnotatedUser {
    pub fn annotate(record: UserRecord, now: DateTime<Utc>, timeout: Duration) -> Self {
        let status = compute_status(record.last_activity, now, timeout);
        Self { record, status }
    }

    /// String fields the search filter looks at.
    pub fn searchable_fields(&self) -> [&str; 3] {
        [&self.record.name, &self.record.email, &self.record.role]
    }

    /// Sortable string value for a named field. Unknown or non-string
    /// fields yield `None` and compare equal in the view pipeline.
    pub fn sort_value(&self, field: &str) -> Option<&str> {
        match field {
            "name" => Some(&self.record.name),
            "email" => Some(&self.record.email),
            "role" => Some(&self.record.role),
            _ => None,
        }
    }
}

/// Fields for creating a new roster member.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: String,
}

/// Partial update applied to an existing member; `None` fields are left
/// untouched by the data source.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}
