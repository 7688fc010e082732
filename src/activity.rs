use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Derived activity status of a roster member. Never persisted; recomputed
/// from `last_activity` whenever a record enters the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityStatus {
    Active,
    Inactive,
}

impl fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityStatus::Active => write!(f, "Active"),
            ActivityStatus::Inactive => write!(f, "Inactive"),
        }
    }
}

/// Maps a last-activity timestamp to [`ActivityStatus`].
///
/// A missing timestamp is `Inactive`. Otherwise the user is `Active` iff
/// strictly less than `timeout` has elapsed; a reading exactly at the
/// threshold is `Inactive`.
pub fn compute_status(
    last_activity: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    timeout: Duration,
) -> ActivityStatus {
    let Some(last) = last_activity else {
        return ActivityStatus::Inactive;
    };
    let elapsed_ms = now.signed_duration_since(last).num_milliseconds();
    if elapsed_ms < timeout.as_millis() as i64 {
        ActivityStatus::Active
    } else {
        ActivityStatus::Inactive
    }
}

/// Human-readable rendering of an inactivity window, e.g. "24 hours".
pub fn readable_duration(window: Duration) -> String {
    let hours = window.as_secs() / 3600;
    if hours == 1 {
        "1 hour".to_owned()
    } else {
        format!("{hours} hours")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readable_duration_pluralizes() {
        assert_eq!(readable_duration(Duration::from_secs(3600)), "1 hour");
        assert_eq!(readable_duration(Duration::from_secs(2 * 3600)), "2 hours");
    }
}
