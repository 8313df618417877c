use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReloadOutcome {
    /// The response replaced the cache.
    Applied { seq: u64, len: usize },
    /// A reload issued later had already been applied; the response was dropped.
    Stale { seq: u64, applied: u64 },
}

impl ReloadOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeleteOutcome {
    Deleted,
    /// The user declined the confirmation; nothing was sent.
    Declined,
}

#[derive(Debug, Clone, Serialize)]
pub enum CacheEvent {
    Reloaded {
        seq: u64,
        len: usize,
        timestamp: DateTime<Utc>,
    },
    StaleDiscarded {
        seq: u64,
        applied: u64,
        timestamp: DateTime<Utc>,
    },
    Inserted {
        id: String,
        timestamp: DateTime<Utc>,
    },
    Replaced {
        id: String,
        timestamp: DateTime<Utc>,
    },
    Removed {
        id: String,
        timestamp: DateTime<Utc>,
    },
    Cleared {
        timestamp: DateTime<Utc>,
    },
}
