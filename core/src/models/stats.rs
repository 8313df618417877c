use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::task::{TaskPriority, TaskStatus};

/// Aggregate counts over the user's whole task set, independent of any filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub by_status: BTreeMap<String, u64>,
    #[serde(default)]
    pub by_priority: BTreeMap<String, u64>,
}

impl StatsSnapshot {
    pub fn count(&self, status: TaskStatus) -> u64 {
        self.by_status.get(status.as_str()).copied().unwrap_or(0)
    }

    pub fn priority_count(&self, priority: TaskPriority) -> u64 {
        self.by_priority.get(priority.as_str()).copied().unwrap_or(0)
    }
}
