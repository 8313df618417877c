//! Search, filter and sort parameters for task reloads.
//!
//! The values are sent verbatim to `GET /tasks`; nothing here filters or
//! sorts locally.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{ParseEnumError, TaskPriority, TaskStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortField {
    #[default]
    #[serde(rename = "createdAt")]
    CreatedAt,
    #[serde(rename = "updatedAt")]
    UpdatedAt,
    #[serde(rename = "priority")]
    Priority,
    #[serde(rename = "status")]
    Status,
}

impl SortField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreatedAt => "createdAt",
            Self::UpdatedAt => "updatedAt",
            Self::Priority => "priority",
            Self::Status => "status",
        }
    }
}

impl FromStr for SortField {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "createdAt" | "created" | "created-at" => Ok(Self::CreatedAt),
            "updatedAt" | "updated" | "updated-at" => Ok(Self::UpdatedAt),
            "priority" => Ok(Self::Priority),
            "status" => Ok(Self::Status),
            _ => Err(ParseEnumError {
                kind: "sort field",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            _ => Err(ParseEnumError {
                kind: "sort order",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryState {
    pub search_term: String,
    pub status_filter: Option<TaskStatus>,
    pub priority_filter: Option<TaskPriority>,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

impl QueryState {
    // Setters report whether the stored value changed.

    pub fn set_search_term(&mut self, term: impl Into<String>) -> bool {
        replace(&mut self.search_term, term.into())
    }

    pub fn set_status_filter(&mut self, status: Option<TaskStatus>) -> bool {
        replace(&mut self.status_filter, status)
    }

    pub fn set_priority_filter(&mut self, priority: Option<TaskPriority>) -> bool {
        replace(&mut self.priority_filter, priority)
    }

    pub fn set_sort_by(&mut self, field: SortField) -> bool {
        replace(&mut self.sort_by, field)
    }

    pub fn set_sort_order(&mut self, order: SortOrder) -> bool {
        replace(&mut self.sort_order, order)
    }

    /// Query-string pairs for `GET /tasks`. Empty search and unset filters are omitted.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(5);
        if !self.search_term.is_empty() {
            params.push(("search", self.search_term.clone()));
        }
        if let Some(status) = self.status_filter {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(priority) = self.priority_filter {
            params.push(("priority", priority.as_str().to_string()));
        }
        params.push(("sortBy", self.sort_by.as_str().to_string()));
        params.push(("sortOrder", self.sort_order.as_str().to_string()));
        params
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}
