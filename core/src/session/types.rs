use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::UserProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Process just started, stored credentials not looked at yet
    Uninitialized,
    /// A stored token is being checked against `/auth/me`
    Resolving,
    Authenticated,
    Anonymous,
}

/// Client-side record of who is logged in.
///
/// The user and token only exist in the `Authenticated` variant, so an
/// authenticated session without a user cannot be represented and a token
/// cannot survive a move to `Anonymous`.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum Session {
    #[default]
    Uninitialized,
    Resolving,
    Authenticated {
        user: UserProfile,
        token: String,
    },
    Anonymous,
}

impl Session {
    pub fn status(&self) -> SessionStatus {
        match self {
            Self::Uninitialized => SessionStatus::Uninitialized,
            Self::Resolving => SessionStatus::Resolving,
            Self::Authenticated { .. } => SessionStatus::Authenticated,
            Self::Anonymous => SessionStatus::Anonymous,
        }
    }

    pub fn user(&self) -> Option<&UserProfile> {
        match self {
            Self::Authenticated { user, .. } => Some(user),
            _ => None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Authenticated { token, .. } => Some(token),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

// Tokens never reach logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authenticated { user, .. } => f
                .debug_struct("Authenticated")
                .field("user", user)
                .field("token", &"<redacted>")
                .finish(),
            other => write!(f, "{:?}", other.status()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub enum SessionEvent {
    Resolved {
        status: SessionStatus,
        timestamp: DateTime<Utc>,
    },
    LoggedIn {
        user_id: String,
        registered: bool,
        timestamp: DateTime<Utc>,
    },
    LoggedOut {
        timestamp: DateTime<Utc>,
    },
    ProfileUpdated {
        user_id: String,
        timestamp: DateTime<Utc>,
    },
    TokenRotated {
        timestamp: DateTime<Utc>,
    },
}

impl SessionEvent {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Resolved { timestamp, .. }
            | Self::LoggedIn { timestamp, .. }
            | Self::LoggedOut { timestamp }
            | Self::ProfileUpdated { timestamp, .. }
            | Self::TokenRotated { timestamp } => *timestamp,
        }
    }
}
