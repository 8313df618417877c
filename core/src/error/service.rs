use std::collections::BTreeMap;

use thiserror::Error;

use crate::session::TransitionError;

/// Field name -> human-readable message, ordered by field name.
pub type FieldErrors = BTreeMap<String, String>;

/// Stable error classes surfaced to callers and mapped to exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    NetworkError = 40,
    AuthError = 41,
    Unauthenticated = 42,
    ValidationError = 43,
    NotFound = 44,
    ServerError = 50,
    InvalidState = 60,
    CredentialError = 61,
}

impl ErrorCode {
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

/// Failure of a session, cache or stats operation.
///
/// Variants carry the server-supplied message when there was one; an empty
/// string means the server gave no reason.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("network failure: {0}")]
    Network(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("validation failed: {message}")]
    Validation {
        message: String,
        fields: FieldErrors,
    },

    #[error("server error: {0}")]
    Server(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("not authenticated")]
    Unauthenticated,

    #[error("operation not allowed: {0}")]
    InvalidState(#[from] TransitionError),

    #[error("credential store error: {0}")]
    Credentials(String),
}

impl ServiceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Network(_) => ErrorCode::NetworkError,
            Self::Auth(_) => ErrorCode::AuthError,
            Self::Validation { .. } => ErrorCode::ValidationError,
            Self::Server(_) => ErrorCode::ServerError,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::Unauthenticated => ErrorCode::Unauthenticated,
            Self::InvalidState(_) => ErrorCode::InvalidState,
            Self::Credentials(_) => ErrorCode::CredentialError,
        }
    }

    /// Builds a validation failure from per-field messages.
    ///
    /// The summary message is the first field's message.
    pub fn from_fields(fields: FieldErrors) -> Self {
        let message = fields
            .values()
            .next()
            .cloned()
            .unwrap_or_else(|| "Validation failed".to_string());
        Self::Validation { message, fields }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_) | Self::Unauthenticated)
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation { fields, .. } => Some(fields),
            _ => None,
        }
    }

    /// Server-supplied reason, if any.
    pub fn reason(&self) -> Option<&str> {
        let msg = match self {
            Self::Auth(m) | Self::Server(m) | Self::NotFound(m) => m.as_str(),
            Self::Validation { message, .. } => message.as_str(),
            Self::Network(_)
            | Self::Unauthenticated
            | Self::InvalidState(_)
            | Self::Credentials(_) => return None,
        };
        let msg = msg.trim();
        (!msg.is_empty()).then_some(msg)
    }

    /// One human-readable reason per failed attempt.
    pub fn reason_or(&self, fallback: &str) -> String {
        match self {
            Self::Unauthenticated => "Please log in to continue".to_string(),
            _ => self.reason().unwrap_or(fallback).to_string(),
        }
    }
}
