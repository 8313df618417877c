use std::{error::Error as StdError, fmt};

use serde_json::Value;
use taskdeck_core::api::{FieldErrors, ServiceError};

pub(crate) const BODY_PREVIEW_LIMIT: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskHttpErrorKind {
    Timeout,
    Connect,
    Request,
    Body,
    Decode,
    Status,
    Unknown,
}

impl TaskHttpErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::Request => "request",
            Self::Body => "body",
            Self::Decode => "decode",
            Self::Status => "status",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TaskHttpErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport-level failure of one API call.
#[derive(Debug)]
pub struct TaskHttpError {
    kind: TaskHttpErrorKind,
    status: Option<u16>,
    url: Option<String>,
    message: String,
    /// `message` field of a JSON error body.
    server_message: Option<String>,
    fields: FieldErrors,
    source: Option<anyhow::Error>,
}

impl TaskHttpError {
    pub fn kind(&self) -> TaskHttpErrorKind {
        self.kind
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn server_message(&self) -> Option<&str> {
        self.server_message.as_deref()
    }

    pub(crate) fn from_reqwest(err: reqwest::Error, url: String) -> Self {
        let kind = if err.is_timeout() {
            TaskHttpErrorKind::Timeout
        } else if err.is_connect() {
            TaskHttpErrorKind::Connect
        } else if err.is_request() {
            TaskHttpErrorKind::Request
        } else if err.is_body() {
            TaskHttpErrorKind::Body
        } else if err.is_decode() {
            TaskHttpErrorKind::Decode
        } else {
            TaskHttpErrorKind::Unknown
        };
        TaskHttpError {
            kind,
            status: err.status().map(|s| s.as_u16()),
            url: Some(url),
            message: err.to_string(),
            server_message: None,
            fields: FieldErrors::new(),
            source: Some(anyhow::Error::new(err)),
        }
    }

    pub(crate) fn status_error(status: u16, url: String, body: &str) -> Self {
        let parsed = serde_json::from_str::<Value>(body).ok();
        let server_message = parsed
            .as_ref()
            .and_then(|v| v.get("message"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string);
        let fields = parsed
            .as_ref()
            .and_then(|v| v.get("errors"))
            .map(parse_field_errors)
            .unwrap_or_default();

        TaskHttpError {
            kind: TaskHttpErrorKind::Status,
            status: Some(status),
            url: Some(url),
            message: preview_body(body),
            server_message,
            fields,
            source: None,
        }
    }

    pub(crate) fn decode_error(status: u16, url: String, err: serde_json::Error, body: &str) -> Self {
        let message = format!(
            "failed to decode response body: {} | body={}",
            err,
            preview_body(body)
        );
        TaskHttpError {
            kind: TaskHttpErrorKind::Decode,
            status: Some(status),
            url: Some(url),
            message,
            server_message: None,
            fields: FieldErrors::new(),
            source: Some(anyhow::Error::new(err)),
        }
    }
}

impl fmt::Display for TaskHttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task api error kind={}", self.kind)?;
        if let Some(status) = self.status {
            write!(f, " status={}", status)?;
        }
        if let Some(url) = &self.url {
            write!(f, " url={}", url)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl StdError for TaskHttpError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|err| &**err as &(dyn StdError + 'static))
    }
}

impl From<TaskHttpError> for ServiceError {
    fn from(err: TaskHttpError) -> Self {
        let reason = err.server_message.clone().unwrap_or_default();
        match err.kind {
            TaskHttpErrorKind::Timeout
            | TaskHttpErrorKind::Connect
            | TaskHttpErrorKind::Request
            | TaskHttpErrorKind::Body => ServiceError::Network(err.message),
            TaskHttpErrorKind::Decode | TaskHttpErrorKind::Unknown => ServiceError::Server(reason),
            TaskHttpErrorKind::Status => match err.status.unwrap_or_default() {
                401 | 403 => ServiceError::Auth(reason),
                400 | 409 | 422 => {
                    let message = match err.server_message {
                        Some(message) => message,
                        None => err.fields.values().next().cloned().unwrap_or_default(),
                    };
                    ServiceError::Validation {
                        message,
                        fields: err.fields,
                    }
                }
                404 => ServiceError::NotFound(reason),
                _ => ServiceError::Server(reason),
            },
        }
    }
}

/// Accepts `{"field": "msg"}` or `[{"field"|"path"|"param": .., "message"|"msg": ..}]`.
fn parse_field_errors(value: &Value) -> FieldErrors {
    let mut fields = FieldErrors::new();
    match value {
        Value::Object(map) => {
            for (field, msg) in map {
                if let Some(msg) = msg.as_str() {
                    fields.insert(field.clone(), msg.to_string());
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                let field = ["field", "path", "param"]
                    .iter()
                    .find_map(|k| item.get(*k).and_then(Value::as_str));
                let msg = ["message", "msg"]
                    .iter()
                    .find_map(|k| item.get(*k).and_then(Value::as_str));
                if let (Some(field), Some(msg)) = (field, msg) {
                    fields.entry(field.to_string()).or_insert_with(|| msg.to_string());
                }
            }
        }
        _ => {}
    }
    fields
}

pub(crate) fn preview_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }

    let mut out: String = trimmed.chars().take(BODY_PREVIEW_LIMIT).collect();
    if trimmed.chars().nth(BODY_PREVIEW_LIMIT).is_some() {
        out.push_str("...");
    }
    out
}
