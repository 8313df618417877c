use thiserror::Error;

use super::service::{ErrorCode, ServiceError};

#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Service(#[from] ServiceError),
    #[error("command failed: {0}")]
    Command(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl CliError {
    /// Process exit code for this error.
    ///
    /// 11: config, 20: io/command, 40-43: service failures by class,
    /// 50: server or uncategorized.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 11,
            Self::Io(_) | Self::Command(_) => 20,
            Self::Service(err) => match err.code() {
                ErrorCode::NetworkError => 40,
                ErrorCode::AuthError | ErrorCode::Unauthenticated => 41,
                ErrorCode::ValidationError | ErrorCode::InvalidState => 42,
                ErrorCode::NotFound => 43,
                ErrorCode::CredentialError => 20,
                ErrorCode::ServerError => 50,
            },
            Self::Anyhow(_) => 50,
        }
    }
}
