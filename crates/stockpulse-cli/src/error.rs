use stockpulse_core::{ClassifiedError, ConfigError, ErrorKind, ValidationError};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{}: {}", .0.category(), .0.message())]
    Upstream(#[from] ClassifiedError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] stockpulse_store::StoreError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::Config(_) => 2,
            Self::Upstream(error) if error.kind() == ErrorKind::InvalidCredentials => 3,
            Self::Upstream(_) => 4,
            Self::Serialization(_) => 5,
            Self::Storage(_) | Self::Io(_) => 10,
        }
    }
}
