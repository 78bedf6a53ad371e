//! Error taxonomy shared by every layer of the client.

use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of failure classes produced by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Timeout,
    NetworkError,
    RateLimit,
    InvalidCredentials,
    DataNotAvailable,
    Unknown,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "TIMEOUT",
            Self::NetworkError => "NETWORK_ERROR",
            Self::RateLimit => "RATE_LIMIT",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::DataNotAvailable => "DATA_NOT_AVAILABLE",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Whether the retry engine may attempt the call again.
    pub const fn is_retryable(self) -> bool {
        !matches!(self, Self::InvalidCredentials | Self::DataNotAvailable)
    }

    /// Label shown to users next to an error.
    pub const fn category(self) -> &'static str {
        match self {
            Self::RateLimit => "Rate Limit",
            Self::Timeout | Self::NetworkError => "Network",
            Self::InvalidCredentials => "Invalid API Key",
            Self::DataNotAvailable => "Data Unavailable",
            Self::Unknown => "Unknown",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

type Cause = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// A normalized failure from the upstream API, whether it came from the
/// transport or from an error notice embedded in a 200 response.
#[derive(Debug, Clone)]
pub struct ClassifiedError {
    kind: ErrorKind,
    message: String,
    retry_after_seconds: Option<u64>,
    cause: Option<Cause>,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_after_seconds: None,
            cause: None,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NetworkError, message)
    }

    pub fn rate_limited(message: impl Into<String>, retry_after_seconds: u64) -> Self {
        Self::new(ErrorKind::RateLimit, message).with_retry_after(retry_after_seconds)
    }

    pub fn invalid_credentials(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidCredentials, message)
    }

    pub fn data_not_available(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DataNotAvailable, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }

    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after_seconds = Some(seconds);
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Arc::new(cause));
        self
    }

    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retry_after_seconds(&self) -> Option<u64> {
        self.retry_after_seconds
    }

    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    /// Invalid credentials are a setup problem the user has to fix; every
    /// other kind is presented as a transient failure with a retry button.
    pub const fn is_configuration_problem(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidCredentials)
    }

    pub const fn category(&self) -> &'static str {
        self.kind.category()
    }

    /// How long a UI should wait before offering an automatic retry.
    pub fn suggested_retry_delay(&self) -> Duration {
        if let Some(seconds) = self.retry_after_seconds {
            return Duration::from_secs(seconds);
        }

        match self.kind {
            ErrorKind::RateLimit => Duration::from_secs(300),
            ErrorKind::Timeout | ErrorKind::NetworkError => Duration::from_secs(30),
            _ => Duration::from_secs(60),
        }
    }

    /// Whether a screen should retry on its own after `attempt_count`
    /// previous automatic retries.
    pub const fn should_auto_retry(&self, attempt_count: u32) -> bool {
        if attempt_count >= 2 {
            return false;
        }
        self.is_retryable()
    }
}

impl Display for ClassifiedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ClassifiedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

/// Input validation errors for request parameters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol cannot start or end with '{ch}'")]
    SymbolDanglingSeparator { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("invalid interval '{value}', expected one of 1min, 5min, 15min, 30min, 60min")]
    InvalidInterval { value: String },
    #[error("invalid granularity '{value}', expected one of intraday, daily, weekly, monthly")]
    InvalidGranularity { value: String },

    #[error("search keywords cannot be empty")]
    EmptyKeywords,
    #[error("news limit must be between 1 and {max}, got {value}")]
    NewsLimitOutOfRange { value: u32, max: u32 },
    #[error("news topic cannot be empty")]
    EmptyTopic,
}

/// Failure of the device storage backend. Never surfaced to endpoint
/// callers: the cache logs it and treats the read or write as a miss.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Store(#[from] stockpulse_store::StoreError),

    #[error("storage task failed: {0}")]
    Task(String),
}

/// Invalid client configuration values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a positive integer, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
}
