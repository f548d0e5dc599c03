//! Launch-side error types.

use thiserror::Error;

/// Failures talking to the remote launch provider.
#[derive(Error, Debug)]
pub enum LaunchApiError {
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl LaunchApiError {
    /// Whether a later refresh cycle can be expected to succeed without intervention.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited(_) | Self::Network(_) => true,
            Self::Api { status, .. } => *status >= 500,
            Self::Parse(_) | Self::InvalidUrl(_) => false,
        }
    }
}

/// Local launch database failures.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(rusqlite::Error),

    #[error("Corrupt launch row: {0}")]
    Corrupt(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::InvalidColumnType(..)
            | rusqlite::Error::IntegralValueOutOfRange(..) => Self::Corrupt(err.to_string()),
            other => Self::Database(other),
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A refresh cycle that could not run at all.
#[derive(Error, Debug)]
pub enum RefreshError {
    #[error("Failed to fetch launches: {0}")]
    Fetch(#[from] LaunchApiError),
}
