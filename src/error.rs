use std::sync::Arc;

use thiserror::Error;

/// Failures talking to the upstream catalog API.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Request(Arc<reqwest::Error>),
    #[error("failed to fetch {resource}: upstream returned {status}")]
    Status {
        resource: String,
        status: reqwest::StatusCode,
    },
    #[error("failed to decode {resource}: {message}")]
    Decode { resource: String, message: String },
    #[error("no evolution chain available for creature {0}")]
    MissingEvolutionChain(u32),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status, .. } if *status == reqwest::StatusCode::NOT_FOUND)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        Self::Request(Arc::new(error))
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Errors returned by catalog store operations.
///
/// The user-visible message lives in the store state; this is what the caller gets back.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("a page load is already in flight")]
    Busy,
}
