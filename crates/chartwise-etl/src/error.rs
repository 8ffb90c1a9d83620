//! Error types for catalog access and the resolution pipeline.

use std::time::Duration;

use thiserror::Error;

/// Errors returned by a single call to a remote catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The request did not complete within the client timeout.
    #[error("request to {source_name} timed out")]
    Timeout { source_name: String },

    /// The catalog returned a rate-limit response.
    #[error("rate limited by {source_name}")]
    RateLimited {
        source_name: String,
        retry_after: Option<Duration>,
    },

    /// The catalog answered with an unexpected HTTP status.
    #[error("HTTP {status} from {source_name}: {message}")]
    Http {
        source_name: String,
        status: u16,
        message: String,
    },

    /// Credentials were rejected or no token could be obtained.
    #[error("authentication with {source_name} failed: {message}")]
    Auth {
        source_name: String,
        message: String,
    },

    /// A response could not be parsed.
    #[error("parse error from {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    /// An error propagated from `reqwest`.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
}

impl CatalogError {
    /// Returns `true` when the error is transient and the call may succeed
    /// if retried.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::RateLimited { .. } => true,
            // 401 means the cached token went stale; the next attempt fetches a new one.
            Self::Http { status, .. } => *status >= 500 || *status == 401,
            Self::Request(e) => e.is_timeout() || e.is_connect(),
            Self::Auth { .. } | Self::Parse { .. } => false,
        }
    }
}

/// Errors surfaced by the resolution, feature and expansion steps.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Every attempt allowed by the retry policy failed transiently.
    #[error("{operation} unavailable after {attempts} attempts: {source}")]
    Unavailable {
        operation: String,
        attempts: u32,
        #[source]
        source: CatalogError,
    },

    /// The catalog failed in a way retrying cannot fix.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Reading or writing a snapshot failed.
    #[error("store error: {0}")]
    Store(#[from] chartwise_core::Error),
}

impl PipelineError {
    /// Returns `true` when the remote catalog could not be reached within
    /// the retry budget.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// Convenience alias for catalog call results.
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Convenience alias for pipeline results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
