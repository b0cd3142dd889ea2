// Error types for repofeed.
// One enum per layer: GitHub API calls, the TTL cache, and feed loading.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::github::RateLimit;

/// Errors raised by a single GitHub API request.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("GitHub API transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Rate limit exceeded ({rate_limit})")]
    RateLimited { rate_limit: RateLimit },

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),
}

impl ApiError {
    /// Whether the request failed before any HTTP status was received
    /// (connection refused, reset, timeout).
    pub fn is_connection_error(&self) -> bool {
        match self {
            ApiError::Transport(e) => e.status().is_none() && !e.is_decode(),
            _ => false,
        }
    }
}

/// Errors raised by cache backends.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No cache directory available on this platform")]
    NoCacheDir,
}

/// Errors surfaced by `RepositoryFeedClient::load`.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Rate limit still exceeded after {} attempts{}", .attempts, format_reset(.reset_at))]
    RateLimited {
        attempts: u32,
        reset_at: Option<DateTime<Utc>>,
    },

    #[error("Failed to fetch repositories{}: {}", format_status(.status), .message)]
    TransportFailure {
        status: Option<u16>,
        message: String,
    },

    #[error("No qualifying repositories found for {account}")]
    EmptyResult { account: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl FeedError {
    /// Soft failures are expected outcomes the caller renders as "nothing to show".
    pub fn is_soft(&self) -> bool {
        matches!(self, FeedError::EmptyResult { .. })
    }
}

fn format_reset(reset_at: &Option<DateTime<Utc>>) -> String {
    reset_at
        .map(|dt| format!(", resets at {}", dt.format("%H:%M:%S")))
        .unwrap_or_default()
}

fn format_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, FeedError>;
