// GitHub API response types.
// Defines structs for deserializing GitHub REST API responses and rate limit headers.

use std::fmt;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::{Deserialize, Serialize};

/// GitHub user or organization, as embedded in repository listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Owner {
    pub login: String,
}

/// GitHub repository as returned by `/users/{account}/repos`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub owner: Option<Owner>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub html_url: String,
    pub homepage: Option<String>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub stargazers_count: u64,
}

/// One entry of a repository's root directory, from `/repos/{owner}/{repo}/contents`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub name: String,
    /// `file`, `dir`, `symlink` or `submodule`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Raw download URL; directories have none.
    pub download_url: Option<String>,
}

impl ContentItem {
    pub fn is_file(&self) -> bool {
        self.kind == "file"
    }
}

/// Rate limit information from response headers.
///
/// Every field is optional: anonymous responses, secondary rate limits and
/// proxies all omit different subsets of these headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimit {
    pub limit: Option<u64>,
    pub remaining: Option<u64>,
    /// Epoch seconds at which the window resets.
    pub reset: Option<u64>,
    /// Seconds to wait, from `Retry-After`.
    pub retry_after: Option<u64>,
}

impl RateLimit {
    /// Parse rate limit headers from a response.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            limit: header_u64(headers, "x-ratelimit-limit"),
            remaining: header_u64(headers, "x-ratelimit-remaining"),
            reset: header_u64(headers, "x-ratelimit-reset"),
            retry_after: header_u64(headers, RETRY_AFTER.as_str()),
        }
    }

    /// Reset instant, if the headers carried one.
    pub fn reset_at(&self) -> Option<DateTime<Utc>> {
        self.reset
            .and_then(|secs| DateTime::from_timestamp(secs as i64, 0))
    }

    /// Whether the primary quota is known to be spent.
    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }
}

impl fmt::Display for RateLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.remaining, self.limit) {
            (Some(remaining), Some(limit)) => write!(f, "{} of {} remaining", remaining, limit)?,
            (Some(remaining), None) => write!(f, "{} remaining", remaining)?,
            _ => write!(f, "quota unknown")?,
        }
        if let Some(reset_at) = self.reset_at() {
            write!(f, ", resets at {}", reset_at.format("%H:%M:%S"))?;
        }
        Ok(())
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}
