// Build-time configuration.
// The account and endpoint are constants; FeedConfig exists so tests can point the client elsewhere.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// GitHub account whose repositories are listed.
pub const ACCOUNT: &str = "g-flame-oss";

/// Base URL of the GitHub REST API.
pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// REST API version pinned in the `X-GitHub-Api-Version` header.
pub const GITHUB_API_VERSION: &str = "2022-11-28";

/// User agent sent with every request.
pub const USER_AGENT: &str = "repofeed";

/// Per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Prefixes of fine-grained and classic personal access tokens.
const TOKEN_PREFIXES: &[&str] = &["github_pat_", "ghp_"];

/// Shortest token length accepted, exclusive.
const MIN_TOKEN_LEN: usize = 30;

/// Whether `token` looks like a GitHub personal access token.
pub fn is_valid_token_format(token: &str) -> bool {
    TOKEN_PREFIXES.iter().any(|prefix| token.starts_with(prefix)) && token.len() > MIN_TOKEN_LEN
}

/// Connection settings for the GitHub client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    pub account: String,
    pub api_base: String,
    pub user_agent: String,
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,
    /// Optional token; requests are anonymous without one.
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            account: ACCOUNT.to_string(),
            api_base: GITHUB_API_BASE.to_string(),
            user_agent: USER_AGENT.to_string(),
            request_timeout: REQUEST_TIMEOUT,
            token: None,
        }
    }
}

impl FeedConfig {
    /// Point the client at a different API root (mock servers, GitHub Enterprise).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = account.into();
        self
    }

    /// Use a personal access token. Tokens that do not look like one are
    /// dropped with a warning and requests stay anonymous.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        let token = token.trim();
        if is_valid_token_format(token) {
            self.token = Some(token.to_string());
        } else {
            warn!("Ignoring GitHub token with unexpected format");
            self.token = None;
        }
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

pub(crate) mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

pub(crate) mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
