// GitHub API HTTP client.
// Handles default headers, request timeout, rate limit tracking, and status classification.

use std::sync::Mutex;

use reqwest::{
    Client, Response, StatusCode,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT},
};
use tracing::{debug, warn};

use crate::config::{FeedConfig, GITHUB_API_VERSION};
use crate::error::ApiError;

use super::types::RateLimit;

/// Remaining-quota level below which each response logs a warning.
const LOW_QUOTA_WARNING: u64 = 20;

/// GitHub API client with rate limit tracking.
pub struct GitHubClient {
    client: Client,
    api_base: String,
    rate_limit: Mutex<RateLimit>,
}

impl GitHubClient {
    /// Create a new GitHub client from connection settings.
    pub fn new(config: &FeedConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();

        if let Some(token) = config.token.as_deref().filter(|t| !t.is_empty()) {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| ApiError::InvalidHeader(e.to_string()))?,
            );
        }
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| ApiError::InvalidHeader(e.to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            rate_limit: Mutex::new(RateLimit::default()),
        })
    }

    /// Rate limit information from the most recent response.
    pub fn rate_limit(&self) -> RateLimit {
        self.rate_limit
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Make a GET request with query parameters.
    pub async fn get_with_params<T: serde::Serialize + ?Sized>(
        &self,
        endpoint: &str,
        params: &T,
    ) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.api_base, endpoint);
        debug!("GET {}", url);
        let response = self.client.get(&url).query(params).send().await?;

        let rate_limit = self.update_rate_limit(&response);
        self.check_response(response, rate_limit).await
    }

    /// Record rate limit headers and warn when the quota runs low.
    fn update_rate_limit(&self, response: &Response) -> RateLimit {
        let rate_limit = RateLimit::from_headers(response.headers());

        if let Some(remaining) = rate_limit.remaining {
            debug!("GitHub API requests remaining: {}", remaining);
            if remaining < LOW_QUOTA_WARNING && remaining > 0 {
                warn!("GitHub rate limit low: {}", rate_limit);
            }
        }

        if let Ok(mut guard) = self.rate_limit.lock() {
            *guard = rate_limit.clone();
        }
        rate_limit
    }

    /// Check response status and convert errors.
    async fn check_response(
        &self,
        response: Response,
        rate_limit: RateLimit,
    ) -> Result<Response, ApiError> {
        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                Err(ApiError::RateLimited { rate_limit })
            }
            status => Err(ApiError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }
}
