// Options for a single feed load.
// Defaults mirror the portfolio page: 12 cards, 3 retries, 1 hour cache.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_TTL;
use crate::github::MAX_PAGE_SIZE;

use super::retry::Backoff;
use super::summary::RepositorySummary;

pub const DEFAULT_LIMIT: usize = 12;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(1000);
pub const DEFAULT_IMAGE_RETRIES: u32 = 3;
pub const DEFAULT_IMAGE_BATCH_SIZE: usize = 3;

/// Which repositories qualify for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoFilter {
    pub exclude_forks: bool,
    pub require_description: bool,
}

impl Default for RepoFilter {
    fn default() -> Self {
        Self {
            exclude_forks: true,
            require_description: true,
        }
    }
}

impl RepoFilter {
    /// Filter that admits every repository.
    pub fn allow_all() -> Self {
        Self {
            exclude_forks: false,
            require_description: false,
        }
    }

    pub fn permits(&self, repo: &RepositorySummary) -> bool {
        !(self.exclude_forks && repo.fork) && !(self.require_description && !repo.has_description())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedOptions {
    /// Maximum number of summaries returned.
    pub limit: usize,
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub cache_ttl: Duration,
    pub filter: RepoFilter,
    /// `per_page` sent to the API; filtering happens after this page arrives.
    pub page_size: u32,
    pub backoff_base: Duration,
    /// Upper bound on any single wait, including waits for a rate limit reset.
    pub max_delay: Option<Duration>,
    /// Serve the just-expired cached list when rate limiting outlasts all retries.
    pub stale_on_rate_limit: bool,
    /// Look up a preview image for every returned repository.
    pub preview_images: bool,
    /// Retries for a single repository's contents listing.
    pub image_retries: u32,
    /// Contents listings requested concurrently.
    pub image_batch_size: usize,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            max_retries: DEFAULT_MAX_RETRIES,
            cache_ttl: DEFAULT_TTL,
            filter: RepoFilter::default(),
            page_size: MAX_PAGE_SIZE,
            backoff_base: DEFAULT_BACKOFF_BASE,
            max_delay: None,
            stale_on_rate_limit: false,
            preview_images: false,
            image_retries: DEFAULT_IMAGE_RETRIES,
            image_batch_size: DEFAULT_IMAGE_BATCH_SIZE,
        }
    }
}

impl FeedOptions {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_filter(mut self, filter: RepoFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    pub fn with_stale_on_rate_limit(mut self, enabled: bool) -> Self {
        self.stale_on_rate_limit = enabled;
        self
    }

    pub fn with_preview_images(mut self, enabled: bool) -> Self {
        self.preview_images = enabled;
        self
    }

    pub fn with_image_retries(mut self, retries: u32) -> Self {
        self.image_retries = retries;
        self
    }

    pub fn with_image_batch_size(mut self, batch_size: usize) -> Self {
        self.image_batch_size = batch_size;
        self
    }

    pub(crate) fn backoff(&self) -> Backoff {
        Backoff::new(self.backoff_base, self.max_delay)
    }

    /// Apply the filter, sort newest first, keep at most `limit`.
    pub(crate) fn select(&self, repos: &[RepositorySummary]) -> Vec<RepositorySummary> {
        let mut picked: Vec<&RepositorySummary> =
            repos.iter().filter(|repo| self.filter.permits(repo)).collect();
        picked.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        picked.into_iter().take(self.limit).cloned().collect()
    }
}
