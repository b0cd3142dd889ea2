// Where the feed gets its repositories from.

use async_trait::async_trait;

use crate::error::ApiError;
use crate::github::{ContentItem, Repository};

/// Listing requests the feed makes: an account's repositories, and the
/// root directory of one repository when preview images are wanted.
///
/// Implementors report rate limiting as `ApiError::RateLimited` and
/// connection-level failures as `ApiError::Transport`; the feed client owns
/// all retry decisions.
#[async_trait]
pub trait RepositorySource: Send + Sync {
    async fn list_repositories(
        &self,
        account: &str,
        page_size: u32,
    ) -> Result<Vec<Repository>, ApiError>;

    async fn list_contents(&self, owner: &str, repo: &str) -> Result<Vec<ContentItem>, ApiError>;
}
