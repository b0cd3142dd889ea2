// GitHub API endpoint functions.
// Provides typed methods for fetching data from the GitHub REST API.

use async_trait::async_trait;
use tracing::debug;

use crate::error::ApiError;
use crate::feed::RepositorySource;

use super::client::GitHubClient;
use super::types::{ContentItem, Repository};

/// Largest page GitHub serves for list endpoints.
pub const MAX_PAGE_SIZE: u32 = 100;

impl GitHubClient {
    /// Get public repositories for a user, most recently updated first.
    #[tracing::instrument(skip(self))]
    pub async fn get_user_repos(
        &self,
        account: &str,
        per_page: u32,
    ) -> Result<Vec<Repository>, ApiError> {
        let per_page = per_page.clamp(1, MAX_PAGE_SIZE).to_string();
        let params = [
            ("sort", "updated"),
            ("direction", "desc"),
            ("per_page", per_page.as_str()),
        ];
        let response = self
            .get_with_params(&format!("/users/{}/repos", account), &params)
            .await?;
        let body = response.text().await?;
        let repos: Vec<Repository> = serde_json::from_str(&body)?;
        debug!("Fetched {} repositories for {}", repos.len(), account);
        Ok(repos)
    }

    /// List the root directory of a repository.
    #[tracing::instrument(skip(self))]
    pub async fn get_repo_contents(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<ContentItem>, ApiError> {
        let params: [(&str, &str); 0] = [];
        let response = self
            .get_with_params(&format!("/repos/{}/{}/contents", owner, repo), &params)
            .await?;
        let body = response.text().await?;
        let items: Vec<ContentItem> = serde_json::from_str(&body)?;
        debug!("Fetched {} root entries for {}/{}", items.len(), owner, repo);
        Ok(items)
    }
}

#[async_trait]
impl RepositorySource for GitHubClient {
    async fn list_repositories(
        &self,
        account: &str,
        page_size: u32,
    ) -> Result<Vec<Repository>, ApiError> {
        self.get_user_repos(account, page_size).await
    }

    async fn list_contents(&self, owner: &str, repo: &str) -> Result<Vec<ContentItem>, ApiError> {
        self.get_repo_contents(owner, repo).await
    }
}
