// Repository summaries handed to the presentation layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::github::Repository;

/// One repository as the feed reports it. Presentation defaults are applied
/// later; absent fields stay absent here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySummary {
    /// `owner/name`.
    pub identifier: String,
    pub name: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub homepage_url: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub source_url: String,
    pub fork: bool,
    pub stars: u64,
    /// Preview image, when one was looked up and found.
    #[serde(default)]
    pub image_url: Option<String>,
}

impl RepositorySummary {
    pub fn has_description(&self) -> bool {
        self.description.is_some()
    }
}

impl From<Repository> for RepositorySummary {
    fn from(repo: Repository) -> Self {
        let identifier = if repo.full_name.is_empty() {
            match &repo.owner {
                Some(owner) => format!("{}/{}", owner.login, repo.name),
                None => repo.name.clone(),
            }
        } else {
            repo.full_name
        };

        Self {
            identifier,
            name: repo.name,
            description: non_blank(repo.description),
            language: non_blank(repo.language),
            homepage_url: non_blank(repo.homepage),
            updated_at: repo.updated_at,
            source_url: repo.html_url,
            fork: repo.fork,
            stars: repo.stargazers_count,
            image_url: None,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
