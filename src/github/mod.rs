// GitHub API module.
// Provides client and types for interacting with the GitHub REST API.

pub mod client;
pub mod endpoints;
pub mod types;

pub use client::GitHubClient;
pub use endpoints::MAX_PAGE_SIZE;
pub use types::{ContentItem, Owner, RateLimit, Repository};
