// repofeed: cached, rate-limit-aware GitHub repository feed.
// Fetches an account's repositories, caches them with a TTL, and prepares display cards.

pub mod cache;
pub mod config;
pub mod error;
pub mod feed;
pub mod github;
pub mod present;

pub use cache::{CacheEntry, FileBackend, MemoryBackend, TtlCache};
pub use config::FeedConfig;
pub use error::{ApiError, CacheError, FeedError, Result};
pub use feed::{FeedOptions, RepoFilter, RepositoryFeedClient, RepositorySummary};
pub use present::{ProjectCard, cards_for};
