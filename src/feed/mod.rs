// Repository feed module.
// Cached, rate-limit-aware loading of an account's repositories for display.

pub mod client;
pub mod images;
pub mod options;
pub mod retry;
pub mod source;
pub mod summary;

pub use client::{RepositoryFeedClient, cache_key};
pub use images::{best_image, image_cache_key};
pub use options::{FeedOptions, RepoFilter};
pub use retry::{Backoff, Sleeper, TokioSleeper};
pub use source::RepositorySource;
pub use summary::RepositorySummary;
