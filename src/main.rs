// repofeed binary.
// Loads the configured account's feed through the on-disk cache and prints the cards.

use std::process::ExitCode;

use repofeed::{
    FeedConfig, FeedOptions, FileBackend, RepositoryFeedClient, TtlCache, cards_for,
};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let config = FeedConfig::default();
    let cache = match FileBackend::in_default_dir() {
        Ok(backend) => TtlCache::new(backend),
        Err(e) => {
            warn!("{}; caching in memory only", e);
            TtlCache::in_memory()
        }
    };

    let client = match RepositoryFeedClient::from_config(&config, cache) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to build GitHub client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let options = FeedOptions::default().with_preview_images(true);
    let result = client.load(&config.account, &options).await;
    if let Err(e) = &result {
        warn!(
            "Could not load GitHub projects: {} (GitHub rate limit: {})",
            e,
            client.source().rate_limit()
        );
    }

    for card in cards_for(&result, &config.account) {
        println!("{}\n", card);
    }
    ExitCode::SUCCESS
}
