// Repository feed client.
// Serves a bounded, freshness-bounded list of repositories: cache first, then
// the network with a bounded retry loop for rate limits and dropped connections.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::cache::{Lookup, TtlCache};
use crate::config::FeedConfig;
use crate::error::{ApiError, FeedError, Result};
use crate::github::{GitHubClient, Repository};

use super::images::{best_image, image_cache_key};
use super::options::FeedOptions;
use super::retry::{Sleeper, TokioSleeper};
use super::source::RepositorySource;
use super::summary::RepositorySummary;

/// Cache key for an account's feed.
pub fn cache_key(account: &str) -> String {
    format!("feed:{}", account)
}

/// Loads repository summaries for display.
///
/// The cache holds the account's whole listing, newest first. Every `load`
/// applies its own filter and limit to it, so callers with different options
/// share one cached listing.
///
/// Concurrent loads for one account are not deduplicated: both may miss the
/// cache and both fetch, and the later write wins.
pub struct RepositoryFeedClient<S> {
    source: S,
    cache: TtlCache,
    sleeper: Arc<dyn Sleeper>,
}

impl RepositoryFeedClient<GitHubClient> {
    /// Client talking to the GitHub API described by `config`.
    pub fn from_config(config: &FeedConfig, cache: TtlCache) -> std::result::Result<Self, ApiError> {
        Ok(Self::new(GitHubClient::new(config)?, cache))
    }
}

impl<S: RepositorySource> RepositoryFeedClient<S> {
    pub fn new(source: S, cache: TtlCache) -> Self {
        Self {
            source,
            cache,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replace the timer used between retries.
    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Arc::new(sleeper);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn cache(&self) -> &TtlCache {
        &self.cache
    }

    /// Load the account's repositories, preferring a fresh cached listing.
    #[tracing::instrument(skip(self, options))]
    pub async fn load(
        &self,
        account: &str,
        options: &FeedOptions,
    ) -> Result<Vec<RepositorySummary>> {
        let account = account.trim();
        if account.is_empty() {
            return Err(FeedError::InvalidRequest(
                "account must not be empty".to_string(),
            ));
        }
        if options.limit == 0 {
            return Err(FeedError::InvalidRequest(
                "limit must be positive".to_string(),
            ));
        }

        let key = cache_key(account);
        let stale = match self.cache.lookup::<Vec<RepositorySummary>>(&key) {
            Ok(Lookup::Fresh(listing)) => {
                debug!("Using cached feed for {} ({} repositories)", account, listing.len());
                return self.narrow(account, &listing, options).await;
            }
            Ok(Lookup::Expired(listing)) => Some(listing),
            Ok(Lookup::Missing) => None,
            Err(e) => {
                warn!("Cache read failed for {}: {}", key, e);
                None
            }
        };

        let repos = match self.fetch_with_retry(account, options).await {
            Ok(repos) => repos,
            Err(err @ FeedError::RateLimited { .. }) => {
                return match stale.filter(|_| options.stale_on_rate_limit) {
                    Some(listing) => {
                        warn!("Rate limited; serving expired feed for {}", account);
                        self.narrow(account, &listing, options).await
                    }
                    None => Err(err),
                };
            }
            Err(err) => return Err(err),
        };

        let mut listing: Vec<RepositorySummary> =
            repos.into_iter().map(RepositorySummary::from).collect();
        listing.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        let summaries = self.narrow(account, &listing, options).await?;

        if let Err(e) = self.cache.set(&key, &listing, options.cache_ttl) {
            warn!("Cache write failed for {}: {}", key, e);
        }

        info!("Loaded {} repositories for {}", summaries.len(), account);
        Ok(summaries)
    }

    /// Drop the cached feed so the next `load` goes to the network.
    pub fn clear(&self, account: &str) -> Result<()> {
        self.cache.clear(&cache_key(account.trim()))?;
        Ok(())
    }

    /// Narrow a full listing to what this load asked for.
    async fn narrow(
        &self,
        account: &str,
        listing: &[RepositorySummary],
        options: &FeedOptions,
    ) -> Result<Vec<RepositorySummary>> {
        let mut summaries = options.select(listing);
        if summaries.is_empty() {
            return Err(FeedError::EmptyResult {
                account: account.to_string(),
            });
        }
        if options.preview_images {
            self.attach_images(&mut summaries, options).await;
        }
        Ok(summaries)
    }

    /// Look up preview images, `image_batch_size` repositories at a time.
    async fn attach_images(&self, summaries: &mut [RepositorySummary], options: &FeedOptions) {
        for batch in summaries.chunks_mut(options.image_batch_size.max(1)) {
            let images = join_all(batch.iter().map(|summary| self.preview_image(summary, options))).await;
            for (summary, image) in batch.iter_mut().zip(images) {
                summary.image_url = image;
            }
        }
    }

    /// Best image in the repository's root directory.
    ///
    /// Failures never fail the load. A definite answer (an image, no image,
    /// or an HTTP error such as the 404 of an empty repository) is cached;
    /// exhausted retries are not.
    async fn preview_image(&self, summary: &RepositorySummary, options: &FeedOptions) -> Option<String> {
        let key = image_cache_key(&summary.identifier);
        match self.cache.get::<Option<String>>(&key) {
            Ok(Some(image)) => return image,
            Ok(None) => {}
            Err(e) => warn!("Cache read failed for {}: {}", key, e),
        }

        let (owner, repo) = summary.identifier.split_once('/')?;
        let image = match self
            .with_retry(&summary.identifier, options.image_retries, options, || {
                self.source.list_contents(owner, repo)
            })
            .await
        {
            Ok(items) => best_image(&items),
            Err(FeedError::TransportFailure {
                status: Some(status),
                ..
            }) => {
                debug!("No contents for {} (HTTP {})", summary.identifier, status);
                None
            }
            Err(e) => {
                warn!("Preview image lookup failed for {}: {}", summary.identifier, e);
                return None;
            }
        };

        if let Err(e) = self.cache.set(&key, &image, options.cache_ttl) {
            warn!("Cache write failed for {}: {}", key, e);
        }
        image
    }

    async fn fetch_with_retry(
        &self,
        account: &str,
        options: &FeedOptions,
    ) -> Result<Vec<Repository>> {
        self.with_retry(account, options.max_retries, options, || {
            self.source.list_repositories(account, options.page_size)
        })
        .await
    }

    /// First attempt plus up to `max_retries` retries.
    async fn with_retry<T, F, Fut>(
        &self,
        target: &str,
        max_retries: u32,
        options: &FeedOptions,
        mut request: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, ApiError>>,
    {
        let backoff = options.backoff();
        let mut attempt: u32 = 0;

        loop {
            let (delay, failure) = match request().await {
                Ok(value) => return Ok(value),
                Err(ApiError::RateLimited { rate_limit }) => (
                    backoff.rate_limit_delay(attempt, &rate_limit, Utc::now()),
                    FeedError::RateLimited {
                        attempts: attempt + 1,
                        reset_at: rate_limit.reset_at(),
                    },
                ),
                Err(err) if err.is_connection_error() => (
                    backoff.exponential(attempt),
                    transport_failure(err),
                ),
                Err(err) => return Err(transport_failure(err)),
            };

            if attempt >= max_retries {
                warn!("Giving up on {} after {} attempts: {}", target, attempt + 1, failure);
                return Err(failure);
            }

            attempt += 1;
            warn!(
                "{}; retrying in {:?} (retry {}/{})",
                failure, delay, attempt, max_retries
            );
            self.sleeper.sleep(delay).await;
        }
    }
}

fn transport_failure(err: ApiError) -> FeedError {
    match err {
        ApiError::Status { status, body } => FeedError::TransportFailure {
            status: Some(status),
            message: body,
        },
        ApiError::Transport(e) => FeedError::TransportFailure {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        },
        ApiError::RateLimited { rate_limit } => FeedError::RateLimited {
            attempts: 1,
            reset_at: rate_limit.reset_at(),
        },
        other => FeedError::TransportFailure {
            status: None,
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheEntry;
    use crate::feed::RepoFilter;
    use crate::github::{ContentItem, RateLimit};
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone};
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Clone)]
    enum Reply {
        Repos(Vec<Repository>),
        RateLimited(RateLimit),
        Status(u16),
        Refused,
    }

    #[derive(Clone)]
    enum Listing {
        Files(Vec<&'static str>),
        RateLimited,
        Status(u16),
    }

    /// Replays scripted replies; the last one repeats once the script runs out.
    /// Repositories without scripted contents list no files.
    struct ScriptedSource {
        replies: Mutex<VecDeque<Reply>>,
        contents: Mutex<HashMap<String, VecDeque<Listing>>>,
        calls: Arc<AtomicUsize>,
        content_calls: Arc<AtomicUsize>,
    }

    impl ScriptedSource {
        fn new(replies: Vec<Reply>) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let source = Self {
                replies: Mutex::new(replies.into()),
                contents: Mutex::new(HashMap::new()),
                calls: calls.clone(),
                content_calls: Arc::new(AtomicUsize::new(0)),
            };
            (source, calls)
        }

        fn with_contents(self, repo: &str, listings: Vec<Listing>) -> Self {
            self.contents
                .lock()
                .unwrap()
                .insert(repo.to_string(), listings.into());
            self
        }
    }

    fn next<T: Clone>(script: &mut VecDeque<T>) -> Option<T> {
        if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        }
    }

    #[async_trait]
    impl RepositorySource for ScriptedSource {
        async fn list_repositories(
            &self,
            _account: &str,
            _page_size: u32,
        ) -> std::result::Result<Vec<Repository>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let reply = next(&mut self.replies.lock().unwrap()).unwrap();
            match reply {
                Reply::Repos(repos) => Ok(repos),
                Reply::RateLimited(rate_limit) => Err(ApiError::RateLimited { rate_limit }),
                Reply::Status(status) => Err(ApiError::Status {
                    status,
                    body: "server error".to_string(),
                }),
                Reply::Refused => Err(refused_error().await),
            }
        }

        async fn list_contents(
            &self,
            _owner: &str,
            repo: &str,
        ) -> std::result::Result<Vec<ContentItem>, ApiError> {
            self.content_calls.fetch_add(1, Ordering::SeqCst);
            let listing = self
                .contents
                .lock()
                .unwrap()
                .get_mut(repo)
                .and_then(next)
                .unwrap_or(Listing::Files(Vec::new()));
            match listing {
                Listing::Files(names) => Ok(names
                    .into_iter()
                    .map(|name| ContentItem {
                        name: name.to_string(),
                        kind: "file".to_string(),
                        download_url: Some(format!("https://example.com/{}/{}", repo, name)),
                    })
                    .collect()),
                Listing::RateLimited => Err(ApiError::RateLimited {
                    rate_limit: RateLimit::default(),
                }),
                Listing::Status(status) => Err(ApiError::Status {
                    status,
                    body: "Not Found".to_string(),
                }),
            }
        }
    }

    async fn refused_error() -> ApiError {
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let err = reqwest::get(format!("http://{}/", addr)).await.unwrap_err();
        ApiError::Transport(err)
    }

    #[derive(Clone, Default)]
    struct RecordingSleeper {
        delays: Arc<Mutex<Vec<Duration>>>,
    }

    impl RecordingSleeper {
        fn delays(&self) -> Vec<Duration> {
            self.delays.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, delay: Duration) {
            self.delays.lock().unwrap().push(delay);
        }
    }

    fn repo(name: &str, day: u32, fork: bool, description: Option<&str>) -> Repository {
        Repository {
            name: name.to_string(),
            full_name: format!("octocat/{}", name),
            owner: None,
            description: description.map(str::to_string),
            language: Some("Rust".to_string()),
            html_url: format!("https://github.com/octocat/{}", name),
            homepage: None,
            updated_at: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
            fork,
            stargazers_count: 0,
        }
    }

    fn three_repos() -> Vec<Repository> {
        vec![
            repo("a", 1, false, Some("first")),
            repo("b", 2, false, Some("second")),
            repo("c", 3, false, Some("third")),
        ]
    }

    /// 20 repos: 5 forks, 3 without descriptions, 12 that qualify.
    fn twenty_repos() -> Vec<Repository> {
        (1..=20)
            .map(|day| {
                let fork = day % 4 == 0;
                let description = if matches!(day, 1 | 2 | 3) { None } else { Some("desc") };
                repo(&format!("r{}", day), day, fork, description)
            })
            .collect()
    }

    fn client(replies: Vec<Reply>) -> (RepositoryFeedClient<ScriptedSource>, Arc<AtomicUsize>, RecordingSleeper) {
        let (source, calls) = ScriptedSource::new(replies);
        client_with(source, calls)
    }

    fn client_with(
        source: ScriptedSource,
        calls: Arc<AtomicUsize>,
    ) -> (RepositoryFeedClient<ScriptedSource>, Arc<AtomicUsize>, RecordingSleeper) {
        let sleeper = RecordingSleeper::default();
        let client = RepositoryFeedClient::new(source, TtlCache::in_memory()).with_sleeper(sleeper.clone());
        (client, calls, sleeper)
    }

    #[tokio::test]
    async fn test_default_load_filters_and_limits() {
        let (client, calls, _) = client(vec![Reply::Repos(twenty_repos())]);

        let loaded = client.load("octocat", &FeedOptions::default()).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(loaded.len(), 12);
        assert!(loaded.iter().all(|r| !r.fork && r.description.is_some()));
        assert!(loaded.windows(2).all(|w| w[0].updated_at >= w[1].updated_at));
    }

    #[tokio::test]
    async fn test_second_load_within_ttl_uses_cache() {
        let (client, calls, _) = client(vec![Reply::Repos(three_repos())]);
        let options = FeedOptions::default();

        let first = client.load("octocat", &options).await.unwrap();
        let second = client.load("octocat", &options).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_cached_listing_honours_each_load_options() {
        let (client, calls, _) = client(vec![Reply::Repos(twenty_repos())]);

        let first = client.load("octocat", &FeedOptions::default()).await.unwrap();
        let three = client
            .load("octocat", &FeedOptions::default().with_limit(3))
            .await
            .unwrap();
        let everything = client
            .load(
                "octocat",
                &FeedOptions::default()
                    .with_filter(RepoFilter::allow_all())
                    .with_limit(50),
            )
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.len(), 12);
        assert_eq!(three, first[..3].to_vec());
        assert_eq!(everything.len(), 20);
        assert_eq!(everything.iter().filter(|r| r.fork).count(), 5);
    }

    #[tokio::test]
    async fn test_clear_forces_fetch() {
        let (client, calls, _) = client(vec![Reply::Repos(three_repos())]);
        let options = FeedOptions::default();

        client.load("octocat", &options).await.unwrap();
        client.clear("octocat").unwrap();
        client.load("octocat", &options).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_expired_cache_is_refetched() {
        let (client, calls, _) = client(vec![Reply::Repos(three_repos())]);
        let old: Vec<RepositorySummary> = vec![repo("stale", 1, false, Some("x")).into()];
        let mut entry = CacheEntry::new(old, Duration::from_secs(60));
        entry.fetched_at = Utc::now() - chrono::Duration::seconds(120);
        client.cache().put_entry(&cache_key("octocat"), &entry).unwrap();

        let loaded = client.load("octocat", &FeedOptions::default()).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(loaded.len(), 3);
    }

    #[tokio::test]
    async fn test_rate_limit_waits_for_reset_then_gives_up() {
        let reset = Utc::now().timestamp() as u64 + 5;
        let rate_limit = RateLimit {
            limit: Some(60),
            remaining: Some(0),
            reset: Some(reset),
            retry_after: None,
        };
        let (client, calls, sleeper) = client(vec![Reply::RateLimited(rate_limit)]);

        let err = client.load("octocat", &FeedOptions::default()).await.unwrap_err();

        match err {
            FeedError::RateLimited { attempts, reset_at } => {
                assert_eq!(attempts, 4);
                assert_eq!(reset_at, DateTime::from_timestamp(reset as i64, 0));
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 4);

        let delays = sleeper.delays();
        assert_eq!(delays.len(), 3);
        for delay in delays {
            assert!(delay > Duration::from_secs(3), "delay too short: {delay:?}");
            assert!(delay <= Duration::from_secs(5), "delay too long: {delay:?}");
        }
    }

    #[tokio::test]
    async fn test_rate_limit_without_reset_backs_off_exponentially() {
        let (client, calls, sleeper) = client(vec![
            Reply::RateLimited(RateLimit::default()),
            Reply::RateLimited(RateLimit::default()),
            Reply::Repos(three_repos()),
        ]);

        let loaded = client.load("octocat", &FeedOptions::default()).await.unwrap();

        assert_eq!(loaded.len(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            sleeper.delays(),
            vec![Duration::from_millis(1000), Duration::from_millis(2000)]
        );
    }

    #[tokio::test]
    async fn test_zero_retries_fails_on_first_rate_limit() {
        let (client, calls, sleeper) = client(vec![Reply::RateLimited(RateLimit::default())]);
        let options = FeedOptions::default().with_max_retries(0);

        let err = client.load("octocat", &options).await.unwrap_err();

        assert!(matches!(err, FeedError::RateLimited { attempts: 1, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn test_connection_refused_then_success_is_cached() {
        let (client, calls, sleeper) = client(vec![Reply::Refused, Reply::Repos(three_repos())]);

        let loaded = client.load("octocat", &FeedOptions::default()).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(sleeper.delays(), vec![Duration::from_millis(1000)]);
        let cached: Option<Vec<RepositorySummary>> =
            client.cache().get(&cache_key("octocat")).unwrap();
        assert_eq!(cached, Some(loaded));
    }

    #[tokio::test]
    async fn test_connection_refused_exhausts_retries() {
        let (client, calls, sleeper) = client(vec![Reply::Refused]);

        let err = client.load("octocat", &FeedOptions::default()).await.unwrap_err();

        assert!(matches!(err, FeedError::TransportFailure { status: None, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(
            sleeper.delays(),
            vec![
                Duration::from_millis(1000),
                Duration::from_millis(2000),
                Duration::from_millis(4000)
            ]
        );
    }

    #[tokio::test]
    async fn test_server_error_fails_without_retry() {
        let (client, calls, sleeper) = client(vec![Reply::Status(500)]);

        let err = client.load("octocat", &FeedOptions::default()).await.unwrap_err();

        assert!(matches!(
            err,
            FeedError::TransportFailure { status: Some(500), .. }
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn test_nothing_qualifies_is_empty_result_and_not_cached() {
        let repos = vec![repo("fork", 1, true, Some("x")), repo("bare", 2, false, None)];
        let (client, calls, _) = client(vec![Reply::Repos(repos)]);
        let options = FeedOptions::default();

        let err = client.load("octocat", &options).await.unwrap_err();
        assert!(err.is_soft());

        client.load("octocat", &options).await.unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_open_filter_admits_everything() {
        let repos = vec![repo("fork", 1, true, Some("x")), repo("bare", 2, false, None)];
        let (client, _, _) = client(vec![Reply::Repos(repos)]);
        let options = FeedOptions::default().with_filter(RepoFilter::allow_all());

        let loaded = client.load("octocat", &options).await.unwrap();
        assert_eq!(loaded.len(), 2);
    }

    #[tokio::test]
    async fn test_stale_feed_served_when_rate_limited() {
        let (client, _, _) = client(vec![Reply::RateLimited(RateLimit::default())]);
        let old: Vec<RepositorySummary> = vec![repo("stale", 1, false, Some("x")).into()];
        let mut entry = CacheEntry::new(old.clone(), Duration::from_secs(60));
        entry.fetched_at = Utc::now() - chrono::Duration::seconds(120);
        client.cache().put_entry(&cache_key("octocat"), &entry).unwrap();

        let options = FeedOptions::default()
            .with_max_retries(1)
            .with_stale_on_rate_limit(true);
        let loaded = client.load("octocat", &options).await.unwrap();

        assert_eq!(loaded, old);
    }

    #[tokio::test]
    async fn test_stale_feed_ignored_by_default() {
        let (client, _, _) = client(vec![Reply::RateLimited(RateLimit::default())]);
        let old: Vec<RepositorySummary> = vec![repo("stale", 1, false, Some("x")).into()];
        let mut entry = CacheEntry::new(old, Duration::from_secs(60));
        entry.fetched_at = Utc::now() - chrono::Duration::seconds(120);
        client.cache().put_entry(&cache_key("octocat"), &entry).unwrap();

        let err = client
            .load("octocat", &FeedOptions::default().with_max_retries(1))
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::RateLimited { attempts: 2, .. }));
    }

    #[tokio::test]
    async fn test_invalid_requests_rejected_before_fetch() {
        let (client, calls, _) = client(vec![Reply::Repos(three_repos())]);

        let err = client.load("  ", &FeedOptions::default()).await.unwrap_err();
        assert!(matches!(err, FeedError::InvalidRequest(_)));

        let err = client
            .load("octocat", &FeedOptions::default().with_limit(0))
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::InvalidRequest(_)));

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_preview_images_off_by_default() {
        let (source, calls) = ScriptedSource::new(vec![Reply::Repos(three_repos())]);
        let content_calls = source.content_calls.clone();
        let (client, _, _) = client_with(source.with_contents("a", vec![Listing::Files(vec!["banner.png"])]), calls);

        let loaded = client.load("octocat", &FeedOptions::default()).await.unwrap();

        assert_eq!(content_calls.load(Ordering::SeqCst), 0);
        assert!(loaded.iter().all(|r| r.image_url.is_none()));
    }

    #[tokio::test]
    async fn test_preview_images_attached_and_cached() {
        let (source, calls) = ScriptedSource::new(vec![Reply::Repos(three_repos())]);
        let content_calls = source.content_calls.clone();
        let source = source
            .with_contents("a", vec![Listing::Files(vec!["logo.png", "banner.jpg", "README.md"])])
            .with_contents("b", vec![Listing::Files(vec!["README.md"])])
            .with_contents("c", vec![Listing::Status(404)]);
        let (client, calls, sleeper) = client_with(source, calls);
        let options = FeedOptions::default().with_preview_images(true);

        let first = client.load("octocat", &options).await.unwrap();

        let images: Vec<_> = first.iter().map(|r| (r.name.as_str(), r.image_url.as_deref())).collect();
        assert_eq!(
            images,
            vec![
                ("c", None),
                ("b", None),
                ("a", Some("https://example.com/a/banner.jpg")),
            ]
        );
        assert_eq!(content_calls.load(Ordering::SeqCst), 3);
        assert!(sleeper.delays().is_empty());

        let second = client.load("octocat", &options).await.unwrap();
        assert_eq!(second, first);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(content_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_preview_image_rate_limit_retries_with_backoff() {
        let (source, calls) = ScriptedSource::new(vec![Reply::Repos(vec![repo("a", 1, false, Some("x"))])]);
        let source = source.with_contents(
            "a",
            vec![Listing::RateLimited, Listing::Files(vec!["cover.webp"])],
        );
        let (client, _, sleeper) = client_with(source, calls);

        let loaded = client
            .load("octocat", &FeedOptions::default().with_preview_images(true))
            .await
            .unwrap();

        assert_eq!(loaded[0].image_url.as_deref(), Some("https://example.com/a/cover.webp"));
        assert_eq!(sleeper.delays(), vec![Duration::from_millis(1000)]);
    }

    #[tokio::test]
    async fn test_preview_image_exhausted_retries_not_cached() {
        let (source, calls) = ScriptedSource::new(vec![Reply::Repos(vec![repo("a", 1, false, Some("x"))])]);
        let content_calls = source.content_calls.clone();
        let source = source.with_contents("a", vec![Listing::RateLimited]);
        let (client, _, sleeper) = client_with(source, calls);
        let options = FeedOptions::default()
            .with_preview_images(true)
            .with_image_retries(2);

        let loaded = client.load("octocat", &options).await.unwrap();

        assert_eq!(loaded[0].image_url, None);
        assert_eq!(content_calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            sleeper.delays(),
            vec![Duration::from_millis(1000), Duration::from_millis(2000)]
        );
        let cached: Option<Option<String>> = client.cache().get(&image_cache_key("octocat/a")).unwrap();
        assert_eq!(cached, None);

        client.load("octocat", &options).await.unwrap();
        assert_eq!(content_calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_preview_images_fetched_in_batches() {
        let repos: Vec<Repository> = (1..=7).map(|day| repo(&format!("r{}", day), day, false, Some("x"))).collect();
        let (source, calls) = ScriptedSource::new(vec![Reply::Repos(repos)]);
        let content_calls = source.content_calls.clone();
        let (client, _, _) = client_with(source, calls);

        let loaded = client
            .load(
                "octocat",
                &FeedOptions::default()
                    .with_preview_images(true)
                    .with_image_batch_size(3),
            )
            .await
            .unwrap();

        assert_eq!(loaded.len(), 7);
        assert_eq!(content_calls.load(Ordering::SeqCst), 7);
    }
}
