// src/pipeline/ingest.rs

//! News ingestion runs.
//!
//! One run is fetch, decode, extract, normalize, sort, publish. The
//! coordinator guarantees at most one run is in flight: `refresh()`
//! invalidates the previous run's token before any asynchronous work
//! begins, and a superseded run discards all partial work without
//! touching the published state.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::models::{Article, Config, IngestionResult};
use crate::services::{ArticleExtractor, DateNormalizer, FetchOutcome, HttpFetcher, PageFetcher};
use crate::store::ArticleStore;

/// Cancellation token for one ingestion run.
///
/// A token is cancelled once a newer `refresh()` has bumped the shared
/// generation counter past the generation it was minted with.
#[derive(Debug, Clone)]
pub struct RunToken {
    current: Arc<AtomicU64>,
    generation: u64,
}

impl RunToken {
    pub(crate) fn new(current: Arc<AtomicU64>, generation: u64) -> Self {
        Self {
            current,
            generation,
        }
    }

    /// Whether a newer run has superseded this one.
    pub fn is_cancelled(&self) -> bool {
        self.current.load(Ordering::Acquire) != self.generation
    }
}

/// Failure category selecting the fallback message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackKind {
    /// The fetch timed out
    Timeout,

    /// No route to the network
    Offline,

    /// Server, transport, or document failure
    Failure,

    /// The document parsed but yielded no usable articles
    Empty,
}

impl FallbackKind {
    /// Consumer-facing message; never a raw technical error.
    pub fn message(&self) -> &'static str {
        match self {
            FallbackKind::Timeout => "Connection timed out. Showing sample data.",
            FallbackKind::Offline => "No internet connection. Showing sample data.",
            FallbackKind::Failure => "Failed to load news. Showing sample data.",
            FallbackKind::Empty => "Could not load latest news. Showing sample data.",
        }
    }
}

/// Orchestrates ingestion runs against a shared [`ArticleStore`].
pub struct NewsCoordinator {
    config: Arc<Config>,
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<ArticleExtractor>,
    store: Arc<ArticleStore>,
    generation: Arc<AtomicU64>,
}

impl NewsCoordinator {
    /// Create a coordinator backed by a live HTTP fetcher.
    pub fn new(config: Arc<Config>, store: Arc<ArticleStore>) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(&config.feed.user_agent)?);
        Self::with_fetcher(config, fetcher, store)
    }

    /// Create a coordinator with a custom fetcher implementation.
    pub fn with_fetcher(
        config: Arc<Config>,
        fetcher: Arc<dyn PageFetcher>,
        store: Arc<ArticleStore>,
    ) -> Result<Self> {
        let extractor = Arc::new(ArticleExtractor::new(&config)?);
        Ok(Self {
            config,
            fetcher,
            extractor,
            store,
            generation: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Shared article store read by consumers.
    pub fn store(&self) -> Arc<ArticleStore> {
        Arc::clone(&self.store)
    }

    /// Start a new ingestion run, cancelling any run still in flight.
    ///
    /// Fire-and-forget from the caller's perspective: completion is
    /// observed through the store. The returned handle may be awaited or
    /// dropped.
    pub fn refresh(&self) -> JoinHandle<()> {
        // Bumping the counter invalidates the previous run's right to
        // publish before any of this run's async work starts.
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let token = RunToken::new(Arc::clone(&self.generation), generation);

        self.store.begin_run();
        log::debug!("Starting ingestion run {generation}");

        let config = Arc::clone(&self.config);
        let fetcher = Arc::clone(&self.fetcher);
        let extractor = Arc::clone(&self.extractor);
        let store = Arc::clone(&self.store);

        tokio::spawn(async move {
            run_once(config, fetcher, extractor, store, token).await;
        })
    }
}

async fn run_once(
    config: Arc<Config>,
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<ArticleExtractor>,
    store: Arc<ArticleStore>,
    token: RunToken,
) {
    let started_at = Utc::now();
    let timeout = Duration::from_secs(config.feed.timeout_secs);

    let outcome = fetcher.fetch(&config.feed.source_url, timeout).await;
    if token.is_cancelled() {
        log::debug!("Ingestion run superseded during fetch");
        return;
    }

    let body = match outcome {
        FetchOutcome::Success { body, status } => {
            log::debug!("Fetched {} bytes (HTTP {status})", body.len());
            body
        }
        FetchOutcome::TimedOut => {
            log::warn!("Fetch timed out after {}s", config.feed.timeout_secs);
            publish_fallback(&store, &token, FallbackKind::Timeout, started_at);
            return;
        }
        FetchOutcome::NoConnectivity => {
            log::warn!("No connectivity while fetching source page");
            publish_fallback(&store, &token, FallbackKind::Offline, started_at);
            return;
        }
        FetchOutcome::HttpError(status) => {
            log::warn!("Source page returned HTTP {status}");
            publish_fallback(&store, &token, FallbackKind::Failure, started_at);
            return;
        }
        FetchOutcome::TransportError(message) => {
            log::warn!("Fetch failed: {message}");
            publish_fallback(&store, &token, FallbackKind::Failure, started_at);
            return;
        }
    };

    // The one fatal parse condition: the byte stream is not a document.
    let html = match String::from_utf8(body) {
        Ok(html) => html,
        Err(error) => {
            log::warn!("Response body is not valid UTF-8: {error}");
            publish_fallback(&store, &token, FallbackKind::Failure, started_at);
            return;
        }
    };

    let Some(extraction) = extractor.extract(&html, &token) else {
        log::debug!("Ingestion run superseded during extraction");
        return;
    };
    for skipped in &extraction.skipped {
        log::warn!("Skipping candidate {}: {}", skipped.index + 1, skipped.reason);
    }

    let normalizer = DateNormalizer::new(started_at);
    let mut articles: Vec<Article> = extraction
        .articles
        .into_iter()
        .map(|raw| {
            let published_at = normalizer.normalize(&raw.date_text);
            Article::from_raw(raw, published_at)
        })
        .collect();

    if articles.is_empty() {
        log::warn!("Document yielded no usable articles");
        publish_fallback(&store, &token, FallbackKind::Empty, started_at);
        return;
    }

    // Stable sort: equal timestamps keep extraction order
    articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));

    let count = articles.len();
    let result = IngestionResult {
        articles,
        used_fallback: false,
        error_message: None,
    };
    if store.publish(&token, result) {
        log::info!("Published {count} articles");
    } else {
        log::debug!("Ingestion run superseded before publish");
    }
}

fn publish_fallback(
    store: &ArticleStore,
    token: &RunToken,
    kind: FallbackKind,
    started_at: DateTime<Utc>,
) {
    let result = IngestionResult {
        articles: Article::samples(started_at),
        used_fallback: true,
        error_message: Some(kind.message().to_string()),
    };
    if store.publish(token, result) {
        log::info!("Published sample data: {}", kind.message());
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    const PAGE: &str = r#"
        <html><body>
        <article>
          <h2>Older post</h2>
          <div class="post-content">Body one</div>
          <span class="post-metadata__date">12. jan. 2025</span>
          <a class="blog-link-hover-color" href="/post/older">Read more</a>
        </article>
        <article>
          <h2>Newer post</h2>
          <div class="post-content">Body two</div>
          <span class="post-metadata__date">3. mar. 2025</span>
          <a class="blog-link-hover-color" href="/post/newer">Read more</a>
        </article>
        </body></html>
    "#;

    const SECOND_PAGE: &str = r#"
        <html><body>
        <article>
          <h2>Replacement post</h2>
          <span class="post-metadata__date">1. feb. 2025</span>
          <a class="blog-link-hover-color" href="/post/replacement">Read more</a>
        </article>
        </body></html>
    "#;

    /// Fetcher that replays scripted responses, one per call, each after
    /// its configured delay.
    struct StubFetcher {
        responses: Mutex<VecDeque<(Duration, FetchOutcome)>>,
    }

    impl StubFetcher {
        fn new(responses: Vec<(Duration, FetchOutcome)>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for StubFetcher {
        async fn fetch(&self, _url: &str, _timeout: Duration) -> FetchOutcome {
            let (delay, outcome) = {
                let mut responses = self.responses.lock().unwrap();
                responses.pop_front().expect("unexpected fetch call")
            };
            tokio::time::sleep(delay).await;
            outcome
        }
    }

    fn success(html: &str) -> FetchOutcome {
        FetchOutcome::Success {
            body: html.as_bytes().to_vec(),
            status: 200,
        }
    }

    fn coordinator(responses: Vec<(Duration, FetchOutcome)>) -> NewsCoordinator {
        let config = Arc::new(Config::default());
        let store = Arc::new(ArticleStore::new());
        NewsCoordinator::with_fetcher(config, Arc::new(StubFetcher::new(responses)), store)
            .unwrap()
    }

    fn titles(store: &ArticleStore) -> Vec<String> {
        store.articles().iter().map(|a| a.title.clone()).collect()
    }

    #[tokio::test]
    async fn publishes_articles_sorted_by_date_descending() {
        let coordinator = coordinator(vec![(Duration::ZERO, success(PAGE))]);
        let store = coordinator.store();

        coordinator.refresh().await.unwrap();

        assert_eq!(titles(&store), vec!["Newer post", "Older post"]);
        assert!(!store.used_fallback());
        assert_eq!(store.error_message(), None);
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn loading_flag_is_raised_during_the_run() {
        let coordinator = coordinator(vec![(Duration::from_millis(50), success(PAGE))]);
        let store = coordinator.store();

        let handle = coordinator.refresh();
        assert!(store.is_loading());

        handle.await.unwrap();
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn timeout_publishes_samples_with_timeout_message() {
        let coordinator = coordinator(vec![(Duration::ZERO, FetchOutcome::TimedOut)]);
        let store = coordinator.store();

        coordinator.refresh().await.unwrap();

        assert!(store.used_fallback());
        assert!(store.error_message().unwrap().contains("timed out"));
        let sample_titles: Vec<String> = Article::samples(Utc::now())
            .iter()
            .map(|a| a.title.clone())
            .collect();
        assert_eq!(titles(&store), sample_titles);
    }

    #[tokio::test]
    async fn no_connectivity_publishes_samples_with_offline_message() {
        let coordinator = coordinator(vec![(Duration::ZERO, FetchOutcome::NoConnectivity)]);
        let store = coordinator.store();

        coordinator.refresh().await.unwrap();

        assert!(store.used_fallback());
        assert!(
            store
                .error_message()
                .unwrap()
                .contains("No internet connection")
        );
    }

    #[tokio::test]
    async fn http_500_publishes_samples_with_failure_message() {
        let coordinator = coordinator(vec![(Duration::ZERO, FetchOutcome::HttpError(500))]);
        let store = coordinator.store();

        coordinator.refresh().await.unwrap();

        assert!(store.used_fallback());
        assert!(store.error_message().unwrap().contains("Failed to load"));
        assert!(!store.articles().is_empty());
    }

    #[tokio::test]
    async fn empty_document_publishes_samples_with_empty_message() {
        let coordinator = coordinator(vec![(
            Duration::ZERO,
            success("<html><body></body></html>"),
        )]);
        let store = coordinator.store();

        coordinator.refresh().await.unwrap();

        assert!(store.used_fallback());
        assert!(
            store
                .error_message()
                .unwrap()
                .contains("Could not load latest news")
        );
    }

    #[tokio::test]
    async fn invalid_utf8_body_publishes_samples() {
        let coordinator = coordinator(vec![(
            Duration::ZERO,
            FetchOutcome::Success {
                body: vec![0xC3, 0x28, 0xA0, 0xFF],
                status: 200,
            },
        )]);
        let store = coordinator.store();

        coordinator.refresh().await.unwrap();

        assert!(store.used_fallback());
        assert!(store.error_message().unwrap().contains("Failed to load"));
    }

    #[tokio::test]
    async fn second_refresh_supersedes_first() {
        // First run's fetch is slow; the second completes while the first
        // is still suspended, so only the second may publish.
        let coordinator = coordinator(vec![
            (Duration::from_millis(100), success(PAGE)),
            (Duration::from_millis(10), success(SECOND_PAGE)),
        ]);
        let store = coordinator.store();

        let first = coordinator.refresh();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let second = coordinator.refresh();

        first.await.unwrap();
        second.await.unwrap();

        assert_eq!(titles(&store), vec!["Replacement post"]);
        assert!(!store.is_loading());
        assert!(!store.used_fallback());
    }

    #[tokio::test]
    async fn superseded_run_leaves_previous_result_untouched() {
        // Run 1 publishes live data; run 2 hangs and is superseded by
        // run 3, which fails over to samples. Run 2's page must never
        // appear.
        let coordinator = coordinator(vec![
            (Duration::ZERO, success(PAGE)),
            (Duration::from_millis(100), success(SECOND_PAGE)),
            (Duration::from_millis(10), FetchOutcome::TimedOut),
        ]);
        let store = coordinator.store();

        coordinator.refresh().await.unwrap();
        assert_eq!(titles(&store), vec!["Newer post", "Older post"]);

        let second = coordinator.refresh();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let third = coordinator.refresh();

        second.await.unwrap();
        third.await.unwrap();

        assert!(store.used_fallback());
        assert!(!titles(&store).contains(&"Replacement post".to_string()));
    }

    #[tokio::test]
    async fn unparsable_dates_fall_back_to_run_time_and_keep_records() {
        let html = r#"
            <article>
              <h2>Dateless</h2>
              <span class="post-metadata__date">sometime soon</span>
              <a class="blog-link-hover-color" href="/post/dateless">Read more</a>
            </article>
        "#;
        let before = Utc::now();
        let coordinator = coordinator(vec![(Duration::ZERO, success(html))]);
        let store = coordinator.store();

        coordinator.refresh().await.unwrap();
        let after = Utc::now();

        let articles = store.articles();
        assert_eq!(articles.len(), 1);
        assert!(articles[0].published_at >= before);
        assert!(articles[0].published_at <= after);
        assert!(!store.used_fallback());
    }
}
