// src/store.rs

//! Published article state.
//!
//! The store owns the single `IngestionResult` slot shared between the
//! coordinator (sole writer) and any number of consumers (readers). It is
//! an explicit owned object injected into consumers, not a module-level
//! singleton, so lifecycle and tests stay in the caller's hands.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use url::Url;

use crate::models::{Article, IngestionResult};
use crate::pipeline::RunToken;

/// External collaborator that opens an article link, typically via the
/// OS-level URL handler. Fire-and-forget; the pipeline consumes no result.
pub trait ArticleOpener: Send + Sync {
    fn open(&self, url: &Url);
}

/// Default opener: records the request in the log only.
pub struct LogOpener;

impl ArticleOpener for LogOpener {
    fn open(&self, url: &Url) {
        log::info!("Opening article link: {url}");
    }
}

/// Read-only view of the pipeline state.
#[derive(Debug, Clone, Default)]
pub struct NewsState {
    /// Published articles, sorted descending by publication date
    pub articles: Vec<Article>,

    /// True strictly between a `refresh()` call and its terminal transition
    pub is_loading: bool,

    /// Non-nil only when the sample set was published
    pub error_message: Option<String>,

    /// Whether `articles` is the built-in sample set
    pub used_fallback: bool,
}

/// Holds the last published result set and exposes it to consumers.
pub struct ArticleStore {
    state: RwLock<NewsState>,
    opener: Arc<dyn ArticleOpener>,
}

impl ArticleStore {
    pub fn new() -> Self {
        Self::with_opener(Arc::new(LogOpener))
    }

    pub fn with_opener(opener: Arc<dyn ArticleOpener>) -> Self {
        Self {
            state: RwLock::new(NewsState::default()),
            opener,
        }
    }

    /// Consistent copy of the full state.
    pub fn snapshot(&self) -> NewsState {
        self.read().clone()
    }

    /// Currently published articles.
    pub fn articles(&self) -> Vec<Article> {
        self.read().articles.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.read().is_loading
    }

    pub fn error_message(&self) -> Option<String> {
        self.read().error_message.clone()
    }

    pub fn used_fallback(&self) -> bool {
        self.read().used_fallback
    }

    /// Open a previously published article through the injected opener.
    pub fn open_article(&self, article: &Article) {
        self.opener.open(&article.source_url);
    }

    /// Mark a run as started: raises the loading flag and clears the
    /// previous error while keeping the published articles visible.
    pub(crate) fn begin_run(&self) {
        let mut state = self.write();
        state.is_loading = true;
        state.error_message = None;
    }

    /// Atomically replace the published result, provided `token` still owns
    /// the current run. A superseded run leaves the state untouched,
    /// including the loading flag its successor now owns.
    pub(crate) fn publish(&self, token: &RunToken, result: IngestionResult) -> bool {
        let mut state = self.write();
        if token.is_cancelled() {
            return false;
        }

        state.articles = result.articles;
        state.used_fallback = result.used_fallback;
        state.error_message = result.error_message;
        state.is_loading = false;
        true
    }

    fn read(&self) -> RwLockReadGuard<'_, NewsState> {
        self.state.read().expect("news state lock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, NewsState> {
        self.state.write().expect("news state lock poisoned")
    }
}

impl Default for ArticleStore {
    fn default() -> Self {
        Self::new()
    }
}
