//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Source page and HTTP behavior settings
    #[serde(default)]
    pub feed: FeedConfig,

    /// CSS selectors and attribute names used by extraction
    #[serde(default)]
    pub selectors: SelectorConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.feed.user_agent.trim().is_empty() {
            return Err(AppError::validation("feed.user_agent is empty"));
        }
        if self.feed.timeout_secs == 0 {
            return Err(AppError::validation("feed.timeout_secs must be > 0"));
        }
        self.feed.parse_source_url()?;
        self.feed.parse_asset_base_url()?;

        let selectors = [
            ("selectors.container", &self.selectors.container),
            ("selectors.title", &self.selectors.title),
            ("selectors.subtitle", &self.selectors.subtitle),
            ("selectors.content", &self.selectors.content),
            ("selectors.date", &self.selectors.date),
            ("selectors.read_more", &self.selectors.read_more),
            ("selectors.image_element", &self.selectors.image_element),
        ];
        for (name, value) in selectors {
            if value.trim().is_empty() {
                return Err(AppError::validation(format!("{name} is empty")));
            }
        }
        if self.selectors.link_attr.trim().is_empty() {
            return Err(AppError::validation("selectors.link_attr is empty"));
        }
        if self.selectors.permalink_fragment.trim().is_empty() {
            return Err(AppError::validation(
                "selectors.permalink_fragment is empty",
            ));
        }
        Ok(())
    }
}

/// Source page and HTTP client behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// URL of the blog index page to ingest
    #[serde(default = "defaults::source_url")]
    pub source_url: String,

    /// Base URL that lazy-image URIs are joined against
    #[serde(default = "defaults::asset_base_url")]
    pub asset_base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl FeedConfig {
    /// Parsed source page URL.
    pub fn parse_source_url(&self) -> Result<Url> {
        let url = Url::parse(&self.source_url)?;
        if url.host_str().is_none() {
            return Err(AppError::validation(format!(
                "feed.source_url has no host: {}",
                self.source_url
            )));
        }
        Ok(url)
    }

    /// Parsed asset base URL.
    pub fn parse_asset_base_url(&self) -> Result<Url> {
        Ok(Url::parse(&self.asset_base_url)?)
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            source_url: defaults::source_url(),
            asset_base_url: defaults::asset_base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// CSS selectors and attribute names for article extraction.
///
/// Defaults match the Wix blog markup of the production source page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Selector for candidate article containers
    #[serde(default = "defaults::container")]
    pub container: String,

    /// Selector for the heading element inside a container
    #[serde(default = "defaults::title")]
    pub title: String,

    /// Selector for the excerpt element
    #[serde(default = "defaults::subtitle")]
    pub subtitle: String,

    /// Selector for the body text element
    #[serde(default = "defaults::content")]
    pub content: String,

    /// Selector for the date metadata element
    #[serde(default = "defaults::date")]
    pub date: String,

    /// Selector for the designated "read more" link
    #[serde(default = "defaults::read_more")]
    pub read_more: String,

    /// Attribute holding the link target
    #[serde(default = "defaults::link_attr")]
    pub link_attr: String,

    /// Path fragment identifying an article permalink
    #[serde(default = "defaults::permalink_fragment")]
    pub permalink_fragment: String,

    /// Element carrying the lazy-image marker
    #[serde(default = "defaults::image_element")]
    pub image_element: String,

    /// Attribute on the lazy-image element holding the JSON payload
    #[serde(default = "defaults::image_attr")]
    pub image_attr: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            container: defaults::container(),
            title: defaults::title(),
            subtitle: defaults::subtitle(),
            content: defaults::content(),
            date: defaults::date(),
            read_more: defaults::read_more(),
            link_attr: defaults::link_attr(),
            permalink_fragment: defaults::permalink_fragment(),
            image_element: defaults::image_element(),
            image_attr: defaults::image_attr(),
        }
    }
}

mod defaults {
    // Feed defaults
    pub fn source_url() -> String {
        "https://boxwall.no/blogg".into()
    }
    pub fn asset_base_url() -> String {
        "https://static.wixstatic.com/media".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; newsdesk/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Selector defaults
    pub fn container() -> String {
        "article".into()
    }
    pub fn title() -> String {
        "h2".into()
    }
    pub fn subtitle() -> String {
        ".post-excerpt".into()
    }
    pub fn content() -> String {
        ".post-content".into()
    }
    pub fn date() -> String {
        ".post-metadata__date".into()
    }
    pub fn read_more() -> String {
        "a.blog-link-hover-color".into()
    }
    pub fn link_attr() -> String {
        "href".into()
    }
    pub fn permalink_fragment() -> String {
        "/post/".into()
    }
    pub fn image_element() -> String {
        "wow-image".into()
    }
    pub fn image_attr() -> String {
        "data-image-info".into()
    }
}
