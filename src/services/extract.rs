// src/services/extract.rs

//! Article extraction from the fetched HTML document.
//!
//! Candidates are located with a structural selector and each one is
//! processed independently: missing optional fields degrade the record,
//! and only an unresolvable source link drops a candidate. One bad
//! candidate never aborts the batch.

use std::fmt;

use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Config, RawArticle};
use crate::pipeline::RunToken;
use crate::utils::{normalize_whitespace, resolve};

/// Result of one extraction pass, in DOM order.
#[derive(Debug, Default)]
pub struct Extraction {
    /// Successfully extracted records
    pub articles: Vec<RawArticle>,

    /// Candidates dropped at the candidate boundary, with reasons
    pub skipped: Vec<Skipped>,
}

/// A candidate dropped during extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    /// Zero-based position of the candidate in the document
    pub index: usize,
    pub reason: SkipReason,
}

/// Why a candidate was dropped. The source link is the one hard
/// per-candidate requirement; every other field only degrades.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Neither the read-more link nor a permalink match was present
    MissingSourceLink,

    /// A link was present but did not resolve to an absolute http(s) URL
    UnresolvableSourceLink(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingSourceLink => write!(f, "no source link found"),
            SkipReason::UnresolvableSourceLink(href) => {
                write!(f, "source link '{href}' does not resolve")
            }
        }
    }
}

/// Payload of the lazy-image marker attribute.
#[derive(Debug, Deserialize)]
struct ImageInfo {
    #[serde(rename = "imageData")]
    image_data: ImageData,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    uri: String,
}

/// Parses the source page into raw article records.
pub struct ArticleExtractor {
    page_url: Url,
    asset_base: String,
    link_attr: String,
    permalink_fragment: String,
    image_attr: String,
    container: Selector,
    title: Selector,
    subtitle: Selector,
    content: Selector,
    date: Selector,
    read_more: Selector,
    any_link: Selector,
    image: Selector,
}

impl ArticleExtractor {
    /// Compile the configured selectors. Fails on an invalid selector or
    /// source URL, before any run is started.
    pub fn new(config: &Config) -> Result<Self> {
        let page_url = config.feed.parse_source_url()?;
        config.feed.parse_asset_base_url()?;
        let selectors = &config.selectors;

        Ok(Self {
            page_url,
            asset_base: config.feed.asset_base_url.trim_end_matches('/').to_string(),
            link_attr: selectors.link_attr.clone(),
            permalink_fragment: selectors.permalink_fragment.clone(),
            image_attr: selectors.image_attr.clone(),
            container: parse_selector(&selectors.container)?,
            title: parse_selector(&selectors.title)?,
            subtitle: parse_selector(&selectors.subtitle)?,
            content: parse_selector(&selectors.content)?,
            date: parse_selector(&selectors.date)?,
            read_more: parse_selector(&selectors.read_more)?,
            any_link: parse_selector("a")?,
            image: parse_selector(&selectors.image_element)?,
        })
    }

    /// Extract all candidates from `html`.
    ///
    /// Returns `None` when the run token was cancelled mid-loop; partial
    /// work is discarded by the caller in that case.
    pub fn extract(&self, html: &str, token: &RunToken) -> Option<Extraction> {
        let document = Html::parse_document(html);
        let mut extraction = Extraction::default();

        for (index, candidate) in document.select(&self.container).enumerate() {
            if token.is_cancelled() {
                return None;
            }

            match self.source_url(candidate) {
                Ok(source_url) => extraction.articles.push(self.build_record(candidate, source_url)),
                Err(reason) => extraction.skipped.push(Skipped { index, reason }),
            }
        }

        Some(extraction)
    }

    fn build_record(&self, candidate: ElementRef<'_>, source_url: Url) -> RawArticle {
        RawArticle {
            title: self.first_text(candidate, &self.title).unwrap_or_default(),
            subtitle: self.first_text(candidate, &self.subtitle),
            content: self.first_text(candidate, &self.content).unwrap_or_default(),
            date_text: self.first_text(candidate, &self.date).unwrap_or_default(),
            image_url: self.image_url(candidate),
            source_url,
        }
    }

    /// First non-empty text under `selector`, whitespace-normalized.
    fn first_text(&self, scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
        let element = scope.select(selector).next()?;
        let text = normalize_whitespace(&element.text().collect::<String>());
        if text.is_empty() { None } else { Some(text) }
    }

    /// The designated read-more link, or the first permalink-shaped link.
    fn source_url(&self, scope: ElementRef<'_>) -> std::result::Result<Url, SkipReason> {
        let primary = scope
            .select(&self.read_more)
            .next()
            .and_then(|el| el.value().attr(&self.link_attr))
            .filter(|href| !href.trim().is_empty());

        let Some(href) = primary.or_else(|| self.permalink(scope)) else {
            return Err(SkipReason::MissingSourceLink);
        };

        resolve(&self.page_url, href)
            .ok_or_else(|| SkipReason::UnresolvableSourceLink(href.to_string()))
    }

    fn permalink<'a>(&self, scope: ElementRef<'a>) -> Option<&'a str> {
        scope
            .select(&self.any_link)
            .filter_map(|el| el.value().attr(&self.link_attr))
            .find(|href| href.contains(&self.permalink_fragment))
    }

    /// Decode the lazy-image JSON marker into an absolute asset URL.
    /// Any parse or shape failure yields `None`, never a dropped candidate.
    fn image_url(&self, scope: ElementRef<'_>) -> Option<Url> {
        let marker = scope.select(&self.image).next()?;
        let payload = marker.value().attr(&self.image_attr)?;
        let info: ImageInfo = serde_json::from_str(payload).ok()?;
        Url::parse(&format!("{}/{}", self.asset_base, info.image_data.uri)).ok()
    }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
