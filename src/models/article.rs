//! Article data structures.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use url::Url;

use crate::utils::{article_id, truncate_graphemes};

/// Maximum summary length when falling back to truncated content.
const SUMMARY_GRAPHEMES: usize = 200;

/// A single news article published to consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Article {
    /// Opaque identifier, stable for the session (derived from the source URL)
    pub id: String,

    /// Article headline
    pub title: String,

    /// Excerpt text, when the source page provides one
    pub subtitle: Option<String>,

    /// Body text
    pub content: String,

    /// Cover image URL, when the lazy-image marker could be decoded
    pub image_url: Option<Url>,

    /// Publication timestamp (falls back to ingestion time, never null)
    pub published_at: DateTime<Utc>,

    /// Absolute link to the article page
    pub source_url: Url,
}

impl Article {
    /// Build an article from an extracted record and its resolved timestamp.
    pub fn from_raw(raw: RawArticle, published_at: DateTime<Utc>) -> Self {
        Self {
            id: article_id(&raw.source_url),
            title: raw.title,
            subtitle: raw.subtitle,
            content: raw.content,
            image_url: raw.image_url,
            published_at,
            source_url: raw.source_url,
        }
    }

    /// Short display text: the subtitle when present, otherwise the content
    /// truncated to a card-sized excerpt.
    pub fn summary(&self) -> String {
        match &self.subtitle {
            Some(subtitle) if !subtitle.is_empty() => subtitle.clone(),
            _ => truncate_graphemes(&self.content, SUMMARY_GRAPHEMES),
        }
    }

    /// Human-readable time elapsed since publication.
    pub fn time_ago(&self, now: DateTime<Utc>) -> String {
        let elapsed = now.signed_duration_since(self.published_at);
        if elapsed < Duration::zero() {
            return "Just now".to_string();
        }

        let days = elapsed.num_days();
        let years = days / 365;
        if years > 0 {
            return plural(years, "year");
        }
        let months = days / 30;
        if months > 0 {
            return plural(months, "month");
        }
        if days > 0 {
            if days == 1 {
                return "Yesterday".to_string();
            }
            if days < 7 {
                return format!("{days} days ago");
            }
            return plural(days / 7, "week");
        }

        let hours = elapsed.num_hours();
        if hours > 0 {
            return plural(hours, "hour");
        }
        let minutes = elapsed.num_minutes();
        if minutes > 0 {
            return plural(minutes, "minute");
        }
        "Just now".to_string()
    }

    /// Fixed built-in sample set shown whenever live ingestion cannot
    /// produce a usable result. Dated relative to the fallback instant.
    pub fn samples(now: DateTime<Utc>) -> Vec<Article> {
        let entries = [
            (
                "BoxWall Launches New Sustainability Initiative",
                "Our walls now carry full environmental product declarations.",
                "https://boxwall.no/blogg/sustainability",
                2,
            ),
            (
                "Introducing BoxWall Premium Series",
                "A new finish level for demanding office environments.",
                "https://boxwall.no/blogg/premium",
                5,
            ),
        ];

        entries
            .into_iter()
            .map(|(title, content, link, days_ago)| {
                let source_url = Url::parse(link).expect("sample link is a valid URL");
                Article {
                    id: article_id(&source_url),
                    title: title.to_string(),
                    subtitle: None,
                    content: content.to_string(),
                    image_url: None,
                    published_at: now - Duration::days(days_ago),
                    source_url,
                }
            })
            .collect()
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}

/// A per-candidate extraction record, before date normalization.
///
/// `source_url` is already resolved and mandatory here: candidates without
/// a resolvable source link never become `RawArticle`s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawArticle {
    pub title: String,
    pub subtitle: Option<String>,
    pub content: String,
    pub date_text: String,
    pub image_url: Option<Url>,
    pub source_url: Url,
}

/// The published outcome of one ingestion run.
///
/// This is the only value retained across runs; the store replaces it
/// atomically, never partially.
#[derive(Debug, Clone)]
pub struct IngestionResult {
    /// Articles sorted descending by `published_at`
    pub articles: Vec<Article>,

    /// Whether the built-in sample set was published instead of live data
    pub used_fallback: bool,

    /// Human-readable failure description, set only alongside fallback data
    pub error_message: Option<String>,
}
