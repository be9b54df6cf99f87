//! Service layer for the ingestion pipeline.
//!
//! This module contains the stages of one ingestion run:
//! - Page fetching and outcome classification (`HttpFetcher`)
//! - Article extraction (`ArticleExtractor`)
//! - Date normalization (`DateNormalizer`)

mod dates;
mod extract;
mod fetch;

pub use dates::DateNormalizer;
pub use extract::{ArticleExtractor, Extraction, SkipReason, Skipped};
pub use fetch::{FetchOutcome, HttpFetcher, PageFetcher};
