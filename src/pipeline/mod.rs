//! Pipeline entry point for ingestion runs.
//!
//! - `NewsCoordinator`: owns the single-flight/cancellation contract and
//!   drives fetch, extraction, normalization, and publication

pub mod ingest;

pub use ingest::{FallbackKind, NewsCoordinator, RunToken};
