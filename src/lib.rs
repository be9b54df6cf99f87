// src/lib.rs

//! newsdesk: news ingestion pipeline for the BoxWall dashboard.
//!
//! Fetches the blog index page, extracts article records from its markup,
//! normalizes their dates, and publishes the result to an
//! [`store::ArticleStore`] under a single-flight/cancellation contract.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod store;
pub mod utils;
