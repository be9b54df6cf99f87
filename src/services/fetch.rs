// src/services/fetch.rs

//! Page fetching and transport outcome classification.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, PRAGMA};

use crate::error::Result;

/// Classified result of one page fetch.
///
/// Every transport and HTTP condition maps to exactly one variant; the
/// fetcher never propagates an error past this boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// 2xx response with the raw body bytes
    Success { body: Vec<u8>, status: u16 },

    /// The request or body read exceeded the timeout
    TimedOut,

    /// DNS, route, or connection failure (offline conditions included)
    NoConnectivity,

    /// Response carried a status outside 200-299
    HttpError(u16),

    /// Any other I/O failure
    TransportError(String),
}

impl FetchOutcome {
    /// Whether this outcome carries a usable body.
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }
}

/// Fetches the source page for one ingestion run.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Issue a single cache-bypassing GET and classify the outcome.
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchOutcome;
}

/// Live HTTP fetcher backed by a shared reqwest client.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with the given User-Agent. The timeout is applied
    /// per request, not on the client.
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchOutcome {
        let response = self
            .client
            .get(url)
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .timeout(timeout)
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(error) => return classify_transport(&error),
        };

        let status = response.status();
        if !status.is_success() {
            return FetchOutcome::HttpError(status.as_u16());
        }

        match response.bytes().await {
            Ok(body) => FetchOutcome::Success {
                body: body.to_vec(),
                status: status.as_u16(),
            },
            Err(error) => classify_transport(&error),
        }
    }
}

fn classify_transport(error: &reqwest::Error) -> FetchOutcome {
    if error.is_timeout() {
        FetchOutcome::TimedOut
    } else if error.is_connect() {
        FetchOutcome::NoConnectivity
    } else {
        FetchOutcome::TransportError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_success() {
        let ok = FetchOutcome::Success {
            body: b"<html></html>".to_vec(),
            status: 200,
        };
        assert!(ok.is_success());
        assert!(!FetchOutcome::TimedOut.is_success());
        assert!(!FetchOutcome::HttpError(500).is_success());
    }
}
