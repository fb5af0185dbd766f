// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::HttpConfig;
use crate::utils::gate::ConcurrencyGate;

/// A fetched document.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after redirects
    pub final_url: String,
    pub body: String,
}

/// Issues one GET per call and returns the response body.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn get(&self, url: &str) -> Result<FetchedPage>;
}

#[async_trait]
impl<F: Fetch + ?Sized> Fetch for std::sync::Arc<F> {
    async fn get(&self, url: &str) -> Result<FetchedPage> {
        (**self).get(url).await
    }
}

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &HttpConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// `Fetch` over a reqwest client. Non-2xx responses are errors.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn get(&self, url: &str) -> Result<FetchedPage> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let final_url = response.url().to_string();
        let body = response.text().await?;
        Ok(FetchedPage { final_url, body })
    }
}

/// Wraps a fetcher so every request holds a gate permit while in flight.
pub struct Gated<F> {
    inner: F,
    gate: ConcurrencyGate,
}

impl<F> Gated<F> {
    pub fn new(inner: F, gate: ConcurrencyGate) -> Self {
        Self { inner, gate }
    }
}

#[async_trait]
impl<F: Fetch> Fetch for Gated<F> {
    async fn get(&self, url: &str) -> Result<FetchedPage> {
        let _permit = self.gate.acquire().await?;
        log::debug!("GET {} ({} slots free)", url, self.gate.available());
        self.inner.get(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_async_client() {
        assert!(create_async_client(&HttpConfig::default()).is_ok());
    }
}
