//! Signing key retrieval
//!
//! Key sets are fetched per validation call; nothing is cached, so a rotated
//! middleware key is honored on the very next request. The fetcher is a
//! trait so validators can run against a fake in tests.

use crate::error::{Error, Result};
use jsonwebtoken::jwk::JwkSet;
use std::time::Duration;

/// Fetches a JWK set from an issuer-controlled URL.
#[async_trait::async_trait]
pub trait KeyFetcher: Send + Sync {
    async fn fetch_key_set(&self, url: &str) -> Result<JwkSet>;
}

/// HTTP key fetcher.
///
/// The document shape consumed is `{"keys": [ ... ]}` whether it comes from
/// a middleware's discovery endpoint or the exchange's certificate endpoint.
pub struct HttpKeyFetcher {
    http: reqwest::Client,
}

impl HttpKeyFetcher {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .expect("Failed to build HTTP client");

        Self { http }
    }
}

impl Default for HttpKeyFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl KeyFetcher for HttpKeyFetcher {
    async fn fetch_key_set(&self, url: &str) -> Result<JwkSet> {
        let response = self.http.get(url).send().await?;
        let key_set: JwkSet = response
            .json()
            .await
            .map_err(|e| Error::Internal(format!("Malformed key set from {url}: {e}")))?;
        Ok(key_set)
    }
}
