//! Asset fetching
//!
//! Retrieves the raw bytes of an asset from disk or over HTTP.

use crate::catalog::SourceLocation;
use crate::{AudioError, Result};
use async_trait::async_trait;

/// Source of raw asset bytes
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, location: &SourceLocation) -> Result<Vec<u8>>;
}

/// Fetches local files with tokio and remote assets with reqwest
#[derive(Debug, Clone, Default)]
pub struct SourceFetcher {
    client: reqwest::Client,
}

impl SourceFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured HTTP client (proxies, user agent, ...)
    pub fn with_client(client: reqwest::Client) -> Self {
        SourceFetcher { client }
    }
}

#[async_trait]
impl AssetFetcher for SourceFetcher {
    async fn fetch(&self, location: &SourceLocation) -> Result<Vec<u8>> {
        match location {
            SourceLocation::File(path) => Ok(tokio::fs::read(path).await?),
            SourceLocation::Url(url) => {
                let response = self
                    .client
                    .get(url.clone())
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| AudioError::HttpError(format!("Failed to download {}: {}", url, e)))?;

                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| AudioError::HttpError(format!("Failed to read bytes: {}", e)))?;

                Ok(bytes.to_vec())
            }
        }
    }
}
