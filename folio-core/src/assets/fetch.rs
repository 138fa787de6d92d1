//! Remote asset fetching

use crate::error::AssetError;
use std::time::Duration;

/// Bytes and declared type of a fetched resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedAsset {
    pub bytes: Vec<u8>,
    /// `Content-Type` as sent by the server, parameters included
    pub content_type: Option<String>,
}

/// Downloads remote assets. Called from pipeline workers, so blocking.
pub trait RemoteFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<FetchedAsset, AssetError>;
}

/// HTTP(S) fetcher backed by a blocking reqwest client
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, AssetError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AssetError::Fetch {
                url: String::new(),
                reason: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }
}

impl RemoteFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedAsset, AssetError> {
        let fetch_error = |e: reqwest::Error| AssetError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(fetch_error)?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response.bytes().map_err(fetch_error)?.to_vec();
        tracing::debug!(url, size = bytes.len(), "fetched remote asset");

        Ok(FetchedAsset {
            bytes,
            content_type,
        })
    }
}
