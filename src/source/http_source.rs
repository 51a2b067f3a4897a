// HTTP fetcher backed by reqwest. Non-success statuses are transfer
// failures; connection and body errors propagate the same way.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::LoadError;
use crate::source::traits::{FetchedResource, ResourceFetcher};

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &EngineConfig) -> Result<Self, LoadError> {
        let mut builder = Client::builder().timeout(Duration::from_secs(config.http_timeout_secs));
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        let client = builder
            .build()
            .map_err(|e| LoadError::transfer(format!("cannot build http client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ResourceFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedResource, LoadError> {
        debug!("fetching {}", url);

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LoadError::transfer(format!("request to {url} failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            warn!("fetch failed url={} status={}", url, status.as_u16());
            return Err(LoadError::transfer(format!(
                "fetch failed: HTTP {} for {url}",
                status.as_u16()
            )));
        }

        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();

        let content_length = resp.content_length();

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| LoadError::transfer(format!("reading body of {url} failed: {e}")))?;

        // A body shorter than the advertised length means the read was cut off.
        if let Some(expected) = content_length {
            if (bytes.len() as u64) < expected {
                return Err(LoadError::transfer(format!(
                    "truncated read from {url}: got {} of {expected} bytes",
                    bytes.len()
                )));
            }
        }

        debug!("fetched {} bytes from {}", bytes.len(), url);
        Ok(FetchedResource {
            bytes,
            content_type,
        })
    }
}
