//! oEmbed lookup through noembed.
//!
//! One `GET {endpoint}?url={source}` per source, no retries. The response
//! carries `title`, `author_name` and `thumbnail_url`; any of them may be
//! missing, and providers answer unknown sources with a 200 and an `error`
//! field, which resolves to an all-empty [`TrackMetadata`].

use crate::catalog::MetadataLookup;
use crate::error::{MetadataError, Result};
use crate::models::TrackMetadata;
use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest, RetryPolicy};
use core_runtime::config::{CatalogConfig, DEFAULT_METADATA_ENDPOINT};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct NoembedClient {
    http_client: Arc<dyn HttpClient>,
    endpoint: String,
    timeout: Duration,
}

#[derive(Debug, Default, Deserialize)]
struct OEmbedResponse {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    author_name: Option<String>,
    #[serde(default)]
    thumbnail_url: Option<String>,
}

impl NoembedClient {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            endpoint: DEFAULT_METADATA_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn from_config(http_client: Arc<dyn HttpClient>, config: &CatalogConfig) -> Self {
        Self::new(http_client)
            .with_endpoint(config.metadata_endpoint.clone())
            .with_timeout(config.request_timeout)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn build_request(&self, source_ref: &str) -> HttpRequest {
        HttpRequest::get(self.endpoint.as_str())
            .query("url", source_ref)
            .header("Accept", "application/json")
            .timeout(self.timeout)
    }
}

#[async_trait]
impl MetadataLookup for NoembedClient {
    async fn lookup(&self, source_ref: &str) -> Result<TrackMetadata> {
        let request = self.build_request(source_ref);
        debug!(url = %request.url, "Looking up track metadata");

        let response = self
            .http_client
            .execute_with_retry(request, RetryPolicy::no_retry())
            .await
            .map_err(|e| MetadataError::LookupFailed(e.to_string()))?;

        if !response.is_success() {
            return Err(MetadataError::HttpError {
                status: response.status,
            });
        }

        let body: OEmbedResponse = response
            .json()
            .map_err(|e| MetadataError::LookupFailed(e.to_string()))?;

        Ok(TrackMetadata {
            title: body.title,
            artist: body.author_name,
            artwork_ref: body.thumbnail_url,
        })
    }
}
