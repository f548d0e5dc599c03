//! Launch Library 2 API client.

use std::time::Duration;

use async_trait::async_trait;
use tracing::instrument;
use url::Url;

use crate::error::LaunchApiError;
use crate::retry::{send_with_retry, RetryConfig};
use crate::types::ResultCollection;

const DEFAULT_ENDPOINT: &str = "launch/upcoming/";
const DEFAULT_LIMIT: u32 = 50;
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;
const USER_AGENT: &str = "T-Minus/0.1.0";

/// Upstream source of launch results.
#[async_trait]
pub trait LaunchSource: Send + Sync {
    /// # Errors
    /// Any transport, HTTP or decode failure. The whole collection fails together.
    async fn fetch_results(&self) -> Result<ResultCollection, LaunchApiError>;
}

pub struct LaunchApiClient {
    client: reqwest::Client,
    base_url: String,
    endpoint: String,
    limit: u32,
    retry: RetryConfig,
}

impl LaunchApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, LaunchApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            limit: DEFAULT_LIMIT,
            retry: RetryConfig::default(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_start_matches('/').to_string();
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn collection_url(&self) -> Result<Url, LaunchApiError> {
        let raw = format!("{}/{}", self.base_url, self.endpoint);
        let mut url = Url::parse(&raw).map_err(|e| LaunchApiError::InvalidUrl(format!("{}: {}", raw, e)))?;
        url.query_pairs_mut()
            .append_pair("limit", &self.limit.to_string())
            .append_pair("mode", "normal");
        Ok(url)
    }

    /// Map the provider's status codes onto `LaunchApiError`.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, LaunchApiError> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| LaunchApiError::Parse(format!("JSON parse error: {}", e)))
        } else if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            Err(LaunchApiError::RateLimited(retry_after))
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(LaunchApiError::Api {
                status: status.as_u16(),
                message: text,
            })
        }
    }
}

#[async_trait]
impl LaunchSource for LaunchApiClient {
    #[instrument(skip(self), level = "info")]
    async fn fetch_results(&self) -> Result<ResultCollection, LaunchApiError> {
        let url = self.collection_url()?;
        tracing::debug!("Fetching launches from {}", url);

        let response =
            send_with_retry(&self.retry, || self.client.get(url.clone()).send()).await?;

        let collection: ResultCollection = self.handle_response(response).await?;
        tracing::debug!(
            "Fetched {} of {} launches",
            collection.results.len(),
            collection.count
        );
        Ok(collection)
    }
}
