//! HTTP client for the storage node being proxied.

mod capture;

pub use capture::ResponseCapture;

use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, header};
use common::protocol::PIN_RM_PATH;
use thiserror::Error;

use crate::config::BackendConfig;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("invalid backend url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Forwards requests to the storage node over a pooled connection.
#[derive(Clone, Debug)]
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let parsed = reqwest::Url::parse(&config.url).map_err(|e| BackendError::InvalidUrl {
            url: config.url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(BackendError::InvalidUrl {
                url: config.url.clone(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST `body` to `path` with the caller's headers and the given query
    /// pairs, and record the full response.
    ///
    /// The body is streamed, not buffered. `Host` and hop-by-hop headers are
    /// not forwarded.
    pub async fn forward(
        &self,
        path: &str,
        query: &[(String, String)],
        headers: &HeaderMap,
        body: Body,
    ) -> Result<ResponseCapture, reqwest::Error> {
        let response = self
            .client
            .post(self.url(path))
            .query(query)
            .headers(forwardable_headers(headers))
            .body(reqwest::Body::wrap_stream(body.into_data_stream()))
            .send()
            .await?;

        ResponseCapture::record(response).await
    }

    /// Ask the node to unpin `content_ids`, one `arg` per id.
    pub async fn pin_rm(&self, content_ids: &[String]) -> Result<reqwest::Response, reqwest::Error> {
        let query: Vec<(&str, &str)> = content_ids.iter().map(|id| ("arg", id.as_str())).collect();
        self.client
            .post(self.url(PIN_RM_PATH))
            .query(&query)
            .send()
            .await
    }
}

fn forwardable_headers(headers: &HeaderMap) -> HeaderMap {
    let mut forwarded = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if *name == header::HOST || capture::is_hop_by_hop(name) {
            continue;
        }
        forwarded.append(name.clone(), value.clone());
    }
    forwarded
}
