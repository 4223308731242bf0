//! Elasticsearch HTTP client
//!
//! Talks to the REST API directly with `reqwest`. Every request is tried
//! against the configured URLs in order; the next URL is used only when a
//! node cannot be reached. An HTTP error status from a reachable node is
//! returned as is.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use logship_protocol::{IndexDocument, check_index_name};

use super::{BulkItemFailure, BulkResponse, SearchBackend};
use crate::error::{SearchError, SearchResult};

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest error body kept in [`SearchError::Status`]
const MAX_ERROR_BODY: usize = 1024;

/// Connection settings for [`ElasticsearchClient`]
#[derive(Debug, Clone)]
pub struct ElasticsearchConfig {
    /// Node base URLs, tried in order (e.g. "http://localhost:9200")
    pub urls: Vec<String>,
    /// Timeout for a single request
    pub request_timeout: Duration,
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            urls: vec!["http://localhost:9200".into()],
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ElasticsearchConfig {
    /// Set the node URLs
    pub fn with_urls(mut self, urls: Vec<String>) -> Self {
        self.urls = urls;
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Search backend over the Elasticsearch REST API
#[derive(Debug, Clone)]
pub struct ElasticsearchClient {
    urls: Vec<String>,
    client: Client,
}

impl ElasticsearchClient {
    /// Create a client; no request is made until the first call
    pub fn new(config: &ElasticsearchConfig) -> SearchResult<Self> {
        let urls: Vec<String> = config
            .urls
            .iter()
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .collect();

        if urls.is_empty() {
            return Err(SearchError::Config("no search backend urls configured".into()));
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SearchError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { urls, client })
    }

    /// Node URLs in failover order
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Send a request to the first reachable node
    async fn send<F>(&self, build: F) -> SearchResult<Response>
    where
        F: Fn(&Client, &str) -> RequestBuilder,
    {
        let mut last_error = String::new();

        for url in &self.urls {
            match build(&self.client, url).send().await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    warn!(url = %url, error = %e, "search node unreachable");
                    last_error = format!("{url}: {e}");
                }
            }
        }

        Err(SearchError::Transport(last_error))
    }
}

#[async_trait]
impl SearchBackend for ElasticsearchClient {
    async fn ping(&self) -> SearchResult<()> {
        let response = self.send(|client, url| client.get(url)).await?;
        let response = ensure_success(response).await?;

        let cluster: Value = response
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse(e.to_string()))?;

        info!(
            cluster = cluster["cluster_name"].as_str().unwrap_or("unknown"),
            version = cluster["version"]["number"].as_str().unwrap_or("unknown"),
            "connected to search backend"
        );
        Ok(())
    }

    async fn index_exists(&self, index: &str) -> SearchResult<bool> {
        check_index_name(index)?;
        let response = self
            .send(|client, url| client.head(format!("{url}/{index}")))
            .await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(SearchError::Status {
                status: status.as_u16(),
                body: String::new(),
            }),
        }
    }

    async fn create_index(&self, index: &str, body: &Value) -> SearchResult<()> {
        check_index_name(index)?;
        let response = self
            .send(|client, url| client.put(format!("{url}/{index}")).json(body))
            .await?;

        match ensure_success(response).await {
            Ok(_) => Ok(()),
            // Another process created it between the exists check and now
            Err(SearchError::Status { status: 400, body })
                if body.contains("resource_already_exists_exception") =>
            {
                debug!(index, "index created concurrently");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn bulk_create(&self, index: &str, docs: &[IndexDocument]) -> SearchResult<BulkResponse> {
        check_index_name(index)?;
        let body = bulk_body(index, docs)?;

        let response = self
            .send(|client, url| {
                client
                    .post(format!("{url}/_bulk"))
                    .header("Content-Type", "application/x-ndjson")
                    .body(body.clone())
            })
            .await?;
        let response = ensure_success(response).await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))?;
        parse_bulk_response(&bytes)
    }
}

/// Turn a non-2xx response into [`SearchError::Status`]
async fn ensure_success(response: Response) -> SearchResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }

    Err(SearchError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Encode documents as an NDJSON bulk body of `create` operations
pub fn bulk_body(index: &str, docs: &[IndexDocument]) -> SearchResult<String> {
    let action = serde_json::to_string(&serde_json::json!({ "create": { "_index": index } }))?;

    let mut body = String::with_capacity(docs.len() * (action.len() + 128));
    for doc in docs {
        body.push_str(&action);
        body.push('\n');
        body.push_str(&serde_json::to_string(doc)?);
        body.push('\n');
    }
    Ok(body)
}

#[derive(Deserialize)]
struct RawBulkResponse {
    #[serde(default)]
    took: u64,
    #[serde(default)]
    items: Vec<HashMap<String, RawBulkItem>>,
}

#[derive(Deserialize)]
struct RawBulkItem {
    #[serde(default)]
    status: u16,
    #[serde(default)]
    error: Option<RawBulkError>,
}

#[derive(Deserialize)]
struct RawBulkError {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    reason: String,
}

/// Decode a bulk response body, collecting per-document failures
pub fn parse_bulk_response(body: &[u8]) -> SearchResult<BulkResponse> {
    let raw: RawBulkResponse =
        serde_json::from_slice(body).map_err(|e| SearchError::InvalidResponse(e.to_string()))?;

    let failures = raw
        .items
        .iter()
        .enumerate()
        .filter_map(|(position, item)| {
            // Each item is keyed by its action name ("create")
            let result = item.values().next()?;
            let error = result.error.as_ref()?;
            Some(BulkItemFailure {
                position,
                status: result.status,
                kind: error.kind.clone(),
                reason: error.reason.clone(),
            })
        })
        .collect();

    Ok(BulkResponse {
        took_ms: raw.took,
        items: raw.items.len(),
        failures,
    })
}

#[cfg(test)]
#[path = "elasticsearch_test.rs"]
mod tests;
