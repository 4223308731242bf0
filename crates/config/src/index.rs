//! Search index configuration

use std::time::Duration;

use serde::Deserialize;

/// Search index configuration
///
/// # Example
///
/// ```toml
/// [index]
/// urls = ["http://es-1:9200", "http://es-2:9200"]
/// index_name = "logship-logs"
/// shards = 3
/// replicas = 1
/// request_timeout = "30s"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Run the index sink
    /// Default: true
    pub enabled: bool,

    /// Node URLs, tried in order
    /// Default: ["http://localhost:9200"]
    pub urls: Vec<String>,

    /// Target index
    /// Default: "logship-logs"
    pub index_name: String,

    /// Primary shards when the index is created
    /// Default: 1
    pub shards: u32,

    /// Replicas when the index is created
    /// Default: 1
    pub replicas: u32,

    /// Timeout for a single request
    /// Default: 30s
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            urls: vec!["http://localhost:9200".into()],
            index_name: "logship-logs".into(),
            shards: 1,
            replicas: 1,
            request_timeout: Duration::from_secs(30),
        }
    }
}
