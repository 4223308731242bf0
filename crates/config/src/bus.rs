//! Message bus configuration
//!
//! Connection and consumer-group settings for the index sink subscription.
//! Follow streams reuse `brokers`, `refresh_frequency` and
//! `balance_strategy`; group and offset policy come from each request.

use std::time::Duration;

use serde::Deserialize;

use logship_protocol::{BalanceStrategy, OffsetPolicy};

/// Bus configuration
///
/// # Example
///
/// ```toml
/// [bus]
/// brokers = ["kafka-1:9092", "kafka-2:9092"]
/// group_id = "logship-indexer"
/// topic_pattern = "^flow-.*"
/// refresh_frequency = "10s"
/// offsets_initial = "oldest"
/// balance_strategy = "sticky"
/// batch_mode = true
/// batch_max = 500
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Broker addresses
    /// Default: ["localhost:9092"]
    pub brokers: Vec<String>,

    /// Consumer group of the index sink
    /// Default: "logship-indexer"
    pub group_id: String,

    /// Regex selecting the topics to index
    /// Default: ".*"
    pub topic_pattern: String,

    /// How often topic metadata (and the pattern match) is refreshed
    /// Default: 10s
    #[serde(with = "humantime_serde")]
    pub refresh_frequency: Duration,

    /// Start position for a group without committed offsets (oldest, newest)
    /// Default: newest
    pub offsets_initial: OffsetPolicy,

    /// Partition assignment strategy (range, roundrobin, sticky)
    /// Default: range
    pub balance_strategy: BalanceStrategy,

    /// Deliver records in batches
    /// Default: true
    pub batch_mode: bool,

    /// Maximum records per batch
    /// Default: 500
    pub batch_max: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            brokers: vec!["localhost:9092".into()],
            group_id: "logship-indexer".into(),
            topic_pattern: ".*".into(),
            refresh_frequency: Duration::from_secs(10),
            offsets_initial: OffsetPolicy::Newest,
            balance_strategy: BalanceStrategy::Range,
            batch_mode: true,
            batch_max: 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: BusConfig = toml::from_str("").unwrap();
        assert_eq!(config.brokers, vec!["localhost:9092"]);
        assert_eq!(config.refresh_frequency, Duration::from_secs(10));
        assert_eq!(config.offsets_initial, OffsetPolicy::Newest);
        assert!(config.batch_mode);
        assert_eq!(config.batch_max, 500);
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
brokers = ["a:9092", "b:9092"]
group_id = "g"
topic_pattern = "^flow-"
refresh_frequency = "1m"
offsets_initial = "oldest"
balance_strategy = "round_robin"
batch_mode = false
batch_max = 10
"#;
        let config: BusConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.brokers.len(), 2);
        assert_eq!(config.group_id, "g");
        assert_eq!(config.refresh_frequency, Duration::from_secs(60));
        assert_eq!(config.offsets_initial, OffsetPolicy::Oldest);
        assert_eq!(config.balance_strategy, BalanceStrategy::RoundRobin);
        assert!(!config.batch_mode);
        assert_eq!(config.batch_max, 10);
    }
}
