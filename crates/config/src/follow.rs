//! Live-follow configuration
//!
//! Defaults applied to follow requests that leave a field unset.

use std::time::Duration;

use serde::Deserialize;

/// Follow stream configuration
///
/// # Example
///
/// ```toml
/// [follow]
/// topic = "flow-logs"
/// group_id_prefix = "logship-follow"
/// default_batch_size = 100
/// max_batch_size = 1000
/// drain_timeout = "5s"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FollowConfig {
    /// Topic followed when the request names none
    /// Default: "logs"
    pub topic: String,

    /// Prefix of the per-request consumer group
    /// Default: "logship-follow"
    pub group_id_prefix: String,

    /// Batch size when the request asks for 0
    /// Default: 100
    pub default_batch_size: u32,

    /// Upper bound for requested batch sizes
    /// Default: 1000
    pub max_batch_size: u32,

    /// Time an in-flight batch may take after the client goes away
    /// Default: 5s
    #[serde(with = "humantime_serde")]
    pub drain_timeout: Duration,
}

impl Default for FollowConfig {
    fn default() -> Self {
        Self {
            topic: "logs".into(),
            group_id_prefix: "logship-follow".into(),
            default_batch_size: 100,
            max_batch_size: 1000,
            drain_timeout: Duration::from_secs(5),
        }
    }
}

impl FollowConfig {
    /// Clamp a requested batch size (0 = default)
    pub fn batch_size(&self, requested: u32) -> u32 {
        let size = if requested == 0 {
            self.default_batch_size
        } else {
            requested
        };
        size.clamp(1, self.max_batch_size.max(1))
    }
}
