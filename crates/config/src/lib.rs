//! logship Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! Every section is optional; an empty file is a valid config.
//! `LOGSHIP_<SECTION>_<FIELD>` environment variables override file values
//! (see [`Config::apply_env`]).
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use logship_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[index]\nindex_name = \"app-logs\"").unwrap();
//! assert_eq!(config.index.index_name, "app-logs");
//! ```
//!
//! # Example Config
//!
//! ```toml
//! [log]
//! level = "debug"
//! format = "json"
//!
//! [bus]
//! brokers = ["kafka-1:9092"]
//! topic_pattern = "^flow-.*"
//! offsets_initial = "oldest"
//!
//! [index]
//! urls = ["http://es-1:9200", "http://es-2:9200"]
//! index_name = "logship-logs"
//! shards = 3
//!
//! [follow]
//! topic = "flow-logs"
//! max_batch_size = 1000
//! ```

mod bus;
mod env;
mod error;
mod follow;
mod index;
mod logging;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use bus::BusConfig;
pub use env::ENV_PREFIX;
pub use error::{ConfigError, Result};
pub use follow::FollowConfig;
pub use index::IndexConfig;
pub use logging::{LogConfig, LogFormat, LogLevel, LogOutput};

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub log: LogConfig,

    /// Bus connection and index sink consumer group
    pub bus: BusConfig,

    /// Search index
    pub index: IndexConfig,

    /// Live-follow defaults
    pub follow: FollowConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, contains invalid TOML, or
    /// fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    ///
    /// Prefer using the `FromStr` trait implementation.
    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::str::FromStr;
    use std::time::Duration;

    use logship_protocol::{BalanceStrategy, OffsetPolicy};

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.log.level, LogLevel::Info);
        assert_eq!(config.bus.topic_pattern, ".*");
        assert_eq!(config.index.index_name, "logship-logs");
        assert_eq!(config.follow.max_batch_size, 1000);
    }

    #[test]
    fn test_full_config_parse() {
        let toml = r#"
[log]
level = "debug"
format = "json"
output = "stderr"

[bus]
brokers = ["kafka-1:9092", "kafka-2:9092"]
group_id = "indexer-prod"
topic_pattern = "^flow-.*"
refresh_frequency = "30s"
offsets_initial = "oldest"
balance_strategy = "sticky"
batch_mode = true
batch_max = 200

[index]
urls = ["http://es-1:9200"]
index_name = "flow-logs"
shards = 3
replicas = 2
request_timeout = "10s"

[follow]
topic = "flow-live"
group_id_prefix = "tail"
default_batch_size = 20
max_batch_size = 200
drain_timeout = "2s"
"#;
        let config = Config::from_str(toml).unwrap();

        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.log.output, LogOutput::Stderr);
        assert_eq!(config.bus.brokers.len(), 2);
        assert_eq!(config.bus.refresh_frequency, Duration::from_secs(30));
        assert_eq!(config.bus.offsets_initial, OffsetPolicy::Oldest);
        assert_eq!(config.bus.balance_strategy, BalanceStrategy::Sticky);
        assert_eq!(config.index.shards, 3);
        assert_eq!(config.index.replicas, 2);
        assert_eq!(config.index.request_timeout, Duration::from_secs(10));
        assert_eq!(config.follow.topic, "flow-live");
        assert_eq!(config.follow.drain_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_invalid_toml() {
        let result = Config::from_str("invalid { toml");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_offset_policy_accepts_earliest_and_latest() {
        let config = Config::from_str("[bus]\noffsets_initial = \"earliest\"").unwrap();
        assert_eq!(config.bus.offsets_initial, OffsetPolicy::Oldest);

        let config = Config::from_str("[bus]\noffsets_initial = \"latest\"").unwrap();
        assert_eq!(config.bus.offsets_initial, OffsetPolicy::Newest);
    }

    #[test]
    fn test_unknown_enum_value() {
        assert!(Config::from_str("[bus]\noffsets_initial = \"middle\"").is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[follow]\ntopic = \"from-file\"").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.follow.topic, "from-file");
    }

    #[test]
    fn test_from_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::IoError { .. }));
        assert!(err.to_string().contains("absent.toml"));
    }
}
