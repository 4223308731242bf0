//! Configuration validation
//!
//! Checks the values serde cannot:
//! - Broker and search node lists are not empty
//! - The index topic pattern compiles
//! - The index name is one the search backend accepts
//! - Shard and batch counts are at least 1
//! - The default follow batch fits under the maximum

use logship_protocol::check_index_name;
use regex::Regex;

use crate::Config;
use crate::error::{ConfigError, Result};

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_bus(config)?;
    validate_index(config)?;
    validate_follow(config)?;
    Ok(())
}

fn validate_bus(config: &Config) -> Result<()> {
    let bus = &config.bus;

    if bus.brokers.iter().all(|b| b.trim().is_empty()) {
        return Err(ConfigError::missing_field("bus", "brokers"));
    }
    if bus.group_id.is_empty() {
        return Err(ConfigError::missing_field("bus", "group_id"));
    }
    if let Err(e) = Regex::new(&bus.topic_pattern) {
        return Err(ConfigError::invalid_value(
            "bus",
            "topic_pattern",
            e.to_string(),
        ));
    }
    if bus.batch_max == 0 {
        return Err(ConfigError::invalid_value(
            "bus",
            "batch_max",
            "must be at least 1",
        ));
    }
    Ok(())
}

fn validate_index(config: &Config) -> Result<()> {
    let index = &config.index;
    if !index.enabled {
        return Ok(());
    }

    if index.urls.iter().all(|u| u.trim().is_empty()) {
        return Err(ConfigError::missing_field("index", "urls"));
    }
    if index.index_name.is_empty() {
        return Err(ConfigError::missing_field("index", "index_name"));
    }
    if let Err(e) = check_index_name(&index.index_name) {
        return Err(ConfigError::invalid_value(
            "index",
            "index_name",
            format!("'{}' {}", e.name, e.reason),
        ));
    }
    if index.shards == 0 {
        return Err(ConfigError::invalid_value(
            "index",
            "shards",
            "must be at least 1",
        ));
    }
    Ok(())
}

fn validate_follow(config: &Config) -> Result<()> {
    let follow = &config.follow;

    if follow.topic.is_empty() {
        return Err(ConfigError::missing_field("follow", "topic"));
    }
    if follow.group_id_prefix.is_empty() {
        return Err(ConfigError::missing_field("follow", "group_id_prefix"));
    }
    if follow.default_batch_size == 0 {
        return Err(ConfigError::invalid_value(
            "follow",
            "default_batch_size",
            "must be at least 1",
        ));
    }
    if follow.max_batch_size == 0 {
        return Err(ConfigError::invalid_value(
            "follow",
            "max_batch_size",
            "must be at least 1",
        ));
    }
    if follow.default_batch_size > follow.max_batch_size {
        return Err(ConfigError::invalid_value(
            "follow",
            "default_batch_size",
            format!(
                "{} exceeds max_batch_size {}",
                follow.default_batch_size, follow.max_batch_size
            ),
        ));
    }
    Ok(())
}
