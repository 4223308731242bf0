//! Environment overrides
//!
//! Every setting can be replaced with a `LOGSHIP_<SECTION>_<FIELD>` variable,
//! for example `LOGSHIP_INDEX_URLS=http://es-1:9200,http://es-2:9200` or
//! `LOGSHIP_BUS_OFFSETS_INITIAL=earliest`. Lists are comma-separated and
//! durations use the same syntax as the file (`30s`, `1m 30s`).
//!
//! Overrides are applied on top of the parsed file; call
//! [`Config::validate`] afterwards. Variables for unknown sections are
//! ignored (`LOGSHIP_CONFIG` names the file itself). An unknown field in a
//! known section is an error, so a typo does not go unnoticed.

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use crate::Config;
use crate::error::{ConfigError, Result};

/// Prefix of every override variable
pub const ENV_PREFIX: &str = "LOGSHIP_";

const SECTIONS: &[&str] = &["log", "bus", "index", "follow"];

impl Config {
    /// Apply overrides from the process environment
    ///
    /// Returns the names of the variables that were applied.
    pub fn apply_env(&mut self) -> Result<Vec<String>> {
        self.apply_env_from(std::env::vars())
    }

    /// Apply overrides from `vars`
    ///
    /// Returns the names of the variables that were applied, in input order.
    pub fn apply_env_from<I, K, V>(&mut self, vars: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut applied = Vec::new();

        for (var, value) in vars {
            let var = var.as_ref();
            let Some(name) = var.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let name = name.to_ascii_lowercase();
            let Some((section, field)) = name.split_once('_') else {
                continue;
            };
            if !SECTIONS.contains(&section) {
                continue;
            }

            self.set(var, section, field, value.as_ref().trim())?;
            applied.push(var.to_string());
        }

        Ok(applied)
    }

    fn set(&mut self, var: &str, section: &str, field: &str, value: &str) -> Result<()> {
        match (section, field) {
            ("log", "level") => self.log.level = parse(var, value)?,
            ("log", "format") => self.log.format = parse(var, value)?,
            ("log", "output") => self.log.output = parse(var, value)?,

            ("bus", "brokers") => self.bus.brokers = list(value),
            ("bus", "group_id") => self.bus.group_id = value.to_string(),
            ("bus", "topic_pattern") => self.bus.topic_pattern = value.to_string(),
            ("bus", "refresh_frequency") => self.bus.refresh_frequency = duration(var, value)?,
            ("bus", "offsets_initial") => self.bus.offsets_initial = parse(var, value)?,
            ("bus", "balance_strategy") => self.bus.balance_strategy = parse(var, value)?,
            ("bus", "batch_mode") => self.bus.batch_mode = parse(var, value)?,
            ("bus", "batch_max") => self.bus.batch_max = parse(var, value)?,

            ("index", "enabled") => self.index.enabled = parse(var, value)?,
            ("index", "urls") => self.index.urls = list(value),
            ("index", "index_name") => self.index.index_name = value.to_string(),
            ("index", "shards") => self.index.shards = parse(var, value)?,
            ("index", "replicas") => self.index.replicas = parse(var, value)?,
            ("index", "request_timeout") => self.index.request_timeout = duration(var, value)?,

            ("follow", "topic") => self.follow.topic = value.to_string(),
            ("follow", "group_id_prefix") => self.follow.group_id_prefix = value.to_string(),
            ("follow", "default_batch_size") => {
                self.follow.default_batch_size = parse(var, value)?;
            }
            ("follow", "max_batch_size") => self.follow.max_batch_size = parse(var, value)?,
            ("follow", "drain_timeout") => self.follow.drain_timeout = duration(var, value)?,

            _ => return Err(ConfigError::UnknownEnvVar(var.to_string())),
        }
        Ok(())
    }
}

fn parse<T>(var: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        message: e.to_string(),
    })
}

fn duration(var: &str, value: &str) -> Result<Duration> {
    humantime_serde::re::humantime::parse_duration(value).map_err(|e| {
        ConfigError::InvalidEnvVar {
            var: var.to_string(),
            message: e.to_string(),
        }
    })
}

fn list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    use logship_protocol::{BalanceStrategy, OffsetPolicy};

    use crate::{LogFormat, LogLevel};

    fn apply(config: &mut Config, vars: &[(&str, &str)]) -> Result<Vec<String>> {
        config.apply_env_from(vars.iter().copied())
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let mut config = Config::from_str("[index]\nindex_name = \"from-file\"").unwrap();

        let applied = apply(
            &mut config,
            &[
                ("LOGSHIP_INDEX_INDEX_NAME", "from-env"),
                ("LOGSHIP_INDEX_URLS", "http://es-1:9200, http://es-2:9200,"),
                ("LOGSHIP_BUS_REFRESH_FREQUENCY", "1m 30s"),
                ("LOGSHIP_FOLLOW_MAX_BATCH_SIZE", "50"),
                ("LOGSHIP_LOG_LEVEL", "debug"),
                ("LOGSHIP_LOG_FORMAT", "json"),
            ],
        )
        .unwrap();

        assert_eq!(applied.len(), 6);
        assert_eq!(config.index.index_name, "from-env");
        assert_eq!(config.index.urls, vec!["http://es-1:9200", "http://es-2:9200"]);
        assert_eq!(config.bus.refresh_frequency, Duration::from_secs(90));
        assert_eq!(config.follow.max_batch_size, 50);
        assert_eq!(config.log.level, LogLevel::Debug);
        assert_eq!(config.log.format, LogFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_policy_names_match_config_file() {
        let mut config = Config::default();
        apply(
            &mut config,
            &[
                ("LOGSHIP_BUS_OFFSETS_INITIAL", "earliest"),
                ("LOGSHIP_BUS_BALANCE_STRATEGY", "round_robin"),
            ],
        )
        .unwrap();
        assert_eq!(config.bus.offsets_initial, OffsetPolicy::Oldest);
        assert_eq!(config.bus.balance_strategy, BalanceStrategy::RoundRobin);

        let from_file =
            Config::from_str("[bus]\noffsets_initial = \"earliest\"\nbalance_strategy = \"round_robin\"")
                .unwrap();
        assert_eq!(from_file.bus.offsets_initial, config.bus.offsets_initial);
        assert_eq!(from_file.bus.balance_strategy, config.bus.balance_strategy);
    }

    #[test]
    fn test_unrelated_variables_are_ignored() {
        let mut config = Config::default();
        let applied = apply(
            &mut config,
            &[
                ("PATH", "/usr/bin"),
                ("LOGSHIP_CONFIG", "/etc/logship.toml"),
                ("LOGSHIP_OTHER_THING", "x"),
            ],
        )
        .unwrap();

        assert!(applied.is_empty());
        assert_eq!(config.index.index_name, "logship-logs");
    }

    #[test]
    fn test_unknown_field_is_an_error() {
        let err = apply(&mut Config::default(), &[("LOGSHIP_INDEX_SHARD", "3")]).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownEnvVar(ref var) if var == "LOGSHIP_INDEX_SHARD"));
    }

    #[test]
    fn test_invalid_values_name_the_variable() {
        for (var, value) in [
            ("LOGSHIP_INDEX_SHARDS", "three"),
            ("LOGSHIP_BUS_BATCH_MODE", "sometimes"),
            ("LOGSHIP_BUS_OFFSETS_INITIAL", "middle"),
            ("LOGSHIP_FOLLOW_DRAIN_TIMEOUT", "soon"),
            ("LOGSHIP_LOG_LEVEL", "loud"),
        ] {
            let err = apply(&mut Config::default(), &[(var, value)]).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidEnvVar { .. }), "{var}");
            assert!(err.to_string().contains(var), "{var}");
        }
    }

    #[test]
    fn test_overridden_config_is_still_validated() {
        let mut config = Config::default();
        apply(&mut config, &[("LOGSHIP_INDEX_INDEX_NAME", "_all")]).unwrap();
        assert!(config.validate().is_err());
    }
}
