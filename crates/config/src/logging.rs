//! Logging configuration
//!
//! The `[log]` section picks the tracing level, format and destination.
//! Commands that print records on stdout (`parse`, `replay --follow`) move
//! logs to stderr with [`LogConfig::for_stdout_data`], so the data stream
//! stays machine-readable. Every value can also be set from the environment
//! (`LOGSHIP_LOG_LEVEL=debug`), which goes through the `FromStr` impls here.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ConfigError;

/// Log level
///
/// At `debug` the router and index sink log every batch; at `trace` they
/// also log every malformed record they drop.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Level name, usable as a tracing filter directive
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(ConfigError::invalid_value(
                "log",
                "level",
                format!("'{s}' is not one of trace, debug, info, warn, error"),
            )),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines (default)
    #[default]
    Console,
    /// One JSON object per event, for log collectors
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "console" => Ok(Self::Console),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::invalid_value(
                "log",
                "format",
                format!("'{s}' is not one of console, json"),
            )),
        }
    }
}

/// Where log lines are written
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
}

impl FromStr for LogOutput {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stdout" => Ok(Self::Stdout),
            "stderr" => Ok(Self::Stderr),
            _ => Err(ConfigError::invalid_value(
                "log",
                "output",
                format!("'{s}' is not one of stdout, stderr"),
            )),
        }
    }
}

/// `[log]` section
///
/// ```toml
/// [log]
/// level = "debug"
/// format = "json"
/// output = "stderr"
/// ```
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    /// Default: info
    pub level: LogLevel,
    /// Default: console
    pub format: LogFormat,
    /// Default: stdout
    pub output: LogOutput,
}

impl LogConfig {
    /// Settings for a command whose stdout carries data
    ///
    /// Logs go to stderr when `data_on_stdout` is set; otherwise the
    /// configured output is kept.
    pub fn for_stdout_data(self, data_on_stdout: bool) -> Self {
        if data_on_stdout {
            Self {
                output: LogOutput::Stderr,
                ..self
            }
        } else {
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stdout_data_moves_logs_to_stderr() {
        let config = LogConfig {
            level: LogLevel::Debug,
            format: LogFormat::Json,
            output: LogOutput::Stdout,
        };

        let moved = config.for_stdout_data(true);
        assert_eq!(moved.output, LogOutput::Stderr);
        assert_eq!(moved.level, LogLevel::Debug);
        assert_eq!(moved.format, LogFormat::Json);

        assert_eq!(config.for_stdout_data(false), config);
    }

    #[test]
    fn test_level_from_str_matches_toml_names() {
        for name in ["trace", "debug", "info", "warn", "error"] {
            let parsed: LogLevel = name.parse().unwrap();
            let from_toml: LogConfig = toml::from_str(&format!("level = \"{name}\"")).unwrap();
            assert_eq!(parsed, from_toml.level);
            assert_eq!(parsed.to_string(), name);
        }
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warn);
    }

    #[test]
    fn test_from_str_rejects_unknown_names() {
        let err = "verbose".parse::<LogLevel>().unwrap_err();
        assert!(err.to_string().contains("verbose"));
        assert!("xml".parse::<LogFormat>().is_err());
        assert!("syslog".parse::<LogOutput>().is_err());
    }

    #[test]
    fn test_unknown_output_rejected_in_toml() {
        assert!(toml::from_str::<LogConfig>("output = \"syslog\"").is_err());
    }
}
