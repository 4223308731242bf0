//! Consumer policy values
//!
//! Pass-through settings handed to the bus when a subscription is created.
//! Neither the router nor the index sink interprets them.
//!
//! Config files and `FromStr` (used for environment overrides) accept the
//! same names, including the `earliest`/`latest` spellings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Where a new subscription starts reading
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OffsetPolicy {
    /// Start from the oldest retained record
    #[serde(alias = "earliest")]
    Oldest,
    /// Only receive records that arrive after subscribing (default)
    #[default]
    #[serde(alias = "latest")]
    Newest,
}

impl OffsetPolicy {
    /// Policy name as used in config files
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Oldest => "oldest",
            Self::Newest => "newest",
        }
    }
}

impl fmt::Display for OffsetPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OffsetPolicy {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "oldest" | "earliest" => Ok(Self::Oldest),
            "newest" | "latest" => Ok(Self::Newest),
            _ => Err(ProtocolError::InvalidOffsetPolicy(s.to_string())),
        }
    }
}

/// How partitions are balanced across members of a consumer group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceStrategy {
    /// Contiguous partition ranges per member (default)
    #[default]
    Range,
    /// Partitions dealt out one at a time
    #[serde(alias = "round_robin")]
    RoundRobin,
    /// Keep previous assignments where possible
    Sticky,
}

impl BalanceStrategy {
    /// Strategy name as used in config files
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Range => "range",
            Self::RoundRobin => "roundrobin",
            Self::Sticky => "sticky",
        }
    }
}

impl fmt::Display for BalanceStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BalanceStrategy {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "range" => Ok(Self::Range),
            "roundrobin" | "round_robin" => Ok(Self::RoundRobin),
            "sticky" => Ok(Self::Sticky),
            _ => Err(ProtocolError::InvalidBalanceStrategy(s.to_string())),
        }
    }
}
