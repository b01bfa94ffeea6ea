//! Interaction with the `zpool` management command.
//!
//! This module owns everything between a pool name and a validated map of raw
//! property strings: the closed set of supported query kinds, the fixed
//! command invocations, the streaming executor, and the per-kind line
//! handlers that validate and extract fields from the command's
//! tab-delimited output.
//!
//! # Key Components
//!
//! - [`PoolKind`] — which query (and therefore which output format) applies
//!   to a collection pass.
//! - [`PoolStatus`] — pool health tokens with their stable numeric codes.
//! - [`Client`] — the seam between collection and command execution, with
//!   [`ZpoolClient`] as the real implementation.
//!
//! # Output formats
//!
//! - `zpool get -Hpo name,property,value ...` — three tab-separated fields
//!   per line: pool name, property name, property value.
//! - `zpool iostat -Hyp ...` — seven tab-separated fields per line; fields
//!   3..=6 are read operations, write operations, read bandwidth and write
//!   bandwidth.

mod command;
mod error;
mod handler;

pub use command::{Client, ZpoolClient};
pub use error::ZpoolError;
pub use handler::{LineHandler, PropertyMap};

use std::str::FromStr;

/// Supported `zpool` query kinds.
///
/// Each kind fixes the command invocation, the number of fields per output
/// line, and how fields map to property keys. Matches over this enum are
/// exhaustive, so adding a kind forces the line handler and command table to
/// be extended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolKind {
    /// `zpool get` — pool properties.
    Properties,
    /// `zpool iostat` — logical I/O statistics.
    Iostat,
}

impl std::fmt::Display for PoolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PoolKind::Properties => f.write_str("properties"),
            PoolKind::Iostat => f.write_str("iostats"),
        }
    }
}

/// Pool health states as reported by the `health` property.
///
/// The numeric code assigned to each state is part of the exported metric
/// contract and must never change between versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolStatus {
    Online,
    Degraded,
    Faulted,
    Offline,
    Unavail,
    Removed,
    Suspended,
}

impl PoolStatus {
    /// Returns the stable numeric code for this health state.
    pub fn code(self) -> u8 {
        match self {
            PoolStatus::Online => 0,
            PoolStatus::Degraded => 1,
            PoolStatus::Faulted => 2,
            PoolStatus::Offline => 3,
            PoolStatus::Unavail => 4,
            PoolStatus::Removed => 5,
            PoolStatus::Suspended => 6,
        }
    }

    /// The health token as printed by `zpool`.
    pub fn as_str(self) -> &'static str {
        match self {
            PoolStatus::Online => "ONLINE",
            PoolStatus::Degraded => "DEGRADED",
            PoolStatus::Faulted => "FAULTED",
            PoolStatus::Offline => "OFFLINE",
            PoolStatus::Unavail => "UNAVAIL",
            PoolStatus::Removed => "REMOVED",
            PoolStatus::Suspended => "SUSPENDED",
        }
    }
}

impl std::fmt::Display for PoolStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The token was not a known health state.
#[derive(Debug, thiserror::Error)]
#[error("unknown pool health state: '{0}'")]
pub struct UnknownPoolStatus(pub String);

impl FromStr for PoolStatus {
    type Err = UnknownPoolStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ONLINE" => Ok(PoolStatus::Online),
            "DEGRADED" => Ok(PoolStatus::Degraded),
            "FAULTED" => Ok(PoolStatus::Faulted),
            "OFFLINE" => Ok(PoolStatus::Offline),
            "UNAVAIL" => Ok(PoolStatus::Unavail),
            "REMOVED" => Ok(PoolStatus::Removed),
            "SUSPENDED" => Ok(PoolStatus::Suspended),
            other => Err(UnknownPoolStatus(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_codes_are_stable() {
        let expected = [
            (PoolStatus::Online, 0),
            (PoolStatus::Degraded, 1),
            (PoolStatus::Faulted, 2),
            (PoolStatus::Offline, 3),
            (PoolStatus::Unavail, 4),
            (PoolStatus::Removed, 5),
            (PoolStatus::Suspended, 6),
        ];
        for (status, code) in expected {
            assert_eq!(status.code(), code);
        }
    }

    #[test]
    fn test_status_round_trips_through_token() {
        for status in [
            PoolStatus::Online,
            PoolStatus::Degraded,
            PoolStatus::Faulted,
            PoolStatus::Offline,
            PoolStatus::Unavail,
            PoolStatus::Removed,
            PoolStatus::Suspended,
        ] {
            assert_eq!(status.as_str().parse::<PoolStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_unknown_status_token_is_rejected() {
        assert!("online".parse::<PoolStatus>().is_err());
        assert!("RESILVERING".parse::<PoolStatus>().is_err());
    }
}
