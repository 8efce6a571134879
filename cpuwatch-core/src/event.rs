//! Event shapes emitted onto the output channel
//!
//! These two shapes are the wire contract with the downstream rule
//! engine and are reproduced field for field: sample events carry
//! `cpu`/`threshold`/`crossed` and no `error`/`severity`; error events
//! carry `error`/`severity` and no CPU fields. Both carry `timestamp`,
//! `host`, and `source`.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::sampler::CpuReading;

/// Source identifier stamped on every event
pub const SOURCE_NAME: &str = "aix_cpu_watch";

/// Severity tag stamped on error events
pub const ERROR_SEVERITY: &str = "error";

/// CPU metrics block of a sample event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CpuMetrics {
    /// Computed usage percent (`us + sy + wa`), rounded to two decimals
    pub percent: f64,
    /// User CPU percent
    pub us: f64,
    /// System CPU percent
    pub sy: f64,
    /// Idle CPU percent
    pub id: f64,
    /// IO wait percent
    pub wa: f64,
}

/// One event on the output channel
///
/// Events are immutable and have no identity beyond their fields;
/// consumers must not assume uniqueness. Serialization is untagged so
/// the JSON matches the wire layout exactly, with no variant wrapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WatchEvent {
    /// A successful CPU sample
    Sample {
        /// Event creation time, ISO 8601 UTC
        timestamp: String,
        /// Host the sample came from
        host: String,
        /// Parsed CPU metrics
        cpu: CpuMetrics,
        /// Threshold the sample was evaluated against
        threshold: f64,
        /// Whether `cpu.percent` reached the threshold
        crossed: bool,
        /// Always [`SOURCE_NAME`]
        source: String,
    },
    /// A per-host polling failure
    Error {
        /// Event creation time, ISO 8601 UTC
        timestamp: String,
        /// Host the failure occurred on
        host: String,
        /// Human-readable failure description
        error: String,
        /// Always [`SOURCE_NAME`]
        source: String,
        /// Always [`ERROR_SEVERITY`]
        severity: String,
    },
}

impl WatchEvent {
    /// Builds a sample event, timestamped now.
    #[must_use]
    pub fn sample(host: &str, reading: CpuReading, threshold: f64, crossed: bool) -> Self {
        Self::Sample {
            timestamp: now_iso8601(),
            host: host.to_string(),
            cpu: CpuMetrics {
                percent: round2(reading.usage()),
                us: reading.us,
                sy: reading.sy,
                id: reading.id,
                wa: reading.wa,
            },
            threshold,
            crossed,
            source: SOURCE_NAME.to_string(),
        }
    }

    /// Builds an error event, timestamped now.
    #[must_use]
    pub fn error(host: &str, message: &str) -> Self {
        Self::Error {
            timestamp: now_iso8601(),
            host: host.to_string(),
            error: message.to_string(),
            source: SOURCE_NAME.to_string(),
            severity: ERROR_SEVERITY.to_string(),
        }
    }

    /// The host this event refers to
    #[must_use]
    pub fn host(&self) -> &str {
        match self {
            Self::Sample { host, .. } | Self::Error { host, .. } => host,
        }
    }

    /// True for the error variant
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// Current instant as an ISO 8601 UTC string
fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Rounds to two decimal places
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
