//! The closed set of GPU metrics the engine queries and aggregates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bytes in one gibibyte.
pub const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// A GPU metric series known to the aggregation engine.
///
/// Each variant owns the rule applied to its raw value before it is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetricKind {
    /// Device utilization, 0 to 100.
    DutyCycle,
    /// Device memory in use, in bytes.
    MemoryUsed,
    /// Device memory capacity, in bytes.
    MemoryTotal,
}

impl MetricKind {
    /// Every kind, in query order.
    pub const ALL: [MetricKind; 3] = [
        MetricKind::DutyCycle,
        MetricKind::MemoryUsed,
        MetricKind::MemoryTotal,
    ];

    /// The backend series name of this metric.
    pub fn series_name(&self) -> &'static str {
        match self {
            MetricKind::DutyCycle => "nvidia_gpu_duty_cycle",
            MetricKind::MemoryUsed => "nvidia_gpu_memory_used_bytes",
            MetricKind::MemoryTotal => "nvidia_gpu_memory_total_bytes",
        }
    }

    /// Maps a backend series name back to its kind.
    pub fn from_series_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.series_name() == name)
    }

    /// Series names of every kind.
    pub fn series_names() -> Vec<String> {
        Self::ALL
            .iter()
            .map(|kind| kind.series_name().to_string())
            .collect()
    }

    /// Applies the per-kind value rule.
    ///
    /// Memory capacity is floored to whole GiB; every other kind is stored
    /// as reported.
    pub fn normalize(&self, value: f64) -> f64 {
        match self {
            MetricKind::MemoryTotal => round_down_to_gib(value),
            MetricKind::DutyCycle | MetricKind::MemoryUsed => value,
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.series_name())
    }
}

/// A record holding one value per [`MetricKind`].
///
/// Implementors only route a kind to its field; the stored value always goes
/// through the kind's own rule.
pub trait MetricRecord {
    fn value_mut(&mut self, kind: MetricKind) -> &mut f64;

    /// Stores a raw value under its kind's rule. The latest sample wins.
    fn apply(&mut self, kind: MetricKind, value: f64) {
        *self.value_mut(kind) = kind.normalize(value);
    }
}

/// `trunc(bytes / 2^30) * 2^30`
pub fn round_down_to_gib(bytes: f64) -> f64 {
    (bytes / GIB).trunc() * GIB
}
