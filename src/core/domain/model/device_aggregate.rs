//! Per-node, per-device GPU metrics.

use crate::core::domain::model::metric_kind::{MetricKind, MetricRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metrics of one physical device on one node.
///
/// `memory_used_bytes` is the sum of every co-resident instance's usage for
/// devices in shared allocation mode, and the latest reported value otherwise.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DeviceAggregate {
    #[serde(rename = "id")]
    pub device_index: String,
    #[serde(rename = "uuid")]
    pub device_uuid: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(rename = "gpuDutyCycle")]
    pub duty_cycle: f64,
    #[serde(rename = "usedGPUMemory")]
    pub memory_used_bytes: f64,
    #[serde(rename = "totalGPUMemory")]
    pub memory_total_bytes: f64,
    /// `"namespace/name"` of every instance that reported on this device,
    /// in arrival order. Repeated samples repeat the entry.
    #[serde(rename = "podNames", default)]
    pub attributed_instances: Vec<String>,
}

impl DeviceAggregate {
    pub fn new(device_index: impl Into<String>, device_uuid: impl Into<String>) -> Self {
        Self {
            device_index: device_index.into(),
            device_uuid: device_uuid.into(),
            ..Default::default()
        }
    }

    /// Whether any of the given `"namespace/name"` instances runs on this device.
    pub fn is_used_by_any<S: AsRef<str>>(&self, instances: &[S]) -> bool {
        self.attributed_instances
            .iter()
            .any(|attributed| instances.iter().any(|i| i.as_ref() == attributed))
    }
}

impl MetricRecord for DeviceAggregate {
    fn value_mut(&mut self, kind: MetricKind) -> &mut f64 {
        match kind {
            MetricKind::DutyCycle => &mut self.duty_cycle,
            MetricKind::MemoryUsed => &mut self.memory_used_bytes,
            MetricKind::MemoryTotal => &mut self.memory_total_bytes,
        }
    }
}

/// Device index to aggregate, for one node.
pub type NodeDeviceSet = BTreeMap<String, DeviceAggregate>;

/// Node name to its device set.
pub type NodeMetrics = BTreeMap<String, NodeDeviceSet>;

/// Returns the device set of one node, or an empty set when the node
/// reported nothing.
pub fn node_metrics_for(metrics: &NodeMetrics, node_name: &str) -> NodeDeviceSet {
    metrics.get(node_name).cloned().unwrap_or_default()
}
