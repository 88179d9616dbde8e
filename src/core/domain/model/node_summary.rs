//! Node-level rollups over a [`NodeDeviceSet`].

use crate::core::domain::model::device_aggregate::NodeDeviceSet;
use serde::{Deserialize, Serialize};

/// Totals of one node's devices, as consumed by node reporters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeGpuSummary {
    pub device_count: usize,
    pub total_memory_bytes: f64,
    pub used_memory_bytes: f64,
    /// Mean duty cycle across the node's devices; 0 without devices.
    pub duty_cycle: f64,
}

impl NodeGpuSummary {
    pub fn from_devices(devices: &NodeDeviceSet) -> Self {
        let device_count = devices.len();
        if device_count == 0 {
            return Self::default();
        }

        let (total, used, duty) = devices.values().fold((0.0, 0.0, 0.0), |acc, d| {
            (
                acc.0 + d.memory_total_bytes,
                acc.1 + d.memory_used_bytes,
                acc.2 + d.duty_cycle,
            )
        });

        Self {
            device_count,
            total_memory_bytes: total,
            used_memory_bytes: used,
            duty_cycle: duty / device_count as f64,
        }
    }
}

/// Device indices on which none of `active_instances` (`"namespace/name"`)
/// is attributed.
pub fn idle_devices<S: AsRef<str>>(devices: &NodeDeviceSet, active_instances: &[S]) -> Vec<String> {
    devices
        .values()
        .filter(|device| !device.is_used_by_any(active_instances))
        .map(|device| device.device_index.clone())
        .collect()
}
