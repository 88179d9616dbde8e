//! Per-instance (pod) GPU metrics.

use crate::core::domain::model::metric_kind::{MetricKind, MetricRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metrics of one device as seen by one workload instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct InstanceDeviceMetric {
    /// Utilization, 0 to 100.
    #[serde(rename = "gpuDutyCycle")]
    pub duty_cycle: f64,
    #[serde(rename = "usedGPUMemory")]
    pub memory_used_bytes: f64,
    #[serde(rename = "totalGPUMemory")]
    pub memory_total_bytes: f64,
}

impl MetricRecord for InstanceDeviceMetric {
    fn value_mut(&mut self, kind: MetricKind) -> &mut f64 {
        match kind {
            MetricKind::DutyCycle => &mut self.duty_cycle,
            MetricKind::MemoryUsed => &mut self.memory_used_bytes,
            MetricKind::MemoryTotal => &mut self.memory_total_bytes,
        }
    }
}

/// Device index to metric, for one instance.
pub type InstanceMetricSet = BTreeMap<String, InstanceDeviceMetric>;

/// Instance name to its device metrics, rebuilt on every query.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct JobMetricSet(BTreeMap<String, InstanceMetricSet>);

impl JobMetricSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the device metrics of one instance, if it reported any.
    pub fn instance_metrics(&self, instance_name: &str) -> Option<&InstanceMetricSet> {
        self.0.get(instance_name)
    }

    /// Returns (creating if needed) the metric of one instance's device.
    pub fn device_entry(
        &mut self,
        instance_name: &str,
        device_index: &str,
    ) -> &mut InstanceDeviceMetric {
        self.0
            .entry(instance_name.to_string())
            .or_default()
            .entry(device_index.to_string())
            .or_default()
    }

    /// Drops every instance the predicate rejects.
    pub fn retain_instances<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.0.retain(|name, _| keep(name));
    }

    pub fn instance_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &InstanceMetricSet)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for JobMetricSet {
    type Item = (String, InstanceMetricSet);
    type IntoIter = std::collections::btree_map::IntoIter<String, InstanceMetricSet>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
