//! A single normalized observation from the metrics backend.

use crate::core::domain::model::metric_kind::MetricKind;
use serde::{Deserialize, Serialize};

/// Allocation mode whose memory-used series must be summed per device.
pub const SHARE_ALLOCATION_MODE: &str = "share";

/// One observation from the backend, with labels mapped to fixed fields.
///
/// Device identity is the pair `(node_name, device_index)`: device indices
/// are only unique within one node.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawSample {
    pub metric: MetricKind,
    pub value: f64,
    /// Unix timestamp in seconds.
    pub timestamp: f64,
    #[serde(default)]
    pub instance_namespace: String,
    #[serde(default)]
    pub instance_name: String,
    #[serde(default)]
    pub container_name: String,
    #[serde(default)]
    pub node_name: String,
    #[serde(default)]
    pub device_uuid: String,
    #[serde(default)]
    pub device_index: String,
    #[serde(default)]
    pub allocation_mode: String,
}

impl RawSample {
    /// Creates a sample with every label empty.
    pub fn new(metric: MetricKind, value: f64) -> Self {
        Self {
            metric,
            value,
            timestamp: 0.0,
            instance_namespace: String::new(),
            instance_name: String::new(),
            container_name: String::new(),
            node_name: String::new(),
            device_uuid: String::new(),
            device_index: String::new(),
            allocation_mode: String::new(),
        }
    }

    /// Whether this sample was reported under the shared-GPU allocation mode.
    pub fn is_shared(&self) -> bool {
        self.allocation_mode == SHARE_ALLOCATION_MODE
    }

    /// `"<namespace>/<name>"`, or `None` without an instance name.
    pub fn instance_key(&self) -> Option<String> {
        if self.instance_name.is_empty() {
            return None;
        }
        Some(format!("{}/{}", self.instance_namespace, self.instance_name))
    }
}
