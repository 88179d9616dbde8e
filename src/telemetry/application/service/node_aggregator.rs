//! Folds samples into per-node, per-device aggregates.

use crate::core::domain::model::{
    device_aggregate::{DeviceAggregate, NodeMetrics},
    metric_kind::{MetricKind, MetricRecord},
    raw_sample::RawSample,
};
use std::collections::HashMap;

/// Groups samples by `(node, device index)`.
///
/// Memory-used series reported under the `share` allocation mode come from
/// several instances slicing one physical memory pool, each reporting only
/// its own allocation, so they are summed per device once every sample is
/// seen. Exclusive devices report their total usage authoritatively and are
/// overwritten, so a repeated sample is never double-counted.
#[derive(Debug, Default, Clone, Copy)]
pub struct NodeAggregator;

impl NodeAggregator {
    pub fn new() -> Self {
        Self
    }

    pub fn aggregate(&self, samples: &[RawSample]) -> NodeMetrics {
        let mut nodes = NodeMetrics::new();
        let mut shared_usage: HashMap<(&str, &str), Vec<f64>> = HashMap::new();

        for sample in samples
            .iter()
            .filter(|s| !s.node_name.is_empty() && !s.device_index.is_empty())
        {
            let device = nodes
                .entry(sample.node_name.clone())
                .or_default()
                .entry(sample.device_index.clone())
                .or_insert_with(|| DeviceAggregate::new(&sample.device_index, &sample.device_uuid));

            match sample.metric {
                MetricKind::MemoryUsed if sample.is_shared() => {
                    shared_usage
                        .entry((&sample.node_name, &sample.device_index))
                        .or_default()
                        .push(sample.value);
                }
                kind => device.apply(kind, sample.value),
            }

            if let Some(instance) = sample.instance_key() {
                device.attributed_instances.push(instance);
            }
        }

        for ((node, index), contributions) in shared_usage {
            if let Some(device) = nodes.get_mut(node).and_then(|d| d.get_mut(index)) {
                device.memory_used_bytes = contributions.iter().sum();
            }
        }

        nodes
    }
}
