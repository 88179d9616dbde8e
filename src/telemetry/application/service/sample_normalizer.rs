//! Turns vector result entries into [`RawSample`]s.

use crate::core::domain::{
    error::{TelemetryError, TelemetryResult},
    model::{metric_kind::MetricKind, raw_sample::RawSample},
};
use crate::telemetry::application::response::query_response::VectorEntry;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LabelField {
    Metric,
    Namespace,
    Instance,
    Node,
    Container,
    DeviceUuid,
    DeviceIndex,
    AllocationMode,
}

/// Known label keys. Where two keys feed one field, the earlier one wins.
const LABEL_TABLE: &[(&str, LabelField)] = &[
    ("__name__", LabelField::Metric),
    ("namespace_name", LabelField::Namespace),
    ("namespace", LabelField::Namespace),
    ("pod_name", LabelField::Instance),
    ("pod", LabelField::Instance),
    ("node_name", LabelField::Node),
    ("node", LabelField::Node),
    ("container_name", LabelField::Container),
    ("container", LabelField::Container),
    ("uuid", LabelField::DeviceUuid),
    ("minor_number", LabelField::DeviceIndex),
    ("allocate_mode", LabelField::AllocationMode),
];

#[derive(Debug, Default)]
struct Labels {
    metric: String,
    namespace: String,
    instance: String,
    node: String,
    container: String,
    device_uuid: String,
    device_index: String,
    allocation_mode: String,
}

impl Labels {
    fn from_map(map: &HashMap<String, String>) -> Self {
        let mut labels = Self::default();
        for (key, field) in LABEL_TABLE {
            let Some(value) = map.get(*key) else {
                continue;
            };
            let slot = labels.slot(*field);
            if slot.is_empty() {
                slot.clone_from(value);
            }
        }
        labels
    }

    fn slot(&mut self, field: LabelField) -> &mut String {
        match field {
            LabelField::Metric => &mut self.metric,
            LabelField::Namespace => &mut self.namespace,
            LabelField::Instance => &mut self.instance,
            LabelField::Node => &mut self.node,
            LabelField::Container => &mut self.container,
            LabelField::DeviceUuid => &mut self.device_uuid,
            LabelField::DeviceIndex => &mut self.device_index,
            LabelField::AllocationMode => &mut self.allocation_mode,
        }
    }
}

/// Maps backend label sets onto the fixed sample schema.
///
/// Unknown labels are ignored. A series whose value does not parse as a
/// float, or whose name is not a known metric, is dropped without error. A
/// `value` that is not a `[timestamp, value]` pair fails the whole call.
#[derive(Debug, Default, Clone, Copy)]
pub struct SampleNormalizer;

impl SampleNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, entries: &[VectorEntry]) -> TelemetryResult<Vec<RawSample>> {
        let mut samples = Vec::with_capacity(entries.len());
        for entry in entries {
            if let Some(sample) = self.normalize_entry(entry)? {
                samples.push(sample);
            }
        }
        Ok(samples)
    }

    fn normalize_entry(&self, entry: &VectorEntry) -> TelemetryResult<Option<RawSample>> {
        let [timestamp, raw_value] = entry.value.as_slice() else {
            return Err(TelemetryError::Decode(format!(
                "Sample value must be a [timestamp, value] pair, got {} elements",
                entry.value.len()
            )));
        };
        let timestamp = timestamp.as_f64().ok_or_else(|| {
            TelemetryError::Decode(format!("Sample timestamp is not a number: {}", timestamp))
        })?;

        let labels = Labels::from_map(&entry.metric);

        let Some(value) = raw_value.as_str().and_then(|v| v.trim().parse::<f64>().ok()) else {
            debug!(metric = %labels.metric, value = %raw_value, "dropping sample with unparseable value");
            return Ok(None);
        };

        let Some(metric) = MetricKind::from_series_name(&labels.metric) else {
            debug!(metric = %labels.metric, "dropping sample of unknown metric");
            return Ok(None);
        };

        Ok(Some(RawSample {
            metric,
            value,
            timestamp,
            instance_namespace: labels.namespace,
            instance_name: labels.instance,
            container_name: labels.container,
            node_name: labels.node,
            device_uuid: labels.device_uuid,
            device_index: labels.device_index,
            allocation_mode: labels.allocation_mode,
        }))
    }
}
