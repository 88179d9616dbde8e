//! Folds samples into per-instance, per-device metrics.

use crate::core::domain::model::{
    instance_metric::JobMetricSet, metric_kind::MetricRecord, raw_sample::RawSample,
};

/// Groups samples by instance name, then device index.
///
/// An instance only ever aggregates its own series, so every kind is a plain
/// overwrite: the last sample for a `(instance, device, metric)` wins.
#[derive(Debug, Default, Clone, Copy)]
pub struct InstanceAggregator;

impl InstanceAggregator {
    pub fn new() -> Self {
        Self
    }

    pub fn aggregate(&self, samples: &[RawSample]) -> JobMetricSet {
        let mut job = JobMetricSet::new();
        for sample in samples.iter().filter(|s| !s.instance_name.is_empty()) {
            job.device_entry(&sample.instance_name, &sample.device_index)
                .apply(sample.metric, sample.value);
        }
        job
    }
}
