pub mod backend_descriptor;
pub mod cluster_connection;
pub mod device_aggregate;
pub mod instance_metric;
pub mod metric_kind;
pub mod node_summary;
pub mod raw_sample;
pub mod telemetry_config;
