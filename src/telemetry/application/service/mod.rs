pub mod backend_locator;
pub mod instance_aggregator;
pub mod node_aggregator;
pub mod query_executor;
pub mod sample_normalizer;
