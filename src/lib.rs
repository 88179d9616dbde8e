mod core;
mod telemetry;


pub use crate::core::domain::{
    error::{TelemetryError, TelemetryResult, ValidationError},
    model::{
        backend_descriptor::{BackendDescriptor, BackendSignature, ServiceRef, supported_backends},
        cluster_connection::ClusterConnection,
        device_aggregate::{DeviceAggregate, NodeDeviceSet, NodeMetrics, node_metrics_for},
        instance_metric::{InstanceDeviceMetric, InstanceMetricSet, JobMetricSet},
        metric_kind::{GIB, MetricKind, MetricRecord, round_down_to_gib},
        node_summary::{NodeGpuSummary, idle_devices},
        raw_sample::RawSample,
        telemetry_config::{DEFAULT_QUERY_TIMEOUT, RateLimitConfig, TelemetryConfig},
    },
    value_object::{BackendAddress, LabelSelector, ServicePort},
};
pub use crate::core::infrastructure::{
    cluster_client::ClusterClient,
    config_file::{
        CONFIG_PATH_ENV, ConfigFile, PROMETHEUS_ADDRESS_ENV, PROMETHEUS_ADDRESS_KEY,
        resolve_prometheus_address,
    },
};
pub use crate::telemetry::application::{
    request::query_request::{QueryRequest, QueryScope},
    service::{
        backend_locator::{BackendLocator, ServiceDirectory},
        instance_aggregator::InstanceAggregator,
        node_aggregator::NodeAggregator,
        query_executor::{DirectTransport, ProxiedTransport, QueryExecutor, QueryTransport},
    },
};

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::debug;

/// Node target matching every node.
const ALL_NODES: &str = ".*";

static SHARED_CLIENT: OnceCell<GpuTelemetryClient> = OnceCell::const_new();

/// A client that queries GPU telemetry and aggregates it per pod and per node
///
/// The transport is fixed when the client is built: a configured backend
/// address is queried directly; otherwise, when a cluster connection is
/// available, the backend is discovered and queried through the API server's
/// service proxy; otherwise every query returns empty results.
///
/// # Examples
///
/// ```no_run
/// use gpu_telemetry::{GpuTelemetryClient, TelemetryResult};
///
/// #[tokio::main]
/// async fn main() -> TelemetryResult<()> {
///     let client = GpuTelemetryClient::builder()
///         .prometheus_address("http://prometheus.monitoring:9090")
///         .build()
///         .await?;
///
///     let pods = client.pod_metrics(&["tf-dist-worker-0"]).await?;
///     let nodes = client.all_node_metrics().await?;
///     println!("{} pods, {} nodes", pods.len(), nodes.len());
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct GpuTelemetryClient {
    executor: QueryExecutor,
    locator: Option<BackendLocator>,
    direct_address: Option<BackendAddress>,
    instance_aggregator: InstanceAggregator,
    node_aggregator: NodeAggregator,
}

/// Builder for GpuTelemetryClient configuration
#[derive(Debug, Default)]
pub struct GpuTelemetryClientBuilder {
    prometheus_address: Option<String>,
    cluster: Option<ClusterConnection>,
    config: TelemetryConfig,
    signatures: Option<Vec<BackendSignature>>,
}

impl GpuTelemetryClientBuilder {
    /// Queries this backend directly; discovery is skipped entirely.
    pub fn prometheus_address(mut self, address: impl Into<String>) -> Self {
        self.prometheus_address = Some(address.into());
        self
    }

    /// Enables discovery and proxied queries through this cluster.
    pub fn cluster(mut self, connection: ClusterConnection) -> Self {
        self.cluster = Some(connection);
        self
    }

    pub fn config(mut self, config: TelemetryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        self.config.query_timeout = timeout;
        self
    }

    pub fn rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.config.rate_limit = Some(rate_limit);
        self
    }

    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.config.accept_invalid_certs = accept;
        self
    }

    /// Replaces the built-in backend signatures used for discovery.
    pub fn signatures(mut self, signatures: Vec<BackendSignature>) -> Self {
        self.signatures = Some(signatures);
        self
    }

    pub async fn build(self) -> TelemetryResult<GpuTelemetryClient> {
        self.config.validate()?;

        let direct_address = self
            .prometheus_address
            .as_deref()
            .map(BackendAddress::new)
            .transpose()?;

        let locator = match self.cluster {
            Some(connection) => {
                let cluster = Arc::new(ClusterClient::new(connection, &self.config)?);
                let directory: Arc<dyn ServiceDirectory> = cluster.clone();
                let locator = match self.signatures {
                    Some(signatures) => BackendLocator::with_signatures(directory, signatures),
                    None => BackendLocator::new(directory),
                };
                Some((cluster, locator))
            }
            None => None,
        };

        let transport: Option<Arc<dyn QueryTransport>> = match (&direct_address, &locator) {
            (Some(address), _) => {
                debug!(address = %address, "using direct metrics backend");
                Some(Arc::new(DirectTransport::new(address.clone(), &self.config)?))
            }
            (None, Some((cluster, locator))) => {
                debug!("using metrics backend discovered through the cluster API");
                Some(Arc::new(ProxiedTransport::new(cluster.clone(), locator.clone())))
            }
            (None, None) => {
                debug!("no metrics backend address or cluster connection configured");
                None
            }
        };

        Ok(GpuTelemetryClient {
            executor: QueryExecutor::new(transport),
            locator: locator.map(|(_, locator)| locator),
            direct_address,
            instance_aggregator: InstanceAggregator::new(),
            node_aggregator: NodeAggregator::new(),
        })
    }
}

impl GpuTelemetryClient {
    /// Creates a new builder for GpuTelemetryClient configuration
    pub fn builder() -> GpuTelemetryClientBuilder {
        GpuTelemetryClientBuilder::default()
    }

    /// Builds a client from the process environment.
    ///
    /// The direct address comes from `PROMETHEUS_ADDRESS`, else from the
    /// `prometheus_address` key of the config file; the cluster connection
    /// comes from the in-cluster service account, when present.
    ///
    /// Kubeconfig files are not read. Outside a pod and without a direct
    /// address the client has no transport, so discovery never runs and
    /// every query returns empty results. Callers running outside the cluster
    /// should pass a [`ClusterConnection`] to the builder or set
    /// `PROMETHEUS_ADDRESS`.
    ///
    /// # Errors
    /// Returns an error if the config file is unreadable, the address is
    /// invalid, or the service-account token cannot be read.
    pub async fn from_env() -> TelemetryResult<Self> {
        let config_file = ConfigFile::load_default().await?;
        let address =
            resolve_prometheus_address(std::env::var(PROMETHEUS_ADDRESS_ENV).ok(), &config_file);

        let mut builder = Self::builder();
        if let Some(address) = address {
            builder = builder.prometheus_address(address);
        }
        if let Some(connection) = ClusterConnection::in_cluster().await? {
            builder = builder.cluster(connection);
        }
        builder.build().await
    }

    /// Returns the process-wide client, building it from the environment on
    /// first use.
    ///
    /// Initialization runs at most once even under concurrent callers; later
    /// calls share the same immutable handle. A failed initialization is not
    /// cached, so a later call retries it.
    pub async fn shared() -> TelemetryResult<&'static GpuTelemetryClient> {
        Self::shared_in(&SHARED_CLIENT, Self::from_env).await
    }

    /// Returns the client held by `cell`, running `init` only if the cell is
    /// still empty. Concurrent callers wait for the single running `init`.
    pub(crate) async fn shared_in<F, Fut>(
        cell: &OnceCell<GpuTelemetryClient>,
        init: F,
    ) -> TelemetryResult<&GpuTelemetryClient>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = TelemetryResult<GpuTelemetryClient>>,
    {
        cell.get_or_try_init(init).await
    }

    /// The directly configured backend address, if any.
    pub fn direct_address(&self) -> Option<&BackendAddress> {
        self.direct_address.as_ref()
    }

    /// Runs discovery and returns the backend queries would be proxied to.
    /// Always `None` when a direct address is configured.
    pub async fn locate_backend(&self) -> Option<BackendDescriptor> {
        if self.direct_address.is_some() {
            return None;
        }
        match &self.locator {
            Some(locator) => locator.locate().await,
            None => None,
        }
    }

    /// Whether a metrics backend is configured or can be discovered.
    pub async fn backend_installed(&self) -> bool {
        self.direct_address.is_some() || self.locate_backend().await.is_some()
    }

    /// GPU metrics of the given pods, keyed by pod name then device index.
    ///
    /// Only the requested pods appear in the result. An empty request returns
    /// an empty set without querying.
    ///
    /// # Errors
    /// Transport, decode and result-type failures of an issued query.
    /// An unavailable backend is not an error.
    pub async fn pod_metrics<S: AsRef<str>>(&self, pod_names: &[S]) -> TelemetryResult<JobMetricSet> {
        if pod_names.is_empty() {
            return Ok(JobMetricSet::new());
        }

        let request = QueryRequest::new(QueryScope::Instance, pod_names);
        let samples = self.executor.query(&request).await?;

        let mut job = self.instance_aggregator.aggregate(&samples);
        let requested: HashSet<&str> = pod_names.iter().map(AsRef::as_ref).collect();
        job.retain_instances(|name| requested.contains(name));
        Ok(job)
    }

    /// GPU metrics of the given nodes, keyed by node name then device index.
    ///
    /// Node names are joined into a regular expression, so `.*` selects all.
    pub async fn node_metrics<S: AsRef<str>>(&self, node_names: &[S]) -> TelemetryResult<NodeMetrics> {
        if node_names.is_empty() {
            return Ok(NodeMetrics::new());
        }

        let request = QueryRequest::new(QueryScope::Node, node_names);
        let samples = self.executor.query(&request).await?;
        Ok(self.node_aggregator.aggregate(&samples))
    }

    /// GPU metrics of every node that reports any.
    pub async fn all_node_metrics(&self) -> TelemetryResult<NodeMetrics> {
        self.node_metrics(&[ALL_NODES]).await
    }
}
