//! Executes instant queries over a direct or proxied transport.

use crate::core::domain::{
    error::TelemetryResult,
    model::{metric_kind::MetricKind, raw_sample::RawSample, telemetry_config::TelemetryConfig},
    value_object::BackendAddress,
};
use crate::core::infrastructure::{
    cluster_client::ClusterClient,
    http_client::{HttpClient, HttpClientOptions},
};
use crate::telemetry::application::{
    request::query_request::{QueryRequest, evaluation_time},
    response::query_response::{QueryResponse, VectorEntry},
    service::{backend_locator::BackendLocator, sample_normalizer::SampleNormalizer},
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Carries one instant query to a backend.
///
/// Returns `Ok(None)` when no backend can be reached, which callers treat as
/// "telemetry unavailable" rather than a failure.
#[async_trait]
pub trait QueryTransport: Send + Sync {
    async fn execute(&self, request: &QueryRequest) -> TelemetryResult<Option<Vec<VectorEntry>>>;
}

fn log_warnings(response: &QueryResponse) {
    if !response.warnings.is_empty() {
        debug!(warnings = ?response.warnings, "backend returned warnings");
    }
}

/// Queries a configured backend address over its own HTTP API.
#[derive(Debug, Clone)]
pub struct DirectTransport {
    http: HttpClient,
    address: BackendAddress,
}

impl DirectTransport {
    pub fn new(address: BackendAddress, config: &TelemetryConfig) -> TelemetryResult<Self> {
        let options = HttpClientOptions {
            accept_invalid_certs: config.accept_invalid_certs,
            ..Default::default()
        };
        Ok(Self {
            http: HttpClient::new(config, options)?,
            address,
        })
    }

    pub fn address(&self) -> &BackendAddress {
        &self.address
    }
}

#[async_trait]
impl QueryTransport for DirectTransport {
    async fn execute(&self, request: &QueryRequest) -> TelemetryResult<Option<Vec<VectorEntry>>> {
        let query = request.expression(&MetricKind::series_names());
        debug!(query = %query, address = %self.address, "querying backend directly");

        let mut url = self.address.query_url()?;
        url.query_pairs_mut()
            .append_pair("query", &query)
            .append_pair("time", &evaluation_time());

        let body = self.http.get_bytes(url).await?;
        let response = QueryResponse::from_slice(&body)?;
        log_warnings(&response);
        response.ensure_success()?;
        response.data.into_vector().map(Some)
    }
}

/// Queries a discovered backend through the control-plane service proxy.
///
/// Discovery runs on every call, so a backend installed after the client was
/// built is picked up.
#[derive(Debug, Clone)]
pub struct ProxiedTransport {
    cluster: Arc<ClusterClient>,
    locator: BackendLocator,
}

impl ProxiedTransport {
    pub fn new(cluster: Arc<ClusterClient>, locator: BackendLocator) -> Self {
        Self { cluster, locator }
    }
}

#[async_trait]
impl QueryTransport for ProxiedTransport {
    async fn execute(&self, request: &QueryRequest) -> TelemetryResult<Option<Vec<VectorEntry>>> {
        let Some(backend) = self.locator.locate().await else {
            debug!("metrics backend is not installed, skipping query");
            return Ok(None);
        };

        let query = request.expression(&backend.signature.metric_names);
        debug!(
            query = %query,
            namespace = %backend.service.namespace,
            "querying backend through service proxy"
        );

        let time = evaluation_time();
        let body = self
            .cluster
            .proxy_get(&backend, &[("query", query.as_str()), ("time", time.as_str())])
            .await?;
        let response = QueryResponse::from_slice(&body)?;
        log_warnings(&response);
        response.ensure_success()?;
        response.data.into_vector_lenient().map(Some)
    }
}

/// Runs a query over whichever transport was chosen at construction and
/// normalizes the result. Without a transport every query yields no samples.
#[derive(Clone, Default)]
pub struct QueryExecutor {
    transport: Option<Arc<dyn QueryTransport>>,
    normalizer: SampleNormalizer,
}

impl QueryExecutor {
    pub fn new(transport: Option<Arc<dyn QueryTransport>>) -> Self {
        Self {
            transport,
            normalizer: SampleNormalizer::new(),
        }
    }

    pub fn has_transport(&self) -> bool {
        self.transport.is_some()
    }

    pub async fn query(&self, request: &QueryRequest) -> TelemetryResult<Vec<RawSample>> {
        let Some(transport) = &self.transport else {
            debug!("no metrics backend configured, returning no samples");
            return Ok(Vec::new());
        };

        match transport.execute(request).await? {
            Some(entries) => {
                let samples = self.normalizer.normalize(&entries)?;
                debug!(entries = entries.len(), samples = samples.len(), "normalized query result");
                Ok(samples)
            }
            None => Ok(Vec::new()),
        }
    }
}

impl std::fmt::Debug for QueryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryExecutor")
            .field("has_transport", &self.transport.is_some())
            .finish()
    }
}
