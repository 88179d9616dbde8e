//! Minimal client for the two control-plane calls the engine needs:
//! listing services by label and proxying a GET to a service.

use crate::core::domain::{
    error::TelemetryResult,
    model::{
        backend_descriptor::{BackendDescriptor, ServiceRef},
        cluster_connection::ClusterConnection,
        telemetry_config::TelemetryConfig,
    },
    value_object::LabelSelector,
};
use crate::core::infrastructure::http_client::{HttpClient, HttpClientOptions};
use crate::telemetry::application::service::backend_locator::ServiceDirectory;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct ServiceList {
    #[serde(default)]
    items: Vec<Service>,
}

#[derive(Debug, Deserialize)]
struct Service {
    metadata: ObjectMeta,
}

#[derive(Debug, Deserialize)]
struct ObjectMeta {
    name: String,
    #[serde(default)]
    namespace: String,
}

/// Authenticated access to the cluster API server.
#[derive(Debug, Clone)]
pub struct ClusterClient {
    http: HttpClient,
    connection: ClusterConnection,
}

impl ClusterClient {
    pub fn new(connection: ClusterConnection, config: &TelemetryConfig) -> TelemetryResult<Self> {
        let options = HttpClientOptions {
            bearer_token: connection.bearer_token().map(str::to_string),
            ca_certificate_pem: connection.ca_certificate_pem().map(<[u8]>::to_vec),
            accept_invalid_certs: connection.accepts_invalid_certs(),
        };
        let http = HttpClient::new(config, options)?;
        Ok(Self { http, connection })
    }

    pub fn connection(&self) -> &ClusterConnection {
        &self.connection
    }

    /// Lists services in all namespaces matching `selector`, in API order.
    pub async fn list_services(&self, selector: &LabelSelector) -> TelemetryResult<Vec<ServiceRef>> {
        let url = self.connection.services_url(selector);
        let list: ServiceList = self.http.get_json(url).await?;
        debug!(selector = %selector, count = list.items.len(), "listed services");
        Ok(list
            .items
            .into_iter()
            .map(|service| ServiceRef {
                namespace: service.metadata.namespace,
                name: service.metadata.name,
            })
            .collect())
    }

    /// Issues a GET through the service-proxy subresource of a discovered
    /// backend and returns the raw body.
    pub async fn proxy_get(
        &self,
        descriptor: &BackendDescriptor,
        params: &[(&str, &str)],
    ) -> TelemetryResult<Vec<u8>> {
        let url = self.connection.proxy_url(descriptor, params);
        self.http.get_bytes(url).await
    }
}

#[async_trait]
impl ServiceDirectory for ClusterClient {
    async fn services_matching(&self, selector: &LabelSelector) -> TelemetryResult<Vec<ServiceRef>> {
        self.list_services(selector).await
    }
}
