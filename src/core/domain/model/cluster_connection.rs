use crate::core::domain::{
    error::{TelemetryError, TelemetryResult},
    model::backend_descriptor::BackendDescriptor,
    value_object::{BackendAddress, LabelSelector},
};
use std::path::Path;
use url::Url;

/// Directory where Kubernetes mounts the pod's service-account credentials.
pub const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

/// Connection details for the cluster control-plane API.
#[derive(Debug, Clone)]
pub struct ClusterConnection {
    api_server: Url,
    bearer_token: Option<String>,
    ca_certificate_pem: Option<Vec<u8>>,
    accept_invalid_certs: bool,
}

impl ClusterConnection {
    /// Creates a connection to the given API server address.
    pub fn new(api_server: impl AsRef<str>) -> TelemetryResult<Self> {
        let address = BackendAddress::new(api_server)?;
        Ok(Self {
            api_server: address.url().clone(),
            bearer_token: None,
            ca_certificate_pem: None,
            accept_invalid_certs: false,
        })
    }

    /// Builds a connection from the in-cluster environment, or `None` when
    /// not running inside a pod.
    pub async fn in_cluster() -> TelemetryResult<Option<Self>> {
        Self::in_cluster_from(
            std::env::var("KUBERNETES_SERVICE_HOST").ok(),
            std::env::var("KUBERNETES_SERVICE_PORT").ok(),
            Path::new(SERVICE_ACCOUNT_DIR),
        )
        .await
    }

    pub(crate) async fn in_cluster_from(
        host: Option<String>,
        port: Option<String>,
        service_account_dir: &Path,
    ) -> TelemetryResult<Option<Self>> {
        let Some(host) = host.filter(|h| !h.is_empty()) else {
            return Ok(None);
        };
        let port = port.unwrap_or_else(|| "443".to_string());
        let host = if host.contains(':') {
            format!("[{}]", host)
        } else {
            host
        };

        let token_path = service_account_dir.join("token");
        let token = tokio::fs::read_to_string(&token_path).await.map_err(|e| {
            TelemetryError::Configuration(format!(
                "Failed to read service account token {}: {}",
                token_path.display(),
                e
            ))
        })?;

        let ca_certificate_pem = tokio::fs::read(service_account_dir.join("ca.crt")).await.ok();

        let mut connection = Self::new(format!("https://{}:{}", host, port))?;
        connection.bearer_token = Some(token.trim().to_string());
        connection.ca_certificate_pem = ca_certificate_pem;
        Ok(Some(connection))
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Trusts the given PEM-encoded certificate authority in addition to the
    /// system roots.
    pub fn with_ca_certificate(mut self, pem: impl Into<Vec<u8>>) -> Self {
        self.ca_certificate_pem = Some(pem.into());
        self
    }

    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    pub fn api_server(&self) -> &Url {
        &self.api_server
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer_token.as_deref()
    }

    pub fn ca_certificate_pem(&self) -> Option<&[u8]> {
        self.ca_certificate_pem.as_deref()
    }

    pub fn accepts_invalid_certs(&self) -> bool {
        self.accept_invalid_certs
    }

    /// `path` under the API server, keeping any prefix the server URL carries
    /// (e.g. a cluster reached through a management proxy).
    fn api_url(&self, path: &str) -> Url {
        let mut url = self.api_server.clone();
        let prefix = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{}/{}", prefix, path.trim_start_matches('/')));
        url
    }

    /// Cluster-wide service listing filtered by a label selector.
    pub fn services_url(&self, selector: &LabelSelector) -> Url {
        let mut url = self.api_url("api/v1/services");
        url.query_pairs_mut()
            .clear()
            .append_pair("labelSelector", selector.as_str());
        url
    }

    /// Query endpoint of a discovered backend, reached through the service proxy.
    pub fn proxy_url(&self, descriptor: &BackendDescriptor, params: &[(&str, &str)]) -> Url {
        let mut url = self.api_url(&descriptor.proxy_path());
        {
            let mut pairs = url.query_pairs_mut();
            pairs.clear();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        url
    }
}
