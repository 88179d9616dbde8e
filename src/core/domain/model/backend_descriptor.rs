//! Known metrics backend signatures and the descriptor of a discovered one.

use crate::core::domain::model::metric_kind::MetricKind;
use crate::core::domain::value_object::{LabelSelector, ServicePort};
use serde::{Deserialize, Serialize};

/// How a metrics backend deployment can be recognised in the cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendSignature {
    /// Human-readable name of the deployment flavour.
    pub name: String,
    /// Selector matching the backend's service.
    pub service_labels: LabelSelector,
    /// Scheme used by the service proxy (`http` or `https`).
    pub protocol: String,
    pub port: ServicePort,
    /// Instant-query path relative to the service root.
    pub path: String,
    /// Series queried from this backend.
    pub metric_names: Vec<String>,
}

impl BackendSignature {
    fn builtin(name: &str, service_labels: &str, port: u16) -> Self {
        Self {
            name: name.to_string(),
            service_labels: LabelSelector::new_unchecked(service_labels),
            protocol: "http".to_string(),
            port: ServicePort::new_unchecked(port),
            path: "api/v1/query".to_string(),
            metric_names: MetricKind::series_names(),
        }
    }
}

/// The built-in signatures, in discovery priority order.
pub fn supported_backends() -> Vec<BackendSignature> {
    vec![
        // managed Prometheus on Alibaba Cloud
        BackendSignature::builtin(
            "arms-prometheus-admin",
            "kubernetes.io/service-name=prometheus-admin",
            9335,
        ),
        BackendSignature::builtin(
            "default",
            "kubernetes.io/service-name=prometheus-server",
            9090,
        ),
        // legacy label
        BackendSignature::builtin("default-old", "kubernetes.io/name=Prometheus", 9090),
    ]
}

/// A service located in the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServiceRef {
    pub namespace: String,
    pub name: String,
}

/// A signature bound to the live service that matched it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendDescriptor {
    pub signature: BackendSignature,
    pub service: ServiceRef,
}

impl BackendDescriptor {
    /// Path of the query endpoint under the control-plane service proxy.
    pub fn proxy_path(&self) -> String {
        format!(
            "/api/v1/namespaces/{}/services/{}:{}:{}/proxy/{}",
            self.service.namespace,
            self.signature.protocol,
            self.service.name,
            self.signature.port,
            self.signature.path.trim_start_matches('/')
        )
    }
}
