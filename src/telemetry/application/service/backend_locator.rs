//! Finds a running metrics backend among the known signatures.

use crate::core::domain::{
    error::TelemetryResult,
    model::backend_descriptor::{BackendDescriptor, BackendSignature, ServiceRef, supported_backends},
    value_object::LabelSelector,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// A cluster-wide service listing filterable by label selector.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ServiceDirectory: Send + Sync {
    async fn services_matching(&self, selector: &LabelSelector) -> TelemetryResult<Vec<ServiceRef>>;
}

/// Tries each signature in priority order and binds the first one whose
/// selector matches a live service.
#[derive(Clone)]
pub struct BackendLocator {
    signatures: Vec<BackendSignature>,
    directory: Arc<dyn ServiceDirectory>,
}

impl BackendLocator {
    /// Creates a locator over the built-in signatures.
    pub fn new(directory: Arc<dyn ServiceDirectory>) -> Self {
        Self::with_signatures(directory, supported_backends())
    }

    pub fn with_signatures(
        directory: Arc<dyn ServiceDirectory>,
        signatures: Vec<BackendSignature>,
    ) -> Self {
        Self {
            signatures,
            directory,
        }
    }

    pub fn signatures(&self) -> &[BackendSignature] {
        &self.signatures
    }

    /// Returns the first matching backend, or `None` when telemetry is
    /// unavailable. Listing failures count as "no match" for that signature.
    pub async fn locate(&self) -> Option<BackendDescriptor> {
        for signature in &self.signatures {
            let services = match self
                .directory
                .services_matching(&signature.service_labels)
                .await
            {
                Ok(services) => services,
                Err(e) => {
                    warn!(backend = %signature.name, error = %e, "failed to list backend services");
                    continue;
                }
            };

            let Some(service) = services.into_iter().next() else {
                debug!(selector = %signature.service_labels, "no services carry labels");
                continue;
            };

            debug!(
                backend = %signature.name,
                namespace = %service.namespace,
                service = %service.name,
                "located metrics backend"
            );
            return Some(BackendDescriptor {
                signature: signature.clone(),
                service,
            });
        }
        debug!("no metrics backend installed");
        None
    }
}

impl std::fmt::Debug for BackendLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendLocator")
            .field("signatures", &self.signatures)
            .finish_non_exhaustive()
    }
}
