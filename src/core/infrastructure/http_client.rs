//! Internal HTTP client shared by the direct backend and the control-plane API.

use crate::core::domain::{
    error::{TelemetryError, TelemetryResult, ValidationError},
    model::telemetry_config::TelemetryConfig,
};
use governor::{DefaultDirectRateLimiter, Quota};
use reqwest::{Certificate, Client, header::ACCEPT};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Options for one underlying HTTP connection pool.
#[derive(Debug, Clone, Default)]
pub struct HttpClientOptions {
    pub bearer_token: Option<String>,
    pub ca_certificate_pem: Option<Vec<u8>>,
    pub accept_invalid_certs: bool,
}

/// Internal HTTP client that issues bounded GET requests.
///
/// Every request carries the configured timeout; a request that exceeds it
/// fails with [`TelemetryError::Transport`]. When a bearer token is set it is
/// sent on every request. No request is ever retried here.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http_client: Client,
    bearer_token: Option<Arc<str>>,
    timeout: Duration,
    rate_limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl HttpClient {
    /// Creates a new `HttpClient`.
    ///
    /// # Errors
    /// Returns `TelemetryError::Configuration` if the HTTP client cannot be built,
    /// and `TelemetryError::Validation` if the configuration is invalid.
    pub fn new(config: &TelemetryConfig, options: HttpClientOptions) -> TelemetryResult<Self> {
        config.validate()?;

        let mut builder = Client::builder()
            .timeout(config.query_timeout)
            .danger_accept_invalid_certs(options.accept_invalid_certs);

        if let Some(pem) = &options.ca_certificate_pem {
            let certificate = Certificate::from_pem(pem).map_err(|e| {
                TelemetryError::Configuration(format!("Invalid CA certificate: {}", e))
            })?;
            builder = builder.add_root_certificate(certificate);
        }

        let http_client = builder
            .build()
            .map_err(|e| TelemetryError::Configuration(e.to_string()))?;

        let rate_limiter = match config.rate_limit {
            Some(rl) => {
                let per_second = non_zero(rl.requests_per_second)?;
                let burst = non_zero(rl.burst_size)?;
                let quota = Quota::per_second(per_second).allow_burst(burst);
                Some(Arc::new(DefaultDirectRateLimiter::direct(quota)))
            }
            None => None,
        };

        Ok(Self {
            http_client,
            bearer_token: options.bearer_token.map(Arc::from),
            timeout: config.query_timeout,
            rate_limiter,
        })
    }

    /// Performs a GET request and returns the raw body.
    ///
    /// # Errors
    /// Returns `TelemetryError::Transport` if the request cannot be sent, times
    /// out, or receives a non-2xx status.
    pub async fn get_bytes(&self, url: Url) -> TelemetryResult<Vec<u8>> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }

        debug!(url = %url, "sending GET request");
        let mut req_builder = self
            .http_client
            .get(url.clone())
            .header(ACCEPT, "application/json");

        if let Some(token) = &self.bearer_token {
            req_builder = req_builder.bearer_auth(token);
        }

        let response = req_builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TelemetryError::Transport(format!(
                    "Request to {} timed out after {:?}",
                    url.path(),
                    self.timeout
                ))
            } else {
                TelemetryError::Transport(format!("HTTP request failed: {}", e))
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            return Err(TelemetryError::Transport(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TelemetryError::Transport(format!("Failed to read response: {}", e)))?;
        Ok(body.to_vec())
    }

    /// Performs a GET request and decodes the JSON body.
    ///
    /// # Errors
    /// Transport failures as for [`HttpClient::get_bytes`]; a body that does not
    /// decode into `T` yields `TelemetryError::Decode`.
    pub async fn get_json<T>(&self, url: Url) -> TelemetryResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let body = self.get_bytes(url).await?;
        serde_json::from_slice(&body)
            .map_err(|e| TelemetryError::Decode(format!("Failed to parse response: {}", e)))
    }
}

fn non_zero(value: u32) -> TelemetryResult<NonZeroU32> {
    NonZeroU32::new(value).ok_or_else(|| {
        ValidationError::ConstraintViolation("Rate limit values must be greater than 0".to_string())
            .into()
    })
}
