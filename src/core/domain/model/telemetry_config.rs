//! Client-wide tuning knobs.

use crate::core::domain::error::ValidationError;
use std::time::Duration;

/// Default bound on a single query round-trip.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Token-bucket limit applied to outgoing requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub requests_per_second: u32,
    pub burst_size: u32,
}

impl RateLimitConfig {
    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        if self.requests_per_second == 0 || self.burst_size == 0 {
            return Err(ValidationError::ConstraintViolation(
                "Rate limit and burst size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings shared by every HTTP client the engine builds.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryConfig {
    /// Upper bound on each request; the call fails once it elapses.
    pub query_timeout: Duration,
    /// Optional limit on outgoing requests. `None` disables limiting.
    pub rate_limit: Option<RateLimitConfig>,
    /// Accept self-signed certificates from a direct backend.
    pub accept_invalid_certs: bool,
}

impl TelemetryConfig {
    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        if self.query_timeout.is_zero() {
            return Err(ValidationError::Field {
                field: "query_timeout".to_string(),
                message: "Query timeout must be greater than 0".to_string(),
            });
        }
        if let Some(rate_limit) = &self.rate_limit {
            rate_limit.validate()?;
        }
        Ok(())
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            rate_limit: None,
            accept_invalid_certs: false,
        }
    }
}
