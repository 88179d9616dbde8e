use crate::core::domain::error::ValidationError;
use std::fmt;
use url::Url;

const ALLOWED_SCHEMES: [&str; 2] = ["http", "https"];
const QUERY_PATH: &str = "api/v1/query";

/// A validated base address of a directly reachable metrics backend,
/// e.g. `http://123.123.123.123:9000`.
///
/// The address may carry a path prefix (for backends served behind a
/// reverse proxy); the instant-query path is appended to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendAddress(Url);

impl BackendAddress {
    /// Parses and validates a backend address.
    pub fn new(address: impl AsRef<str>) -> Result<Self, ValidationError> {
        let url = validate_address(address.as_ref())?;
        Ok(Self(url))
    }

    /// Returns the address as a URL.
    pub fn url(&self) -> &Url {
        &self.0
    }

    /// Returns the URL of the instant-query endpoint under this address.
    pub fn query_url(&self) -> Result<Url, ValidationError> {
        let mut base = self.0.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(QUERY_PATH)
            .map_err(|e| ValidationError::Format(format!("Invalid query URL: {}", e)))
    }
}

impl fmt::Display for BackendAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Validates a backend address and returns the parsed URL.
pub(crate) fn validate_address(address: &str) -> Result<Url, ValidationError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(ValidationError::Field {
            field: "address".to_string(),
            message: "Address cannot be empty".to_string(),
        });
    }

    let url = Url::parse(address)
        .map_err(|e| ValidationError::Format(format!("Invalid URL format: {}", e)))?;

    if !ALLOWED_SCHEMES.contains(&url.scheme()) {
        return Err(ValidationError::ConstraintViolation(format!(
            "Invalid scheme. Must be one of: {}",
            ALLOWED_SCHEMES.join(", ")
        )));
    }

    if url.host_str().is_none() {
        return Err(ValidationError::Field {
            field: "address".to_string(),
            message: "Address must contain a host".to_string(),
        });
    }

    Ok(url)
}
