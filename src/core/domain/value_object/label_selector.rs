use crate::core::domain::error::ValidationError;
use std::fmt;

const MAX_SELECTOR_LENGTH: usize = 1024;

/// A validated equality-based Kubernetes label selector,
/// e.g. `kubernetes.io/service-name=prometheus-server`.
///
/// Only the `key=value[,key=value]` form is accepted; set-based
/// expressions are never needed for backend discovery.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabelSelector(String);

impl LabelSelector {
    /// Creates a new selector with validation.
    pub fn new(selector: impl Into<String>) -> Result<Self, ValidationError> {
        let selector = selector.into();
        validate_label_selector(&selector)?;
        Ok(Self(selector))
    }

    /// Creates a new selector without validation.
    pub(crate) fn new_unchecked(selector: impl Into<String>) -> Self {
        Self(selector.into())
    }

    /// Returns the selector as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validates an equality-based label selector.
pub(crate) fn validate_label_selector(selector: &str) -> Result<(), ValidationError> {
    if selector.trim().is_empty() {
        return Err(ValidationError::Field {
            field: "label_selector".to_string(),
            message: "Label selector cannot be empty".to_string(),
        });
    }

    if selector.len() > MAX_SELECTOR_LENGTH {
        return Err(ValidationError::Format(format!(
            "Label selector exceeds maximum length of {} characters",
            MAX_SELECTOR_LENGTH
        )));
    }

    for requirement in selector.split(',') {
        let (key, value) = requirement.split_once('=').ok_or_else(|| {
            ValidationError::Format(format!(
                "Requirement '{}' must have the form key=value",
                requirement
            ))
        })?;

        let key = key.trim();
        if key.is_empty() {
            return Err(ValidationError::Format(format!(
                "Requirement '{}' has an empty key",
                requirement
            )));
        }

        let valid_chars = |s: &str| {
            s.chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/'))
        };
        if !valid_chars(key) || !valid_chars(value.trim()) {
            return Err(ValidationError::ConstraintViolation(format!(
                "Requirement '{}' contains characters not allowed in labels",
                requirement
            )));
        }
    }

    Ok(())
}
