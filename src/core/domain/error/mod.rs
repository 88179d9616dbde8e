use thiserror::Error;

/// The main error type for GPU telemetry operations.
///
/// A backend that cannot be found is not represented here: discovery misses
/// surface as empty results. Only failures that happen after a query was
/// actually issued, plus configuration and validation problems, become errors.
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Network or HTTP failure while talking to the backend or the
    /// control-plane proxy, including timeouts and non-2xx statuses
    ///
    /// # Fields
    /// * `0` - A description of what went wrong on the wire
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response body could not be decoded into the query envelope
    ///
    /// # Fields
    /// * `0` - A description of the decoding failure
    #[error("Decode error: {0}")]
    Decode(String),

    /// The backend answered with a result type other than `vector`
    ///
    /// # Fields
    /// * `0` - The result type the backend reported
    #[error("Unsupported result type '{0}', expected 'vector'")]
    UnsupportedResultType(String),

    /// The backend answered, but reported a non-success status
    #[error("Query rejected with status '{status}': {message}")]
    QueryRejected { status: String, message: String },

    /// Represents problems loading configuration or building clients
    ///
    /// # Fields
    /// * `0` - A description of the configuration problem
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Represents validation failures with detailed context
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Specialized error type for validation failures.
///
/// This enum provides detailed context about why a validation
/// failed, including field-specific errors and format violations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Represents a validation failure for a specific field
    ///
    /// # Fields
    /// * `field` - The name of the field that failed validation
    /// * `message` - A detailed message about why validation failed
    #[error("Field '{field}' validation failed: {message}")]
    Field { field: String, message: String },

    /// Represents format/syntax validation failures
    ///
    /// # Fields
    /// * `0` - Description of the format violation
    #[error("Format error: {0}")]
    Format(String),

    /// Represents violations of domain constraints
    ///
    /// # Fields
    /// * `0` - Description of the constraint violation
    #[error("Domain constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Type alias for Results that may fail with a TelemetryError
pub type TelemetryResult<T> = Result<T, TelemetryError>;
