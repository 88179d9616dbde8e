use crate::core::domain::error::{TelemetryError, TelemetryResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Status reported by a successful query.
pub const SUCCESS_STATUS: &str = "success";
/// The only result type the engine aggregates.
pub const VECTOR_RESULT_TYPE: &str = "vector";

/// The `{status, data}` envelope returned by the instant-query endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub status: String,
    #[serde(default)]
    pub data: QueryData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Result payload. `result` is kept untyped until the result type is known,
/// since scalar and string results are not arrays of series.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryData {
    #[serde(default)]
    pub result_type: String,
    #[serde(default)]
    pub result: serde_json::Value,
}

/// One series of a vector result: its labels and a `[timestamp, "value"]` pair.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VectorEntry {
    #[serde(default)]
    pub metric: HashMap<String, String>,
    #[serde(default)]
    pub value: Vec<serde_json::Value>,
}

impl QueryResponse {
    /// Decodes an envelope from raw bytes.
    pub fn from_slice(body: &[u8]) -> TelemetryResult<Self> {
        serde_json::from_slice(body)
            .map_err(|e| TelemetryError::Decode(format!("Failed to parse query response: {}", e)))
    }

    /// Fails with `QueryRejected` unless the status is `success`.
    pub fn ensure_success(&self) -> TelemetryResult<()> {
        if self.status == SUCCESS_STATUS {
            return Ok(());
        }
        let message = match (&self.error_type, &self.error) {
            (Some(kind), Some(error)) => format!("{}: {}", kind, error),
            (None, Some(error)) => error.clone(),
            (Some(kind), None) => kind.clone(),
            (None, None) => "no error detail".to_string(),
        };
        Err(TelemetryError::QueryRejected {
            status: self.status.clone(),
            message,
        })
    }
}

impl QueryData {
    /// Decodes the result as a vector, requiring the `vector` result type.
    pub fn into_vector(self) -> TelemetryResult<Vec<VectorEntry>> {
        if self.result_type != VECTOR_RESULT_TYPE {
            return Err(TelemetryError::UnsupportedResultType(self.result_type));
        }
        self.decode_entries()
    }

    /// Decodes the result as a vector, accepting an absent result type.
    pub fn into_vector_lenient(self) -> TelemetryResult<Vec<VectorEntry>> {
        if !self.result_type.is_empty() && self.result_type != VECTOR_RESULT_TYPE {
            return Err(TelemetryError::UnsupportedResultType(self.result_type));
        }
        self.decode_entries()
    }

    fn decode_entries(self) -> TelemetryResult<Vec<VectorEntry>> {
        if self.result.is_null() {
            return Ok(Vec::new());
        }
        serde_json::from_value(self.result)
            .map_err(|e| TelemetryError::Decode(format!("Failed to parse vector result: {}", e)))
    }
}
