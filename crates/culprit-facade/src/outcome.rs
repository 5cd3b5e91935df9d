use serde::Serialize;
use serde_json::Value;

/// The one result shape every facade entry point returns. Failures are
/// data, never panics: `error` carries a human-readable message with
/// enough context to retry by hand.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Outcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

impl Outcome {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            error: None,
            data,
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            data: Value::Null,
        }
    }

    /// Failure that still carries partial results (e.g. an aborted
    /// bisection).
    pub fn fail_with(error: impl Into<String>, data: Value) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            data,
        }
    }
}
