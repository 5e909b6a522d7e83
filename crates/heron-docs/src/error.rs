//! Error types for the documentation crate.

use thiserror::Error;

/// Errors that can occur while synthesizing or rendering a document.
#[derive(Debug, Error)]
pub enum DocsError {
    /// Failed to serialize the document to JSON.
    #[error("Failed to serialize OpenAPI document to JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to serialize the document to YAML.
    #[error("Failed to serialize OpenAPI document to YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// An endpoint cannot be described.
    #[error("Invalid operation '{operation_id}': {reason}")]
    InvalidOperation {
        /// Endpoint identity.
        operation_id: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Result type for documentation operations.
pub type DocsResult<T> = Result<T, DocsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_converts() {
        let err: DocsError = serde_json::from_str::<String>("invalid")
            .unwrap_err()
            .into();
        assert!(matches!(err, DocsError::Json(_)));
        assert!(err.to_string().contains("JSON"));
    }

    #[test]
    fn test_invalid_operation_error() {
        let err = DocsError::InvalidOperation {
            operation_id: "Items::get".to_string(),
            reason: "no HTTP method declared".to_string(),
        };
        assert!(err.to_string().contains("Items::get"));
        assert!(err.to_string().contains("no HTTP method"));
    }
}
