//! Error types for Heron.
//!
//! Heron separates failures into two families:
//!
//! | Type | When | Effect |
//! |---|---|---|
//! | [`RegistrationError`] | load, configuration and bind time | aborts application startup |
//! | [`HeronError`] | while dispatching one request | converted into an error response |
//!
//! Request-scoped errors never crash the process. The engine maps each one to a
//! status code via [`HeronError::status_code`] and renders an [`ErrorEnvelope`] body.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`HeronError`].
pub type HeronResult<T> = Result<T, HeronError>;

/// Categories of request-scoped errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Body validation or malformed input.
    Validation,
    /// Missing or rejected credentials.
    Authentication,
    /// Authenticated caller lacks a required role.
    Authorization,
    /// No route matched the request path.
    NotFound,
    /// The path matched but not for this HTTP method.
    MethodNotAllowed,
    /// A business error carrying its own status.
    Http,
    /// Misconfiguration or failure inside the framework or a handler.
    Internal,
}

impl ErrorCategory {
    /// Returns the default HTTP status code for this error category.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::Authentication => StatusCode::UNAUTHORIZED,
            Self::Authorization => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Http | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Request-scoped error raised while dispatching a request.
///
/// # Example
///
/// ```
/// use heron_core::HeronError;
/// use http::StatusCode;
///
/// let err = HeronError::http(StatusCode::CONFLICT, "order already shipped");
/// assert_eq!(err.status_code(), StatusCode::CONFLICT);
/// ```
#[derive(Error, Debug)]
pub enum HeronError {
    /// Body coercion or field validation failed.
    #[error("Validation error: {message}")]
    Validation {
        /// Summary message.
        message: String,
        /// One human-readable message per failed field rule.
        messages: Vec<String>,
    },

    /// No auth filter produced a principal for a request that requires one.
    #[error("Unauthenticated: {message}")]
    Unauthenticated {
        /// Human-readable error message.
        message: String,
        /// Authentication schemes the caller may retry with.
        schemes: Vec<String>,
    },

    /// The principal holds none of the required roles.
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Human-readable error message.
        message: String,
    },

    /// No route matched.
    #[error("Not found: {path}")]
    NotFound {
        /// The request path.
        path: String,
    },

    /// A route matched the path but not the method.
    #[error("Method {method} not allowed for {path}")]
    MethodNotAllowed {
        /// The request method.
        method: String,
        /// The request path.
        path: String,
        /// Methods the path does accept.
        allowed: Vec<String>,
    },

    /// Business error with an explicit status code.
    #[error("{message}")]
    Http {
        /// Status code to respond with.
        status: StatusCode,
        /// Human-readable error message.
        message: String,
    },

    /// The endpoint neither returned a value nor sent the response.
    #[error("Endpoint '{endpoint}' produced no content: it returned nothing and did not send a response")]
    NoContent {
        /// Endpoint identity (`Controller::method`).
        endpoint: String,
    },

    /// The endpoint requires roles but no authorizer is registered.
    #[error("Endpoint '{endpoint}' requires roles but no authorizer is registered")]
    NoAuthorizer {
        /// Endpoint identity (`Controller::method`).
        endpoint: String,
    },

    /// Internal error.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl HeronError {
    /// Creates a validation error from a list of field messages.
    #[must_use]
    pub fn validation(message: impl Into<String>, messages: Vec<String>) -> Self {
        Self::Validation {
            message: message.into(),
            messages,
        }
    }

    /// Creates an unauthenticated error.
    #[must_use]
    pub fn unauthenticated(message: impl Into<String>, schemes: Vec<String>) -> Self {
        Self::Unauthenticated {
            message: message.into(),
            schemes,
        }
    }

    /// Creates a forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Creates a business error with an explicit status.
    #[must_use]
    pub fn http(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Creates a missing-response error for an endpoint.
    #[must_use]
    pub fn no_content(endpoint: impl Into<String>) -> Self {
        Self::NoContent {
            endpoint: endpoint.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::Unauthenticated { .. } => ErrorCategory::Authentication,
            Self::Forbidden { .. } => ErrorCategory::Authorization,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::MethodNotAllowed { .. } => ErrorCategory::MethodNotAllowed,
            Self::Http { .. } => ErrorCategory::Http,
            Self::NoContent { .. } | Self::NoAuthorizer { .. } | Self::Internal { .. } => {
                ErrorCategory::Internal
            }
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Http { status, .. } => *status,
            other => other.category().default_status_code(),
        }
    }

    /// Returns `true` when the error maps to a 5xx status.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Converts this error to a serializable error envelope.
    ///
    /// Internal details are replaced by a generic message for 5xx errors.
    #[must_use]
    pub fn to_envelope(&self, request_id: Option<&str>) -> ErrorEnvelope {
        let message = if matches!(self, Self::Internal { .. }) {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        ErrorEnvelope {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message,
                category: self.category(),
                details: self.error_details(),
            },
            request_id: request_id.map(ToString::to_string),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Unauthenticated { .. } => "UNAUTHENTICATED",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::MethodNotAllowed { .. } => "METHOD_NOT_ALLOWED",
            Self::Http { .. } => "HTTP_ERROR",
            Self::NoContent { .. } => "NO_CONTENT_PRODUCED",
            Self::NoAuthorizer { .. } => "NO_AUTHORIZER",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    fn error_details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Validation { messages, .. } if !messages.is_empty() => {
                Some(serde_json::json!({ "messages": messages }))
            }
            Self::MethodNotAllowed { allowed, .. } => {
                Some(serde_json::json!({ "allowed": allowed }))
            }
            _ => None,
        }
    }
}

/// Fatal error raised while declaring, registering or binding.
///
/// These abort startup and are never produced while serving a request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// The method is not part of the method table of the type registered
    /// under the controller identity.
    #[error("method lookup failure: '{method}' is not a method of controller '{controller}' ({type_name})")]
    MethodLookup {
        /// Controller identity.
        controller: String,
        /// Method name that could not be resolved.
        method: String,
        /// Rust type registered under the identity.
        type_name: &'static str,
    },

    /// A declaration argument was malformed.
    #[error("invalid declaration for '{target}': {reason}")]
    InvalidDeclaration {
        /// What was being declared.
        target: String,
        /// Why the declaration was rejected.
        reason: String,
    },

    /// The endpoint's HTTP method token is not one the binder supports.
    #[error("unsupported HTTP method '{method}' on endpoint '{endpoint}'")]
    UnsupportedMethod {
        /// Endpoint identity.
        endpoint: String,
        /// The offending method token.
        method: String,
    },

    /// An auth filter, authorizer or error interceptor was absent or malformed.
    #[error("invalid {kind}: {reason}")]
    InvalidMiddleware {
        /// Middleware kind (`auth filter`, `authorizer`, `error interceptor`).
        kind: &'static str,
        /// Why the registration was rejected.
        reason: String,
    },
}

impl RegistrationError {
    /// Creates an invalid-declaration error.
    #[must_use]
    pub fn invalid_declaration(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDeclaration {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid-middleware error.
    #[must_use]
    pub fn invalid_middleware(kind: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidMiddleware {
            kind,
            reason: reason.into(),
        }
    }
}

/// Serializable error envelope for HTTP responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error details.
    pub error: ErrorDetail,
    /// The request ID for correlation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Error detail within an envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Error category.
    pub category: ErrorCategory,
    /// Additional error details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let error = HeronError::validation(
            "body failed validation",
            vec!["name must be a string".to_string()],
        );
        assert_eq!(error.category(), ErrorCategory::Validation);
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);

        let envelope = error.to_envelope(Some("req-1"));
        let details = envelope.error.details.unwrap();
        assert_eq!(details["messages"][0], "name must be a string");
    }

    #[test]
    fn test_http_error_keeps_status() {
        let error = HeronError::http(StatusCode::IM_A_TEAPOT, "short and stout");
        assert_eq!(error.status_code(), StatusCode::IM_A_TEAPOT);
        assert_eq!(error.to_string(), "short and stout");
    }

    #[test]
    fn test_no_content_names_endpoint() {
        let error = HeronError::no_content("Orders::get");
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(error.to_string().contains("Orders::get"));
    }

    #[test]
    fn test_no_authorizer_is_server_error() {
        let error = HeronError::NoAuthorizer {
            endpoint: "Orders::delete".to_string(),
        };
        assert!(error.is_server_error());
    }

    #[test]
    fn test_internal_envelope_hides_details() {
        let error = HeronError::internal_with_source(
            "db exploded",
            std::io::Error::new(std::io::ErrorKind::Other, "socket closed"),
        );
        let envelope = error.to_envelope(None);
        assert_eq!(envelope.error.message, "Internal server error");
        assert_eq!(envelope.error.code, "INTERNAL_ERROR");
    }

    #[test]
    fn test_error_envelope_serialization() {
        let error = HeronError::forbidden("missing role admin");
        let envelope = error.to_envelope(Some("req-456"));

        let json = serde_json::to_string(&envelope).expect("serialization should work");
        assert!(json.contains("\"code\":\"FORBIDDEN\""));
        assert!(json.contains("\"request_id\":\"req-456\""));
        assert!(json.contains("\"category\":\"authorization\""));
    }

    #[test]
    fn test_registration_error_display() {
        let error = RegistrationError::MethodLookup {
            controller: "Orders".to_string(),
            method: "ship".to_string(),
            type_name: "app::OrdersController",
        };
        let msg = error.to_string();
        assert!(msg.contains("method lookup failure"));
        assert!(msg.contains("ship"));
    }

    #[test]
    fn test_all_error_categories_have_status_codes() {
        let categories = [
            ErrorCategory::Validation,
            ErrorCategory::Authentication,
            ErrorCategory::Authorization,
            ErrorCategory::NotFound,
            ErrorCategory::MethodNotAllowed,
            ErrorCategory::Http,
            ErrorCategory::Internal,
        ];

        for category in categories {
            let status = category.default_status_code();
            assert!(
                status.is_client_error() || status.is_server_error(),
                "Category {:?} should map to error status code, got {}",
                category,
                status
            );
        }
    }
}
