//! API Gateway proxy event shapes.
//!
//! These are the wire types the engine consumes and produces:
//!
//! ```text
//! request  = { httpMethod, path, headers, queryStringParameters, body, isBase64Encoded }
//! response = { statusCode, headers, multiValueHeaders, body, isBase64Encoded }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// An incoming proxy request event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRequest {
    /// HTTP method token, e.g. `GET`.
    pub http_method: String,
    /// Request path, e.g. `/orders/42`.
    pub path: String,
    /// Single-value headers. API Gateway sends `null` when there are none.
    #[serde(default, deserialize_with = "nullable_map")]
    pub headers: IndexMap<String, String>,
    /// Single-value query string parameters.
    #[serde(default, deserialize_with = "nullable_map")]
    pub query_string_parameters: IndexMap<String, String>,
    /// Raw body text, base64-encoded when `is_base64_encoded` is set.
    #[serde(default)]
    pub body: Option<String>,
    /// Whether `body` is base64-encoded.
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl ApiRequest {
    /// Creates a request event with no headers, query or body.
    #[must_use]
    pub fn new(http_method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            http_method: http_method.into(),
            path: path.into(),
            ..Self::default()
        }
    }
}

/// An outgoing proxy response event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    /// HTTP status code.
    pub status_code: u16,
    /// Headers with exactly one value.
    #[serde(default)]
    pub headers: IndexMap<String, String>,
    /// Headers with more than one value, such as repeated `Set-Cookie`.
    #[serde(default)]
    pub multi_value_headers: IndexMap<String, Vec<String>>,
    /// Response body, base64-encoded when `is_base64_encoded` is set.
    #[serde(default)]
    pub body: String,
    /// Whether `body` is base64-encoded.
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl ApiResponse {
    /// Looks up a single-value header, ignoring ASCII case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

fn nullable_map<'de, D>(deserializer: D) -> Result<IndexMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<IndexMap<String, String>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_proxy_request() {
        let json = r#"{
            "httpMethod": "POST",
            "path": "/orders",
            "headers": {"Content-Type": "application/json"},
            "queryStringParameters": null,
            "body": "{\"sku\":\"A1\"}",
            "isBase64Encoded": false
        }"#;

        let request: ApiRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.http_method, "POST");
        assert_eq!(request.path, "/orders");
        assert_eq!(request.headers["Content-Type"], "application/json");
        assert!(request.query_string_parameters.is_empty());
        assert_eq!(request.body.as_deref(), Some("{\"sku\":\"A1\"}"));
    }

    #[test]
    fn test_deserialize_minimal_request() {
        let request: ApiRequest =
            serde_json::from_str(r#"{"httpMethod": "GET", "path": "/"}"#).unwrap();
        assert!(request.headers.is_empty());
        assert!(request.body.is_none());
        assert!(!request.is_base64_encoded);
    }

    #[test]
    fn test_serialize_response_camel_case() {
        let response = ApiResponse {
            status_code: 200,
            body: "ok".to_string(),
            ..ApiResponse::default()
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["statusCode"], 200);
        assert_eq!(json["isBase64Encoded"], false);
        assert!(json.get("multiValueHeaders").is_some());
    }

    #[test]
    fn test_response_header_case_insensitive() {
        let mut response = ApiResponse::default();
        response
            .headers
            .insert("content-type".to_string(), "text/plain".to_string());
        assert_eq!(response.header("Content-Type"), Some("text/plain"));
    }
}
