//! The request abstraction handed to extractors, auth filters and interceptors.

use std::borrow::Cow;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use heron_router::Params;
use http::header::{HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, Method};
use indexmap::IndexMap;

use crate::error::HeronError;
use crate::event::ApiRequest;
use crate::principal::Credentials;

/// An incoming request after routing.
///
/// Immutable once built; the pipeline shares it behind an `Arc`.
///
/// # Example
///
/// ```rust
/// use heron_core::Request;
/// use http::Method;
///
/// let request = Request::builder()
///     .method(Method::GET)
///     .path("/items/42")
///     .path_param("id", "42")
///     .query("expand", "true")
///     .build();
///
/// assert_eq!(request.path_param("id"), Some("42"));
/// assert_eq!(request.query("expand"), Some("true"));
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    headers: HeaderMap,
    query: IndexMap<String, String>,
    path_params: Params,
    body: Option<String>,
    is_base64_encoded: bool,
    request_id: Option<String>,
}

impl Request {
    /// Creates a new request builder.
    #[must_use]
    pub fn builder() -> RequestBuilder {
        RequestBuilder::new()
    }

    /// Builds a request from a proxy event and the parameters captured by routing.
    ///
    /// Headers whose name or value is not valid HTTP are dropped.
    pub fn from_event(event: &ApiRequest, path_params: Params) -> Result<Self, HeronError> {
        let method = Method::from_bytes(event.http_method.to_ascii_uppercase().as_bytes())
            .map_err(|_| {
                HeronError::http(
                    http::StatusCode::BAD_REQUEST,
                    format!("invalid HTTP method '{}'", event.http_method),
                )
            })?;

        let mut headers = HeaderMap::with_capacity(event.headers.len());
        for (name, value) in &event.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => tracing::debug!(header = %name, "dropping malformed request header"),
            }
        }

        Ok(Self {
            method,
            path: event.path.clone(),
            headers,
            query: event.query_string_parameters.clone(),
            path_params,
            body: event.body.clone(),
            is_base64_encoded: event.is_base64_encoded,
            request_id: None,
        })
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value by name, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the query string parameters.
    #[must_use]
    pub fn query_params(&self) -> &IndexMap<String, String> {
        &self.query
    }

    /// Returns a query parameter by name.
    #[must_use]
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Returns the path parameters captured by routing.
    #[must_use]
    pub fn path_params(&self) -> &Params {
        &self.path_params
    }

    /// Returns a path parameter by name.
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name)
    }

    /// Returns the body exactly as received.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Returns whether the body is base64-encoded.
    #[must_use]
    pub fn is_base64_encoded(&self) -> bool {
        self.is_base64_encoded
    }

    /// Returns the correlation id assigned by the engine, if any.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Returns the `Content-Type` header.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    /// Returns `true` when the content type is `application/json` or a `+json` type.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.content_type().is_some_and(is_json_media_type)
    }

    /// Returns the body bytes, decoding base64 when the request says so.
    ///
    /// A missing body yields an empty buffer.
    pub fn raw_body(&self) -> Result<Bytes, HeronError> {
        let Some(body) = self.body.as_deref() else {
            return Ok(Bytes::new());
        };
        if self.is_base64_encoded {
            STANDARD
                .decode(body)
                .map(Bytes::from)
                .map_err(|e| HeronError::validation("request body is not valid base64", vec![e.to_string()]))
        } else {
            Ok(Bytes::copy_from_slice(body.as_bytes()))
        }
    }

    /// Returns the body as text, decoding base64 when needed.
    pub fn body_text(&self) -> Result<Option<Cow<'_, str>>, HeronError> {
        match self.body.as_deref() {
            None => Ok(None),
            Some(body) if !self.is_base64_encoded => Ok(Some(Cow::Borrowed(body))),
            Some(_) => {
                let bytes = self.raw_body()?;
                String::from_utf8(bytes.to_vec())
                    .map(|s| Some(Cow::Owned(s)))
                    .map_err(|e| HeronError::validation("request body is not valid UTF-8", vec![e.to_string()]))
            }
        }
    }

    /// Returns the parsed body.
    ///
    /// JSON-typed bodies are parsed; anything else comes back as a JSON string.
    /// Returns `None` when the request has no body.
    pub fn parsed_body(&self) -> Result<Option<serde_json::Value>, HeronError> {
        let Some(text) = self.body_text()? else {
            return Ok(None);
        };
        if self.is_json() {
            if text.trim().is_empty() {
                return Ok(None);
            }
            serde_json::from_str(&text).map(Some).map_err(|e| {
                HeronError::validation("request body is not valid JSON", vec![e.to_string()])
            })
        } else {
            Ok(Some(serde_json::Value::String(text.into_owned())))
        }
    }

    /// Returns credentials from the `Authorization` header.
    #[must_use]
    pub fn credentials(&self) -> Option<Credentials> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(Credentials::parse)
    }

    /// Returns a copy of this request tagged with a correlation id.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

/// Returns `true` for `application/json` and `application/*+json` media types.
#[must_use]
pub fn is_json_media_type(content_type: &str) -> bool {
    let media = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    media == "application/json" || (media.starts_with("application/") && media.ends_with("+json"))
}

/// Builder for constructing a [`Request`].
#[derive(Debug, Default)]
pub struct RequestBuilder {
    method: Option<Method>,
    path: String,
    headers: HeaderMap,
    query: IndexMap<String, String>,
    path_params: Params,
    body: Option<String>,
    is_base64_encoded: bool,
    request_id: Option<String>,
}

impl RequestBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            path: "/".to_string(),
            ..Self::default()
        }
    }

    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the path.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Adds a header. Invalid names or values are ignored.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Adds a query parameter.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Adds a path parameter.
    #[must_use]
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.push(name, value);
        self
    }

    /// Sets the body text.
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Marks the body as base64-encoded.
    #[must_use]
    pub fn base64_encoded(mut self, encoded: bool) -> Self {
        self.is_base64_encoded = encoded;
        self
    }

    /// Sets the correlation id.
    #[must_use]
    pub fn request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Builds the request. The method defaults to `GET`.
    #[must_use]
    pub fn build(self) -> Request {
        Request {
            method: self.method.unwrap_or(Method::GET),
            path: self.path,
            headers: self.headers,
            query: self.query,
            path_params: self.path_params,
            body: self.body,
            is_base64_encoded: self.is_base64_encoded,
            request_id: self.request_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_event() {
        let mut event = ApiRequest::new("post", "/orders");
        event
            .headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        event
            .query_string_parameters
            .insert("dryRun".to_string(), "true".to_string());
        event.body = Some(r#"{"sku":"A1"}"#.to_string());

        let request = Request::from_event(&event, Params::new()).unwrap();
        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.query("dryRun"), Some("true"));
        assert!(request.is_json());
        assert_eq!(
            request.parsed_body().unwrap(),
            Some(serde_json::json!({"sku": "A1"}))
        );
    }

    #[test]
    fn test_from_event_invalid_method() {
        let event = ApiRequest::new("G E T", "/");
        let err = Request::from_event(&event, Params::new()).unwrap_err();
        assert_eq!(err.status_code(), http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_raw_body_base64() {
        let request = Request::builder()
            .body("aGVsbG8=")
            .base64_encoded(true)
            .build();
        assert_eq!(request.raw_body().unwrap(), Bytes::from_static(b"hello"));
        assert_eq!(request.body_text().unwrap().as_deref(), Some("hello"));
    }

    #[test]
    fn test_raw_body_plain() {
        let request = Request::builder().body("hello").build();
        assert_eq!(request.raw_body().unwrap(), Bytes::from_static(b"hello"));
    }

    #[test]
    fn test_raw_body_missing() {
        let request = Request::builder().build();
        assert!(request.raw_body().unwrap().is_empty());
        assert!(request.parsed_body().unwrap().is_none());
    }

    #[test]
    fn test_invalid_base64_is_validation_error() {
        let request = Request::builder().body("%%%").base64_encoded(true).build();
        let err = request.raw_body().unwrap_err();
        assert_eq!(err.status_code(), http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_parsed_body_non_json_is_text() {
        let request = Request::builder()
            .header("content-type", "text/plain")
            .body("plain words")
            .build();
        assert_eq!(
            request.parsed_body().unwrap(),
            Some(serde_json::Value::String("plain words".to_string()))
        );
    }

    #[test]
    fn test_parsed_body_malformed_json() {
        let request = Request::builder()
            .header("content-type", "application/json; charset=utf-8")
            .body("{not json")
            .build();
        assert!(matches!(
            request.parsed_body(),
            Err(HeronError::Validation { .. })
        ));
    }

    #[test]
    fn test_json_media_types() {
        assert!(is_json_media_type("application/json"));
        assert!(is_json_media_type("application/problem+json"));
        assert!(is_json_media_type("Application/JSON; charset=utf-8"));
        assert!(!is_json_media_type("text/json-ish"));
        assert!(!is_json_media_type("text/plain"));
    }

    #[test]
    fn test_credentials_from_header() {
        let request = Request::builder()
            .header("Authorization", "Bearer token-1")
            .build();
        assert_eq!(
            request.credentials(),
            Some(Credentials::Bearer("token-1".to_string()))
        );
    }
}
