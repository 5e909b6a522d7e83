//! Shared, mutable response handle.
//!
//! A [`Response`] is a cheap clone around shared state so that the pipeline,
//! the endpoint and an error interceptor all write to the same response.
//! Once [`Response::send`] has been called the response is committed: the
//! status and headers are frozen and a second send is rejected.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, StatusCode};
use parking_lot::Mutex;

use crate::controller::Reply;
use crate::error::HeronError;
use crate::event::ApiResponse;
use crate::request::is_json_media_type;

#[derive(Debug)]
struct ResponseState {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    is_binary: bool,
    sent: bool,
}

impl Default for ResponseState {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            is_binary: false,
            sent: false,
        }
    }
}

/// A response under construction.
///
/// # Example
///
/// ```rust
/// use heron_core::{Reply, Response};
/// use http::StatusCode;
///
/// let response = Response::new();
/// response.set_status(StatusCode::CREATED).unwrap();
/// response.set_header("x-order-id", "42").unwrap();
/// response.send(Reply::text("created")).unwrap();
///
/// assert!(response.is_sent());
/// assert!(response.set_header("x-late", "1").is_err());
///
/// let event = response.to_api_response();
/// assert_eq!(event.status_code, 201);
/// assert_eq!(event.body, "created");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Response {
    inner: Arc<Mutex<ResponseState>>,
}

impl Response {
    /// Creates an uncommitted `200 OK` response.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` once the response has been sent.
    #[must_use]
    pub fn is_sent(&self) -> bool {
        self.inner.lock().sent
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.inner.lock().status
    }

    /// Sets the status code.
    pub fn set_status(&self, status: StatusCode) -> Result<(), HeronError> {
        let mut state = self.inner.lock();
        ensure_uncommitted(&state, "status")?;
        state.status = status;
        Ok(())
    }

    /// Sets a header, replacing any existing values.
    pub fn set_header(&self, name: &str, value: &str) -> Result<(), HeronError> {
        let (name, value) = parse_header(name, value)?;
        let mut state = self.inner.lock();
        ensure_uncommitted(&state, name.as_str())?;
        state.headers.insert(name, value);
        Ok(())
    }

    /// Appends a header value, keeping existing ones.
    pub fn append_header(&self, name: &str, value: &str) -> Result<(), HeronError> {
        let (name, value) = parse_header(name, value)?;
        let mut state = self.inner.lock();
        ensure_uncommitted(&state, name.as_str())?;
        state.headers.append(name, value);
        Ok(())
    }

    /// Returns the first value of a header.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<String> {
        self.inner
            .lock()
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    }

    /// Returns the `Content-Type` header.
    #[must_use]
    pub fn content_type(&self) -> Option<String> {
        self.header(CONTENT_TYPE.as_str())
    }

    /// Sets the `Content-Type` header.
    pub fn set_content_type(&self, content_type: &str) -> Result<(), HeronError> {
        self.set_header(CONTENT_TYPE.as_str(), content_type)
    }

    /// Writes the body and commits the response.
    ///
    /// JSON values are serialized, except that a bare JSON string is written
    /// verbatim when the content type is not JSON. Binary bodies are base64
    /// encoded in the produced event. Sending [`Reply::Empty`] commits an
    /// empty body.
    pub fn send(&self, reply: Reply) -> Result<(), HeronError> {
        let mut state = self.inner.lock();
        if state.sent {
            return Err(HeronError::internal("response has already been sent"));
        }

        let content_type = state
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);

        let (body, is_binary, default_type) = match reply {
            Reply::Empty => (Bytes::new(), false, None),
            Reply::Text(text) => (Bytes::from(text), false, Some("text/plain")),
            Reply::Binary(bytes) => (bytes, true, Some("application/octet-stream")),
            Reply::Json(serde_json::Value::String(text))
                if content_type.as_deref().is_some_and(|ct| !is_json_media_type(ct)) =>
            {
                (Bytes::from(text), false, None)
            }
            Reply::Json(value) => {
                let text = serde_json::to_string(&value).map_err(|e| {
                    HeronError::internal_with_source("failed to serialize response body", e)
                })?;
                (Bytes::from(text), false, Some("application/json"))
            }
        };

        if content_type.is_none() {
            if let Some(default_type) = default_type {
                state
                    .headers
                    .insert(CONTENT_TYPE, HeaderValue::from_static(default_type));
            }
        }

        state.body = body;
        state.is_binary = is_binary;
        state.sent = true;
        Ok(())
    }

    /// Sets the status and commits an empty body.
    pub fn send_status(&self, status: StatusCode) -> Result<(), HeronError> {
        self.set_status(status)?;
        self.send(Reply::Empty)
    }

    /// Renders the response as a proxy response event.
    ///
    /// Headers with a single value go to `headers`; repeated headers go to
    /// `multiValueHeaders`.
    #[must_use]
    pub fn to_api_response(&self) -> ApiResponse {
        let state = self.inner.lock();
        let mut response = ApiResponse {
            status_code: state.status.as_u16(),
            ..ApiResponse::default()
        };

        for name in state.headers.keys() {
            let values: Vec<String> = state
                .headers
                .get_all(name)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .map(ToString::to_string)
                .collect();
            match values.as_slice() {
                [single] => {
                    response
                        .headers
                        .insert(name.as_str().to_string(), single.clone());
                }
                _ => {
                    response
                        .multi_value_headers
                        .insert(name.as_str().to_string(), values);
                }
            }
        }

        if state.is_binary {
            response.body = STANDARD.encode(&state.body);
            response.is_base64_encoded = true;
        } else {
            response.body = String::from_utf8_lossy(&state.body).into_owned();
        }
        response
    }
}

fn ensure_uncommitted(state: &ResponseState, what: &str) -> Result<(), HeronError> {
    if state.sent {
        return Err(HeronError::internal(format!(
            "cannot set {what} after the response has been sent"
        )));
    }
    Ok(())
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), HeronError> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| HeronError::internal_with_source(format!("invalid header name '{name}'"), e))?;
    let header_value = HeaderValue::from_str(value).map_err(|e| {
        HeronError::internal_with_source(format!("invalid value for header '{name}'"), e)
    })?;
    Ok((header_name, header_value))
}
