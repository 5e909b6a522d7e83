//! In-memory test client.

use std::future::Future;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use heron_core::{ApiRequest, ApiResponse, BoxFuture};
use heron_server::LambdaEngine;
use http::Method;
use indexmap::IndexMap;

use crate::error::TestError;
use crate::response::TestResponse;

/// Handler function type for the test client.
pub type TestHandler = Arc<dyn Fn(ApiRequest) -> BoxFuture<'static, ApiResponse> + Send + Sync>;

/// A client that sends proxy events to a handler without any network.
///
/// # Example
///
/// ```rust
/// use heron_core::ApiResponse;
/// use heron_test::TestClient;
///
/// let client = TestClient::new(|event| async move {
///     ApiResponse {
///         status_code: 200,
///         body: event.path,
///         ..ApiResponse::default()
///     }
/// });
///
/// let response = tokio_test_block_on(client.get("/ping").send());
/// response.assert_status(200).assert_body_contains("/ping");
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Runtime::new().unwrap().block_on(f)
/// # }
/// ```
#[must_use]
pub struct TestClient {
    handler: TestHandler,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Creates a client from a handler function.
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(ApiRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResponse> + Send + 'static,
    {
        Self {
            handler: Arc::new(move |event: ApiRequest| -> BoxFuture<'static, ApiResponse> {
                Box::pin(handler(event))
            }),
            default_headers: Vec::new(),
        }
    }

    /// Creates a client that sends every request through `engine`.
    pub fn engine(engine: Arc<LambdaEngine>) -> Self {
        Self::new(move |event| {
            let engine = Arc::clone(&engine);
            async move { engine.handle(event).await }
        })
    }

    /// Adds a header included in every request.
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Creates a GET request builder.
    pub fn get(&self, uri: &str) -> TestClientRequest<'_> {
        self.request(Method::GET, uri)
    }

    /// Creates a POST request builder.
    pub fn post(&self, uri: &str) -> TestClientRequest<'_> {
        self.request(Method::POST, uri)
    }

    /// Creates a PUT request builder.
    pub fn put(&self, uri: &str) -> TestClientRequest<'_> {
        self.request(Method::PUT, uri)
    }

    /// Creates a PATCH request builder.
    pub fn patch(&self, uri: &str) -> TestClientRequest<'_> {
        self.request(Method::PATCH, uri)
    }

    /// Creates a DELETE request builder.
    pub fn delete(&self, uri: &str) -> TestClientRequest<'_> {
        self.request(Method::DELETE, uri)
    }

    /// Creates a request builder with a custom method.
    ///
    /// A query string in `uri` becomes `queryStringParameters`.
    pub fn request(&self, method: Method, uri: &str) -> TestClientRequest<'_> {
        let (path, query) = uri.split_once('?').unwrap_or((uri, ""));
        let mut event = ApiRequest::new(method.as_str(), path);
        event.query_string_parameters = parse_query(query);
        for (name, value) in &self.default_headers {
            event.headers.insert(name.clone(), value.clone());
        }
        let error = (!path.starts_with('/'))
            .then(|| TestError::RequestBuild(format!("path must start with '/': {path}")));
        TestClientRequest {
            client: self,
            event,
            error,
        }
    }

    async fn send_internal(&self, event: ApiRequest) -> Result<TestResponse, TestError> {
        let response = (self.handler)(event).await;
        TestResponse::from_api_response(response)
    }
}

impl std::fmt::Debug for TestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestClient")
            .field("default_headers", &self.default_headers)
            .finish_non_exhaustive()
    }
}

fn parse_query(query: &str) -> IndexMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            (name.to_string(), value.to_string())
        })
        .collect()
}

/// A request event under construction, bound to a client.
#[derive(Debug)]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    event: ApiRequest,
    error: Option<TestError>,
}

impl<'a> TestClientRequest<'a> {
    /// Sets a header, replacing one with the same name.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.event
            .headers
            .retain(|existing, _| !existing.eq_ignore_ascii_case(name));
        self.event.headers.insert(name.to_string(), value.to_string());
        self
    }

    /// Adds a query string parameter.
    #[must_use]
    pub fn query(mut self, name: &str, value: &str) -> Self {
        self.event
            .query_string_parameters
            .insert(name.to_string(), value.to_string());
        self
    }

    /// Sets the `Content-Type` header.
    #[must_use]
    pub fn content_type(self, content_type: &str) -> Self {
        self.header("content-type", content_type)
    }

    /// Sets `Authorization: Bearer <token>`.
    #[must_use]
    pub fn bearer_token(self, token: &str) -> Self {
        self.header("authorization", &format!("Bearer {token}"))
    }

    /// Sets `Authorization: Basic <base64(user:password)>`.
    #[must_use]
    pub fn basic_auth(self, user: &str, password: &str) -> Self {
        let encoded = STANDARD.encode(format!("{user}:{password}"));
        self.header("authorization", &format!("Basic {encoded}"))
    }

    /// Sets a text body.
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.event.body = Some(body.into());
        self.event.is_base64_encoded = false;
        self
    }

    /// Sets a binary body, base64-encoded in the event.
    #[must_use]
    pub fn binary(mut self, body: &[u8]) -> Self {
        self.event.body = Some(STANDARD.encode(body));
        self.event.is_base64_encoded = true;
        self
    }

    /// Sets a JSON body and content type.
    #[must_use]
    pub fn json<T: serde::Serialize>(mut self, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => self.body(body).content_type("application/json"),
            Err(e) => {
                self.error = Some(TestError::Json(e));
                self
            }
        }
    }

    /// Returns the event that would be sent.
    #[must_use]
    pub fn event(&self) -> &ApiRequest {
        &self.event
    }

    /// Sends the request.
    ///
    /// # Panics
    ///
    /// Panics if the request could not be built or the response decoded.
    pub async fn send(self) -> TestResponse {
        self.try_send().await.expect("request should succeed")
    }

    /// Sends the request and returns a `Result`.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.client.send_internal(self.event).await
    }
}
