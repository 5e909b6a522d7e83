//! The request engine.
//!
//! An engine owns the routing table. The route binder registers one handler
//! per endpoint through [`RequestEngine`]; [`LambdaEngine`] then turns API
//! Gateway proxy events into proxy responses.

use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use heron_core::{ApiRequest, ApiResponse, BoxFuture, HeronError, RegistrationError, Request, Response};
use heron_router::{RouteLookup, Router};
use http::header::{ALLOW, CONTENT_TYPE, WWW_AUTHENTICATE};
use http::Method;
use tracing::Instrument;

/// Header carrying the request id, read from the event and echoed back.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// A bound route handler.
///
/// The handler writes to the shared [`Response`]. An `Err` is rendered by the
/// engine as an error envelope.
pub type RouteHandler =
    Arc<dyn Fn(Arc<Request>, Response) -> BoxFuture<'static, Result<(), HeronError>> + Send + Sync>;

/// Boxes an async closure into a [`RouteHandler`].
pub fn route_handler<F, Fut>(f: F) -> RouteHandler
where
    F: Fn(Arc<Request>, Response) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HeronError>> + Send + 'static,
{
    Arc::new(
        move |request: Arc<Request>, response: Response| -> BoxFuture<'static, Result<(), HeronError>> {
            Box::pin(f(request, response))
        },
    )
}

/// Something routes can be bound on.
///
/// The per-method helpers forward to [`RequestEngine::route`].
pub trait RequestEngine {
    /// Registers `handler` for `method` on `path`.
    ///
    /// Paths accept both `:id` and `{id}` parameters.
    fn route(&mut self, method: Method, path: &str, handler: RouteHandler) -> Result<(), RegistrationError>;

    /// Registers a GET handler.
    fn get(&mut self, path: &str, handler: RouteHandler) -> Result<(), RegistrationError> {
        self.route(Method::GET, path, handler)
    }

    /// Registers a POST handler.
    fn post(&mut self, path: &str, handler: RouteHandler) -> Result<(), RegistrationError> {
        self.route(Method::POST, path, handler)
    }

    /// Registers a PUT handler.
    fn put(&mut self, path: &str, handler: RouteHandler) -> Result<(), RegistrationError> {
        self.route(Method::PUT, path, handler)
    }

    /// Registers a PATCH handler.
    fn patch(&mut self, path: &str, handler: RouteHandler) -> Result<(), RegistrationError> {
        self.route(Method::PATCH, path, handler)
    }

    /// Registers a DELETE handler.
    fn delete(&mut self, path: &str, handler: RouteHandler) -> Result<(), RegistrationError> {
        self.route(Method::DELETE, path, handler)
    }
}

/// Engine for API Gateway proxy events, backed by the radix router.
///
/// # Example
///
/// ```rust
/// use heron_core::{ApiRequest, Reply};
/// use heron_server::{route_handler, LambdaEngine, RequestEngine};
///
/// let mut engine = LambdaEngine::new();
/// let handler = route_handler(|request, response| async move {
///     let id = request.path_param("id").unwrap_or_default().to_string();
///     response.send(Reply::text(id))
/// });
/// engine.get("/items/{id}", handler).unwrap();
///
/// let response = tokio_test::block_on(engine.handle(ApiRequest::new("GET", "/items/7")));
/// assert_eq!(response.status_code, 200);
/// assert_eq!(response.body, "7");
/// ```
#[derive(Default)]
pub struct LambdaEngine {
    router: Router<RouteHandler>,
}

impl LambdaEngine {
    /// Creates an engine with no routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of bound routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.router.len()
    }

    /// Returns `true` if no route is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.router.is_empty()
    }

    /// Returns the bound `(method, pattern)` pairs in registration order.
    #[must_use]
    pub fn routes(&self) -> &[(Method, String)] {
        self.router.routes()
    }

    /// Handles one proxy event.
    ///
    /// Never fails: routing misses, handler errors and panics all become
    /// error responses.
    pub async fn handle(&self, event: ApiRequest) -> ApiResponse {
        let request_id = event
            .headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(REQUEST_ID_HEADER))
            .map(|(_, value)| value.clone())
            .unwrap_or_else(|| uuid::Uuid::now_v7().to_string());

        let span = tracing::info_span!(
            "dispatch",
            request_id = %request_id,
            method = %event.http_method,
            path = %event.path,
            endpoint = tracing::field::Empty,
        );

        async {
            match self.dispatch(&event, &request_id).await {
                Ok(response) => response,
                Err(error) => error_response(&error, &request_id),
            }
        }
        .instrument(span)
        .await
    }

    async fn dispatch(&self, event: &ApiRequest, request_id: &str) -> Result<ApiResponse, HeronError> {
        let method = Method::from_bytes(event.http_method.to_ascii_uppercase().as_bytes()).map_err(|_| {
            HeronError::http(
                http::StatusCode::BAD_REQUEST,
                format!("invalid HTTP method '{}'", event.http_method),
            )
        })?;

        let (handler, params) = match self.router.lookup(&method, &event.path) {
            RouteLookup::Found(found) => (Arc::clone(found.target), found.params),
            RouteLookup::MethodNotAllowed(allowed) => {
                return Err(HeronError::MethodNotAllowed {
                    method: method.to_string(),
                    path: event.path.clone(),
                    allowed: allowed.iter().map(ToString::to_string).collect(),
                })
            }
            RouteLookup::NotFound => {
                return Err(HeronError::NotFound {
                    path: event.path.clone(),
                })
            }
        };

        let request = Arc::new(Request::from_event(event, params)?.with_request_id(request_id));
        let response = Response::new();
        response.set_header(REQUEST_ID_HEADER, request_id)?;

        match AssertUnwindSafe(handler(request, response.clone()))
            .catch_unwind()
            .await
        {
            Ok(Ok(())) => Ok(response.to_api_response()),
            Ok(Err(error)) => Err(error),
            Err(_) => Err(HeronError::internal("route handler panicked")),
        }
    }
}

impl RequestEngine for LambdaEngine {
    fn route(&mut self, method: Method, path: &str, handler: RouteHandler) -> Result<(), RegistrationError> {
        tracing::debug!(method = %method, path = %path, "binding route");
        self.router
            .insert(method.clone(), path, handler)
            .map_err(|e| RegistrationError::invalid_declaration(format!("{method} {path}"), e.to_string()))
    }
}

impl fmt::Debug for LambdaEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LambdaEngine")
            .field("routes", &self.router.routes())
            .finish_non_exhaustive()
    }
}

/// Renders a request-scoped error as a JSON error envelope.
///
/// 401 responses carry a `WWW-Authenticate` challenge and 405 responses an
/// `Allow` header. Server errors are logged at error level, client errors at
/// debug level.
#[must_use]
pub fn error_response(error: &HeronError, request_id: &str) -> ApiResponse {
    let status = error.status_code();
    if status.is_server_error() {
        tracing::error!(error = %error, status = status.as_u16(), "request failed");
    } else {
        tracing::debug!(error = %error, status = status.as_u16(), "request rejected");
    }

    let mut response = ApiResponse {
        status_code: status.as_u16(),
        ..ApiResponse::default()
    };
    response
        .headers
        .insert(CONTENT_TYPE.as_str().to_string(), "application/json".to_string());
    response
        .headers
        .insert(REQUEST_ID_HEADER.to_string(), request_id.to_string());

    match error {
        HeronError::Unauthenticated { schemes, .. } if !schemes.is_empty() => {
            response
                .headers
                .insert(WWW_AUTHENTICATE.as_str().to_string(), schemes.join(", "));
        }
        HeronError::MethodNotAllowed { allowed, .. } => {
            response
                .headers
                .insert(ALLOW.as_str().to_string(), allowed.join(", "));
        }
        _ => {}
    }

    response.body = serde_json::to_string(&error.to_envelope(Some(request_id)))
        .unwrap_or_else(|_| r#"{"error":{"code":"INTERNAL_ERROR"}}"#.to_string());
    response
}
