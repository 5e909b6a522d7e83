//! The per-request dispatch pipeline.
//!
//! ```text
//! Authenticate → Authorize → ResolveController → NegotiateContentType
//!     → ExtractParameters → Invoke → DetectResponse
//!                  │            │
//!                  └────────────┴──→ InterceptError
//! ```
//!
//! Every stage runs sequentially inside the dispatch span opened by the
//! engine. Registries are frozen, so requests share them without locking.

use std::fmt;
use std::sync::Arc;

use heron_core::di::ControllerFactory;
use heron_core::{Args, HeronError, Instance, Principal, Reply, Request, Response};
use heron_extract::ExtractionContext;
use heron_middleware::{ErrorInterceptor, InterceptContext, InterceptorFactory, MiddlewareRegistry};
use heron_registry::{EndpointRef, Registry};

/// Runs endpoints of a frozen registry.
///
/// Created once at bind time and shared by every bound route.
pub struct DispatchPipeline {
    registry: Arc<Registry>,
    middleware: Arc<MiddlewareRegistry>,
    controllers: Arc<dyn ControllerFactory>,
    interceptors: Arc<dyn InterceptorFactory>,
    default_content_type: String,
}

impl DispatchPipeline {
    /// Creates a pipeline.
    ///
    /// `default_content_type` is used when neither the endpoint nor its
    /// controller declares `produces`.
    #[must_use]
    pub fn new(
        registry: Arc<Registry>,
        middleware: Arc<MiddlewareRegistry>,
        controllers: Arc<dyn ControllerFactory>,
        interceptors: Arc<dyn InterceptorFactory>,
        default_content_type: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            middleware,
            controllers,
            interceptors,
            default_content_type: default_content_type.into(),
        }
    }

    /// Returns the registry snapshot.
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Returns the middleware registry.
    #[must_use]
    pub fn middleware(&self) -> &Arc<MiddlewareRegistry> {
        &self.middleware
    }

    /// Dispatches one request to the endpoint `endpoint_id`.
    ///
    /// On `Ok` the response has been sent. Errors that no interceptor turned
    /// into a response are returned to the engine.
    pub async fn dispatch(
        &self,
        endpoint_id: &str,
        request: Arc<Request>,
        response: Response,
    ) -> Result<(), HeronError> {
        let endpoint = self
            .registry
            .endpoint(endpoint_id)
            .ok_or_else(|| HeronError::internal(format!("endpoint '{endpoint_id}' is not registered")))?;
        tracing::Span::current().record("endpoint", endpoint_id);

        let principal = self.authenticate(endpoint, &request).await?;

        let instance = self
            .controllers
            .resolve_instance(endpoint.controller.type_key())?;

        let content_type = endpoint
            .produces()
            .unwrap_or(self.default_content_type.as_str());
        response.set_content_type(content_type)?;

        let (args, extracted) = extract(endpoint, &request, &response, principal.as_ref());
        let method = endpoint.endpoint.method();
        let outcome = match extracted {
            Ok(()) => method.invoke(Arc::clone(&instance), args.clone()).await,
            Err(error) => Err(error),
        };

        let error = match outcome {
            Ok(reply) => return detect_response(endpoint_id, reply, &response),
            Err(error) => error,
        };

        let Some(interceptor) = self.choose_interceptor(endpoint) else {
            return Err(error);
        };
        let ctx = InterceptContext {
            error: &error,
            endpoint_id,
            controller_id: endpoint.controller.id(),
            method,
            instance: &instance,
            args: &args,
            request: &request,
            response: &response,
        };
        let reply = interceptor.intercept(ctx).await?;
        if response.is_sent() {
            return Ok(());
        }
        if reply.is_empty() {
            return Err(error);
        }
        response.send(reply)
    }

    /// Runs the auth filters and then the authorizers.
    ///
    /// A no-auth flag on the endpoint or its controller skips both.
    async fn authenticate(
        &self,
        endpoint: EndpointRef<'_>,
        request: &Request,
    ) -> Result<Option<Arc<Principal>>, HeronError> {
        if endpoint.skips_auth() {
            return Ok(None);
        }
        let principal = self.middleware.authenticate(request).await?;
        self.middleware
            .authorize(endpoint.id(), principal.as_ref(), endpoint.roles())
            .await?;
        Ok(principal.map(Arc::new))
    }

    /// Picks exactly one interceptor: the endpoint binding, then the
    /// controller binding, then the first matching registry entry.
    fn choose_interceptor(&self, endpoint: EndpointRef<'_>) -> Option<Arc<dyn ErrorInterceptor>> {
        let bindings = [
            endpoint.endpoint.error_interceptor(),
            endpoint.controller.error_interceptor(),
        ];
        for id in bindings.into_iter().flatten() {
            match self.interceptors.resolve_interceptor(id) {
                Some(interceptor) => return Some(interceptor),
                None => tracing::warn!(
                    interceptor = %id,
                    endpoint = endpoint.id(),
                    "bound error interceptor is not registered, falling through"
                ),
            }
        }
        self.middleware
            .find_interceptor(endpoint.id(), endpoint.controller.id())
            .cloned()
    }
}

impl fmt::Debug for DispatchPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchPipeline")
            .field("endpoints", &self.registry.endpoints().count())
            .field("middleware", &self.middleware)
            .field("default_content_type", &self.default_content_type)
            .finish_non_exhaustive()
    }
}

/// Runs the extractors in slot order.
///
/// Stops at the first failure; the arguments gathered so far are returned
/// either way so an interceptor can inspect them.
fn extract(
    endpoint: EndpointRef<'_>,
    request: &Arc<Request>,
    response: &Response,
    principal: Option<&Arc<Principal>>,
) -> (Args, Result<(), HeronError>) {
    let ctx = ExtractionContext::new(request, response, principal);
    let slots = endpoint.endpoint.extractors();
    let mut values = Vec::with_capacity(slots.len());

    for slot in slots {
        let value = match slot {
            Some(extractor) => match extractor.extract(&ctx) {
                Ok(value) => value,
                Err(error) => return (Args::new(values), Err(error)),
            },
            None => heron_core::ArgValue::Absent,
        };
        values.push(value);
    }
    (Args::new(values), Ok(()))
}

/// A non-empty reply is sent; an already sent response stands on its own.
fn detect_response(endpoint_id: &str, reply: Reply, response: &Response) -> Result<(), HeronError> {
    if response.is_sent() {
        if !reply.is_empty() {
            tracing::debug!(endpoint = endpoint_id, "response already sent, discarding returned value");
        }
        return Ok(());
    }
    if reply.is_empty() {
        return Err(HeronError::no_content(endpoint_id));
    }
    response.send(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use heron_core::{Controller, MethodTable, TypeKey};
    use heron_extract::ParameterExtractor;
    use heron_middleware::{FnInterceptor, InterceptorCatalog, InterceptorTarget};
    use http::StatusCode;
    use serde_json::json;

    struct Items;

    impl Controller for Items {
        fn methods() -> MethodTable {
            MethodTable::builder::<Self>()
                .method("get", 1, |_this: Arc<Self>, args: Args| async move {
                    Ok(args.text(0).map(ToString::to_string))
                })
                .method("silent", 0, |_this: Arc<Self>, _args: Args| async move { Ok(()) })
                .method("direct", 1, |_this: Arc<Self>, args: Args| async move {
                    if let Some(response) = args.response(0) {
                        response.set_status(StatusCode::ACCEPTED)?;
                        response.send(Reply::text("queued"))?;
                    }
                    Ok::<_, HeronError>(())
                })
                .method("fail", 0, |_this: Arc<Self>, _args: Args| async move {
                    Err::<(), _>(HeronError::http(StatusCode::CONFLICT, "already exists"))
                })
                .build()
        }
    }

    fn pipeline(registry: Registry, middleware: MiddlewareRegistry, catalog: InterceptorCatalog) -> DispatchPipeline {
        let factory = |key: TypeKey| -> Result<Instance, HeronError> {
            assert_eq!(key, TypeKey::of::<Items>());
            Ok(Arc::new(Items))
        };
        DispatchPipeline::new(
            registry.freeze(),
            Arc::new(middleware),
            Arc::new(factory),
            Arc::new(catalog),
            "application/json",
        )
    }

    fn items() -> Registry {
        let mut registry = Registry::new();
        registry
            .declare::<Items>("Items")
            .root_path("/items")
            .endpoint("get", |e| e.get("/:id").param(0, ParameterExtractor::path("id")))
            .endpoint("silent", |e| e.get("/silent"))
            .endpoint("direct", |e| {
                e.post("/direct")
                    .produces("text/plain")
                    .param(0, ParameterExtractor::response())
            })
            .endpoint("fail", |e| e.delete("/:id").error_interceptor("missing"))
            .finish()
            .unwrap();
        registry
    }

    fn request(id: &str) -> Arc<Request> {
        Arc::new(Request::builder().path(format!("/items/{id}")).path_param("id", id).build())
    }

    #[tokio::test]
    async fn test_returned_value_becomes_body() {
        let pipeline = pipeline(items(), MiddlewareRegistry::new(), InterceptorCatalog::new());
        let response = Response::new();
        pipeline
            .dispatch("Items::get", request("42"), response.clone())
            .await
            .unwrap();

        let event = response.to_api_response();
        assert_eq!(event.status_code, 200);
        assert_eq!(event.body, "42");
        assert_eq!(event.header("content-type"), Some("application/json"));
    }

    #[tokio::test]
    async fn test_sent_response_is_accepted() {
        let pipeline = pipeline(items(), MiddlewareRegistry::new(), InterceptorCatalog::new());
        let response = Response::new();
        pipeline
            .dispatch("Items::direct", request("1"), response.clone())
            .await
            .unwrap();

        let event = response.to_api_response();
        assert_eq!(event.status_code, 202);
        assert_eq!(event.header("content-type"), Some("text/plain"));
    }

    #[tokio::test]
    async fn test_nothing_produced_is_no_content() {
        let pipeline = pipeline(items(), MiddlewareRegistry::new(), InterceptorCatalog::new());
        let err = pipeline
            .dispatch("Items::silent", request("1"), Response::new())
            .await
            .unwrap_err();
        assert!(matches!(err, HeronError::NoContent { ref endpoint } if endpoint == "Items::silent"));
    }

    #[tokio::test]
    async fn test_unresolved_binding_falls_through_to_registry() {
        let mut middleware = MiddlewareRegistry::new();
        middleware
            .add_interceptor(FnInterceptor::new(InterceptorTarget::parse("*"), |ctx| {
                ctx.response.set_status(ctx.error.status_code())?;
                Ok(Reply::Json(json!({ "handled": ctx.error.to_string() })))
            }))
            .unwrap();

        let pipeline = pipeline(items(), middleware, InterceptorCatalog::new());
        let response = Response::new();
        pipeline
            .dispatch("Items::fail", request("1"), response.clone())
            .await
            .unwrap();

        let event = response.to_api_response();
        assert_eq!(event.status_code, 409);
        assert_eq!(event.body, r#"{"handled":"already exists"}"#);
    }

    #[tokio::test]
    async fn test_bound_interceptor_wins() {
        let mut middleware = MiddlewareRegistry::new();
        middleware
            .add_interceptor(FnInterceptor::new(InterceptorTarget::Any, |_ctx| {
                Ok(Reply::text("registry"))
            }))
            .unwrap();
        let mut catalog = InterceptorCatalog::new();
        catalog
            .register(
                "missing",
                FnInterceptor::new(InterceptorTarget::Any, |_ctx| Ok(Reply::text("bound"))),
            )
            .unwrap();

        let pipeline = pipeline(items(), middleware, catalog);
        let response = Response::new();
        pipeline
            .dispatch("Items::fail", request("1"), response.clone())
            .await
            .unwrap();
        assert_eq!(response.to_api_response().body, "bound");
    }

    #[tokio::test]
    async fn test_empty_interception_rethrows_original() {
        let mut middleware = MiddlewareRegistry::new();
        middleware
            .add_interceptor(FnInterceptor::new(InterceptorTarget::Any, |_ctx| Ok(Reply::Empty)))
            .unwrap();

        let pipeline = pipeline(items(), middleware, InterceptorCatalog::new());
        let err = pipeline
            .dispatch("Items::fail", request("1"), Response::new())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_unknown_endpoint_is_internal() {
        let pipeline = pipeline(items(), MiddlewareRegistry::new(), InterceptorCatalog::new());
        let err = pipeline
            .dispatch("Items::nope", request("1"), Response::new())
            .await
            .unwrap_err();
        assert!(err.is_server_error());
    }
}
