//! Route binding.
//!
//! Walks a frozen registry and registers one route per endpoint on a
//! [`RequestEngine`]. Each route forwards to the shared [`DispatchPipeline`].

use std::sync::Arc;

use heron_core::RegistrationError;
use heron_registry::EndpointRef;
use http::Method;

use crate::engine::{route_handler, RequestEngine};
use crate::pipeline::DispatchPipeline;

/// Binds every registered endpoint on an engine.
#[derive(Debug, Clone)]
pub struct RouteBinder {
    pipeline: Arc<DispatchPipeline>,
}

impl RouteBinder {
    /// Creates a binder for the pipeline's registry.
    #[must_use]
    pub fn new(pipeline: Arc<DispatchPipeline>) -> Self {
        Self { pipeline }
    }

    /// Binds all endpoints in declaration order and returns how many routes
    /// were registered.
    ///
    /// Ignored endpoints are still bound; the flag only affects API
    /// documents.
    ///
    /// # Errors
    ///
    /// Fails with [`RegistrationError::UnsupportedMethod`] when an endpoint
    /// has no HTTP method or one outside GET, POST, PUT, PATCH and DELETE,
    /// and with [`RegistrationError::InvalidDeclaration`] when the engine
    /// rejects a path.
    pub fn bind<E: RequestEngine + ?Sized>(&self, engine: &mut E) -> Result<usize, RegistrationError> {
        let registry = Arc::clone(self.pipeline.registry());
        let mut bound = 0;
        for endpoint in registry.endpoints() {
            self.bind_endpoint(endpoint, engine)?;
            bound += 1;
        }
        tracing::debug!(routes = bound, "bound controller routes");
        Ok(bound)
    }

    fn bind_endpoint<E: RequestEngine + ?Sized>(
        &self,
        endpoint: EndpointRef<'_>,
        engine: &mut E,
    ) -> Result<(), RegistrationError> {
        let method = http_method(endpoint)?;
        let path = endpoint.full_path();
        let id = endpoint.id().to_string();

        let pipeline = Arc::clone(&self.pipeline);
        let handler = route_handler(move |request, response| {
            let pipeline = Arc::clone(&pipeline);
            let id = id.clone();
            async move { pipeline.dispatch(&id, request, response).await }
        });

        tracing::debug!(endpoint = endpoint.id(), method = %method, path = %path, "binding endpoint");
        match method {
            Method::GET => engine.get(&path, handler),
            Method::POST => engine.post(&path, handler),
            Method::PUT => engine.put(&path, handler),
            Method::PATCH => engine.patch(&path, handler),
            _ => engine.delete(&path, handler),
        }
    }
}

fn http_method(endpoint: EndpointRef<'_>) -> Result<Method, RegistrationError> {
    let token = endpoint.endpoint.http_method().unwrap_or_default();
    match token.trim().to_ascii_uppercase().as_str() {
        "GET" => Ok(Method::GET),
        "POST" => Ok(Method::POST),
        "PUT" => Ok(Method::PUT),
        "PATCH" => Ok(Method::PATCH),
        "DELETE" => Ok(Method::DELETE),
        _ => Err(RegistrationError::UnsupportedMethod {
            endpoint: endpoint.id().to_string(),
            method: token.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{LambdaEngine, RouteHandler};
    use heron_core::{Args, Controller, HeronError, Instance, MethodTable, TypeKey};
    use heron_middleware::{InterceptorCatalog, MiddlewareRegistry};
    use heron_registry::Registry;

    struct Orders;

    impl Controller for Orders {
        fn methods() -> MethodTable {
            MethodTable::builder::<Self>()
                .method("list", 0, |_this: Arc<Self>, _args: Args| async move { Ok("[]") })
                .method("create", 0, |_this: Arc<Self>, _args: Args| async move { Ok("{}") })
                .method("purge", 0, |_this: Arc<Self>, _args: Args| async move { Ok(()) })
                .build()
        }
    }

    fn binder(registry: Registry) -> RouteBinder {
        let factory = |_key: TypeKey| -> Result<Instance, HeronError> { Ok(Arc::new(Orders)) };
        RouteBinder::new(Arc::new(DispatchPipeline::new(
            registry.freeze(),
            Arc::new(MiddlewareRegistry::new()),
            Arc::new(factory),
            Arc::new(InterceptorCatalog::new()),
            "application/json",
        )))
    }

    #[derive(Default)]
    struct Recorder {
        routes: Vec<(Method, String)>,
    }

    impl RequestEngine for Recorder {
        fn route(&mut self, method: Method, path: &str, _handler: RouteHandler) -> Result<(), RegistrationError> {
            self.routes.push((method, path.to_string()));
            Ok(())
        }
    }

    #[test]
    fn test_binds_each_endpoint_with_full_path() {
        let mut registry = Registry::new();
        registry
            .declare::<Orders>("Orders")
            .root_path("/orders")
            .endpoint("list", |e| e.get("/"))
            .endpoint("create", |e| e.method("post").path("/"))
            .endpoint("purge", |e| e.delete("/all").ignored())
            .finish()
            .unwrap();

        let mut engine = Recorder::default();
        let bound = binder(registry).bind(&mut engine).unwrap();

        assert_eq!(bound, 3);
        assert_eq!(
            engine.routes,
            vec![
                (Method::GET, "/orders/".to_string()),
                (Method::POST, "/orders/".to_string()),
                (Method::DELETE, "/orders/all".to_string()),
            ]
        );
    }

    #[test]
    fn test_missing_method_is_unsupported() {
        let mut registry = Registry::new();
        registry
            .declare::<Orders>("Orders")
            .endpoint("list", |e| e.path("/"))
            .finish()
            .unwrap();

        let err = binder(registry).bind(&mut LambdaEngine::new()).unwrap_err();
        assert_eq!(
            err,
            RegistrationError::UnsupportedMethod {
                endpoint: "Orders::list".to_string(),
                method: String::new(),
            }
        );
    }

    #[test]
    fn test_unknown_method_is_unsupported() {
        let mut registry = Registry::new();
        registry
            .declare::<Orders>("Orders")
            .endpoint("list", |e| e.method("OPTIONS").path("/"))
            .finish()
            .unwrap();

        let err = binder(registry).bind(&mut LambdaEngine::new()).unwrap_err();
        assert!(matches!(err, RegistrationError::UnsupportedMethod { ref method, .. } if method == "OPTIONS"));
    }
}
