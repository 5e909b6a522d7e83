//! Application assembly.

use std::fmt;
use std::sync::Arc;

use heron_config::HeronConfig;
use heron_core::di::{Container, ControllerFactory};
use heron_core::{ApiRequest, ApiResponse, RegistrationError};
use heron_docs::{DocsError, OpenApi};
use heron_middleware::{InterceptorCatalog, InterceptorFactory, MiddlewareRegistry};
use heron_registry::Registry;
use heron_server::{DispatchPipeline, LambdaEngine, RouteBinder, SpecRoutes};
use heron_telemetry::{LogConfig, TelemetryResult};

/// A bound application: frozen registries and a ready engine.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use heron::prelude::*;
///
/// struct Health;
///
/// impl Controller for Health {
///     fn methods() -> MethodTable {
///         MethodTable::builder::<Self>()
///             .method("check", 0, |_this: Arc<Self>, _args: Args| async move { Ok("ok") })
///             .build()
///     }
/// }
///
/// let mut registry = Registry::new();
/// registry
///     .declare::<Health>("Health")
///     .root_path("/health")
///     .produces("text/plain")
///     .endpoint("check", |e| e.get("/"))
///     .finish()
///     .unwrap();
///
/// let mut container = Container::new();
/// container.register(Arc::new(Health));
///
/// let app = Heron::builder()
///     .registry(registry)
///     .controllers(container)
///     .build()
///     .unwrap();
///
/// let response = tokio::runtime::Runtime::new()
///     .unwrap()
///     .block_on(app.handle(ApiRequest::new("GET", "/health")));
/// assert_eq!(response.body, "ok");
/// ```
pub struct Heron {
    engine: Arc<LambdaEngine>,
    registry: Arc<Registry>,
    middleware: Arc<MiddlewareRegistry>,
    spec_routes: SpecRoutes,
    config: HeronConfig,
}

impl Heron {
    /// Starts building an application.
    #[must_use]
    pub fn builder() -> HeronBuilder {
        HeronBuilder::default()
    }

    /// Dispatches one proxy event.
    pub async fn handle(&self, event: ApiRequest) -> ApiResponse {
        self.engine.handle(event).await
    }

    /// Returns the engine, for sharing with a runtime or a test client.
    #[must_use]
    pub fn engine(&self) -> &Arc<LambdaEngine> {
        &self.engine
    }

    /// Returns the frozen registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Returns the frozen middleware registry.
    #[must_use]
    pub fn middleware(&self) -> &Arc<MiddlewareRegistry> {
        &self.middleware
    }

    /// Returns the configuration the application was built with.
    #[must_use]
    pub fn config(&self) -> &HeronConfig {
        &self.config
    }

    /// Generates the OpenAPI document, whether or not its routes are mounted.
    pub fn openapi(&self) -> Result<OpenApi, DocsError> {
        self.spec_routes.document(&self.registry, &self.middleware)
    }
}

impl fmt::Debug for Heron {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Heron")
            .field("routes", &self.engine.len())
            .field("base", &self.config.base)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Heron`].
#[must_use]
pub struct HeronBuilder {
    registry: Registry,
    middleware: MiddlewareRegistry,
    controllers: Option<Arc<dyn ControllerFactory>>,
    interceptors: Option<Arc<dyn InterceptorFactory>>,
    config: HeronConfig,
}

impl Default for HeronBuilder {
    fn default() -> Self {
        Self {
            registry: Registry::new(),
            middleware: MiddlewareRegistry::new(),
            controllers: None,
            interceptors: None,
            config: HeronConfig::default(),
        }
    }
}

impl HeronBuilder {
    /// Sets the controller and endpoint declarations.
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Sets the auth filters, authorizers and error interceptors.
    pub fn middleware(mut self, middleware: MiddlewareRegistry) -> Self {
        self.middleware = middleware;
        self
    }

    /// Sets the controller factory. Defaults to an empty [`Container`].
    pub fn controllers<F: ControllerFactory>(mut self, controllers: F) -> Self {
        self.controllers = Some(Arc::new(controllers));
        self
    }

    /// Sets the factory for interceptors bound by identifier. Defaults to an
    /// empty [`InterceptorCatalog`].
    pub fn interceptors<F: InterceptorFactory>(mut self, interceptors: F) -> Self {
        self.interceptors = Some(Arc::new(interceptors));
        self
    }

    /// Sets the configuration.
    pub fn config(mut self, config: HeronConfig) -> Self {
        self.config = config;
        self
    }

    /// Freezes the registries, binds every endpoint and mounts the API
    /// document routes when enabled.
    ///
    /// # Errors
    ///
    /// Fails when a declaration cannot be bound or the document cannot be
    /// generated.
    pub fn build(self) -> Result<Heron, RegistrationError> {
        let registry = self.registry.freeze();
        let middleware = Arc::new(self.middleware);
        let controllers = self
            .controllers
            .unwrap_or_else(|| Arc::new(Container::new()));
        let interceptors = self
            .interceptors
            .unwrap_or_else(|| Arc::new(InterceptorCatalog::new()));

        let pipeline = DispatchPipeline::new(
            Arc::clone(&registry),
            Arc::clone(&middleware),
            controllers,
            interceptors,
            self.config.default_content_type.clone(),
        );

        let mut engine = LambdaEngine::new();
        let bound = RouteBinder::new(Arc::new(pipeline)).bind(&mut engine)?;

        let spec_routes = SpecRoutes::from_config(&self.config);
        if self.config.open_api.enabled {
            spec_routes.mount(&registry, &middleware, &mut engine)?;
        }

        tracing::info!(
            controllers = registry.controllers().count(),
            endpoints = bound,
            routes = engine.len(),
            base = %self.config.base,
            open_api = self.config.open_api.enabled,
            "heron application ready"
        );

        Ok(Heron {
            engine: Arc::new(engine),
            registry,
            middleware,
            spec_routes,
            config: self.config,
        })
    }
}

impl fmt::Debug for HeronBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeronBuilder")
            .field("controllers", &self.registry.len())
            .field("base", &self.config.base)
            .finish_non_exhaustive()
    }
}

/// Installs the global subscriber from the `logging` section of `config`.
///
/// # Errors
///
/// Fails when the level is not a valid filter or a subscriber is already
/// installed.
pub fn init_logging(config: &HeronConfig) -> TelemetryResult<()> {
    heron_telemetry::init_logging(&LogConfig::from(&config.logging))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_application_mounts_only_documents() {
        let app = Heron::builder().build().unwrap();
        assert_eq!(app.engine().len(), 4);
        assert_eq!(app.config().base, "/");
    }

    #[test]
    fn test_documents_can_be_disabled() {
        let mut config = HeronConfig::default();
        config.open_api.enabled = false;

        let app = Heron::builder().config(config).build().unwrap();
        assert!(app.engine().is_empty());
        assert!(app.openapi().unwrap().paths.is_empty());
    }

    #[test]
    fn test_invalid_log_level_is_rejected() {
        let mut config = HeronConfig::default();
        config.logging.level = "heron=loud".to_string();
        assert!(init_logging(&config).is_err());
    }
}
