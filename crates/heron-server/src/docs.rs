//! API document endpoints.
//!
//! Serves the generated OpenAPI document under the configured base path:
//!
//! | Path | Format |
//! |------|--------|
//! | `{base}/open-api.json` | JSON |
//! | `{base}/open-api.yml` | YAML |
//! | `{base}/swagger.json` | JSON |
//! | `{base}/swagger.yml` | YAML |
//!
//! The document is rendered once when the routes are mounted.

use std::sync::Arc;

use heron_config::HeronConfig;
use heron_core::{RegistrationError, Reply};
use heron_docs::{DocsError, OpenApi, OpenApiGenerator};
use heron_middleware::MiddlewareRegistry;
use heron_registry::Registry;
use heron_router::path;

use crate::engine::{route_handler, RequestEngine};

const YAML_CONTENT_TYPE: &str = "application/yaml";

/// Mounts the document endpoints.
#[derive(Debug, Clone)]
pub struct SpecRoutes {
    base: String,
    use_authentication: bool,
    generator: OpenApiGenerator,
}

impl SpecRoutes {
    /// Creates spec routes from the application configuration.
    #[must_use]
    pub fn from_config(config: &HeronConfig) -> Self {
        let mut generator = OpenApiGenerator::new()
            .version(config.version.clone())
            .default_content_type(config.default_content_type.clone());
        if let Some(title) = &config.open_api.title {
            generator = generator.title(title.clone());
        }
        if let Some(description) = &config.open_api.description {
            generator = generator.description(description.clone());
        }
        Self {
            base: config.base.clone(),
            use_authentication: config.open_api.use_authentication,
            generator,
        }
    }

    /// Returns the mounted paths, JSON first.
    #[must_use]
    pub fn paths(&self) -> [String; 4] {
        [
            path::join(&self.base, "open-api.json"),
            path::join(&self.base, "open-api.yml"),
            path::join(&self.base, "swagger.json"),
            path::join(&self.base, "swagger.yml"),
        ]
    }

    /// Generates the document without mounting anything.
    pub fn document(&self, registry: &Registry, middleware: &MiddlewareRegistry) -> Result<OpenApi, DocsError> {
        self.generator.generate(registry, middleware)
    }

    /// Renders the document and registers the four GET routes.
    ///
    /// With `use_authentication` set, each request runs the auth filters
    /// before the document is returned.
    ///
    /// # Errors
    ///
    /// Fails with [`RegistrationError::InvalidDeclaration`] when the
    /// document cannot be generated or rendered, or when the engine rejects
    /// a path.
    pub fn mount<E: RequestEngine + ?Sized>(
        &self,
        registry: &Registry,
        middleware: &Arc<MiddlewareRegistry>,
        engine: &mut E,
    ) -> Result<(), RegistrationError> {
        let invalid = |e: DocsError| RegistrationError::invalid_declaration("open-api", e.to_string());
        let document = self.document(registry, middleware).map_err(invalid)?;
        let json: Arc<str> = document.to_json().map_err(invalid)?.into();
        let yaml: Arc<str> = document.to_yaml().map_err(invalid)?.into();

        let [open_api_json, open_api_yaml, swagger_json, swagger_yaml] = self.paths();
        for (path, body, content_type) in [
            (open_api_json, &json, heron_docs::DEFAULT_CONTENT_TYPE),
            (open_api_yaml, &yaml, YAML_CONTENT_TYPE),
            (swagger_json, &json, heron_docs::DEFAULT_CONTENT_TYPE),
            (swagger_yaml, &yaml, YAML_CONTENT_TYPE),
        ] {
            let body = Arc::clone(body);
            let middleware = Arc::clone(middleware);
            let authenticate = self.use_authentication;
            engine.get(
                &path,
                route_handler(move |request, response| {
                    let body = Arc::clone(&body);
                    let middleware = Arc::clone(&middleware);
                    async move {
                        if authenticate {
                            middleware.authenticate(&request).await?;
                        }
                        response.set_content_type(content_type)?;
                        response.send(Reply::text(&*body))
                    }
                }),
            )?;
        }
        tracing::debug!(base = %self.base, authenticated = self.use_authentication, "mounted API document routes");
        Ok(())
    }
}
