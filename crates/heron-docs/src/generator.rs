//! OpenAPI synthesis from a frozen registry.
//!
//! The generator never runs an endpoint. It reads descriptors, extractor
//! slots and the registered auth schemes, and nothing else.

use heron_extract::{ApiParam, ExtractorSource, ParameterExtractor};
use heron_middleware::{AuthScheme, MiddlewareRegistry};
use heron_registry::{ApiBody, EndpointRef, Registry};
use heron_router::path;
use indexmap::IndexMap;
use std::collections::HashSet;

use crate::error::{DocsError, DocsResult};
use crate::openapi::{
    Components, Info, MediaType, OpenApi, Operation, Parameter, ParameterIn, PathItem,
    RequestBody, Response, Schema, SecurityRequirement, SecurityScheme, Server, Tag,
};
use crate::schema::{schema_for_example, schema_for_shape, schema_for_token};

/// Content type used when neither the endpoint nor its controller declares one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// OpenAPI version emitted by the generator.
pub const OPENAPI_VERSION: &str = "3.0.3";

/// Builds an [`OpenApi`] document from registry metadata.
///
/// # Example
///
/// ```rust
/// use heron_docs::OpenApiGenerator;
/// use heron_middleware::MiddlewareRegistry;
/// use heron_registry::Registry;
///
/// let registry = Registry::new();
/// let doc = OpenApiGenerator::new()
///     .title("Shop")
///     .version("2.1")
///     .generate(&registry, &MiddlewareRegistry::new())
///     .unwrap();
///
/// assert_eq!(doc.info.title, "Shop");
/// assert!(doc.paths.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct OpenApiGenerator {
    title: String,
    version: String,
    description: Option<String>,
    servers: Vec<Server>,
    default_content_type: String,
}

impl Default for OpenApiGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenApiGenerator {
    /// Create a new generator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            title: "API".to_string(),
            version: "1.0".to_string(),
            description: None,
            servers: Vec::new(),
            default_content_type: DEFAULT_CONTENT_TYPE.to_string(),
        }
    }

    /// Set the API title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the API version.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set the API description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a server.
    #[must_use]
    pub fn server(mut self, url: impl Into<String>, description: Option<String>) -> Self {
        self.servers.push(Server {
            url: url.into(),
            description,
        });
        self
    }

    /// Set the content type backfilled into bodies that declare none.
    #[must_use]
    pub fn default_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.default_content_type = content_type.into();
        self
    }

    /// Generates the document.
    ///
    /// Fails if a documented endpoint has no HTTP method, or one the
    /// document model cannot hold.
    pub fn generate(
        &self,
        registry: &Registry,
        middleware: &MiddlewareRegistry,
    ) -> DocsResult<OpenApi> {
        let schemes = middleware.schemes();
        let security_schemes: IndexMap<String, SecurityScheme> = schemes
            .iter()
            .map(|scheme| (scheme.component_name(), security_scheme(scheme)))
            .collect();
        // Filters are tried in turn, so any one scheme suffices.
        let requirements: Vec<SecurityRequirement> = security_schemes
            .keys()
            .map(|name| SecurityRequirement::from([(name.clone(), Vec::new())]))
            .collect();

        let mut paths: IndexMap<String, PathItem> = IndexMap::new();
        let mut tags: Vec<Tag> = Vec::new();
        let mut seen_tags: HashSet<String> = HashSet::new();

        for endpoint in registry.endpoints().filter(|e| !e.is_ignored()) {
            let method = endpoint
                .endpoint
                .http_method()
                .map(str::to_ascii_lowercase)
                .ok_or_else(|| DocsError::InvalidOperation {
                    operation_id: endpoint.id().to_string(),
                    reason: "no HTTP method declared".to_string(),
                })?;

            let mut operation = self.operation(endpoint);
            if endpoint.skips_auth() {
                operation.security = Some(Vec::new());
            } else if !requirements.is_empty() {
                operation.security = Some(requirements.clone());
            }

            if let Some(api_name) = endpoint.controller.api().name.as_deref() {
                if seen_tags.insert(api_name.to_string()) {
                    tags.push(Tag {
                        name: api_name.to_string(),
                        description: endpoint.controller.api().description.clone(),
                    });
                }
            }

            let key = path::to_template(path::trim_trailing_slash(&endpoint.full_path()));
            let slot = paths
                .entry(key)
                .or_default()
                .slot_mut(&method)
                .ok_or_else(|| DocsError::InvalidOperation {
                    operation_id: endpoint.id().to_string(),
                    reason: format!("unsupported HTTP method: {method}"),
                })?;
            if slot.is_some() {
                tracing::debug!(
                    endpoint = endpoint.id(),
                    method = %method,
                    "replacing an earlier operation on the same path"
                );
            }
            *slot = Some(operation);
        }

        let components = (!security_schemes.is_empty()).then(|| Components { security_schemes });

        Ok(OpenApi {
            openapi: OPENAPI_VERSION.to_string(),
            info: Info {
                title: self.title.clone(),
                version: self.version.clone(),
                description: self.description.clone(),
            },
            servers: self.servers.clone(),
            paths,
            components,
            tags,
        })
    }

    fn operation(&self, endpoint: EndpointRef<'_>) -> Operation {
        let merged = endpoint.operation();
        let produces = endpoint.produces().unwrap_or(self.default_content_type.as_str());
        let consumes = endpoint.consumes().unwrap_or(self.default_content_type.as_str());

        let parameters = endpoint
            .endpoint
            .extractors()
            .iter()
            .flatten()
            .filter_map(parameter)
            .collect();

        let request_body = merged
            .request
            .or_else(|| typed_body(endpoint))
            .map(|body| {
                let (content_type, media) = media_type(&body, consumes);
                RequestBody {
                    description: body.description.clone(),
                    required: true,
                    content: IndexMap::from([(content_type, media)]),
                }
            });

        let mut responses: IndexMap<String, Response> = merged
            .responses
            .iter()
            .map(|(status, body)| {
                let (content_type, media) = media_type(body, produces);
                let response = Response {
                    description: body
                        .description
                        .clone()
                        .unwrap_or_else(|| format!("{status} response")),
                    content: IndexMap::from([(content_type, media)]),
                };
                (status.clone(), response)
            })
            .collect();
        if responses.is_empty() {
            responses.insert(
                "200".to_string(),
                Response {
                    description: "Successful response".to_string(),
                    content: IndexMap::new(),
                },
            );
        }

        Operation {
            operation_id: merged.name.or_else(|| Some(endpoint.endpoint.method_name().to_string())),
            summary: merged.description,
            tags: endpoint.controller.api().name.iter().cloned().collect(),
            parameters,
            request_body,
            responses,
            security: None,
        }
    }
}

/// The request body implied by a typed body extractor, when none is declared.
fn typed_body(endpoint: EndpointRef<'_>) -> Option<ApiBody> {
    endpoint
        .endpoint
        .extractors()
        .iter()
        .flatten()
        .filter_map(ParameterExtractor::body_extractor)
        .find_map(|body| body.shape().cloned())
        .map(|shape| ApiBody::new().shape(shape))
}

fn parameter(extractor: &ParameterExtractor) -> Option<Parameter> {
    let location = match extractor.source() {
        ExtractorSource::Path => ParameterIn::Path,
        ExtractorSource::Query => ParameterIn::Query,
        ExtractorSource::Header => ParameterIn::Header,
        _ => return None,
    };
    let named = extractor.named()?;
    let info: &ApiParam = named.info();

    Some(Parameter {
        name: named.name().to_string(),
        location,
        description: info.description.clone(),
        required: location == ParameterIn::Path || info.required.unwrap_or(false),
        schema: Some(
            info.type_token
                .as_deref()
                .and_then(schema_for_token)
                .or_else(|| info.example.as_ref().map(schema_for_example))
                .unwrap_or_else(Schema::string),
        ),
        example: info.example.clone(),
    })
}

/// Describes a body under its declared content type, else `fallback`.
///
/// The schema comes from the shape, else the type token, else the example.
/// A declared example is used verbatim; shapes without one get a generated
/// example.
fn media_type(body: &ApiBody, fallback: &str) -> (String, MediaType) {
    let schema = body
        .shape
        .as_ref()
        .map(schema_for_shape)
        .or_else(|| body.type_token.as_deref().and_then(schema_for_token))
        .or_else(|| body.example.as_ref().map(schema_for_example));
    let example = body
        .example
        .clone()
        .or_else(|| body.shape.as_ref().map(heron_extract::Shape::example));
    let content_type = body
        .content_type
        .clone()
        .unwrap_or_else(|| fallback.to_string());
    (content_type, MediaType { schema, example })
}

fn security_scheme(scheme: &AuthScheme) -> SecurityScheme {
    match scheme {
        AuthScheme::Http {
            scheme,
            bearer_format,
        } => SecurityScheme {
            scheme_type: "http".to_string(),
            description: None,
            scheme: Some(scheme.clone()),
            bearer_format: bearer_format.clone(),
            location: None,
            name: None,
        },
        AuthScheme::ApiKey { location, name } => SecurityScheme {
            scheme_type: "apiKey".to_string(),
            description: None,
            scheme: None,
            bearer_format: None,
            location: Some(location.as_str().to_string()),
            name: Some(name.clone()),
        },
    }
}
