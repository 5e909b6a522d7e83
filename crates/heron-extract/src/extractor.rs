//! Positional parameter extractors.
//!
//! Every parameter of an endpoint method is bound by position to at most one
//! [`ParameterExtractor`]. At dispatch time the pipeline runs the extractors
//! in slot order and passes the produced [`ArgValue`]s to the method.

use std::fmt;
use std::sync::Arc;

use heron_core::{ArgValue, HeronError, RegistrationError};
use serde_json::Value;

use crate::body::BodyExtractor;
use crate::context::ExtractionContext;
use crate::shape::{Shape, ValidationOptions};

/// Where an extractor reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractorSource {
    /// A path parameter.
    Path,
    /// A query string parameter.
    Query,
    /// A request header.
    Header,
    /// The decoded body bytes.
    RawBody,
    /// The parsed (and possibly validated) body.
    Body,
    /// The request itself.
    Request,
    /// The response handle.
    Response,
    /// The authenticated principal.
    Principal,
}

impl ExtractorSource {
    /// Returns `true` for sources that are not documented as parameters.
    #[must_use]
    pub fn is_virtual(self) -> bool {
        !matches!(self, Self::Path | Self::Query | Self::Header)
    }

    /// Returns the `in` value used in API documents.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::RawBody => "rawBody",
            Self::Body => "body",
            Self::Request => "request",
            Self::Response => "response",
            Self::Principal => "principal",
        }
    }
}

impl fmt::Display for ExtractorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Documentation attached to a parameter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiParam {
    /// Human-readable description.
    pub description: Option<String>,
    /// Primitive type token such as `string` or `integer`.
    pub type_token: Option<String>,
    /// Example value.
    pub example: Option<Value>,
    /// Whether the parameter is required. Path parameters always are.
    pub required: Option<bool>,
}

impl ApiParam {
    /// Creates empty parameter info.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the primitive type token.
    #[must_use]
    pub fn type_token(mut self, token: impl Into<String>) -> Self {
        self.type_token = Some(token.into());
        self
    }

    /// Sets the example.
    #[must_use]
    pub fn example(mut self, example: Value) -> Self {
        self.example = Some(example);
        self
    }

    /// Sets the required flag.
    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }
}

/// A named lookup with optional documentation.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedParam {
    name: String,
    info: ApiParam,
}

impl NamedParam {
    /// Returns the lookup key.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the documentation.
    #[must_use]
    pub fn info(&self) -> &ApiParam {
        &self.info
    }
}

/// Produces one positional argument from a request.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use heron_core::{ArgValue, Request, Response};
/// use heron_extract::{ExtractionContext, ParameterExtractor};
///
/// let request = Arc::new(Request::builder().path("/items/42").path_param("id", "42").build());
/// let response = Response::new();
/// let ctx = ExtractionContext::new(&request, &response, None);
///
/// let value = ParameterExtractor::path("id").extract(&ctx).unwrap();
/// assert!(matches!(value, ArgValue::Text(ref s) if s == "42"));
///
/// let missing = ParameterExtractor::query("limit").extract(&ctx).unwrap();
/// assert!(missing.is_absent());
/// ```
#[derive(Debug, Clone)]
pub enum ParameterExtractor {
    /// A path parameter by name.
    Path(NamedParam),
    /// A query parameter by name.
    Query(NamedParam),
    /// A header by name, matched case-insensitively.
    Header(NamedParam),
    /// The decoded body bytes.
    RawBody,
    /// The body, untyped or validated.
    Body(Arc<BodyExtractor>),
    /// The request.
    Request,
    /// The response.
    Response,
    /// The principal.
    Principal,
}

impl ParameterExtractor {
    /// Extracts a path parameter.
    #[must_use]
    pub fn path(name: impl Into<String>) -> Self {
        Self::Path(named(name))
    }

    /// Extracts a query parameter.
    #[must_use]
    pub fn query(name: impl Into<String>) -> Self {
        Self::Query(named(name))
    }

    /// Extracts a header.
    #[must_use]
    pub fn header(name: impl Into<String>) -> Self {
        Self::Header(named(name))
    }

    /// Extracts the raw body.
    #[must_use]
    pub fn raw_body() -> Self {
        Self::RawBody
    }

    /// Extracts the untyped body.
    #[must_use]
    pub fn body() -> Self {
        Self::Body(Arc::new(BodyExtractor::untyped()))
    }

    /// Extracts the body validated against `shape`.
    #[must_use]
    pub fn typed_body(shape: Shape) -> Self {
        Self::Body(Arc::new(BodyExtractor::typed(shape)))
    }

    /// Extracts the body validated against `shape` with explicit options.
    #[must_use]
    pub fn typed_body_with(shape: Shape, options: ValidationOptions) -> Self {
        Self::Body(Arc::new(BodyExtractor::typed_with(shape, options)))
    }

    /// Passes the request through.
    #[must_use]
    pub fn request() -> Self {
        Self::Request
    }

    /// Passes the response through.
    #[must_use]
    pub fn response() -> Self {
        Self::Response
    }

    /// Passes the principal through.
    #[must_use]
    pub fn principal() -> Self {
        Self::Principal
    }

    /// Attaches documentation. Ignored by virtual extractors.
    #[must_use]
    pub fn with_info(mut self, info: ApiParam) -> Self {
        if let Self::Path(p) | Self::Query(p) | Self::Header(p) = &mut self {
            p.info = info;
        }
        self
    }

    /// Returns where this extractor reads from.
    #[must_use]
    pub fn source(&self) -> ExtractorSource {
        match self {
            Self::Path(_) => ExtractorSource::Path,
            Self::Query(_) => ExtractorSource::Query,
            Self::Header(_) => ExtractorSource::Header,
            Self::RawBody => ExtractorSource::RawBody,
            Self::Body(_) => ExtractorSource::Body,
            Self::Request => ExtractorSource::Request,
            Self::Response => ExtractorSource::Response,
            Self::Principal => ExtractorSource::Principal,
        }
    }

    /// Returns `true` for extractors not documented as parameters.
    #[must_use]
    pub fn is_virtual(&self) -> bool {
        self.source().is_virtual()
    }

    /// Returns the named lookup for path, query and header extractors.
    #[must_use]
    pub fn named(&self) -> Option<&NamedParam> {
        match self {
            Self::Path(p) | Self::Query(p) | Self::Header(p) => Some(p),
            _ => None,
        }
    }

    /// Returns the body extractor, if this is one.
    #[must_use]
    pub fn body_extractor(&self) -> Option<&BodyExtractor> {
        match self {
            Self::Body(body) => Some(body),
            _ => None,
        }
    }

    /// Checks the extractor is well formed.
    pub fn validate(&self) -> Result<(), RegistrationError> {
        match self.named() {
            Some(p) if p.name.trim().is_empty() => Err(RegistrationError::invalid_declaration(
                format!("{} extractor", self.source()),
                "parameter name must not be blank",
            )),
            _ => Ok(()),
        }
    }

    /// Produces the argument for one dispatch.
    pub fn extract(&self, ctx: &ExtractionContext<'_>) -> Result<ArgValue, HeronError> {
        let request = ctx.request();
        let text = |value: Option<&str>| value.map_or(ArgValue::Absent, |v| ArgValue::Text(v.to_string()));

        match self {
            Self::Path(p) => Ok(text(request.path_param(&p.name))),
            Self::Query(p) => Ok(text(request.query(&p.name))),
            Self::Header(p) => Ok(text(request.header(&p.name))),
            Self::RawBody => request.raw_body().map(ArgValue::Bytes),
            Self::Body(body) => body.extract(request),
            Self::Request => Ok(ArgValue::Request(Arc::clone(request))),
            Self::Response => Ok(ArgValue::Response(ctx.response().clone())),
            Self::Principal => Ok(ctx
                .principal()
                .map_or(ArgValue::Absent, |p| ArgValue::Principal(Arc::clone(p)))),
        }
    }
}

fn named(name: impl Into<String>) -> NamedParam {
    NamedParam {
        name: name.into(),
        info: ApiParam::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Field;
    use heron_core::{Principal, Request, Response};
    use heron_router::Params;
    use serde_json::json;

    fn request() -> Arc<Request> {
        let mut params = Params::new();
        params.push("id", "42");
        let event = heron_core::ApiRequest {
            headers: [
                ("X-Tenant".to_string(), "acme".to_string()),
                ("Content-Type".to_string(), "application/json".to_string()),
            ]
            .into_iter()
            .collect(),
            query_string_parameters: [("limit".to_string(), "10".to_string())]
                .into_iter()
                .collect(),
            body: Some(r#"{"qty":3}"#.to_string()),
            ..heron_core::ApiRequest::new("POST", "/items/42")
        };
        Arc::new(Request::from_event(&event, params).unwrap())
    }

    #[test]
    fn test_string_sources() {
        let request = request();
        let response = Response::new();
        let ctx = ExtractionContext::new(&request, &response, None);

        let cases = [
            (ParameterExtractor::path("id"), "42"),
            (ParameterExtractor::query("limit"), "10"),
            (ParameterExtractor::header("x-tenant"), "acme"),
        ];
        for (extractor, expected) in cases {
            match extractor.extract(&ctx).unwrap() {
                ArgValue::Text(value) => assert_eq!(value, expected),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_missing_string_is_absent() {
        let request = request();
        let response = Response::new();
        let ctx = ExtractionContext::new(&request, &response, None);
        assert!(ParameterExtractor::header("x-missing").extract(&ctx).unwrap().is_absent());
        assert!(ParameterExtractor::path("other").extract(&ctx).unwrap().is_absent());
    }

    #[test]
    fn test_raw_body() {
        let request = Arc::new(
            Request::builder()
                .body("AQI=")
                .base64_encoded(true)
                .build(),
        );
        let response = Response::new();
        let ctx = ExtractionContext::new(&request, &response, None);
        match ParameterExtractor::raw_body().extract(&ctx).unwrap() {
            ArgValue::Bytes(bytes) => assert_eq!(bytes, bytes::Bytes::from_static(b"\x01\x02")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_typed_body() {
        let request = request();
        let response = Response::new();
        let ctx = ExtractionContext::new(&request, &response, None);
        let extractor = ParameterExtractor::typed_body(Shape::new("Qty").field("qty", Field::integer()));
        match extractor.extract(&ctx).unwrap() {
            ArgValue::Json(value) => assert_eq!(value, json!({"qty": 3})),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_ambient_sources() {
        let request = request();
        let response = Response::new();
        let principal = Arc::new(Principal::new("alice"));
        let ctx = ExtractionContext::new(&request, &response, Some(&principal));

        assert!(matches!(
            ParameterExtractor::request().extract(&ctx).unwrap(),
            ArgValue::Request(r) if Arc::ptr_eq(&r, &request)
        ));
        assert!(matches!(
            ParameterExtractor::response().extract(&ctx).unwrap(),
            ArgValue::Response(_)
        ));
        assert!(matches!(
            ParameterExtractor::principal().extract(&ctx).unwrap(),
            ArgValue::Principal(p) if p.name() == "alice"
        ));
    }

    #[test]
    fn test_principal_absent_without_auth() {
        let request = request();
        let response = Response::new();
        let ctx = ExtractionContext::new(&request, &response, None);
        assert!(ParameterExtractor::principal().extract(&ctx).unwrap().is_absent());
    }

    #[test]
    fn test_virtual_sources() {
        assert!(!ParameterExtractor::path("id").is_virtual());
        assert!(!ParameterExtractor::query("q").is_virtual());
        assert!(!ParameterExtractor::header("h").is_virtual());
        assert!(ParameterExtractor::raw_body().is_virtual());
        assert!(ParameterExtractor::body().is_virtual());
        assert!(ParameterExtractor::request().is_virtual());
        assert!(ParameterExtractor::response().is_virtual());
        assert!(ParameterExtractor::principal().is_virtual());
    }

    #[test]
    fn test_with_info_and_validate() {
        let extractor = ParameterExtractor::query("limit")
            .with_info(ApiParam::new().type_token("integer").description("page size"));
        let named = extractor.named().unwrap();
        assert_eq!(named.info().type_token.as_deref(), Some("integer"));
        assert!(extractor.validate().is_ok());

        assert!(ParameterExtractor::path("  ").validate().is_err());
    }
}
