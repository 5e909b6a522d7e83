//! API document metadata carried by descriptors.

use heron_extract::Shape;
use indexmap::IndexMap;
use serde_json::Value;

/// Controller-level API metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiInfo {
    /// Name used as the tag of every operation of the controller.
    pub name: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
}

/// A documented request or response body.
///
/// The schema comes from the first of `shape`, `type_token` or `example`
/// that is present.
#[derive(Debug, Clone, Default)]
pub struct ApiBody {
    /// Human-readable description.
    pub description: Option<String>,
    /// Media type. Backfilled from the endpoint when unset.
    pub content_type: Option<String>,
    /// Primitive type token such as `string` or `array-object`.
    pub type_token: Option<String>,
    /// Declared structure.
    pub shape: Option<Shape>,
    /// Example value, used verbatim.
    pub example: Option<Value>,
}

impl ApiBody {
    /// Creates an empty body description.
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

    /// Sets the media type.
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Sets the primitive type token.
    #[must_use]
    pub fn type_token(mut self, token: impl Into<String>) -> Self {
        self.type_token = Some(token.into());
        self
    }

    /// Sets the shape.
    #[must_use]
    pub fn shape(mut self, shape: Shape) -> Self {
        self.shape = Some(shape);
        self
    }

    /// Sets the example.
    #[must_use]
    pub fn example(mut self, example: Value) -> Self {
        self.example = Some(example);
        self
    }
}

/// Operation metadata, declared on endpoints and as controller defaults.
#[derive(Debug, Clone, Default)]
pub struct ApiOperation {
    /// Operation id.
    pub name: Option<String>,
    /// Summary text.
    pub description: Option<String>,
    /// Request body.
    pub request: Option<ApiBody>,
    /// Responses keyed by status code.
    pub responses: IndexMap<String, ApiBody>,
}

impl ApiOperation {
    /// Merges controller defaults with endpoint metadata.
    ///
    /// The endpoint wins on name, description and request body. Responses
    /// are unioned by status, the endpoint winning on a clash.
    #[must_use]
    pub fn merged(defaults: &Self, endpoint: &Self) -> Self {
        let mut responses = defaults.responses.clone();
        for (status, body) in &endpoint.responses {
            responses.insert(status.clone(), body.clone());
        }
        Self {
            name: endpoint.name.clone().or_else(|| defaults.name.clone()),
            description: endpoint
                .description
                .clone()
                .or_else(|| defaults.description.clone()),
            request: endpoint.request.clone().or_else(|| defaults.request.clone()),
            responses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_endpoint_wins() {
        let mut defaults = ApiOperation {
            name: Some("default".to_string()),
            description: Some("controller text".to_string()),
            request: Some(ApiBody::new().type_token("string")),
            ..ApiOperation::default()
        };
        defaults
            .responses
            .insert("200".to_string(), ApiBody::new().description("controller ok"));
        defaults
            .responses
            .insert("500".to_string(), ApiBody::new().description("boom"));

        let mut endpoint = ApiOperation {
            name: Some("getItem".to_string()),
            ..ApiOperation::default()
        };
        endpoint
            .responses
            .insert("200".to_string(), ApiBody::new().description("the item"));

        let merged = ApiOperation::merged(&defaults, &endpoint);
        assert_eq!(merged.name.as_deref(), Some("getItem"));
        assert_eq!(merged.description.as_deref(), Some("controller text"));
        assert_eq!(merged.request.unwrap().type_token.as_deref(), Some("string"));
        assert_eq!(merged.responses.len(), 2);
        assert_eq!(merged.responses["200"].description.as_deref(), Some("the item"));
        assert_eq!(merged.responses["500"].description.as_deref(), Some("boom"));
    }
}
