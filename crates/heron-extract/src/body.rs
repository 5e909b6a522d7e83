//! Body extraction.
//!
//! Untyped extraction hands the endpoint whatever the request carried: parsed
//! JSON for JSON-typed requests, the text otherwise. Typed extraction coerces
//! the parsed body into a [`Shape`] and rejects it with a validation error
//! listing every problem found.

use heron_core::{ArgValue, HeronError, Request};
use serde_json::Value;

use crate::shape::{Shape, ValidationOptions};

/// Extracts the request body, optionally validated against a shape.
#[derive(Debug, Clone, Default)]
pub struct BodyExtractor {
    shape: Option<Shape>,
    options: ValidationOptions,
}

impl BodyExtractor {
    /// An untyped body extractor.
    #[must_use]
    pub fn untyped() -> Self {
        Self::default()
    }

    /// A typed extractor with default validation options.
    #[must_use]
    pub fn typed(shape: Shape) -> Self {
        Self::typed_with(shape, ValidationOptions::default())
    }

    /// A typed extractor with explicit validation options.
    #[must_use]
    pub fn typed_with(shape: Shape, options: ValidationOptions) -> Self {
        Self {
            shape: Some(shape),
            options,
        }
    }

    /// Returns the declared shape, if typed.
    #[must_use]
    pub fn shape(&self) -> Option<&Shape> {
        self.shape.as_ref()
    }

    /// Returns the validation options.
    #[must_use]
    pub fn options(&self) -> ValidationOptions {
        self.options
    }

    /// Extracts the body from `request`.
    pub fn extract(&self, request: &Request) -> Result<ArgValue, HeronError> {
        let parsed = request.parsed_body()?;

        let Some(shape) = &self.shape else {
            return Ok(parsed.map_or(ArgValue::Absent, ArgValue::Json));
        };

        let value = match parsed {
            Some(value) => value,
            None if self.options.skip_missing_fields => return Ok(ArgValue::Absent),
            None => {
                return Err(HeronError::validation(
                    "request body is required",
                    vec![format!("{} body is required", shape.name())],
                ))
            }
        };

        // text bodies may still hold JSON when the client omitted the content type
        let value = match value {
            Value::String(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
            other => other,
        };

        shape
            .validate(&value, self.options)
            .map(ArgValue::Json)
            .map_err(|messages| HeronError::validation("request body failed validation", messages))
    }
}
