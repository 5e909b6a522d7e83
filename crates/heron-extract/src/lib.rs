//! # Heron Extract
//!
//! Positional parameter extractors for Heron endpoints.
//!
//! Each parameter of an endpoint method is bound to one extractor. The
//! dispatch pipeline runs them eagerly, in slot order, before the method is
//! invoked.
//!
//! | Extractor | Source | Produces |
//! |-----------|--------|----------|
//! | [`ParameterExtractor::path`] | path parameter | text or absent |
//! | [`ParameterExtractor::query`] | query string | text or absent |
//! | [`ParameterExtractor::header`] | header (any case) | text or absent |
//! | [`ParameterExtractor::raw_body`] | body | decoded bytes |
//! | [`ParameterExtractor::body`] | body | parsed JSON or text |
//! | [`ParameterExtractor::typed_body`] | body | validated JSON |
//! | [`ParameterExtractor::request`] | ambient | the request |
//! | [`ParameterExtractor::response`] | ambient | the response |
//! | [`ParameterExtractor::principal`] | ambient | the principal |
//!
//! Typed bodies are described by a [`Shape`]. The same shape feeds the API
//! document generator, so what is validated is what is documented.

#![doc(html_root_url = "https://docs.rs/heron-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod body;
mod context;
mod extractor;
pub mod shape;

pub use body::BodyExtractor;
pub use context::ExtractionContext;
pub use extractor::{ApiParam, ExtractorSource, NamedParam, ParameterExtractor};
pub use shape::{Field, FieldKind, Shape, ValidationOptions};
