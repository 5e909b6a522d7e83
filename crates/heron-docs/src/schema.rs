//! Schema derivation from type tokens, shapes and examples.

use heron_extract::{Field, FieldKind, Shape};
use serde_json::Value;

use crate::openapi::Schema;

/// Maps a primitive type token to a schema.
///
/// Tokens are matched ignoring ASCII case. Returns `None` for unknown tokens.
///
/// | Token | Schema |
/// |-------|--------|
/// | `string` | `string` |
/// | `number` | `number` |
/// | `integer`, `int` | `integer` |
/// | `boolean` | `boolean` |
/// | `object` | `object` |
/// | `array` | `array` of anything |
/// | `array-<primitive>` | `array` of that primitive |
/// | `file` | `string` with `binary` format |
#[must_use]
pub fn schema_for_token(token: &str) -> Option<Schema> {
    let token = token.trim().to_ascii_lowercase();
    if let Some(items) = token.strip_prefix("array-") {
        return primitive(items).map(Schema::array);
    }
    match token.as_str() {
        "array" => Some(Schema::array(Schema::default())),
        "file" => Some(Schema {
            format: Some("binary".to_string()),
            ..Schema::string()
        }),
        other => primitive(other),
    }
}

fn primitive(token: &str) -> Option<Schema> {
    match token {
        "string" => Some(Schema::string()),
        "number" => Some(Schema::number()),
        "integer" | "int" => Some(Schema::integer()),
        "boolean" => Some(Schema::boolean()),
        "object" => Some(Schema::object()),
        _ => None,
    }
}

/// Builds an object schema from a shape, field by field.
///
/// Unsupported fields are dropped, from both `properties` and `required`.
#[must_use]
pub fn schema_for_shape(shape: &Shape) -> Schema {
    let mut schema = Schema::object();
    for (name, field) in shape.fields() {
        let Some(property) = schema_for_field(field) else {
            continue;
        };
        if field.is_required() {
            schema.required.push(name.clone());
        }
        schema.properties.insert(name.clone(), property);
    }
    schema
}

/// Builds the schema of one field, or `None` if its kind, or the item kind
/// of an array, is unsupported.
#[must_use]
pub fn schema_for_field(field: &Field) -> Option<Schema> {
    let mut schema = schema_for_kind(field.kind())?;

    schema.description = field.description_text().map(ToString::to_string);
    schema.enum_values = field.allowed_values().to_vec();

    let (min_length, max_length) = field.length_bounds();
    schema.min_length = min_length.map(|n| n as u64);
    schema.max_length = max_length.map(|n| n as u64);

    let (minimum, maximum) = field.numeric_bounds();
    schema.minimum = minimum;
    schema.maximum = maximum;
    schema.pattern = field.pattern_source().map(ToString::to_string);

    schema.example = match (field.example_value(), field.kind()) {
        (Some(example), _) => Some(example.clone()),
        (None, kind @ (FieldKind::Object(_) | FieldKind::Array(_))) => {
            Some(heron_extract::shape::placeholder(kind))
        }
        (None, _) => None,
    };
    Some(schema)
}

fn schema_for_kind(kind: &FieldKind) -> Option<Schema> {
    match kind {
        FieldKind::String => Some(Schema::string()),
        FieldKind::Number => Some(Schema::number()),
        FieldKind::Integer => Some(Schema::integer()),
        FieldKind::Boolean => Some(Schema::boolean()),
        FieldKind::Object(shape) => Some(schema_for_shape(shape)),
        FieldKind::Array(items) => schema_for_kind(items).map(Schema::array),
        FieldKind::Any => Some(Schema::default()),
        FieldKind::Unsupported => None,
    }
}

/// Infers a schema from an example value.
///
/// `null` carries no type and yields an empty schema. Arrays take their item
/// schema from the first element.
#[must_use]
pub fn schema_for_example(example: &Value) -> Schema {
    match example {
        Value::Null => Schema::default(),
        Value::Bool(_) => Schema::boolean(),
        Value::Number(n) if n.is_i64() || n.is_u64() => Schema::integer(),
        Value::Number(_) => Schema::number(),
        Value::String(_) => Schema::string(),
        Value::Array(items) => {
            Schema::array(items.first().map(schema_for_example).unwrap_or_default())
        }
        Value::Object(map) => map.iter().fold(Schema::object(), |schema, (key, value)| {
            schema.property(key.clone(), schema_for_example(value))
        }),
    }
}
