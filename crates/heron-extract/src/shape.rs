//! Declared body shapes.
//!
//! A [`Shape`] describes the structure a request body (or a documented
//! response) is expected to have. The same description drives two things:
//! coercion and field validation of incoming bodies, and schema and example
//! generation when the API document is synthesized.

use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Number, Value};

/// The kind of value a field holds.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// A string.
    String,
    /// Any JSON number.
    Number,
    /// A whole number.
    Integer,
    /// `true` or `false`.
    Boolean,
    /// A nested object.
    Object(Shape),
    /// An array whose elements share one kind.
    Array(Box<FieldKind>),
    /// Anything; not checked.
    Any,
    /// A kind that cannot be described, such as a callback. Ignored by
    /// validation and left out of generated schemas.
    Unsupported,
}

impl FieldKind {
    fn describe(&self) -> &'static str {
        match self {
            Self::String => "a string",
            Self::Number => "a number",
            Self::Integer => "an integer",
            Self::Boolean => "a boolean",
            Self::Object(_) => "an object",
            Self::Array(_) => "an array",
            Self::Any | Self::Unsupported => "a value",
        }
    }
}

/// One declared field.
#[derive(Debug, Clone)]
pub struct Field {
    kind: FieldKind,
    required: bool,
    description: Option<String>,
    example: Option<Value>,
    min_length: Option<usize>,
    max_length: Option<usize>,
    minimum: Option<f64>,
    maximum: Option<f64>,
    pattern: Option<Regex>,
    one_of: Vec<Value>,
}

impl Field {
    /// Creates a required field of the given kind.
    #[must_use]
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            required: true,
            description: None,
            example: None,
            min_length: None,
            max_length: None,
            minimum: None,
            maximum: None,
            pattern: None,
            one_of: Vec::new(),
        }
    }

    /// A required string field.
    #[must_use]
    pub fn string() -> Self {
        Self::new(FieldKind::String)
    }

    /// A required number field.
    #[must_use]
    pub fn number() -> Self {
        Self::new(FieldKind::Number)
    }

    /// A required integer field.
    #[must_use]
    pub fn integer() -> Self {
        Self::new(FieldKind::Integer)
    }

    /// A required boolean field.
    #[must_use]
    pub fn boolean() -> Self {
        Self::new(FieldKind::Boolean)
    }

    /// A required nested object field.
    #[must_use]
    pub fn object(shape: Shape) -> Self {
        Self::new(FieldKind::Object(shape))
    }

    /// A required array field.
    #[must_use]
    pub fn array(items: FieldKind) -> Self {
        Self::new(FieldKind::Array(Box::new(items)))
    }

    /// Marks the field optional.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Sets the documentation text.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the documentation example.
    #[must_use]
    pub fn example(mut self, example: Value) -> Self {
        self.example = Some(example);
        self
    }

    /// Minimum length of a string or array.
    #[must_use]
    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    /// Maximum length of a string or array.
    #[must_use]
    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Inclusive lower bound of a number.
    #[must_use]
    pub fn minimum(mut self, min: f64) -> Self {
        self.minimum = Some(min);
        self
    }

    /// Inclusive upper bound of a number.
    #[must_use]
    pub fn maximum(mut self, max: f64) -> Self {
        self.maximum = Some(max);
        self
    }

    /// Pattern a string must match.
    #[must_use]
    pub fn pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }

    /// Restricts the field to a fixed set of values.
    #[must_use]
    pub fn one_of<I: IntoIterator<Item = Value>>(mut self, values: I) -> Self {
        self.one_of = values.into_iter().collect();
        self
    }

    /// Returns the field kind.
    #[must_use]
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Returns whether the field is required.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Returns the documentation text.
    #[must_use]
    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the documentation example.
    #[must_use]
    pub fn example_value(&self) -> Option<&Value> {
        self.example.as_ref()
    }

    /// Returns the allowed values, empty when unrestricted.
    #[must_use]
    pub fn allowed_values(&self) -> &[Value] {
        &self.one_of
    }

    /// Returns the `(min_length, max_length)` bounds.
    #[must_use]
    pub fn length_bounds(&self) -> (Option<usize>, Option<usize>) {
        (self.min_length, self.max_length)
    }

    /// Returns the `(minimum, maximum)` bounds.
    #[must_use]
    pub fn numeric_bounds(&self) -> (Option<f64>, Option<f64>) {
        (self.minimum, self.maximum)
    }

    /// Returns the pattern source, if any.
    #[must_use]
    pub fn pattern_source(&self) -> Option<&str> {
        self.pattern.as_ref().map(Regex::as_str)
    }
}

/// Options controlling body coercion and validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Reject properties the shape does not declare.
    pub forbid_unknown_fields: bool,
    /// Silently drop undeclared properties when they are not forbidden.
    pub strip_unknown_fields: bool,
    /// Do not report missing required fields.
    pub skip_missing_fields: bool,
    /// Convert strings to numbers and booleans where the shape asks for them.
    pub implicit_conversion: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            forbid_unknown_fields: true,
            strip_unknown_fields: false,
            skip_missing_fields: false,
            implicit_conversion: false,
        }
    }
}

impl ValidationOptions {
    /// Options that accept unknown fields and keep them.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            forbid_unknown_fields: false,
            ..Self::default()
        }
    }
}

/// A named object structure.
///
/// # Example
///
/// ```rust
/// use heron_extract::{Field, Shape, ValidationOptions};
/// use serde_json::json;
///
/// let shape = Shape::new("Order")
///     .field("sku", Field::string().min_length(1))
///     .field("qty", Field::integer().minimum(1.0));
///
/// assert!(shape.validate(&json!({"sku": "A1", "qty": 2}), ValidationOptions::default()).is_ok());
///
/// let errors = shape
///     .validate(&json!({"sku": "", "qty": 0, "gift": true}), ValidationOptions::default())
///     .unwrap_err();
/// assert_eq!(errors.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct Shape {
    name: String,
    fields: IndexMap<String, Field>,
}

impl Shape {
    /// Creates a shape with no fields.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
        }
    }

    /// Adds a field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    /// Returns the shape name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared fields in order.
    #[must_use]
    pub fn fields(&self) -> &IndexMap<String, Field> {
        &self.fields
    }

    /// Infers a shape from an example object.
    ///
    /// Every field becomes required and carries its value as the example.
    /// `null` fields cannot be typed and become [`FieldKind::Unsupported`].
    /// Returns `None` if `example` is not an object.
    #[must_use]
    pub fn from_example(name: impl Into<String>, example: &Value) -> Option<Self> {
        let name = name.into();
        let object = example.as_object()?;
        let mut shape = Self::new(name.clone());
        for (key, value) in object {
            let kind = infer_kind(&format!("{name}{}", capitalize(key)), value);
            shape = shape.field(key.clone(), Field::new(kind).example(value.clone()));
        }
        Some(shape)
    }

    /// Infers a shape from any serializable example value.
    pub fn infer<T: Serialize>(name: impl Into<String>, example: &T) -> Result<Option<Self>, serde_json::Error> {
        let value = serde_json::to_value(example)?;
        Ok(Self::from_example(name, &value))
    }

    /// Builds an example object from field examples, generating placeholders
    /// for fields without one. Unsupported fields are skipped.
    #[must_use]
    pub fn example(&self) -> Value {
        let mut object = Map::new();
        for (name, field) in &self.fields {
            if matches!(field.kind, FieldKind::Unsupported) {
                continue;
            }
            let value = field
                .example
                .clone()
                .or_else(|| field.one_of.first().cloned())
                .unwrap_or_else(|| placeholder(&field.kind));
            object.insert(name.clone(), value);
        }
        Value::Object(object)
    }

    /// Coerces and validates `value` against this shape.
    ///
    /// Returns the coerced value, or every validation message found.
    pub fn validate(&self, value: &Value, options: ValidationOptions) -> Result<Value, Vec<String>> {
        let mut errors = Vec::new();
        let coerced = self.validate_object(value, "", options, &mut errors);
        if errors.is_empty() {
            Ok(coerced)
        } else {
            Err(errors)
        }
    }

    fn validate_object(
        &self,
        value: &Value,
        prefix: &str,
        options: ValidationOptions,
        errors: &mut Vec<String>,
    ) -> Value {
        let Some(object) = value.as_object() else {
            let subject = if prefix.is_empty() { "body" } else { prefix };
            errors.push(format!("{subject} must be an object"));
            return value.clone();
        };

        let mut coerced = Map::new();
        for (key, item) in object {
            let path = join_path(prefix, key);
            match self.fields.get(key) {
                Some(field) => {
                    if let Some(value) = validate_field(field, item, &path, options, errors) {
                        coerced.insert(key.clone(), value);
                    }
                }
                None if options.forbid_unknown_fields => {
                    errors.push(format!("property {path} should not exist"));
                }
                None if options.strip_unknown_fields => {}
                None => {
                    coerced.insert(key.clone(), item.clone());
                }
            }
        }

        if !options.skip_missing_fields {
            for (key, field) in &self.fields {
                let missing = object.get(key).map_or(true, Value::is_null);
                if field.required && missing && !matches!(field.kind, FieldKind::Unsupported) {
                    errors.push(format!("{} is required", join_path(prefix, key)));
                }
            }
        }

        Value::Object(coerced)
    }
}

fn validate_field(
    field: &Field,
    value: &Value,
    path: &str,
    options: ValidationOptions,
    errors: &mut Vec<String>,
) -> Option<Value> {
    if value.is_null() {
        // reported by the required-field pass
        return Some(Value::Null);
    }

    let value = validate_kind(&field.kind, value, path, options, errors)?;

    if let Some(len) = length_of(&value) {
        if let Some(min) = field.min_length {
            if len < min {
                errors.push(format!("{path} must be longer than or equal to {min} characters"));
            }
        }
        if let Some(max) = field.max_length {
            if len > max {
                errors.push(format!("{path} must be shorter than or equal to {max} characters"));
            }
        }
    }

    if let Some(n) = value.as_f64() {
        if let Some(min) = field.minimum {
            if n < min {
                errors.push(format!("{path} must not be less than {min}"));
            }
        }
        if let Some(max) = field.maximum {
            if n > max {
                errors.push(format!("{path} must not be greater than {max}"));
            }
        }
    }

    if let (Some(pattern), Some(text)) = (&field.pattern, value.as_str()) {
        if !pattern.is_match(text) {
            errors.push(format!("{path} must match {} regular expression", pattern.as_str()));
        }
    }

    if !field.one_of.is_empty() && !field.one_of.contains(&value) {
        let allowed: Vec<String> = field.one_of.iter().map(display_value).collect();
        errors.push(format!(
            "{path} must be one of the following values: {}",
            allowed.join(", ")
        ));
    }

    Some(value)
}

fn validate_kind(
    kind: &FieldKind,
    value: &Value,
    path: &str,
    options: ValidationOptions,
    errors: &mut Vec<String>,
) -> Option<Value> {
    let mismatch = |errors: &mut Vec<String>| {
        errors.push(format!("{path} must be {}", kind.describe()));
        None
    };

    match kind {
        FieldKind::Any | FieldKind::Unsupported => Some(value.clone()),
        FieldKind::String => match value {
            Value::String(_) => Some(value.clone()),
            Value::Number(n) if options.implicit_conversion => Some(Value::String(n.to_string())),
            _ => mismatch(errors),
        },
        FieldKind::Number => match value {
            Value::Number(_) => Some(value.clone()),
            Value::String(s) if options.implicit_conversion => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .or_else(|| mismatch(errors)),
            _ => mismatch(errors),
        },
        FieldKind::Integer => match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(value.clone()),
            Value::String(s) if options.implicit_conversion => s
                .trim()
                .parse::<i64>()
                .ok()
                .map(Value::from)
                .or_else(|| mismatch(errors)),
            _ => mismatch(errors),
        },
        FieldKind::Boolean => match value {
            Value::Bool(_) => Some(value.clone()),
            Value::String(s) if options.implicit_conversion => match s.as_str() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => mismatch(errors),
            },
            _ => mismatch(errors),
        },
        FieldKind::Object(shape) => {
            if value.is_object() {
                Some(shape.validate_object(value, path, options, errors))
            } else {
                mismatch(errors)
            }
        }
        FieldKind::Array(items) => {
            let Some(elements) = value.as_array() else {
                return mismatch(errors);
            };
            let coerced = elements
                .iter()
                .enumerate()
                .filter_map(|(i, element)| {
                    validate_kind(items, element, &format!("{path}[{i}]"), options, errors)
                })
                .collect();
            Some(Value::Array(coerced))
        }
    }
}

fn infer_kind(nested_name: &str, value: &Value) -> FieldKind {
    match value {
        Value::Null => FieldKind::Unsupported,
        Value::Bool(_) => FieldKind::Boolean,
        Value::Number(n) if n.is_i64() || n.is_u64() => FieldKind::Integer,
        Value::Number(_) => FieldKind::Number,
        Value::String(_) => FieldKind::String,
        Value::Array(items) => FieldKind::Array(Box::new(
            items
                .first()
                .map_or(FieldKind::Any, |first| infer_kind(nested_name, first)),
        )),
        Value::Object(_) => Shape::from_example(nested_name, value).map_or(FieldKind::Any, FieldKind::Object),
    }
}

/// Generates a placeholder example for a kind.
#[must_use]
pub fn placeholder(kind: &FieldKind) -> Value {
    match kind {
        FieldKind::String => Value::String("string".to_string()),
        FieldKind::Number => Value::from(0.0),
        FieldKind::Integer => Value::from(0),
        FieldKind::Boolean => Value::Bool(true),
        FieldKind::Object(shape) => shape.example(),
        FieldKind::Array(items) => match items.as_ref() {
            FieldKind::Unsupported => Value::Array(Vec::new()),
            inner => Value::Array(vec![placeholder(inner)]),
        },
        FieldKind::Any | FieldKind::Unsupported => Value::Object(Map::new()),
    }
}

fn length_of(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

fn display_value(value: &Value) -> String {
    value
        .as_str()
        .map_or_else(|| value.to_string(), ToString::to_string)
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn order_shape() -> Shape {
        Shape::new("Order")
            .field("sku", Field::string().pattern(Regex::new("^[A-Z][0-9]+$").unwrap()))
            .field("qty", Field::integer().minimum(1.0).maximum(10.0))
            .field("note", Field::string().optional().max_length(5))
            .field(
                "address",
                Field::object(Shape::new("Address").field("city", Field::string())).optional(),
            )
            .field("tags", Field::array(FieldKind::String).optional())
    }

    #[test]
    fn test_valid_body_passes() {
        let body = json!({"sku": "A1", "qty": 3, "tags": ["x"], "address": {"city": "Oslo"}});
        let coerced = order_shape()
            .validate(&body, ValidationOptions::default())
            .unwrap();
        assert_eq!(coerced, body);
    }

    #[test]
    fn test_unknown_field_rejected_by_default() {
        let errors = order_shape()
            .validate(&json!({"sku": "A1", "qty": 1, "extra": 1}), ValidationOptions::default())
            .unwrap_err();
        assert_eq!(errors, vec!["property extra should not exist"]);
    }

    #[test]
    fn test_unknown_field_allowed_when_permissive() {
        let coerced = order_shape()
            .validate(&json!({"sku": "A1", "qty": 1, "extra": 1}), ValidationOptions::permissive())
            .unwrap();
        assert_eq!(coerced["extra"], 1);
    }

    #[test]
    fn test_unknown_field_stripped() {
        let options = ValidationOptions {
            strip_unknown_fields: true,
            ..ValidationOptions::permissive()
        };
        let coerced = order_shape()
            .validate(&json!({"sku": "A1", "qty": 1, "extra": 1}), options)
            .unwrap();
        assert!(coerced.get("extra").is_none());
    }

    #[test]
    fn test_missing_required_fields() {
        let errors = order_shape()
            .validate(&json!({"note": "hi"}), ValidationOptions::default())
            .unwrap_err();
        assert!(errors.contains(&"sku is required".to_string()));
        assert!(errors.contains(&"qty is required".to_string()));
    }

    #[test]
    fn test_skip_missing_fields() {
        let options = ValidationOptions {
            skip_missing_fields: true,
            ..ValidationOptions::default()
        };
        assert!(order_shape().validate(&json!({}), options).is_ok());
    }

    #[test]
    fn test_type_and_constraint_messages() {
        let errors = order_shape()
            .validate(
                &json!({"sku": "bad", "qty": 20, "note": "too long", "tags": [1], "address": {"city": 5}}),
                ValidationOptions::default(),
            )
            .unwrap_err();
        assert!(errors.contains(&"sku must match ^[A-Z][0-9]+$ regular expression".to_string()));
        assert!(errors.contains(&"qty must not be greater than 10".to_string()));
        assert!(errors.contains(&"note must be shorter than or equal to 5 characters".to_string()));
        assert!(errors.contains(&"tags[0] must be a string".to_string()));
        assert!(errors.contains(&"address.city must be a string".to_string()));
    }

    #[test]
    fn test_implicit_conversion() {
        let shape = Shape::new("Filter")
            .field("limit", Field::integer())
            .field("ratio", Field::number())
            .field("active", Field::boolean());
        let options = ValidationOptions {
            implicit_conversion: true,
            ..ValidationOptions::default()
        };
        let coerced = shape
            .validate(&json!({"limit": "10", "ratio": "0.5", "active": "true"}), options)
            .unwrap();
        assert_eq!(coerced, json!({"limit": 10, "ratio": 0.5, "active": true}));

        let errors = shape
            .validate(&json!({"limit": "ten", "ratio": 1, "active": true}), options)
            .unwrap_err();
        assert_eq!(errors, vec!["limit must be an integer"]);
    }

    #[test]
    fn test_non_object_body() {
        let errors = order_shape()
            .validate(&json!([1, 2]), ValidationOptions::default())
            .unwrap_err();
        assert_eq!(errors, vec!["body must be an object"]);
    }

    #[test]
    fn test_one_of() {
        let shape = Shape::new("Ship").field("speed", Field::string().one_of([json!("slow"), json!("fast")]));
        let errors = shape
            .validate(&json!({"speed": "warp"}), ValidationOptions::default())
            .unwrap_err();
        assert_eq!(errors, vec!["speed must be one of the following values: slow, fast"]);
    }

    #[test]
    fn test_from_example() {
        let shape = Shape::from_example(
            "Item",
            &json!({"id": 1, "price": 9.5, "name": "pen", "meta": {"color": "red"}, "gone": null, "tags": ["a"]}),
        )
        .unwrap();

        assert!(matches!(shape.fields()["id"].kind(), FieldKind::Integer));
        assert!(matches!(shape.fields()["price"].kind(), FieldKind::Number));
        assert!(matches!(shape.fields()["gone"].kind(), FieldKind::Unsupported));
        match shape.fields()["meta"].kind() {
            FieldKind::Object(nested) => assert_eq!(nested.name(), "ItemMeta"),
            other => panic!("expected object, got {other:?}"),
        }
        assert!(Shape::from_example("Scalar", &json!(3)).is_none());
    }

    #[test]
    fn test_example_generation_skips_unsupported() {
        let shape = Shape::new("Thing")
            .field("id", Field::integer().example(json!(7)))
            .field("label", Field::string())
            .field("callback", Field::new(FieldKind::Unsupported))
            .field("child", Field::object(Shape::new("Child").field("ok", Field::boolean())));

        assert_eq!(
            shape.example(),
            json!({"id": 7, "label": "string", "child": {"ok": true}})
        );
    }

    #[test]
    fn test_infer_from_serializable() {
        #[derive(Serialize)]
        struct Line {
            sku: String,
            qty: u32,
        }
        let shape = Shape::infer(
            "Line",
            &Line {
                sku: "A1".to_string(),
                qty: 2,
            },
        )
        .unwrap()
        .unwrap();
        assert_eq!(shape.fields().len(), 2);
    }
}
