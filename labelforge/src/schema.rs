//! Declared output shapes for structured generation calls.
//!
//! A remote structured response is never trusted as-is: it must parse as
//! JSON and then pass field-by-field validation against the schema the
//! request declared, or the call fails with a validation error.

use serde_json::{Value, json};

use crate::error::GenerationError;

/// Primitive type expected for one object field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    Boolean,
}

impl FieldKind {
    fn matches(&self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Number => value.is_number(),
            FieldKind::Boolean => value.is_boolean(),
        }
    }

    fn wire_name(&self) -> &'static str {
        match self {
            FieldKind::String => "STRING",
            FieldKind::Number => "NUMBER",
            FieldKind::Boolean => "BOOLEAN",
        }
    }
}

/// A required, typed field of an object response.
#[derive(Clone, Copy, Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

/// The shape a structured response must satisfy.
#[derive(Clone, Copy, Debug)]
pub enum ResponseSchema {
    /// A JSON array whose every element is a string.
    StringArray,
    /// A JSON object with the given required, typed fields.
    Object(&'static [FieldSpec]),
}

impl ResponseSchema {
    /// Check a parsed response against this schema.
    pub fn validate(&self, value: &Value) -> Result<(), GenerationError> {
        match self {
            ResponseSchema::StringArray => {
                let items = value.as_array().ok_or_else(|| {
                    GenerationError::Validation("expected a JSON array".into())
                })?;
                for (i, item) in items.iter().enumerate() {
                    if !item.is_string() {
                        return Err(GenerationError::Validation(format!(
                            "array element {i} is not a string"
                        )));
                    }
                }
                Ok(())
            }
            ResponseSchema::Object(fields) => {
                let map = value.as_object().ok_or_else(|| {
                    GenerationError::Validation("expected a JSON object".into())
                })?;
                for field in *fields {
                    match map.get(field.name) {
                        None => {
                            return Err(GenerationError::Validation(format!(
                                "missing required key '{}'",
                                field.name
                            )));
                        }
                        Some(v) if !field.kind.matches(v) => {
                            return Err(GenerationError::Validation(format!(
                                "key '{}' has the wrong type",
                                field.name
                            )));
                        }
                        Some(_) => {}
                    }
                }
                Ok(())
            }
        }
    }

    /// The schema in the generation API's wire format.
    pub fn to_wire(&self) -> Value {
        match self {
            ResponseSchema::StringArray => json!({
                "type": "ARRAY",
                "items": { "type": "STRING" },
            }),
            ResponseSchema::Object(fields) => {
                let mut properties = serde_json::Map::new();
                let mut required = Vec::new();
                for field in *fields {
                    properties.insert(field.name.into(), json!({ "type": field.kind.wire_name() }));
                    required.push(Value::from(field.name));
                }
                json!({
                    "type": "OBJECT",
                    "properties": properties,
                    "required": required,
                })
            }
        }
    }
}

/// Extract a validated string-array response into owned strings.
pub fn as_string_array(value: &Value) -> Result<Vec<String>, GenerationError> {
    ResponseSchema::StringArray.validate(value)?;
    let entries = value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    const OBJ: &[FieldSpec] = &[
        FieldSpec::new("name", FieldKind::String),
        FieldSpec::new("count", FieldKind::Number),
        FieldSpec::new("ready", FieldKind::Boolean),
    ];

    #[test]
    fn string_array_accepts_strings() {
        assert!(ResponseSchema::StringArray.validate(&json!(["a", "b"])).is_ok());
        assert!(ResponseSchema::StringArray.validate(&json!([])).is_ok());
    }

    #[test]
    fn string_array_rejects_non_array_and_mixed() {
        assert!(ResponseSchema::StringArray.validate(&json!({"a": 1})).is_err());
        let err = ResponseSchema::StringArray
            .validate(&json!(["a", 3]))
            .unwrap_err();
        assert!(err.to_string().contains("element 1"));
    }

    #[test]
    fn object_accepts_matching_shape() {
        let value = json!({"name": "x", "count": 2, "ready": true, "extra": null});
        assert!(ResponseSchema::Object(OBJ).validate(&value).is_ok());
    }

    #[test]
    fn object_rejects_missing_key() {
        let err = ResponseSchema::Object(OBJ)
            .validate(&json!({"name": "x", "count": 2}))
            .unwrap_err();
        assert!(err.to_string().contains("'ready'"));
    }

    #[test]
    fn object_rejects_wrong_type() {
        let err = ResponseSchema::Object(OBJ)
            .validate(&json!({"name": "x", "count": "two", "ready": false}))
            .unwrap_err();
        assert!(err.to_string().contains("'count'"));
    }

    #[test]
    fn wire_formats() {
        assert_eq!(
            ResponseSchema::StringArray.to_wire(),
            json!({"type": "ARRAY", "items": {"type": "STRING"}})
        );
        let wire = ResponseSchema::Object(OBJ).to_wire();
        assert_eq!(wire["type"], "OBJECT");
        assert_eq!(wire["properties"]["count"]["type"], "NUMBER");
        assert_eq!(wire["required"], json!(["name", "count", "ready"]));
    }

    #[test]
    fn string_array_extraction() {
        let values = as_string_array(&json!(["one", "two"])).unwrap();
        assert_eq!(values, vec!["one".to_string(), "two".to_string()]);
        assert!(as_string_array(&json!("nope")).is_err());
    }
}
