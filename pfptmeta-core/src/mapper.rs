//! Mapper - Copy fields between API JSON bodies and resource attributes
//!
//! The mapping is driven by the resource schema: each attribute's declared type
//! decides how the JSON value is coerced. Nested blocks are skipped here and
//! mapped by hand for each entity, since their JSON shape is entity specific.

use std::collections::HashMap;

use serde_json::{Map, json};

use crate::resource::Value;
use crate::schema::{AttributeSchema, AttributeType, ResourceSchema};

/// Error raised when a field cannot be coerced into its declared type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MapError {
    #[error("attribute '{attribute}': expected {expected}, got {got}")]
    TypeMismatch {
        attribute: String,
        expected: String,
        got: String,
    },

    #[error("attribute '{attribute}': integer {value} out of range")]
    OutOfRange { attribute: String, value: String },
}

/// Copy every non-excluded, non-block attribute of `schema` from `props` into `dest`.
///
/// Keys that are missing or `null` in `props` are removed from `dest`.
pub fn map_response(
    schema: &ResourceSchema,
    props: &serde_json::Value,
    excluded: &[&str],
    dest: &mut HashMap<String, Value>,
) -> Result<(), MapError> {
    for name in schema.attribute_names() {
        let attr = &schema.attributes[name];
        if excluded.contains(&name) || attr.attr_type.is_block() {
            continue;
        }

        match props.get(attr.api_name()) {
            None | Some(serde_json::Value::Null) => {
                dest.remove(name);
            }
            Some(raw) => {
                let value = coerce(name, &attr.attr_type, raw)?;
                dest.insert(name.to_string(), value);
            }
        }
    }
    Ok(())
}

fn coerce(name: &str, attr_type: &AttributeType, raw: &serde_json::Value) -> Result<Value, MapError> {
    let mismatch = || MapError::TypeMismatch {
        attribute: name.to_string(),
        expected: attr_type.type_name(),
        got: json_type_name(raw).to_string(),
    };

    match (attr_type.base(), raw) {
        (
            AttributeType::String | AttributeType::Enum(_) | AttributeType::Id(_),
            serde_json::Value::String(s),
        ) => Ok(Value::String(s.clone())),
        (AttributeType::Int, serde_json::Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Int(i))
            } else {
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                        Ok(Value::Int(f as i64))
                    }
                    _ => Err(MapError::OutOfRange {
                        attribute: name.to_string(),
                        value: n.to_string(),
                    }),
                }
            }
        }
        (AttributeType::Bool, serde_json::Value::Bool(b)) => Ok(Value::Bool(*b)),
        (AttributeType::List(inner), serde_json::Value::Array(items)) => items
            .iter()
            .map(|item| coerce(name, inner, item))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        (AttributeType::Set(inner), serde_json::Value::Array(items)) => {
            let mut values = items
                .iter()
                .map(|item| coerce(name, inner, item))
                .collect::<Result<Vec<_>, _>>()?;
            normalize_set(&mut values);
            Ok(Value::List(values))
        }
        (AttributeType::Map(inner), serde_json::Value::Object(obj)) => obj
            .iter()
            .map(|(k, v)| coerce(name, inner, v).map(|v| (k.clone(), v)))
            .collect::<Result<HashMap<_, _>, _>>()
            .map(Value::Map),
        _ => Err(mismatch()),
    }
}

/// Sort and de-duplicate set members so that set comparisons are order independent
pub fn normalize_set(values: &mut Vec<Value>) {
    values.sort_by_key(sort_key);
    values.dedup();
}

fn sort_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        // serde_json objects keep their keys sorted, so this is stable for maps too
        other => value_to_json(other).to_string(),
    }
}

/// Build a JSON request body from configured attributes.
///
/// Read-only and block attributes are skipped. When `only` is given the body is
/// restricted to those attribute names, and names absent from `attrs` are sent as
/// `null` (or `[]` for lists and sets) so the API clears them.
pub fn build_body(
    schema: &ResourceSchema,
    attrs: &HashMap<String, Value>,
    excluded: &[&str],
    only: Option<&[String]>,
) -> Result<Map<String, serde_json::Value>, MapError> {
    let mut body = Map::new();

    for name in schema.attribute_names() {
        let attr = &schema.attributes[name];
        if excluded.contains(&name) || attr.is_read_only() || attr.attr_type.is_block() {
            continue;
        }
        if let Some(only) = only
            && !only.iter().any(|n| n == name)
        {
            continue;
        }

        match attrs.get(name) {
            Some(value) => {
                body.insert(attr.api_name().to_string(), encode(attr, value)?);
            }
            None if only.is_some() && !attr.computed => {
                body.insert(attr.api_name().to_string(), cleared(attr));
            }
            None => {}
        }
    }

    Ok(body)
}

fn encode(attr: &AttributeSchema, value: &Value) -> Result<serde_json::Value, MapError> {
    attr.attr_type.validate(value).map_err(|_| MapError::TypeMismatch {
        attribute: attr.name.clone(),
        expected: attr.attr_type.type_name(),
        got: value.type_name().to_string(),
    })?;
    Ok(value_to_json(value))
}

fn cleared(attr: &AttributeSchema) -> serde_json::Value {
    if attr.attr_type.is_collection() {
        json!([])
    } else {
        serde_json::Value::Null
    }
}

/// Convert an attribute value to JSON without schema information
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::String(s) => json!(s),
        Value::Int(i) => json!(i),
        Value::Bool(b) => json!(b),
        Value::List(items) => serde_json::Value::Array(items.iter().map(value_to_json).collect()),
        Value::Map(map) => serde_json::Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), value_to_json(v)))
                .collect(),
        ),
    }
}

/// Convert a JSON value to an attribute value without schema information.
///
/// `null` and non-integral numbers have no attribute representation and yield `None`;
/// such entries are dropped from arrays and objects.
pub fn json_to_value(value: &serde_json::Value) -> Option<Value> {
    match value {
        serde_json::Value::String(s) => Some(Value::String(s.clone())),
        serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
        serde_json::Value::Number(n) => n.as_i64().map(Value::Int),
        serde_json::Value::Array(arr) => Some(Value::List(arr.iter().filter_map(json_to_value).collect())),
        serde_json::Value::Object(obj) => Some(Value::Map(
            obj.iter()
                .filter_map(|(k, v)| json_to_value(v).map(|v| (k.clone(), v)))
                .collect(),
        )),
        serde_json::Value::Null => None,
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
