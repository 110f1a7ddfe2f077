//! Structured parameter validation against a tool's JSON-schema-like map
//!
//! Supports the subset tools actually declare: `type` (single or list),
//! `enum`, `required`, `properties`, `additionalProperties: false` and
//! array `items`. Every violation is collected rather than stopping at
//! the first one.

use serde_json::{Map, Value};

/// Validate structured parameters, returning every violation found
pub fn validate_params(params: &Map<String, Value>, schema: &Value) -> Result<(), Vec<String>> {
    let mut problems = Vec::new();
    validate_value(&Value::Object(params.clone()), schema, "params", &mut problems);
    if problems.is_empty() { Ok(()) } else { Err(problems) }
}

fn validate_value(value: &Value, schema: &Value, path: &str, problems: &mut Vec<String>) {
    let Some(schema_obj) = schema.as_object() else {
        return;
    };

    if let Some(type_spec) = schema_obj.get("type")
        && !matches_type_spec(value, type_spec)
    {
        problems.push(format!("{} must be of type {}", path, describe_type_spec(type_spec)));
        return;
    }

    if let Some(variants) = schema_obj.get("enum").and_then(Value::as_array)
        && !variants.iter().any(|candidate| candidate == value)
    {
        problems.push(format!("{} is not one of the allowed values", path));
    }

    if let Some(object) = value.as_object() {
        if let Some(required) = schema_obj.get("required").and_then(Value::as_array) {
            for key in required.iter().filter_map(Value::as_str) {
                if !object.contains_key(key) {
                    problems.push(format!("{} missing required field '{}'", path, key));
                }
            }
        }

        if let Some(properties) = schema_obj.get("properties").and_then(Value::as_object) {
            for (key, property_schema) in properties {
                if let Some(child) = object.get(key) {
                    validate_value(child, property_schema, &format!("{}.{}", path, key), problems);
                }
            }

            if schema_obj.get("additionalProperties").and_then(Value::as_bool) == Some(false) {
                for key in object.keys().filter(|k| !properties.contains_key(*k)) {
                    problems.push(format!("{} contains unknown field '{}'", path, key));
                }
            }
        }
    }

    if let (Some(items), Some(item_schema)) = (value.as_array(), schema_obj.get("items")) {
        for (index, item) in items.iter().enumerate() {
            validate_value(item, item_schema, &format!("{}[{}]", path, index), problems);
        }
    }
}

fn matches_type_spec(value: &Value, type_spec: &Value) -> bool {
    match type_spec {
        Value::String(name) => matches_type(value, name),
        Value::Array(names) => names.iter().filter_map(Value::as_str).any(|name| matches_type(value, name)),
        _ => true,
    }
}

fn matches_type(value: &Value, name: &str) -> bool {
    match name {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn describe_type_spec(type_spec: &Value) -> String {
    match type_spec {
        Value::Array(names) => names.iter().filter_map(Value::as_str).collect::<Vec<_>>().join(" | "),
        other => other.as_str().unwrap_or("unknown").to_string(),
    }
}
