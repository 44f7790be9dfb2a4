//! Runtime parameter and query validation. A JSON boolean never satisfies
//! a declared `"integer"`/`"number"` schema type: type checks here are
//! strict, not truthiness-based.

use serde_json::Value;

use crate::error::{RouterError, Result};
use crate::types::JsonSchema;

/// Validate a `search_tools` query: must be present, a string, and non-empty
/// after trimming.
pub fn validate_search_query(query: Option<&Value>) -> Result<String> {
    let Some(query) = query else {
        return Err(RouterError::validation("'query' is required"));
    };
    let Some(text) = query.as_str() else {
        return Err(RouterError::validation("'query' must be a string"));
    };
    if text.trim().is_empty() {
        return Err(RouterError::validation("'query' cannot be empty"));
    }
    Ok(text.to_string())
}

/// Validate a tool-call `arguments` object against its declared input schema:
/// missing required properties, unknown properties (any key not listed in
/// `properties`, whenever the schema declares `properties` at all), and
/// primitive-type mismatches.
pub fn validate_tool_parameters(arguments: &Value, schema: &JsonSchema) -> Result<()> {
    let args_obj = arguments.as_object().ok_or_else(|| {
        RouterError::validation("Tool arguments must be a JSON object")
    })?;

    if let Some(required) = &schema.required {
        for name in required {
            if !args_obj.contains_key(name) {
                return Err(RouterError::validation(format!(
                    "Missing required parameter '{name}'"
                )));
            }
        }
    }

    let properties = schema.properties.clone().unwrap_or_default();

    if schema.properties.is_some() {
        for key in args_obj.keys() {
            if !properties.contains_key(key) {
                return Err(RouterError::validation(format!(
                    "Unknown parameter '{key}'"
                )));
            }
        }
    }

    for (name, value) in args_obj {
        if let Some(prop_schema) = properties.get(name) {
            if let Some(expected_type) = prop_schema.get("type").and_then(Value::as_str) {
                validate_primitive_type(name, value, expected_type)?;
            }
        }
    }

    Ok(())
}

fn validate_primitive_type(name: &str, value: &Value, expected_type: &str) -> Result<()> {
    let matches = match expected_type {
        "string" => value.is_string(),
        // A JSON boolean must never satisfy "number"/"integer".
        "number" => value.is_number() && !value.is_boolean(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true, // unknown declared type: accept (schema is advisory beyond known primitives)
    };

    if matches {
        Ok(())
    } else {
        Err(RouterError::validation(format!(
            "Parameter '{name}' must be of type '{expected_type}'"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_missing_query() {
        assert!(validate_search_query(None).unwrap_err().to_string().contains("required"));
    }

    #[test]
    fn rejects_empty_query() {
        let err = validate_search_query(Some(&json!(""))).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn rejects_whitespace_only_query() {
        let err = validate_search_query(Some(&json!("   "))).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn rejects_non_string_query() {
        let err = validate_search_query(Some(&json!(123))).unwrap_err();
        assert!(err.to_string().contains("string"));
    }

    #[test]
    fn accepts_valid_query() {
        assert_eq!(validate_search_query(Some(&json!("hello"))).unwrap(), "hello");
    }

    fn schema_with(properties: Value, required: Vec<&str>, additional: Option<bool>) -> JsonSchema {
        let mut schema = JsonSchema::from_value(&json!({
            "type": "object",
            "properties": properties,
            "required": required,
        }));
        schema.additional_properties = additional;
        schema
    }

    #[test]
    fn rejects_missing_required_parameter() {
        let schema = schema_with(json!({"path": {"type": "string"}}), vec!["path"], None);
        let err = validate_tool_parameters(&json!({}), &schema).unwrap_err();
        assert!(err.to_string().contains("Missing required"));
    }

    #[test]
    fn rejects_unknown_parameter_when_additional_properties_false() {
        let schema = schema_with(json!({"path": {"type": "string"}}), vec![], Some(false));
        let err = validate_tool_parameters(&json!({"path": "a", "extra": 1}), &schema).unwrap_err();
        assert!(err.to_string().contains("Unknown parameter"));
    }

    #[test]
    fn rejects_unknown_parameter_even_when_additional_properties_is_unset() {
        // The common MCP case: a schema that declares `properties` but never
        // mentions `additionalProperties` still rejects extra arguments.
        let schema = schema_with(json!({"path": {"type": "string"}}), vec![], None);
        let err = validate_tool_parameters(&json!({"path": "a", "extra": 1}), &schema).unwrap_err();
        assert!(err.to_string().contains("Unknown parameter"));
    }

    #[test]
    fn allows_any_parameter_when_schema_declares_no_properties() {
        let schema = JsonSchema::from_value(&json!({"type": "object"}));
        assert!(validate_tool_parameters(&json!({"anything": 1}), &schema).is_ok());
    }

    #[test]
    fn rejects_wrong_primitive_type() {
        let schema = schema_with(json!({"count": {"type": "number"}}), vec![], None);
        let err = validate_tool_parameters(&json!({"count": "not a number"}), &schema).unwrap_err();
        assert!(err.to_string().contains("'count'"));
    }

    #[test]
    fn boolean_never_satisfies_number_type() {
        let schema = schema_with(json!({"count": {"type": "number"}}), vec![], None);
        let err = validate_tool_parameters(&json!({"count": true}), &schema).unwrap_err();
        assert!(err.to_string().contains("'count'"));
    }

    #[test]
    fn boolean_never_satisfies_integer_type() {
        let schema = schema_with(json!({"flag": {"type": "integer"}}), vec![], None);
        assert!(validate_tool_parameters(&json!({"flag": false}), &schema).is_err());
    }

    #[test]
    fn boolean_satisfies_boolean_type() {
        let schema = schema_with(json!({"flag": {"type": "boolean"}}), vec![], None);
        assert!(validate_tool_parameters(&json!({"flag": true}), &schema).is_ok());
    }
}
