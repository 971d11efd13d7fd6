//! Conversion from JSON Schema (as produced by `schemars`) into the OpenAPI
//! subset Gemini accepts as `responseSchema`.
//!
//! Gemini rejects unknown keywords such as `$schema`, `title` or
//! `additionalProperties`, so only the supported ones are carried over and
//! `$ref`s are inlined from the root `definitions`.

use super::LlmError;
use serde_json::{Map, Value};

const MAX_REF_DEPTH: usize = 16;

pub fn to_gemini_schema(schema: &Value) -> Result<Value, LlmError> {
    let definitions = schema
        .get("definitions")
        .or_else(|| schema.get("$defs"))
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    convert(schema, &definitions, 0)
}

fn convert(schema: &Value, definitions: &Map<String, Value>, depth: usize) -> Result<Value, LlmError> {
    let object = schema
        .as_object()
        .ok_or_else(|| LlmError::InvalidSchema(format!("expected a schema object, got {}", schema)))?;

    if let Some(reference) = object.get("$ref").and_then(Value::as_str) {
        if depth >= MAX_REF_DEPTH {
            return Err(LlmError::InvalidSchema(format!(
                "recursive schema reference {}",
                reference
            )));
        }
        let name = reference
            .rsplit('/')
            .next()
            .ok_or_else(|| LlmError::InvalidSchema(format!("bad reference {}", reference)))?;
        let target = definitions
            .get(name)
            .ok_or_else(|| LlmError::InvalidSchema(format!("unknown reference {}", reference)))?;

        let mut resolved = convert(target, definitions, depth + 1)?;
        copy_description(object, &mut resolved);
        return Ok(resolved);
    }

    // schemars wraps documented references as `allOf: [{ $ref }]`
    if let Some(all_of) = object.get("allOf").and_then(Value::as_array) {
        if let [single] = all_of.as_slice() {
            let mut resolved = convert(single, definitions, depth + 1)?;
            copy_description(object, &mut resolved);
            return Ok(resolved);
        }
        return Err(LlmError::InvalidSchema(
            "allOf with more than one member is not supported".to_string(),
        ));
    }

    let mut out = Map::new();

    let (type_name, nullable) = match object.get("type") {
        Some(Value::String(name)) => (name.as_str(), false),
        Some(Value::Array(names)) => {
            let non_null: Vec<&str> = names
                .iter()
                .filter_map(Value::as_str)
                .filter(|name| *name != "null")
                .collect();
            match non_null.as_slice() {
                [name] => (*name, names.len() > non_null.len()),
                _ => {
                    return Err(LlmError::InvalidSchema(format!(
                        "union types are not supported: {:?}",
                        names
                    )))
                }
            }
        }
        Some(other) => {
            return Err(LlmError::InvalidSchema(format!("bad type keyword {}", other)));
        }
        None if object.contains_key("enum") => ("string", false),
        None => {
            return Err(LlmError::InvalidSchema(
                "schema has no type keyword".to_string(),
            ))
        }
    };

    out.insert("type".to_string(), Value::String(gemini_type(type_name)?.to_string()));
    if nullable {
        out.insert("nullable".to_string(), Value::Bool(true));
    }

    if let Some(description) = object.get("description") {
        out.insert("description".to_string(), description.clone());
    }
    if let Some(format) = object.get("format") {
        out.insert("format".to_string(), format.clone());
    }
    if let Some(values) = object.get("enum") {
        out.insert("enum".to_string(), values.clone());
    }

    if let Some(properties) = object.get("properties").and_then(Value::as_object) {
        let mut converted = Map::new();
        for (name, property) in properties {
            converted.insert(name.clone(), convert(property, definitions, depth)?);
        }
        out.insert("properties".to_string(), Value::Object(converted));
    }
    if let Some(required) = object.get("required") {
        out.insert("required".to_string(), required.clone());
    }
    if let Some(items) = object.get("items") {
        out.insert("items".to_string(), convert(items, definitions, depth)?);
    }

    Ok(Value::Object(out))
}

/// Keep the description written at the reference site over the target's own
fn copy_description(from: &Map<String, Value>, to: &mut Value) {
    if let (Some(description), Some(target)) = (from.get("description"), to.as_object_mut()) {
        target.insert("description".to_string(), description.clone());
    }
}

fn gemini_type(name: &str) -> Result<&'static str, LlmError> {
    match name {
        "object" => Ok("OBJECT"),
        "string" => Ok("STRING"),
        "integer" => Ok("INTEGER"),
        "number" => Ok("NUMBER"),
        "boolean" => Ok("BOOLEAN"),
        "array" => Ok("ARRAY"),
        other => Err(LlmError::InvalidSchema(format!(
            "unsupported type {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared_types::FinancialExtraction;

    #[test]
    fn test_financial_extraction_schema() {
        let root = serde_json::to_value(schemars::schema_for!(FinancialExtraction)).unwrap();
        let schema = to_gemini_schema(&root).unwrap();

        assert_eq!(schema["type"], "OBJECT");
        assert!(schema.get("$schema").is_none());
        assert!(schema.get("title").is_none());
        assert!(schema.get("additionalProperties").is_none());

        let properties = schema["properties"].as_object().unwrap();
        assert_eq!(properties.len(), 4);
        for key in ["revenue", "cogs", "net_income", "note"] {
            assert_eq!(properties[key]["type"], "STRING");
            assert!(properties[key]["description"].is_string());
        }

        let mut required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        required.sort();
        assert_eq!(required, vec!["cogs", "net_income", "note", "revenue"]);
    }

    #[test]
    fn test_inlines_references_and_nullable() {
        let root = json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "title": "Report",
            "type": "object",
            "required": ["period"],
            "properties": {
                "period": {
                    "description": "Reporting period",
                    "allOf": [{ "$ref": "#/definitions/Period" }]
                },
                "auditor": { "type": ["string", "null"] },
                "segments": { "type": "array", "items": { "type": "number" } }
            },
            "definitions": {
                "Period": {
                    "type": "object",
                    "properties": { "year": { "type": "integer", "format": "int32" } }
                }
            }
        });

        let schema = to_gemini_schema(&root).unwrap();
        let period = &schema["properties"]["period"];
        assert_eq!(period["type"], "OBJECT");
        assert_eq!(period["description"], "Reporting period");
        assert_eq!(period["properties"]["year"]["type"], "INTEGER");
        assert_eq!(period["properties"]["year"]["format"], "int32");

        let auditor = &schema["properties"]["auditor"];
        assert_eq!(auditor["type"], "STRING");
        assert_eq!(auditor["nullable"], true);

        assert_eq!(schema["properties"]["segments"]["items"]["type"], "NUMBER");
    }

    #[test]
    fn test_rejects_unresolvable_reference() {
        let root = json!({ "$ref": "#/definitions/Missing" });
        assert!(matches!(
            to_gemini_schema(&root),
            Err(LlmError::InvalidSchema(_))
        ));
    }

    #[test]
    fn test_rejects_union_types() {
        let root = json!({ "type": ["string", "number"] });
        assert!(to_gemini_schema(&root).is_err());
    }
}
