//! JSON Schema generation and per-provider schema dialects.
//!
//! Schemas are generated from Rust types with `schemars`, `$ref`s are
//! inlined, and then reshaped for the provider:
//! - OpenAI strict mode: `additionalProperties: false`, every property
//!   required, no `default`/`format` keywords.
//! - Gemini: OpenAPI subset with upper-case type names and `nullable`.

use schemars::{JsonSchema, schema_for};
use serde_json::{Map, Value};

/// Generate the schema for `T` with every `$ref` inlined.
pub fn schema_for_type<T: JsonSchema>() -> Value {
    let schema = schema_for!(T);
    let mut value = serde_json::to_value(schema).unwrap_or_default();
    inline_refs(&mut value);

    if let Value::Object(map) = &mut value {
        map.remove("definitions");
        map.remove("$schema");
    }
    value
}

/// Reshape a schema for OpenAI strict structured output.
pub fn openai_strict_schema(schema: &Value) -> Value {
    let mut value = schema.clone();
    strip_keywords(&mut value, &["default", "format", "title", "$schema"]);
    fix_object_schemas(&mut value);
    value
}

/// Reshape a schema for Gemini's `responseSchema`.
pub fn gemini_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => {
            let mut out = Map::new();

            let (type_name, nullable) = match map.get("type") {
                Some(Value::String(t)) => (Some(t.clone()), false),
                Some(Value::Array(types)) => {
                    let nullable = types.iter().any(|t| t == "null");
                    let first = types
                        .iter()
                        .filter_map(Value::as_str)
                        .find(|t| *t != "null")
                        .map(str::to_string);
                    (first, nullable)
                }
                _ => (None, false),
            };

            if let Some(t) = type_name {
                out.insert("type".into(), Value::String(t.to_ascii_uppercase()));
            }
            if nullable {
                out.insert("nullable".into(), Value::Bool(true));
            }
            for key in ["description", "enum", "required"] {
                if let Some(v) = map.get(key) {
                    out.insert(key.into(), v.clone());
                }
            }
            if let Some(Value::Object(props)) = map.get("properties") {
                let converted: Map<String, Value> = props
                    .iter()
                    .map(|(k, v)| (k.clone(), gemini_schema(v)))
                    .collect();
                out.insert("properties".into(), Value::Object(converted));
            }
            if let Some(items) = map.get("items") {
                out.insert("items".into(), gemini_schema(items));
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}

/// Add `additionalProperties: false` and require every property, recursively.
fn fix_object_schemas(value: &mut Value) {
    match value {
        Value::Object(map) => {
            let is_object = match map.get("type") {
                Some(Value::String(t)) => t == "object",
                Some(Value::Array(types)) => types.iter().any(|t| t == "object"),
                _ => false,
            };

            if is_object {
                map.insert("additionalProperties".into(), Value::Bool(false));
                if let Some(Value::Object(props)) = map.get("properties") {
                    let all_keys: Vec<Value> =
                        props.keys().map(|k| Value::String(k.clone())).collect();
                    map.insert("required".into(), Value::Array(all_keys));
                }
            }

            for (_, v) in map.iter_mut() {
                fix_object_schemas(v);
            }
        }
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                fix_object_schemas(item);
            }
        }
        _ => {}
    }
}

/// Remove keywords that a provider rejects, recursively.
///
/// Property maps are walked without touching their keys, so a property
/// literally named `default` survives.
fn strip_keywords(value: &mut Value, keywords: &[&str]) {
    match value {
        Value::Object(map) => {
            for keyword in keywords {
                map.remove(*keyword);
            }
            for (key, v) in map.iter_mut() {
                if key == "properties" {
                    if let Value::Object(props) = v {
                        for (_, prop) in props.iter_mut() {
                            strip_keywords(prop, keywords);
                        }
                    }
                } else {
                    strip_keywords(v, keywords);
                }
            }
        }
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                strip_keywords(item, keywords);
            }
        }
        _ => {}
    }
}

/// Inline all `#/definitions/...` references.
fn inline_refs(value: &mut Value) {
    let definitions = match value {
        Value::Object(map) => map.get("definitions").cloned(),
        _ => None,
    };

    if let Some(defs) = definitions {
        inline_refs_recursive(value, &defs);
    }
}

fn inline_refs_recursive(value: &mut Value, definitions: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(ref_path)) = map.get("$ref").cloned() {
                if let Some(type_name) = ref_path.strip_prefix("#/definitions/") {
                    if let Some(def) = definitions.get(type_name) {
                        *value = def.clone();
                        inline_refs_recursive(value, definitions);
                        return;
                    }
                }
            }

            // schemars wraps documented refs as `allOf: [{$ref}]`
            if let Some(Value::Array(all_of)) = map.get("allOf").cloned() {
                if all_of.len() == 1 {
                    let description = map.get("description").cloned();
                    let mut inner = all_of[0].clone();
                    inline_refs_recursive(&mut inner, definitions);
                    if let (Value::Object(inner_map), Some(desc)) = (&mut inner, description) {
                        inner_map.insert("description".into(), desc);
                    }
                    *value = inner;
                    return;
                }
            }

            for (_, v) in map.iter_mut() {
                inline_refs_recursive(v, definitions);
            }
        }
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                inline_refs_recursive(item, definitions);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use schemars::JsonSchema;
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[allow(dead_code)]
    #[derive(Deserialize, JsonSchema)]
    struct Faq {
        question: String,
        answer: String,
    }

    #[allow(dead_code)]
    #[derive(Deserialize, JsonSchema)]
    struct Listing {
        /// Product name.
        name: String,
        #[serde(default)]
        tags: Vec<String>,
        icon: Option<String>,
        faq: Vec<Faq>,
    }

    #[test]
    fn schema_for_type_inlines_definitions() {
        let schema = schema_for_type::<Listing>();
        let text = schema.to_string();
        assert!(!text.contains("$ref"));
        assert!(schema.get("definitions").is_none());
        assert_eq!(schema["properties"]["faq"]["items"]["type"], "object");
    }

    #[test]
    fn openai_schema_requires_everything() {
        let schema = openai_strict_schema(&schema_for_type::<Listing>());
        assert_eq!(schema["additionalProperties"], false);
        let required = schema["required"].as_array().unwrap();
        assert_eq!(required.len(), 4);
        assert!(schema["properties"]["tags"].get("default").is_none());
        assert_eq!(
            schema["properties"]["faq"]["items"]["additionalProperties"],
            false
        );
    }

    #[test]
    fn strip_keywords_keeps_property_names() {
        let mut schema = json!({
            "type": "object",
            "properties": {"default": {"type": "string", "default": "x"}}
        });
        strip_keywords(&mut schema, &["default"]);
        assert!(schema["properties"].get("default").is_some());
        assert!(schema["properties"]["default"].get("default").is_none());
    }

    #[test]
    fn gemini_schema_uppercases_and_marks_nullable() {
        let schema = gemini_schema(&schema_for_type::<Listing>());
        assert_eq!(schema["type"], "OBJECT");
        assert_eq!(schema["properties"]["icon"]["type"], "STRING");
        assert_eq!(schema["properties"]["icon"]["nullable"], true);
        assert_eq!(schema["properties"]["tags"]["items"]["type"], "STRING");
        assert!(schema.get("additionalProperties").is_none());
        assert!(schema.get("title").is_none());
        assert_eq!(schema["properties"]["name"]["description"], "Product name.");
    }
}
