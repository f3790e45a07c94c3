use serde_json::Value;

use toolscout_shared::{Result, ToolscoutError};

/// Pull the first JSON object out of a free-form completion.
///
/// Handles Markdown code fences and leading or trailing prose. Text after
/// the first complete value is ignored.
pub fn extract_json_object(text: &str) -> Result<Value> {
    let trimmed = strip_code_fence(text.trim());

    let start = trimmed
        .find('{')
        .ok_or_else(|| ToolscoutError::parse("completion contains no JSON object"))?;

    let mut stream = serde_json::Deserializer::from_str(&trimmed[start..]).into_iter::<Value>();
    match stream.next() {
        Some(Ok(value)) => Ok(value),
        Some(Err(e)) => Err(ToolscoutError::parse(format!("invalid JSON in completion: {e}"))),
        None => Err(ToolscoutError::parse("completion contains no JSON object")),
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // drop the info string (`json`, `JSON`, ...)
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_object() {
        let value = extract_json_object(r#"{"name": "Acme"}"#).unwrap();
        assert_eq!(value["name"], "Acme");
    }

    #[test]
    fn fenced_object() {
        let text = "```json\n{\"name\": \"Acme\", \"tags\": [\"AI\"]}\n```";
        let value = extract_json_object(text).unwrap();
        assert_eq!(value["tags"][0], "AI");
    }

    #[test]
    fn object_surrounded_by_prose() {
        let text = "Here is the result:\n{\"name\": \"Acme\"}\nLet me know if you need more.";
        let value = extract_json_object(text).unwrap();
        assert_eq!(value["name"], "Acme");
    }

    #[test]
    fn no_object_is_a_parse_error() {
        let err = extract_json_object("I cannot help with that.").unwrap_err();
        assert!(matches!(err, ToolscoutError::Parse { .. }));
    }

    #[test]
    fn truncated_object_is_a_parse_error() {
        assert!(extract_json_object(r#"{"name": "Ac"#).is_err());
    }
}
