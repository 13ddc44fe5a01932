use serde_json::Value;

/// Normalized output of a strategy invocation.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// The textual response.
    pub content: String,
    /// The strategy's raw return value, opaque to the bridge.
    pub data: Value,
    pub is_task_complete: bool,
}

impl ExecutionResult {
    pub fn complete(content: impl Into<String>, data: Value) -> Self {
        Self {
            content: content.into(),
            data,
            is_task_complete: true,
        }
    }
}

/// Render a JSON value as response text: strings stay unquoted, everything
/// else is its JSON form.
pub(crate) fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Normalize a callable's raw return value: a map contributes its
/// `response` or `content` field (in that order) as the text, anything
/// else is stringified directly. The raw value is kept as `data`.
pub(crate) fn normalize_value(value: Value) -> ExecutionResult {
    let content = match &value {
        Value::Object(map) => map
            .get("response")
            .or_else(|| map.get("content"))
            .map(stringify)
            .unwrap_or_else(|| value.to_string()),
        other => stringify(other),
    };
    ExecutionResult {
        content,
        data: value,
        is_task_complete: true,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn map_prefers_response_over_content() {
        let result = normalize_value(json!({"response": "r", "content": "c"}));
        assert_eq!(result.content, "r");
        assert!(result.is_task_complete);
    }

    #[test]
    fn map_falls_back_to_content_field() {
        let result = normalize_value(json!({"content": "c", "extra": 1}));
        assert_eq!(result.content, "c");
        assert_eq!(result.data["extra"], 1);
    }

    #[test]
    fn map_without_known_fields_is_stringified() {
        let result = normalize_value(json!({"x": 1}));
        assert_eq!(result.content, r#"{"x":1}"#);
    }

    #[test]
    fn scalar_is_stringified_unquoted() {
        assert_eq!(normalize_value(json!(42)).content, "42");
        assert_eq!(normalize_value(json!("plain")).content, "plain");
    }
}
