use crate::error::AgentError;
use jsonschema::{Draft, JSONSchema};
use serde_json::Value;

const MAX_SCHEMA_ERRORS: usize = 3;

/// Check tool arguments against the tool's declared parameter schema.
///
/// The model runtime is responsible for sending conforming arguments; this is
/// where that responsibility is enforced before a tool runs.
pub fn validate_tool_arguments(
    tool_name: &str,
    schema: &Value,
    arguments: &Value,
) -> std::result::Result<(), AgentError> {
    let validator = JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(schema)
        .map_err(|err| {
            AgentError::Validation(format!(
                "Failed to prepare `{}` schema for validation: {}",
                tool_name, err
            ))
        })?;

    if let Err(errors) = validator.validate(arguments) {
        let mut details = Vec::new();
        let mut truncated = false;

        for (idx, error) in errors.enumerate() {
            if idx < MAX_SCHEMA_ERRORS {
                let mut path = error.instance_path.to_string();
                if path.is_empty() {
                    path = "<root>".to_string();
                }
                details.push(format!("{}: {}", path, error));
            } else {
                truncated = true;
                break;
            }
        }

        let mut detail_str = if details.is_empty() {
            "arguments failed schema validation".to_string()
        } else {
            details.join("; ")
        };

        if truncated {
            detail_str.push_str("; additional errors truncated");
        }

        return Err(AgentError::Validation(format!(
            "Arguments for `{}` do not match its parameter schema: {}",
            tool_name, detail_str
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string"},
                "max_results": {"type": "integer", "default": 5}
            },
            "required": ["query"]
        })
    }

    #[test]
    fn test_valid_arguments_pass() {
        assert!(validate_tool_arguments("web_search", &schema(), &json!({"query": "rust"})).is_ok());
        assert!(validate_tool_arguments(
            "web_search",
            &schema(),
            &json!({"query": "rust", "max_results": 3})
        )
        .is_ok());
    }

    #[test]
    fn test_missing_required_field() {
        let err = validate_tool_arguments("web_search", &schema(), &json!({})).unwrap_err();
        assert!(matches!(err, AgentError::Validation(_)));
        assert!(err.to_string().contains("web_search"));
        assert!(err.to_string().contains("query"));
    }

    #[test]
    fn test_wrong_type_reports_path() {
        let err = validate_tool_arguments(
            "web_search",
            &schema(),
            &json!({"query": "rust", "max_results": "five"}),
        )
        .unwrap_err();
        assert!(err.to_string().contains("/max_results"));
    }
}
