use crate::{core::tool_call::ToolCall, error::AgentError};
use serde_json::Value;

/// Extract tool_call_id from a tool call JSON object
pub(super) fn extract_tool_call_id(tool_call: &Value) -> &str {
    tool_call
        .get("id")
        .and_then(|value| value.as_str())
        .unwrap_or_default()
}

/// Extract the function name from a tool call JSON object
pub(super) fn extract_function_name(tool_call: &Value) -> Option<&str> {
    tool_call
        .get("function")
        .and_then(|function| function.get("name"))
        .and_then(|value| value.as_str())
        .filter(|name| !name.is_empty())
}

/// Extract arguments string from a tool call JSON object
pub(super) fn extract_arguments_str(tool_call: &Value) -> &str {
    tool_call
        .get("function")
        .and_then(|function| function.get("arguments"))
        .and_then(|value| value.as_str())
        .unwrap_or("")
}

/// Parse function arguments from JSON string. Providers send `""` for a
/// call without arguments, which is read as an empty object.
pub(super) fn parse_function_arguments(
    arguments_str: &str,
    function_name: &str,
) -> Result<Value, AgentError> {
    if arguments_str.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }

    serde_json::from_str(arguments_str).map_err(|err| {
        AgentError::InvalidFunctionCall(format!(
            "Failed to parse arguments for tool '{}': {}",
            function_name, err
        ))
    })
}

/// Turn one entry of an assistant `tool_calls` array into a [`ToolCall`].
/// On failure the call id is returned alongside the error so the caller can
/// still answer the call with an error observation.
pub(super) fn parse_tool_call(tool_call: &Value) -> Result<ToolCall, (String, AgentError)> {
    let tool_call_id = extract_tool_call_id(tool_call).to_string();

    let function_name = match extract_function_name(tool_call) {
        Some(name) => name.to_string(),
        None => {
            return Err((
                tool_call_id,
                AgentError::InvalidFunctionCall("Tool call missing function name".to_string()),
            ))
        }
    };

    match parse_function_arguments(extract_arguments_str(tool_call), &function_name) {
        Ok(arguments) => Ok(ToolCall::new(tool_call_id, function_name, arguments)),
        Err(err) => Err((tool_call_id, err)),
    }
}
