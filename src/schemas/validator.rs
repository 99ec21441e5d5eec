use crate::{schemas::validation::validate_tool_arguments, AgentError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Validation strategies for tool parameters
#[derive(Debug, Clone)]
pub enum Validator {
    /// Fast validation using serde
    SerdeFirst,
    /// Check against the JSON schema first, then deserialize
    Strict { tool_name: String, schema: Value },
}

impl Validator {
    pub fn strict(tool_name: impl Into<String>, schema: Value) -> Self {
        Validator::Strict {
            tool_name: tool_name.into(),
            schema,
        }
    }

    /// Validate and deserialize parameters into type T
    pub fn validate<T: DeserializeOwned>(&self, params: Value) -> Result<T> {
        match self {
            Validator::SerdeFirst => serde_first_validate(params),
            Validator::Strict { tool_name, schema } => {
                validate_tool_arguments(tool_name, schema, &params)?;
                serde_first_validate(params)
            }
        }
    }
}

fn serde_first_validate<T: DeserializeOwned>(params: Value) -> Result<T> {
    serde_path_to_error::deserialize(params).map_err(|e| {
        AgentError::Validation(format!(
            "Parameter validation failed at {}: {}",
            e.path(),
            e
        ))
    })
}
