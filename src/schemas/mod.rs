//! Tool-argument validation

pub mod validation;
pub mod validator;

pub use validation::validate_tool_arguments;
pub use validator::Validator;
