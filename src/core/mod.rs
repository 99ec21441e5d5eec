pub mod agent;
pub mod memory;
pub mod steps;
pub mod tool_call;

pub use crate::types::result::{AnswerResult, TokenUsage};
pub use agent::{Agent, AnswerGenerator};
pub use memory::AgentMemory;
pub use steps::AgentStep;
pub use tool_call::{ToolCall, ToolExecution, ToolOutput};
