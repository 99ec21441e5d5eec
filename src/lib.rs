//! web-search-agent: an interactive question-answering loop over an
//! OpenAI-compatible model that may call a `web_search` tool.
//!
//! The model decides when to search; the tool-call exchange itself runs in
//! this crate as an explicit request / tool-execution loop.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use web_search_agent::{Agent, ModelConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ModelConfig::from_env()?;
//!     let agent = Agent::with_web_search(config);
//!
//!     let answer = agent.run_with_steps("What is the capital of France?").await?;
//!     println!("{} ({:.2}s)", answer.text, answer.elapsed_seconds());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod schemas;
pub(crate) mod services;
pub mod tools;
pub mod types;

pub use config::ModelConfig;
pub use crate::core::{
    Agent, AgentMemory, AgentStep, AnswerGenerator, AnswerResult, TokenUsage, ToolCall,
    ToolExecution, ToolOutput,
};
pub use error::{AgentError, Result};
pub use schemas::Validator;
pub use tools::{FunctionFactory, SearchBackend, Tool, WebSearchTool};

#[cfg(feature = "cli")]
pub mod cli;
