pub mod result;

pub use result::{AnswerResult, TokenUsage};
