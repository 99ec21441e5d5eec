//! Tools module containing tool abstractions and built-in tools

pub mod function_factory;
pub mod tool;
pub mod web_search;

pub use function_factory::FunctionFactory;
pub use tool::{Tool, ToolRegistry};
pub use web_search::{
    format_search_results, search, search_report, DuckDuckGoBackend, SearchBackend, SearchError,
    SearchHit, WebSearchTool,
};
