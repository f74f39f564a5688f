pub mod prompt;
pub mod llm;
pub mod parser;
pub mod filter;
pub mod memory;

pub use llm::{HuggingFaceSummarizer, Summarizer};
pub use parser::parse_model_output;
pub use filter::is_critical_bearish;
pub use memory::SeenLinks;
