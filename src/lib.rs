pub mod citation;
pub mod cli;
pub mod config;
pub mod llm;
pub mod prompts;
pub mod research;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use llm::{LLMClient, ResearchBackend};
pub use research::workflow::launch;
pub use research::{ResearchError, ResearchOutcome, ResearchRequest, run_research};
