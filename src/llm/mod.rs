pub mod backend;
pub mod client;

pub use backend::ResearchBackend;
pub use client::LLMClient;
