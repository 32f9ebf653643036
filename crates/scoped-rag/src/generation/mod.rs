//! Context assembly, prompt construction and the Ollama client

pub mod context;
pub mod ollama;
pub mod prompt;

pub use context::{AssembledContext, ContextAssembler};
pub use ollama::OllamaClient;
pub use prompt::PromptBuilder;
