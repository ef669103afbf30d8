pub mod gemini_provider;
pub mod llm_factory;
pub mod llm_provider;
pub mod retry;

// Local and self-hosted endpoints (Ollama, LM Studio, OpenAI)
#[cfg(feature = "openai-compatible")]
pub mod openai_compatible_provider;

pub use gemini_provider::{GeminiConfig, GeminiProvider};
pub use llm_factory::LLMProviderFactory;
pub use llm_provider::*;
