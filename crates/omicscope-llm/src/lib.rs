//! omicscope-llm - LLM backend abstraction used for free-form multi-omics
//! questions the dataset rules cannot answer.

pub mod audit;
pub mod backend;
pub mod prompt;

pub use audit::LlmAuditEntry;
pub use backend::{LlmBackend, LlmError, LlmRequest, LlmResponse, Message, OllamaBackend, OpenAiCompatibleBackend};
pub use prompt::multi_omics_prompt;
