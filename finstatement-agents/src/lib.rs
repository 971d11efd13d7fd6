pub mod config;
pub mod financial_extractor;
pub mod llm;
pub mod runtime;
pub mod storage;

pub use config::AgentsConfig;
pub use financial_extractor::FinancialExtractorAgent;
pub use llm::gemini::GeminiClient;
pub use llm::{LlmClient, LlmError};
pub use runtime::{AgentError, AgentRun, AgentRunner, LlmAgent, OutputSchema, SchemaViolation};
pub use storage::{AgentStorage, InMemoryAgentStorage, SqliteAgentStorage};
