use crate::llm::LlmError;

/// A parsed reply that breaks a rule of its output schema
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("field `{field}` {reason}")]
pub struct SchemaViolation {
    pub field: String,
    pub reason: String,
}

impl SchemaViolation {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Model error: {0}")]
    Llm(#[from] LlmError),

    #[error("Invalid model reply: {reason}")]
    InvalidReply { reason: String, raw: String },

    #[error("Schema violation: {0}")]
    SchemaViolation(#[from] SchemaViolation),

    #[error("Storage error: {0:#}")]
    Storage(anyhow::Error),
}
