pub mod agent;
pub mod error;
pub mod reply;
pub mod runner;

pub use agent::{LlmAgent, LlmAgentBuilder, OutputSchema, DEFAULT_MAX_TOKENS};
pub use error::{AgentError, SchemaViolation};
pub use reply::parse_structured_reply;
pub use runner::{AgentRun, AgentRunner};
