pub mod memory_storage;
pub mod migrations;
pub mod sqlite_storage;

pub use memory_storage::InMemoryAgentStorage;
pub use migrations::run_migrations;
pub use sqlite_storage::SqliteAgentStorage;

use anyhow::Result;
use async_trait::async_trait;
use shared_types::{AgentMessage, AgentSession};

/// Session log plus the per-session key/value state an agent writes its
/// output into.
#[async_trait]
pub trait AgentStorage: Send + Sync {
    async fn create_session(&self, session: AgentSession) -> Result<i64>;
    async fn get_session(&self, session_id: i64) -> Result<Option<AgentSession>>;
    async fn update_session(&self, session: AgentSession) -> Result<()>;

    async fn create_message(&self, message: AgentMessage) -> Result<i64>;
    async fn get_messages(&self, session_id: i64) -> Result<Vec<AgentMessage>>;

    async fn set_state(&self, session_id: i64, key: &str, value: serde_json::Value) -> Result<()>;
    async fn get_state(&self, session_id: i64, key: &str) -> Result<Option<serde_json::Value>>;
}
