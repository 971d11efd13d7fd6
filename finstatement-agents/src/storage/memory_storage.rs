use super::AgentStorage;
use anyhow::anyhow;
use async_trait::async_trait;
use shared_types::{AgentMessage, AgentSession};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Inner {
    sessions: Vec<AgentSession>,
    messages: Vec<AgentMessage>,
    state: HashMap<(i64, String), serde_json::Value>,
}

/// Process-local storage for one-off runs that should leave nothing on disk
#[derive(Default)]
pub struct InMemoryAgentStorage {
    inner: Mutex<Inner>,
}

impl InMemoryAgentStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> anyhow::Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| anyhow!("In-memory storage mutex poisoned"))
    }
}

#[async_trait]
impl AgentStorage for InMemoryAgentStorage {
    async fn create_session(&self, mut session: AgentSession) -> anyhow::Result<i64> {
        let mut inner = self.lock()?;
        let id = inner.sessions.len() as i64 + 1;
        session.id = Some(id);
        inner.sessions.push(session);
        Ok(id)
    }

    async fn get_session(&self, session_id: i64) -> anyhow::Result<Option<AgentSession>> {
        let inner = self.lock()?;
        Ok(inner
            .sessions
            .iter()
            .find(|s| s.id == Some(session_id))
            .cloned())
    }

    async fn update_session(&self, session: AgentSession) -> anyhow::Result<()> {
        let mut inner = self.lock()?;
        let stored = inner
            .sessions
            .iter_mut()
            .find(|s| s.id.is_some() && s.id == session.id)
            .ok_or_else(|| anyhow!("Unknown session {:?}", session.id))?;

        stored.status = session.status;
        stored.result = session.result;
        stored.error = session.error;
        Ok(())
    }

    async fn create_message(&self, mut message: AgentMessage) -> anyhow::Result<i64> {
        let mut inner = self.lock()?;
        let id = inner.messages.len() as i64 + 1;
        message.id = Some(id);
        inner.messages.push(message);
        Ok(id)
    }

    async fn get_messages(&self, session_id: i64) -> anyhow::Result<Vec<AgentMessage>> {
        let inner = self.lock()?;
        Ok(inner
            .messages
            .iter()
            .filter(|m| m.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn set_state(
        &self,
        session_id: i64,
        key: &str,
        value: serde_json::Value,
    ) -> anyhow::Result<()> {
        let mut inner = self.lock()?;
        inner.state.insert((session_id, key.to_string()), value);
        Ok(())
    }

    async fn get_state(
        &self,
        session_id: i64,
        key: &str,
    ) -> anyhow::Result<Option<serde_json::Value>> {
        let inner = self.lock()?;
        Ok(inner.state.get(&(session_id, key.to_string())).cloned())
    }
}
