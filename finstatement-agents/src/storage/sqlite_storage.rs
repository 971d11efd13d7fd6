use super::AgentStorage;
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension};
use shared_types::{AgentMessage, AgentSession, MessageRole, SessionStatus};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

pub struct SqliteAgentStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteAgentStorage {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Open (creating if needed) the database at `path` and run migrations
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open db at {:?}", path))?;
        super::run_migrations(&conn)?;
        Ok(Self::new(Arc::new(Mutex::new(conn))))
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        super::run_migrations(&conn)?;
        Ok(Self::new(Arc::new(Mutex::new(conn))))
    }

    fn lock(&self) -> anyhow::Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("SQLite connection mutex poisoned"))
    }
}

fn parse_column<T: std::str::FromStr<Err = String>>(
    index: usize,
    value: String,
) -> rusqlite::Result<T> {
    value.parse::<T>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            rusqlite::types::Type::Text,
            e.into(),
        )
    })
}

#[async_trait]
impl AgentStorage for SqliteAgentStorage {
    async fn create_session(&self, session: AgentSession) -> anyhow::Result<i64> {
        let conn = self.lock()?;
        let now = chrono::Utc::now().timestamp();

        conn.execute(
            "INSERT INTO agent_sessions
             (agent_name, provider, model, system_prompt, user_prompt, output_key, status, started_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            rusqlite::params![
                session.agent_name,
                session.provider,
                session.model,
                session.system_prompt,
                session.user_prompt,
                session.output_key,
                session.status.as_str(),
                now,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    async fn get_session(&self, session_id: i64) -> anyhow::Result<Option<AgentSession>> {
        let conn = self.lock()?;

        let session = conn
            .query_row(
                "SELECT id, agent_name, provider, model, system_prompt, user_prompt,
                        output_key, status, result, error
                 FROM agent_sessions WHERE id = ?",
                [session_id],
                |row| {
                    Ok(AgentSession {
                        id: Some(row.get(0)?),
                        agent_name: row.get(1)?,
                        provider: row.get(2)?,
                        model: row.get(3)?,
                        system_prompt: row.get(4)?,
                        user_prompt: row.get(5)?,
                        output_key: row.get(6)?,
                        status: parse_column(7, row.get(7)?)?,
                        result: row.get(8)?,
                        error: row.get(9)?,
                    })
                },
            )
            .optional()?;

        Ok(session)
    }

    async fn update_session(&self, session: AgentSession) -> anyhow::Result<()> {
        let session_id = session
            .id
            .ok_or_else(|| anyhow!("Cannot update a session without an id"))?;
        let conn = self.lock()?;
        let now = chrono::Utc::now().timestamp();

        conn.execute(
            "UPDATE agent_sessions
             SET status = ?, result = ?, error = ?, ended_at = ?
             WHERE id = ?",
            rusqlite::params![
                session.status.as_str(),
                session.result,
                session.error,
                if session.status.is_finished() {
                    Some(now)
                } else {
                    None
                },
                session_id,
            ],
        )?;

        Ok(())
    }

    async fn create_message(&self, message: AgentMessage) -> anyhow::Result<i64> {
        let conn = self.lock()?;
        let now = chrono::Utc::now().timestamp();

        conn.execute(
            "INSERT INTO agent_messages (session_id, role, content, created_at)
             VALUES (?, ?, ?, ?)",
            rusqlite::params![
                message.session_id,
                message.role.as_str(),
                message.content,
                now
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    async fn get_messages(&self, session_id: i64) -> anyhow::Result<Vec<AgentMessage>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT id, session_id, role, content
             FROM agent_messages
             WHERE session_id = ?
             ORDER BY id ASC",
        )?;

        let messages = stmt
            .query_map([session_id], |row| {
                Ok(AgentMessage {
                    id: Some(row.get(0)?),
                    session_id: row.get(1)?,
                    role: parse_column::<MessageRole>(2, row.get(2)?)?,
                    content: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(messages)
    }

    async fn set_state(
        &self,
        session_id: i64,
        key: &str,
        value: serde_json::Value,
    ) -> anyhow::Result<()> {
        let conn = self.lock()?;
        let now = chrono::Utc::now().timestamp();

        conn.execute(
            "INSERT INTO agent_state (session_id, key, value, updated_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(session_id, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            rusqlite::params![session_id, key, serde_json::to_string(&value)?, now],
        )?;

        Ok(())
    }

    async fn get_state(
        &self,
        session_id: i64,
        key: &str,
    ) -> anyhow::Result<Option<serde_json::Value>> {
        let conn = self.lock()?;

        let raw: Option<String> = conn
            .query_row(
                "SELECT value FROM agent_state WHERE session_id = ? AND key = ?",
                rusqlite::params![session_id, key],
                |row| row.get(0),
            )
            .optional()?;

        raw.map(|raw| serde_json::from_str(&raw).context("Corrupt agent_state value"))
            .transpose()
    }
}
