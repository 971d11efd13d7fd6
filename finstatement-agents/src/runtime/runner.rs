use super::agent::{LlmAgent, OutputSchema};
use super::error::AgentError;
use super::reply::parse_structured_reply;
use crate::llm::{CompletionRequest, LlmClient, Message, ResponseFormat};
use crate::storage::AgentStorage;
use shared_types::{AgentMessage, AgentSession, MessageRole, SessionStatus};
use std::sync::Arc;

/// Result of one agent invocation
#[derive(Debug, Clone)]
pub struct AgentRun<T> {
    pub session_id: i64,
    pub output_key: String,
    pub output: T,
    pub raw_reply: String,
}

/// Executes [`LlmAgent`] descriptors: one model call per input, reply parsed
/// into the agent's output type and stored under its output key.
pub struct AgentRunner {
    llm_client: Arc<dyn LlmClient>,
    storage: Arc<dyn AgentStorage>,
    validate_output: bool,
}

impl AgentRunner {
    pub fn new(llm_client: Arc<dyn LlmClient>, storage: Arc<dyn AgentStorage>) -> Self {
        Self {
            llm_client,
            storage,
            validate_output: true,
        }
    }

    /// Toggle the [`OutputSchema::validate`] pass run on every parsed reply
    pub fn with_validation(mut self, validate_output: bool) -> Self {
        self.validate_output = validate_output;
        self
    }

    pub fn storage(&self) -> &Arc<dyn AgentStorage> {
        &self.storage
    }

    pub async fn run<T: OutputSchema>(
        &self,
        agent: &LlmAgent<T>,
        input: &str,
    ) -> Result<AgentRun<T>, AgentError> {
        let session = AgentSession {
            id: None,
            agent_name: agent.name().to_string(),
            provider: self.llm_client.provider_name().to_string(),
            model: agent.model().to_string(),
            system_prompt: Some(agent.instruction().to_string()),
            user_prompt: input.to_string(),
            output_key: agent.output_key().to_string(),
            status: SessionStatus::Running,
            result: None,
            error: None,
        };
        let session_id = self
            .storage
            .create_session(session.clone())
            .await
            .map_err(AgentError::Storage)?;

        tracing::info!(
            agent = agent.name(),
            model = agent.model(),
            session_id,
            input_length = input.len(),
            "Running agent"
        );

        let outcome = self.execute(agent, session_id, input).await;

        let finished = match &outcome {
            Ok(run) => {
                let result = match serde_json::to_string(&run.output) {
                    Ok(json) => Some(json),
                    Err(err) => {
                        tracing::warn!(session_id, error = %err, "Failed to serialize agent output");
                        None
                    }
                };
                AgentSession {
                    id: Some(session_id),
                    status: SessionStatus::Completed,
                    result,
                    ..session
                }
            }
            Err(err) => {
                tracing::warn!(agent = agent.name(), session_id, error = %err, "Agent run failed");
                AgentSession {
                    id: Some(session_id),
                    status: SessionStatus::Failed,
                    error: Some(err.to_string()),
                    ..session
                }
            }
        };

        // The run outcome wins over a failure to record it
        if let Err(err) = self.storage.update_session(finished).await {
            tracing::error!(session_id, error = %err, "Failed to update agent session");
        }

        outcome
    }

    async fn execute<T: OutputSchema>(
        &self,
        agent: &LlmAgent<T>,
        session_id: i64,
        input: &str,
    ) -> Result<AgentRun<T>, AgentError> {
        self.storage
            .create_message(AgentMessage {
                id: None,
                session_id,
                role: MessageRole::User,
                content: input.to_string(),
            })
            .await
            .map_err(AgentError::Storage)?;

        let request = CompletionRequest {
            messages: vec![Message::user(input)],
            max_tokens: agent.max_tokens(),
            model: agent.model().to_string(),
            system: Some(agent.instruction().to_string()),
            temperature: agent.temperature(),
            top_p: None,
            stop_sequences: None,
            response_format: Some(ResponseFormat::JsonSchema {
                name: agent.schema_name(),
                schema: agent.output_schema(),
            }),
        };

        let response = self.llm_client.complete(request).await?;
        let raw_reply = response.text();

        self.storage
            .create_message(AgentMessage {
                id: None,
                session_id,
                role: MessageRole::Assistant,
                content: raw_reply.clone(),
            })
            .await
            .map_err(AgentError::Storage)?;

        let output: T = parse_structured_reply(&raw_reply)?;
        if self.validate_output {
            output.validate()?;
        }

        let value = serde_json::to_value(&output).map_err(|e| AgentError::InvalidReply {
            reason: e.to_string(),
            raw: raw_reply.clone(),
        })?;
        self.storage
            .set_state(session_id, agent.output_key(), value)
            .await
            .map_err(AgentError::Storage)?;

        tracing::debug!(
            agent = agent.name(),
            session_id,
            output_key = agent.output_key(),
            "Stored agent output"
        );

        Ok(AgentRun {
            session_id,
            output_key: agent.output_key().to_string(),
            output,
            raw_reply,
        })
    }
}
