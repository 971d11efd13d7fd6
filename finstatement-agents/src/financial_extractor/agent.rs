use super::system_prompt::{build_instruction, AGENT_DESCRIPTION, AGENT_NAME, OUTPUT_KEY};
use crate::llm::models::gemini::GEMINI_2_0_FLASH_ID;
use crate::llm::LlmClient;
use crate::runtime::{AgentError, AgentRun, AgentRunner, LlmAgent};
use crate::storage::AgentStorage;
use shared_types::FinancialExtraction;
use std::sync::Arc;

pub const DEFAULT_MODEL: &str = GEMINI_2_0_FLASH_ID;

/// Extracts revenue, cost of goods sold and net income (millions of USD)
/// from free text. Non-USD statements and texts without figures come back
/// zeroed with an explanatory note rather than as errors.
pub struct FinancialExtractorAgent {
    agent: LlmAgent<FinancialExtraction>,
    runner: AgentRunner,
}

impl FinancialExtractorAgent {
    pub fn new(
        llm_client: Arc<dyn LlmClient>,
        storage: Arc<dyn AgentStorage>,
        model: impl Into<String>,
    ) -> Result<Self, AgentError> {
        Ok(Self {
            agent: descriptor(model)?,
            runner: AgentRunner::new(llm_client, storage),
        })
    }

    pub fn with_validation(mut self, validate_output: bool) -> Self {
        self.runner = self.runner.with_validation(validate_output);
        self
    }

    pub fn descriptor(&self) -> &LlmAgent<FinancialExtraction> {
        &self.agent
    }

    pub async fn extract(&self, text: &str) -> Result<AgentRun<FinancialExtraction>, AgentError> {
        let run = self.runner.run(&self.agent, text).await?;

        tracing::info!(
            session_id = run.session_id,
            status = ?run.output.status(),
            "Financial extraction finished"
        );

        Ok(run)
    }
}

/// The agent descriptor: model, instruction, output schema and output key
pub fn descriptor(model: impl Into<String>) -> Result<LlmAgent<FinancialExtraction>, AgentError> {
    LlmAgent::builder(AGENT_NAME)
        .model(model)
        .description(AGENT_DESCRIPTION)
        .instruction(build_instruction())
        .output_key(OUTPUT_KEY)
        .temperature(0.0)
        .build()
}
