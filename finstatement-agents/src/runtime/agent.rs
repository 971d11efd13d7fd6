use super::error::{AgentError, SchemaViolation};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;

pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// A type a model reply can be coerced into.
///
/// The JSON schema is sent to the model as the required response shape; the
/// reply is then deserialized and passed through [`OutputSchema::validate`].
pub trait OutputSchema: Serialize + DeserializeOwned + JsonSchema + Send + Sync {
    fn validate(&self) -> Result<(), SchemaViolation> {
        Ok(())
    }

    fn json_schema() -> serde_json::Value {
        // A RootSchema always serializes
        serde_json::to_value(schemars::schema_for!(Self)).unwrap_or_default()
    }
}

/// Declarative description of a single-turn structured-output agent: which
/// model to call, with what instruction, what shape the reply must take and
/// under which key the result is stored.
#[derive(Debug, Clone)]
pub struct LlmAgent<T> {
    name: String,
    model: String,
    description: Option<String>,
    instruction: String,
    output_key: String,
    max_tokens: u32,
    temperature: Option<f32>,
    _output: PhantomData<fn() -> T>,
}

impl<T: OutputSchema> LlmAgent<T> {
    pub fn builder(name: impl Into<String>) -> LlmAgentBuilder<T> {
        LlmAgentBuilder {
            name: name.into(),
            model: String::new(),
            description: None,
            instruction: String::new(),
            output_key: String::new(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
            _output: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn output_key(&self) -> &str {
        &self.output_key
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn temperature(&self) -> Option<f32> {
        self.temperature
    }

    pub fn schema_name(&self) -> String {
        T::schema_name()
    }

    pub fn output_schema(&self) -> serde_json::Value {
        <T as OutputSchema>::json_schema()
    }
}

pub struct LlmAgentBuilder<T> {
    name: String,
    model: String,
    description: Option<String>,
    instruction: String,
    output_key: String,
    max_tokens: u32,
    temperature: Option<f32>,
    _output: PhantomData<fn() -> T>,
}

impl<T: OutputSchema> LlmAgentBuilder<T> {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    pub fn output_key(mut self, output_key: impl Into<String>) -> Self {
        self.output_key = output_key.into();
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn build(self) -> Result<LlmAgent<T>, AgentError> {
        let required = [
            ("name", &self.name),
            ("model", &self.model),
            ("instruction", &self.instruction),
            ("output_key", &self.output_key),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(AgentError::Config(format!(
                    "agent `{}` is missing `{}`",
                    self.name, field
                )));
            }
        }
        if self.max_tokens == 0 {
            return Err(AgentError::Config(format!(
                "agent `{}` has max_tokens = 0",
                self.name
            )));
        }

        Ok(LlmAgent {
            name: self.name,
            model: self.model,
            description: self.description,
            instruction: self.instruction,
            output_key: self.output_key,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            _output: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, JsonSchema)]
    struct Headline {
        title: String,
    }

    impl OutputSchema for Headline {}

    #[test]
    fn test_build_agent() {
        let agent = LlmAgent::<Headline>::builder("headline_agent")
            .model("gemini-2.0-flash")
            .description("Writes headlines")
            .instruction("Write a headline.")
            .output_key("headline")
            .temperature(0.2)
            .build()
            .unwrap();

        assert_eq!(agent.name(), "headline_agent");
        assert_eq!(agent.model(), "gemini-2.0-flash");
        assert_eq!(agent.description(), Some("Writes headlines"));
        assert_eq!(agent.output_key(), "headline");
        assert_eq!(agent.max_tokens(), DEFAULT_MAX_TOKENS);
        assert_eq!(agent.temperature(), Some(0.2));
        assert_eq!(agent.schema_name(), "Headline");
        assert_eq!(agent.output_schema()["properties"]["title"]["type"], "string");
    }

    #[test]
    fn test_missing_fields_are_rejected() {
        let missing_model = LlmAgent::<Headline>::builder("headline_agent")
            .instruction("Write a headline.")
            .output_key("headline")
            .build();
        assert!(matches!(missing_model, Err(AgentError::Config(msg)) if msg.contains("model")));

        let missing_key = LlmAgent::<Headline>::builder("headline_agent")
            .model("gemini-2.0-flash")
            .instruction("Write a headline.")
            .build();
        assert!(matches!(missing_key, Err(AgentError::Config(msg)) if msg.contains("output_key")));

        let zero_tokens = LlmAgent::<Headline>::builder("headline_agent")
            .model("gemini-2.0-flash")
            .instruction("Write a headline.")
            .output_key("headline")
            .max_tokens(0)
            .build();
        assert!(zero_tokens.is_err());
    }
}
