use super::schema::to_gemini_schema;
use super::{
    CompletionRequest, CompletionResponse, ContentBlock, LlmClient, LlmError, ResponseFormat,
    Role, Usage,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

pub const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Client for the Gemini `generateContent` REST endpoint
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, LlmError> {
        Self::with_options(
            api_key,
            GEMINI_API_BASE_URL,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    pub fn with_options(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::Config("Gemini API key is empty".to_string()));
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, model
        )
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    fn provider_name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let model = request.model.clone();
        let body = GenerateContentRequest::from_completion(&request)?;

        tracing::debug!(
            model = %model,
            messages = request.messages.len(),
            structured = body
                .generation_config
                .as_ref()
                .and_then(|c| c.response_schema.as_ref())
                .is_some(),
            "Sending Gemini generateContent request"
        );

        let started = Instant::now();
        let response = self
            .http
            .post(self.endpoint(&model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|envelope| envelope.error.message)
                .unwrap_or(text);
            tracing::error!(
                model = %model,
                status = status.as_u16(),
                error = %message,
                "Gemini API call failed"
            );
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;

        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyResponse)?;

        let content: Vec<ContentBlock> = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|part| part.text)
            .map(|text| ContentBlock::Text { text })
            .collect();

        if content.is_empty() {
            tracing::warn!(
                model = %model,
                finish_reason = ?candidate.finish_reason,
                "Gemini candidate carried no text"
            );
            return Err(LlmError::EmptyResponse);
        }

        let usage = parsed.usage_metadata.map(|u| Usage {
            input_tokens: u.prompt_token_count,
            output_tokens: u.candidates_token_count,
        });

        tracing::info!(
            model = %model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            input_tokens = usage.as_ref().map(|u| u.input_tokens),
            output_tokens = usage.as_ref().map(|u| u.output_tokens),
            "Gemini response received"
        );

        Ok(CompletionResponse {
            content,
            model: parsed.model_version.unwrap_or(model),
            stop_reason: candidate.finish_reason,
            usage,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    fn from_completion(request: &CompletionRequest) -> Result<Self, LlmError> {
        let contents = request
            .messages
            .iter()
            .map(|message| Content {
                role: Some(
                    match message.role {
                        Role::User => "user",
                        Role::Assistant => "model",
                    }
                    .to_string(),
                ),
                parts: message
                    .content
                    .iter()
                    .map(|block| match block {
                        ContentBlock::Text { text } => Part {
                            text: Some(text.clone()),
                        },
                    })
                    .collect(),
            })
            .collect();

        let system_instruction = request.system.as_ref().map(|system| Content {
            role: None,
            parts: vec![Part {
                text: Some(system.clone()),
            }],
        });

        let (response_mime_type, response_schema) = match &request.response_format {
            None => (None, None),
            Some(ResponseFormat::Json) => (Some("application/json".to_string()), None),
            Some(ResponseFormat::JsonSchema { schema, .. }) => (
                Some("application/json".to_string()),
                Some(to_gemini_schema(schema)?),
            ),
        };

        Ok(Self {
            contents,
            system_instruction,
            generation_config: Some(GenerationConfig {
                max_output_tokens: Some(request.max_tokens),
                temperature: request.temperature,
                top_p: request.top_p,
                stop_sequences: request.stop_sequences.clone(),
                response_mime_type,
                response_schema,
            }),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::models::gemini::GEMINI_2_0_FLASH_ID;
    use crate::llm::Message;
    use serde_json::json;
    use shared_types::FinancialExtraction;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn structured_request() -> CompletionRequest {
        let schema = serde_json::to_value(schemars::schema_for!(FinancialExtraction)).unwrap();
        CompletionRequest {
            messages: vec![Message::user("Revenue $10M, COGS $4M, Net Income $2M")],
            max_tokens: 1024,
            model: GEMINI_2_0_FLASH_ID.to_string(),
            system: Some("Extract the figures.".to_string()),
            temperature: Some(0.0),
            top_p: None,
            stop_sequences: None,
            response_format: Some(ResponseFormat::JsonSchema {
                name: "FinancialExtraction".to_string(),
                schema,
            }),
        }
    }

    fn client_for(server: &MockServer) -> GeminiClient {
        GeminiClient::with_options("test-key", server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_request_body_shape() {
        let body = GenerateContentRequest::from_completion(&structured_request()).unwrap();
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(
            value["contents"][0]["parts"][0]["text"],
            "Revenue $10M, COGS $4M, Net Income $2M"
        );
        assert_eq!(
            value["systemInstruction"]["parts"][0]["text"],
            "Extract the figures."
        );
        assert!(value["systemInstruction"].get("role").is_none());

        let config = &value["generationConfig"];
        assert_eq!(config["maxOutputTokens"], 1024);
        assert_eq!(config["responseMimeType"], "application/json");
        assert_eq!(config["responseSchema"]["type"], "OBJECT");
        assert!(config.get("topP").is_none());
    }

    #[test]
    fn test_assistant_role_maps_to_model() {
        let mut request = structured_request();
        request.messages.push(Message::assistant("{}"));
        request.response_format = None;

        let body = GenerateContentRequest::from_completion(&request).unwrap();
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["contents"][1]["role"], "model");
        assert!(value["generationConfig"].get("responseMimeType").is_none());
    }

    #[test]
    fn test_rejects_empty_api_key() {
        assert!(matches!(
            GeminiClient::new("  "),
            Err(LlmError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_complete_returns_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [{ "text": "{\"revenue\":\"10.00\",\"cogs\":\"4.00\",\"net_income\":\"2.00\",\"note\":\"\"}" }]
                    },
                    "finishReason": "STOP"
                }],
                "usageMetadata": {
                    "promptTokenCount": 120,
                    "candidatesTokenCount": 30,
                    "totalTokenCount": 150
                },
                "modelVersion": "gemini-2.0-flash-001"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client_for(&server)
            .complete(structured_request())
            .await
            .unwrap();

        assert!(response.text().contains("\"revenue\":\"10.00\""));
        assert_eq!(response.model, "gemini-2.0-flash-001");
        assert_eq!(response.stop_reason.as_deref(), Some("STOP"));
        assert_eq!(
            response.usage,
            Some(Usage {
                input_tokens: 120,
                output_tokens: 30
            })
        );
    }

    #[tokio::test]
    async fn test_api_error_carries_provider_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {
                    "code": 400,
                    "message": "Invalid JSON payload received.",
                    "status": "INVALID_ARGUMENT"
                }
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .complete(structured_request())
            .await
            .unwrap_err();

        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid JSON payload received.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_no_candidates_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "finishReason": "SAFETY" }]
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .complete(structured_request())
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::EmptyResponse));
    }
}
