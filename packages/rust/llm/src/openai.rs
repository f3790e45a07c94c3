//! OpenAI chat completions with strict `json_schema` output.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, instrument, warn};

use toolscout_shared::{Result, ToolscoutError};

use crate::schema::openai_strict_schema;
use crate::{ModelBackend, ModelRequest, ProviderKind, ProviderSettings, ensure_object};

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub response_format: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

/// POST a chat completion to an OpenAI-compatible endpoint and return the
/// first choice's text.
pub(crate) async fn chat_completion(
    http: &Client,
    base_url: &str,
    api_key: &str,
    provider: ProviderKind,
    request: &ChatRequest<'_>,
) -> Result<String> {
    let response = http
        .post(format!("{base_url}/chat/completions"))
        .bearer_auth(api_key)
        .json(request)
        .send()
        .await
        .map_err(|e| ToolscoutError::model(provider, format!("request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        warn!(%status, error = %error_text, "{provider} API error");
        return Err(ToolscoutError::http(provider, status.as_u16(), error_text));
    }

    let parsed: ChatResponse = response
        .json()
        .await
        .map_err(|e| ToolscoutError::parse(format!("{provider} response: {e}")))?;

    let message = parsed
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or_else(|| ToolscoutError::model(provider, "no choices returned"))?;

    if let Some(refusal) = message.refusal.filter(|r| !r.is_empty()) {
        return Err(ToolscoutError::model(provider, format!("refused: {refusal}")));
    }

    message
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ToolscoutError::model(provider, "empty completion"))
}

/// OpenAI backend.
pub struct OpenAiBackend {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiBackend {
    pub fn new(http: Client, settings: &ProviderSettings) -> Self {
        Self {
            http,
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            base_url: settings.base_url.clone(),
        }
    }
}

#[async_trait]
impl ModelBackend for OpenAiBackend {
    #[instrument(skip_all, fields(model = %self.model, prompt_chars = request.prompt.len()))]
    async fn generate(&self, request: &ModelRequest) -> Result<Value> {
        let chat = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            response_format: json!({
                "type": "json_schema",
                "json_schema": {
                    "name": request.schema_name,
                    "strict": true,
                    "schema": openai_strict_schema(&request.schema),
                }
            }),
            temperature: None,
        };

        let content =
            chat_completion(&self.http, &self.base_url, &self.api_key, self.kind(), &chat).await?;
        debug!(chars = content.len(), "completion received");

        let value: Value = serde_json::from_str(&content)
            .map_err(|e| ToolscoutError::parse(format!("openai completion is not JSON: {e}")))?;
        ensure_object(value)
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use wiremock::matchers::{bearer_token, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer) -> OpenAiBackend {
        OpenAiBackend::new(
            Client::new(),
            &ProviderSettings {
                kind: ProviderKind::OpenAi,
                api_key: "sk-test".into(),
                model: "gpt-4o-mini".into(),
                base_url: server.uri(),
                timeout_secs: 5,
            },
        )
    }

    fn request() -> ModelRequest {
        ModelRequest {
            system: "You extract listings.".into(),
            prompt: "Page content".into(),
            schema_name: "listing".into(),
            schema: json!({
                "type": "object",
                "properties": {"name": {"type": "string"}}
            }),
        }
    }

    fn completion(content: &str) -> Value {
        json!({"choices": [{"message": {"role": "assistant", "content": content}}]})
    }

    #[tokio::test]
    async fn sends_strict_schema_and_parses_content() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(bearer_token("sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "response_format": {
                    "type": "json_schema",
                    "json_schema": {
                        "name": "listing",
                        "strict": true,
                        "schema": {"additionalProperties": false, "required": ["name"]}
                    }
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(r#"{"name":"Acme"}"#)))
            .expect(1)
            .mount(&server)
            .await;

        let value = backend(&server).generate(&request()).await.unwrap();
        assert_eq!(value["name"], "Acme");
    }

    #[tokio::test]
    async fn non_success_status_is_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let err = backend(&server).generate(&request()).await.unwrap_err();
        assert_eq!(err.status(), Some(429));
        assert!(err.to_string().contains("rate limited"));
    }

    #[tokio::test]
    async fn refusal_is_model_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": null, "refusal": "cannot comply"}}]
            })))
            .mount(&server)
            .await;

        let err = backend(&server).generate(&request()).await.unwrap_err();
        assert!(err.to_string().contains("refused"));
    }

    #[tokio::test]
    async fn non_object_completion_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("[1, 2]")))
            .mount(&server)
            .await;

        let err = backend(&server).generate(&request()).await.unwrap_err();
        assert!(matches!(err, ToolscoutError::Validation { .. }));
    }
}
