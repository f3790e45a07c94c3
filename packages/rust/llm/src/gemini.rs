//! Google Gemini `generateContent` with a response schema.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, instrument, warn};

use toolscout_shared::{Result, ToolscoutError};

use crate::schema::gemini_schema;
use crate::{ModelBackend, ModelRequest, ProviderKind, ProviderSettings, ensure_object};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

/// Gemini backend.
pub struct GeminiBackend {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiBackend {
    pub fn new(http: Client, settings: &ProviderSettings) -> Self {
        Self {
            http,
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            base_url: settings.base_url.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl ModelBackend for GeminiBackend {
    #[instrument(skip_all, fields(model = %self.model, prompt_chars = request.prompt.len()))]
    async fn generate(&self, request: &ModelRequest) -> Result<Value> {
        let body = json!({
            "systemInstruction": {"parts": [{"text": request.system}]},
            "contents": [{"role": "user", "parts": [{"text": request.prompt}]}],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": gemini_schema(&request.schema),
            }
        });

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                ToolscoutError::model(ProviderKind::Google, format!("request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(%status, error = %error_text, "google API error");
            return Err(ToolscoutError::http(
                ProviderKind::Google,
                status.as_u16(),
                error_text,
            ));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ToolscoutError::parse(format!("google response: {e}")))?;

        let Some(candidate) = parsed.candidates.into_iter().next() else {
            let feedback = parsed
                .prompt_feedback
                .map(|f| f.to_string())
                .unwrap_or_default();
            return Err(ToolscoutError::model(
                ProviderKind::Google,
                format!("no candidates {feedback}"),
            ));
        };

        let text: String = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|p| p.text)
            .collect();

        if text.trim().is_empty() {
            let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".into());
            return Err(ToolscoutError::model(
                ProviderKind::Google,
                format!("empty completion (finish reason: {reason})"),
            ));
        }
        debug!(chars = text.len(), "completion received");

        let value: Value = serde_json::from_str(&text)
            .map_err(|e| ToolscoutError::parse(format!("google completion is not JSON: {e}")))?;
        ensure_object(value)
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer) -> GeminiBackend {
        GeminiBackend::new(
            Client::new(),
            &ProviderSettings {
                kind: ProviderKind::Google,
                api_key: "g-test".into(),
                model: "gemini-2.0-flash".into(),
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
            schema: json!({"type": "object", "properties": {"name": {"type": "string"}}}),
        }
    }

    #[tokio::test]
    async fn sends_response_schema_and_joins_parts() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/gemini-2.0-flash:generateContent"))
            .and(header("x-goog-api-key", "g-test"))
            .and(body_partial_json(json!({
                "generationConfig": {
                    "responseMimeType": "application/json",
                    "responseSchema": {"type": "OBJECT"}
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"parts": [{"text": "{\"name\":"}, {"text": " \"Acme\"}"}]},
                    "finishReason": "STOP"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let value = backend(&server).generate(&request()).await.unwrap();
        assert_eq!(value["name"], "Acme");
    }

    #[tokio::test]
    async fn blocked_prompt_is_model_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "promptFeedback": {"blockReason": "SAFETY"}
            })))
            .mount(&server)
            .await;

        let err = backend(&server).generate(&request()).await.unwrap_err();
        assert!(matches!(err, ToolscoutError::Model { .. }));
        assert!(err.to_string().contains("SAFETY"));
    }

    #[tokio::test]
    async fn rejected_key_is_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("bad key"))
            .mount(&server)
            .await;

        let err = backend(&server).generate(&request()).await.unwrap_err();
        assert_eq!(err.status(), Some(403));
        assert!(err.to_string().contains("bad key"));
    }
}
