//! DeepSeek chat completions in JSON mode.
//!
//! DeepSeek accepts `response_format: {"type": "json_object"}` but no schema,
//! so the schema is appended to the user prompt and the reply is parsed
//! leniently.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use toolscout_shared::Result;

use crate::json::extract_json_object;
use crate::openai::{ChatMessage, ChatRequest, chat_completion};
use crate::{ModelBackend, ModelRequest, ProviderKind, ProviderSettings, ensure_object};

/// DeepSeek backend.
pub struct DeepSeekBackend {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl DeepSeekBackend {
    pub fn new(http: Client, settings: &ProviderSettings) -> Self {
        Self {
            http,
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            base_url: settings.base_url.clone(),
        }
    }
}

fn prompt_with_schema(request: &ModelRequest) -> String {
    let schema = serde_json::to_string_pretty(&request.schema).unwrap_or_default();
    format!(
        "{}\n\nRespond with a single JSON object matching this JSON Schema:\n{schema}",
        request.prompt
    )
}

#[async_trait]
impl ModelBackend for DeepSeekBackend {
    #[instrument(skip_all, fields(model = %self.model, prompt_chars = request.prompt.len()))]
    async fn generate(&self, request: &ModelRequest) -> Result<Value> {
        let prompt = prompt_with_schema(request);
        let chat = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            response_format: json!({"type": "json_object"}),
            temperature: Some(0.0),
        };

        let content =
            chat_completion(&self.http, &self.base_url, &self.api_key, self.kind(), &chat).await?;
        debug!(chars = content.len(), "completion received");

        ensure_object(extract_json_object(&content)?)
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::DeepSeek
    }

    fn model(&self) -> &str {
        &self.model
    }
}
