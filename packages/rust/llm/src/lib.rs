//! AI provider backends for structured listing extraction.
//!
//! The provider is resolved once from configuration ([`resolve`]) and the
//! resulting [`ModelBackend`] is injected into the pipeline. Three backends
//! are available:
//!
//! | Provider | Output mode |
//! |---|---|
//! | [`OpenAiBackend`] | `json_schema` structured output (strict) |
//! | [`GeminiBackend`] | `responseSchema` structured output |
//! | [`DeepSeekBackend`] | JSON mode; schema is described in the prompt |

mod deepseek;
mod gemini;
mod json;
mod openai;
pub mod schema;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use toolscout_shared::{AiConfig, ProviderConfig, Result, ToolscoutError};

pub use deepseek::DeepSeekBackend;
pub use gemini::GeminiBackend;
pub use json::extract_json_object;
pub use openai::OpenAiBackend;

// ---------------------------------------------------------------------------
// Request / trait
// ---------------------------------------------------------------------------

/// A single completion request.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    /// Role instruction.
    pub system: String,
    /// User prompt (page content included).
    pub prompt: String,
    /// Name reported to providers that label schemas.
    pub schema_name: String,
    /// JSON Schema of the expected object, `$ref`s inlined.
    pub schema: serde_json::Value,
}

/// An AI provider able to return a JSON object for a prompt.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Run the completion and return the parsed JSON object.
    ///
    /// Errors cover transport failures, non-2xx responses, empty completions,
    /// and completions that are not a JSON object.
    async fn generate(&self, request: &ModelRequest) -> Result<serde_json::Value>;

    fn kind(&self) -> ProviderKind;

    fn model(&self) -> &str;
}

// ---------------------------------------------------------------------------
// ProviderKind
// ---------------------------------------------------------------------------

/// Supported AI providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    OpenAi,
    Google,
    DeepSeek,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Google => "google",
            Self::DeepSeek => "deepseek",
        }
    }

    /// Whether the provider validates output against a schema server-side.
    pub fn supports_structured_output(&self) -> bool {
        !matches!(self, Self::DeepSeek)
    }

    pub fn default_api_key_env(&self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Google => "GOOGLE_GENERATIVE_AI_API_KEY",
            Self::DeepSeek => "DEEPSEEK_API_KEY",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o-mini",
            Self::Google => "gemini-2.0-flash",
            Self::DeepSeek => "deepseek-chat",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Google => "https://generativelanguage.googleapis.com/v1beta",
            Self::DeepSeek => "https://api.deepseek.com",
        }
    }

    fn overrides<'a>(&self, config: &'a AiConfig) -> &'a ProviderConfig {
        match self {
            Self::OpenAi => &config.openai,
            Self::Google => &config.google,
            Self::DeepSeek => &config.deepseek,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ToolscoutError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "google" | "gemini" => Ok(Self::Google),
            "deepseek" => Ok(Self::DeepSeek),
            other => Err(ToolscoutError::config(format!(
                "unknown AI provider '{other}': expected 'openai', 'google', or 'deepseek'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Everything needed to build a backend.
#[derive(Clone)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("kind", &self.kind)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

/// Outcome of provider resolution at startup.
#[derive(Debug, Clone)]
pub enum AiResolution {
    /// No provider named: the AI submit feature is off.
    Disabled,
    /// A provider is named but cannot be used.
    Unavailable { provider: String, reason: String },
    /// Ready to build a backend.
    Ready(ProviderSettings),
}

/// Resolve the configured provider.
///
/// `env` looks up environment variables; the CLI passes
/// `|name| std::env::var(name).ok()`, tests pass a map lookup.
pub fn resolve(config: &AiConfig, env: impl Fn(&str) -> Option<String>) -> AiResolution {
    let named = env(&config.provider_env)
        .or_else(|| config.default_provider.clone())
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());

    let Some(name) = named else {
        return AiResolution::Disabled;
    };

    let kind = match name.parse::<ProviderKind>() {
        Ok(kind) => kind,
        Err(e) => {
            return AiResolution::Unavailable {
                provider: name,
                reason: e.to_string(),
            };
        }
    };

    let overrides = kind.overrides(config);
    let key_env = overrides
        .api_key_env
        .clone()
        .unwrap_or_else(|| kind.default_api_key_env().to_string());

    let Some(api_key) = env(&key_env).filter(|k| !k.trim().is_empty()) else {
        return AiResolution::Unavailable {
            provider: kind.to_string(),
            reason: format!("{key_env} is not set"),
        };
    };

    AiResolution::Ready(ProviderSettings {
        kind,
        api_key,
        model: overrides
            .model
            .clone()
            .unwrap_or_else(|| kind.default_model().to_string()),
        base_url: overrides
            .base_url
            .clone()
            .unwrap_or_else(|| kind.default_base_url().to_string())
            .trim_end_matches('/')
            .to_string(),
        timeout_secs: config.timeout_secs,
    })
}

/// Build the backend for resolved settings.
pub fn build_backend(settings: &ProviderSettings) -> Result<Arc<dyn ModelBackend>> {
    let http = Client::builder()
        .timeout(Duration::from_secs(settings.timeout_secs))
        .build()
        .map_err(|e| ToolscoutError::Network(format!("failed to build HTTP client: {e}")))?;

    let backend: Arc<dyn ModelBackend> = match settings.kind {
        ProviderKind::OpenAi => Arc::new(OpenAiBackend::new(http, settings)),
        ProviderKind::Google => Arc::new(GeminiBackend::new(http, settings)),
        ProviderKind::DeepSeek => Arc::new(DeepSeekBackend::new(http, settings)),
    };
    Ok(backend)
}

/// Require the completion to be a JSON object.
pub(crate) fn ensure_object(value: serde_json::Value) -> Result<serde_json::Value> {
    if value.is_object() {
        Ok(value)
    } else {
        Err(ToolscoutError::validation(format!(
            "completion is not a JSON object (got {})",
            json_kind(&value)
        )))
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
