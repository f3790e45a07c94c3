//! Application configuration for toolscout.
//!
//! User config lives at `~/.toolscout/toolscout.toml`.
//! CLI flags override config file values, which override defaults.
//! Secrets are never stored here; sections name the env vars that hold them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ToolscoutError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "toolscout.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".toolscout";

// ---------------------------------------------------------------------------
// Config structs (matching toolscout.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Page fetching.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// AI provider selection.
    #[serde(default)]
    pub ai: AiConfig,

    /// Headless CMS connection.
    #[serde(default)]
    pub cms: CmsConfig,

    /// Icon/screenshot persistence.
    #[serde(default)]
    pub assets: AssetsConfig,

    /// Vocabulary matching policies.
    #[serde(default)]
    pub matching: MatchingConfig,
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Timeout for the page request, in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,

    /// Maximum number of characters of page content embedded in the prompt.
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,

    /// Whether the prompt embeds sanitized HTML or Markdown converted from it.
    #[serde(default)]
    pub page_format: PageFormat,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout(),
            max_content_chars: default_max_content_chars(),
            page_format: PageFormat::default(),
        }
    }
}

fn default_fetch_timeout() -> u64 {
    10
}
fn default_max_content_chars() -> usize {
    50_000
}

/// Representation of the page content handed to the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageFormat {
    #[default]
    Html,
    Markdown,
}

/// `[ai]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Provider name used when the provider env var is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_provider: Option<String>,

    /// Name of the env var selecting the provider.
    #[serde(default = "default_provider_env")]
    pub provider_env: String,

    /// Upper bound on a single completion request, in seconds.
    #[serde(default = "default_ai_timeout")]
    pub timeout_secs: u64,

    /// `[ai.openai]` overrides.
    #[serde(default)]
    pub openai: ProviderConfig,

    /// `[ai.google]` overrides.
    #[serde(default)]
    pub google: ProviderConfig,

    /// `[ai.deepseek]` overrides.
    #[serde(default)]
    pub deepseek: ProviderConfig,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            default_provider: None,
            provider_env: default_provider_env(),
            timeout_secs: default_ai_timeout(),
            openai: ProviderConfig::default(),
            google: ProviderConfig::default(),
            deepseek: ProviderConfig::default(),
        }
    }
}

fn default_provider_env() -> String {
    "DEFAULT_AI_PROVIDER".into()
}
fn default_ai_timeout() -> u64 {
    120
}

/// Per-provider overrides. Unset fields use the provider's built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Name of the env var holding the API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Model identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// API base URL (proxies, gateways, tests).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// `[cms]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CmsConfig {
    /// Sanity project id. Without it the CMS is treated as absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    /// Dataset name.
    #[serde(default = "default_dataset")]
    pub dataset: String,

    /// API version date segment.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Name of the env var holding the API token.
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Override of `https://<project_id>.api.sanity.io`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Timeout for CMS requests, in seconds.
    #[serde(default = "default_cms_timeout")]
    pub timeout_secs: u64,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            dataset: default_dataset(),
            api_version: default_api_version(),
            token_env: default_token_env(),
            base_url: None,
            timeout_secs: default_cms_timeout(),
        }
    }
}

fn default_dataset() -> String {
    "production".into()
}
fn default_api_version() -> String {
    "2024-01-01".into()
}
fn default_token_env() -> String {
    "SANITY_API_TOKEN".into()
}
fn default_cms_timeout() -> u64 {
    30
}

/// `[assets]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Copy the icon and screenshot into the CMS asset store.
    #[serde(default = "default_true")]
    pub upload: bool,

    /// Timeout for each asset download, in seconds.
    #[serde(default = "default_asset_timeout")]
    pub timeout_secs: u64,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            upload: true,
            timeout_secs: default_asset_timeout(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_asset_timeout() -> u64 {
    15
}

/// How a model-supplied label is matched against a vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// Case-sensitive exact membership.
    Exact,
    /// Exact, then case-insensitive, substring, and word-prefix matching.
    Fuzzy,
}

/// `[matching]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    #[serde(default = "default_fuzzy")]
    pub category: MatchPolicy,

    #[serde(default = "default_exact")]
    pub tags: MatchPolicy,

    #[serde(default = "default_exact")]
    pub core_technologies: MatchPolicy,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            category: MatchPolicy::Fuzzy,
            tags: MatchPolicy::Exact,
            core_technologies: MatchPolicy::Exact,
        }
    }
}

fn default_fuzzy() -> MatchPolicy {
    MatchPolicy::Fuzzy
}
fn default_exact() -> MatchPolicy {
    MatchPolicy::Exact
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.toolscout/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ToolscoutError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.toolscout/toolscout.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ToolscoutError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| ToolscoutError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ToolscoutError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ToolscoutError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ToolscoutError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("max_content_chars"));
        assert!(toml_str.contains("DEFAULT_AI_PROVIDER"));
        assert!(toml_str.contains("SANITY_API_TOKEN"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.fetch.timeout_secs, 10);
        assert_eq!(parsed.fetch.max_content_chars, 50_000);
        assert_eq!(parsed.matching.category, MatchPolicy::Fuzzy);
        assert_eq!(parsed.matching.tags, MatchPolicy::Exact);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let toml_str = r#"
[ai]
default_provider = "google"

[ai.google]
model = "gemini-2.0-pro"

[cms]
project_id = "abc123"

[matching]
tags = "fuzzy"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.ai.default_provider.as_deref(), Some("google"));
        assert_eq!(config.ai.google.model.as_deref(), Some("gemini-2.0-pro"));
        assert!(config.ai.google.api_key_env.is_none());
        assert_eq!(config.cms.project_id.as_deref(), Some("abc123"));
        assert_eq!(config.cms.dataset, "production");
        assert_eq!(config.matching.tags, MatchPolicy::Fuzzy);
        assert_eq!(config.matching.category, MatchPolicy::Fuzzy);
        assert!(config.assets.upload);
    }

    #[test]
    fn page_format_parses_lowercase() {
        let config: AppConfig =
            toml::from_str("[fetch]\npage_format = \"markdown\"\n").expect("parse");
        assert_eq!(config.fetch.page_format, PageFormat::Markdown);
    }

    #[test]
    fn load_config_from_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("toolscout-does-not-exist.toml");
        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, ToolscoutError::Io { .. }));
    }
}
