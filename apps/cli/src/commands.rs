//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use toolscout_cms::{CmsClient, MemoryCms, SanityClient};
use toolscout_core::vocabulary::load_vocabulary;
use toolscout_core::{ExtractionReport, PipelineConfig, ProgressReporter, SubmissionPipeline};
use toolscout_llm::{AiResolution, resolve};
use toolscout_shared::{
    AppConfig, CmsConfig, ControlledVocabulary, init_config, load_config, load_config_from,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// toolscout: draft directory listings from product websites.
#[derive(Parser)]
#[command(
    name = "toolscout",
    version,
    about = "Draft tool-directory listings from product websites with an AI provider.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.toolscout/toolscout.toml).
    #[arg(long, global = true, env = "TOOLSCOUT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Extract a listing draft from a website and print it as JSON.
    Extract {
        /// Website URL of the tool.
        url: String,

        /// Do not upload the icon and image to the CMS.
        #[arg(long)]
        no_upload: bool,

        /// Print the full extraction report instead of the form result.
        #[arg(long)]
        report: bool,

        /// Pretty-print JSON output.
        #[arg(long)]
        pretty: bool,
    },

    /// Print the categories, tags, and core technologies the CMS defines.
    Vocab {
        /// Pretty-print JSON output.
        #[arg(long)]
        pretty: bool,
    },

    /// Show which AI provider would be used.
    Provider,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr; stdout carries JSON.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "toolscout=info",
        1 => "toolscout=debug",
        _ => "toolscout=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    match cli.command {
        Command::Extract {
            url,
            no_upload,
            report,
            pretty,
        } => cmd_extract(config_path, &url, no_upload, report, pretty).await,
        Command::Vocab { pretty } => cmd_vocab(config_path, pretty).await,
        Command::Provider => cmd_provider(config_path).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(config_path).await,
        },
    }
}

fn load(config_path: Option<PathBuf>) -> Result<AppConfig> {
    Ok(match config_path {
        Some(path) => load_config_from(&path)?,
        None => load_config()?,
    })
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Sanity when a project is configured, otherwise an empty read-only store.
fn build_cms(config: &CmsConfig) -> Result<Arc<dyn CmsClient>> {
    if config.project_id.is_none() && config.base_url.is_none() {
        warn!("cms.project_id is not set; using an empty vocabulary and skipping uploads");
        return Ok(Arc::new(
            MemoryCms::new(ControlledVocabulary::default()).read_only(),
        ));
    }

    let token = env_lookup(&config.token_env);
    Ok(Arc::new(SanityClient::from_config(config, token)?))
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_extract(
    config_path: Option<PathBuf>,
    url: &str,
    no_upload: bool,
    report: bool,
    pretty: bool,
) -> Result<()> {
    let mut config = load(config_path)?;
    if no_upload {
        config.assets.upload = false;
    }

    let ai = resolve(&config.ai, env_lookup);
    let cms = build_cms(&config.cms)?;
    let pipeline = SubmissionPipeline::new(PipelineConfig::from(&config), cms, ai)?;

    info!(
        url,
        provider = %pipeline.provider_summary(),
        upload = config.assets.upload,
        "extracting listing"
    );

    let progress = CliProgress::new();
    let output = extract_output(&pipeline, url, report, &progress).await;
    progress.finish();
    print_json(&output?, pretty)
}

/// The form result, or the full report when asked for and the form would
/// have run. A disabled provider or blank URL answers with the form error
/// either way.
async fn extract_output(
    pipeline: &SubmissionPipeline,
    url: &str,
    report: bool,
    progress: &dyn ProgressReporter,
) -> Result<Value> {
    let output = if report && pipeline.is_enabled() && !url.trim().is_empty() {
        serde_json::to_value(pipeline.fetch_website_info_report(url, progress).await)?
    } else {
        serde_json::to_value(pipeline.fetch_website_with(url, progress).await)?
    };
    Ok(output)
}

async fn cmd_vocab(config_path: Option<PathBuf>, pretty: bool) -> Result<()> {
    let config = load(config_path)?;
    let cms = build_cms(&config.cms)?;

    let (vocabulary, degradations) = load_vocabulary(cms.as_ref()).await;
    if !degradations.is_empty() {
        warn!(failed = degradations.len(), "some vocabularies could not be loaded");
    }
    print_json(&vocabulary, pretty)
}

async fn cmd_provider(config_path: Option<PathBuf>) -> Result<()> {
    let config = load(config_path)?;

    match resolve(&config.ai, env_lookup) {
        AiResolution::Disabled => {
            println!("AI submit is disabled: {} is not set.", config.ai.provider_env);
        }
        AiResolution::Unavailable { provider, reason } => {
            println!("Provider: {provider}");
            println!("Status:   unavailable ({reason})");
        }
        AiResolution::Ready(settings) => {
            println!("Provider: {}", settings.kind);
            println!("Model:    {}", settings.model);
            println!("Endpoint: {}", settings.base_url);
            println!(
                "Output:   {}",
                if settings.kind.supports_structured_output() {
                    "structured (schema enforced by provider)"
                } else {
                    "JSON mode (schema in prompt)"
                }
            );
        }
    }
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config_path: Option<PathBuf>) -> Result<()> {
    let config = load(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Spinner on stderr showing the current pipeline stage.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, report: &ExtractionReport) {
        self.finish();
        if let Some(reason) = report.fallback {
            warn!(%reason, "extraction fell back to a minimal draft");
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use toolscout_core::SilentProgress;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_extract_flags() {
        let cli = Cli::try_parse_from([
            "toolscout",
            "extract",
            "https://acme.dev",
            "--no-upload",
            "--report",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Extract {
                url,
                no_upload,
                report,
                pretty,
            } => {
                assert_eq!(url, "https://acme.dev");
                assert!(no_upload);
                assert!(report);
                assert!(!pretty);
            }
            _ => panic!("expected extract"),
        }
    }

    #[test]
    fn cms_without_project_is_read_only_memory() {
        let cms = build_cms(&CmsConfig::default()).unwrap();
        assert_eq!(cms.name(), "memory");
        assert!(!cms.accepts_uploads());
    }

    #[tokio::test]
    async fn report_flag_keeps_disabled_error() {
        let cms: Arc<dyn CmsClient> = Arc::new(MemoryCms::new(ControlledVocabulary::default()));
        let pipeline =
            SubmissionPipeline::new(PipelineConfig::default(), cms, AiResolution::Disabled)
                .unwrap();

        let output = extract_output(&pipeline, "https://acme.dev", true, &SilentProgress)
            .await
            .unwrap();

        assert_eq!(
            output,
            serde_json::json!({"status": "error", "message": "AI submit is not supported"})
        );
    }

    #[test]
    fn cms_with_project_is_sanity() {
        let config = CmsConfig {
            project_id: Some("abc123".into()),
            ..CmsConfig::default()
        };
        let cms = build_cms(&config).unwrap();
        assert_eq!(cms.name(), "sanity");
    }
}
