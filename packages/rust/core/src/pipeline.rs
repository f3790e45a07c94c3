//! End-to-end extraction: URL → vocabulary → page → prompt → model → reconcile → assets.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument, warn};
use url::Url;

use toolscout_cms::CmsClient;
use toolscout_fetch::{AssetFetcher, PageFetcher, tool_name_from_url, to_markdown};
use toolscout_llm::schema::schema_for_type;
use toolscout_llm::{AiResolution, ModelBackend, ModelRequest, build_backend};
use toolscout_shared::{
    ActionResult, AppConfig, AssetsConfig, FetchConfig, ListingDraft, MatchingConfig, PageFormat,
    Result, SubmissionId,
};

use crate::assets::upload_assets;
use crate::fallback::fallback_draft;
use crate::listing::ModelListing;
use crate::prompt::{PromptInput, build_prompt, system_prompt};
use crate::reconcile::{PageContext, Reconciled, reconcile};
use crate::report::{Degradation, ExtractionReport, FallbackReason};
use crate::vocabulary::load_vocabulary;

/// Message returned when no AI provider is configured.
pub const AI_DISABLED_MESSAGE: &str = "AI submit is not supported";

/// Message returned for a blank URL.
pub const URL_REQUIRED_MESSAGE: &str = "URL is required";

/// Schema name reported to providers.
const SCHEMA_NAME: &str = "tool_listing";

/// Settings the pipeline needs from the application config.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub fetch: FetchConfig,
    pub assets: AssetsConfig,
    pub matching: MatchingConfig,
    /// Allow localhost/private hosts (for tests against mock servers).
    pub allow_private_hosts: bool,
}

impl From<&AppConfig> for PipelineConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            fetch: config.fetch.clone(),
            assets: config.assets.clone(),
            matching: config.matching.clone(),
            allow_private_hosts: false,
        }
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new stage.
    fn phase(&self, name: &str);
    /// Called once with the final report.
    fn done(&self, report: &ExtractionReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _report: &ExtractionReport) {}
}

/// Provider state, fixed at construction.
enum Provider {
    Disabled,
    Unavailable { provider: String, reason: String },
    Ready(Arc<dyn ModelBackend>),
}

/// The listing-extraction pipeline.
///
/// Built once at startup with the resolved provider and shared across
/// requests; every call is self-contained.
pub struct SubmissionPipeline {
    config: PipelineConfig,
    cms: Arc<dyn CmsClient>,
    provider: Provider,
    page_fetcher: PageFetcher,
    asset_fetcher: AssetFetcher,
    schema: serde_json::Value,
}

impl SubmissionPipeline {
    /// Create a pipeline, building the backend for a ready provider.
    ///
    /// A backend that cannot be built is treated like an unavailable provider.
    pub fn new(config: PipelineConfig, cms: Arc<dyn CmsClient>, ai: AiResolution) -> Result<Self> {
        let provider = match ai {
            AiResolution::Disabled => Provider::Disabled,
            AiResolution::Unavailable { provider, reason } => {
                warn!(%provider, %reason, "AI provider unavailable; extraction will fall back");
                Provider::Unavailable { provider, reason }
            }
            AiResolution::Ready(settings) => match build_backend(&settings) {
                Ok(backend) => Provider::Ready(backend),
                Err(e) => {
                    warn!(provider = %settings.kind, error = %e, "failed to build AI backend");
                    Provider::Unavailable {
                        provider: settings.kind.to_string(),
                        reason: e.to_string(),
                    }
                }
            },
        };
        Self::build(config, cms, provider)
    }

    /// Create a pipeline around an existing backend.
    pub fn with_backend(
        config: PipelineConfig,
        cms: Arc<dyn CmsClient>,
        backend: Arc<dyn ModelBackend>,
    ) -> Result<Self> {
        Self::build(config, cms, Provider::Ready(backend))
    }

    fn build(config: PipelineConfig, cms: Arc<dyn CmsClient>, provider: Provider) -> Result<Self> {
        let mut page_fetcher = PageFetcher::new(&config.fetch)?;
        let mut asset_fetcher = AssetFetcher::new(&config.assets)?;
        if config.allow_private_hosts {
            page_fetcher = page_fetcher.allow_private_hosts();
            asset_fetcher = asset_fetcher.allow_private_hosts();
        }

        Ok(Self {
            config,
            cms,
            provider,
            page_fetcher,
            asset_fetcher,
            schema: schema_for_type::<ModelListing>(),
        })
    }

    /// Whether the AI submit feature is on (a provider is named).
    pub fn is_enabled(&self) -> bool {
        !matches!(self.provider, Provider::Disabled)
    }

    /// Provider name and model, or why there is none.
    pub fn provider_summary(&self) -> String {
        match &self.provider {
            Provider::Disabled => "disabled".to_string(),
            Provider::Unavailable { provider, reason } => {
                format!("{provider} (unavailable: {reason})")
            }
            Provider::Ready(backend) => format!("{} ({})", backend.kind(), backend.model()),
        }
    }

    /// Form action entry point: always answers with a discriminated result.
    pub async fn fetch_website(&self, raw_url: &str) -> ActionResult {
        self.fetch_website_with(raw_url, &SilentProgress).await
    }

    /// [`fetch_website`](Self::fetch_website) with progress callbacks.
    pub async fn fetch_website_with(
        &self,
        raw_url: &str,
        progress: &dyn ProgressReporter,
    ) -> ActionResult {
        if !self.is_enabled() {
            return ActionResult::error(AI_DISABLED_MESSAGE);
        }
        if raw_url.trim().is_empty() {
            return ActionResult::error(URL_REQUIRED_MESSAGE);
        }

        ActionResult::Success {
            data: self.fetch_website_info_report(raw_url, progress).await.draft,
        }
    }

    /// Extract a draft. Never fails; falls back to a minimal draft.
    pub async fn fetch_website_info(&self, raw_url: &str) -> ListingDraft {
        self.fetch_website_info_report(raw_url, &SilentProgress)
            .await
            .draft
    }

    /// Extract a draft and report every absorbed failure.
    pub async fn fetch_website_info_report(
        &self,
        raw_url: &str,
        progress: &dyn ProgressReporter,
    ) -> ExtractionReport {
        let submission_id = SubmissionId::new();
        let report = self.run(submission_id, raw_url, progress).await;
        progress.done(&report);
        report
    }

    #[instrument(skip_all, fields(submission_id = %submission_id, url = %raw_url))]
    async fn run(
        &self,
        submission_id: SubmissionId,
        raw_url: &str,
        progress: &dyn ProgressReporter,
    ) -> ExtractionReport {
        let start = Instant::now();
        let fallback = |reason: FallbackReason, degradations: Vec<Degradation>| {
            warn!(stage = reason.as_str(), "returning fallback draft");
            ExtractionReport {
                submission_id,
                draft: fallback_draft(raw_url),
                fallback: Some(reason),
                degradations,
            }
        };

        // --- Parse URL ---
        progress.phase("Parsing URL");
        let Some(url) = parse_submission_url(raw_url) else {
            warn!("submitted URL is not an absolute http(s) URL");
            return fallback(FallbackReason::InvalidUrl, Vec::new());
        };

        // --- Provider check ---
        let backend = match &self.provider {
            Provider::Ready(backend) => backend,
            Provider::Unavailable { provider, reason } => {
                warn!(%provider, %reason, "AI provider unavailable");
                return fallback(FallbackReason::ProviderUnavailable, Vec::new());
            }
            Provider::Disabled => {
                warn!("AI provider disabled");
                return fallback(FallbackReason::ProviderUnavailable, Vec::new());
            }
        };

        // --- Vocabulary ---
        progress.phase("Loading vocabularies");
        let (vocabulary, mut degradations) = load_vocabulary(self.cms.as_ref()).await;

        // --- Fetch ---
        progress.phase("Fetching page");
        let page = match self.page_fetcher.fetch_page(&url).await {
            Ok(page) => page,
            Err(e) => {
                warn!(stage = "fetch", error = %e, "page fetch failed");
                return fallback(FallbackReason::FetchFailed, degradations);
            }
        };
        if !page.has_content() {
            degradations.push(Degradation::PageUnreadable {
                status: page.status,
            });
        }

        let content = match self.config.fetch.page_format {
            PageFormat::Html => page.html.clone(),
            PageFormat::Markdown => to_markdown(&page.html).unwrap_or_else(|e| {
                warn!(error = %e, "markdown conversion failed; sending HTML");
                page.html.clone()
            }),
        };

        // --- Prompt ---
        progress.phase("Building prompt");
        let tool_name = tool_name_from_url(&url);
        let prompt = build_prompt(&PromptInput {
            url: raw_url.trim(),
            tool_name: tool_name.as_deref(),
            content: &content,
            vocabulary: &vocabulary,
            max_content_chars: self.config.fetch.max_content_chars,
        });

        // --- Model ---
        progress.phase("Invoking model");
        let request = ModelRequest {
            system: system_prompt().to_string(),
            prompt,
            schema_name: SCHEMA_NAME.to_string(),
            schema: self.schema.clone(),
        };
        let value = match backend.generate(&request).await {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    stage = "model",
                    provider = %backend.kind(),
                    model = backend.model(),
                    status = ?e.status(),
                    error = %e,
                    "model call failed"
                );
                return fallback(FallbackReason::ModelFailed, degradations);
            }
        };

        // --- Reconcile ---
        progress.phase("Reconciling");
        let Reconciled {
            mut draft,
            degradations: repaired,
        } = reconcile(
            ModelListing::parse(value),
            &vocabulary,
            &self.config.matching,
            PageContext {
                raw_url: raw_url.trim(),
                url: &url,
                hints: &page.hints,
            },
        );
        degradations.extend(repaired);

        // --- Assets ---
        if self.config.assets.upload {
            progress.phase("Uploading assets");
            let asset_degradations =
                upload_assets(&mut draft, &self.asset_fetcher, self.cms.as_ref()).await;
            degradations.extend(asset_degradations);
        } else {
            degradations.push(Degradation::AssetsSkipped);
        }

        info!(
            name = %draft.name,
            category = %draft.category,
            tags = draft.tags.len(),
            degradations = degradations.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "extraction complete"
        );

        ExtractionReport {
            submission_id,
            draft,
            fallback: None,
            degradations,
        }
    }
}

/// Accept only absolute http(s) URLs with a host.
fn parse_submission_url(raw_url: &str) -> Option<Url> {
    let url = Url::parse(raw_url.trim()).ok()?;
    let valid = matches!(url.scheme(), "http" | "https") && url.host().is_some();
    valid.then_some(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_urls_must_be_absolute_http() {
        assert!(parse_submission_url("https://acme.dev").is_some());
        assert!(parse_submission_url("  http://acme.dev/x  ").is_some());
        assert!(parse_submission_url("acme.dev").is_none());
        assert!(parse_submission_url("ftp://acme.dev").is_none());
        assert!(parse_submission_url("").is_none());
    }

    #[test]
    fn pipeline_config_from_app_config() {
        let mut app = AppConfig::default();
        app.assets.upload = false;
        let config = PipelineConfig::from(&app);
        assert!(!config.assets.upload);
        assert!(!config.allow_private_hosts);
        assert_eq!(config.fetch.max_content_chars, 50_000);
    }
}
