//! What happened during one extraction run.

use serde::Serialize;

use toolscout_shared::{ListingDraft, SubmissionId, VocabularyKind};

/// Why the pipeline returned the fallback draft instead of a model result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// The submitted URL did not parse as an absolute http(s) URL.
    InvalidUrl,
    /// A provider is named but has no usable API key, or is unknown.
    ProviderUnavailable,
    /// The page could not be fetched at all.
    FetchFailed,
    /// The provider call failed or returned something that is not an object.
    ModelFailed,
}

impl FallbackReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidUrl => "invalid_url",
            Self::ProviderUnavailable => "provider_unavailable",
            Self::FetchFailed => "fetch_failed",
            Self::ModelFailed => "model_failed",
        }
    }
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-fatal problem absorbed by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    /// A vocabulary query failed; the list was treated as empty.
    VocabularyUnavailable { vocabulary: VocabularyKind },
    /// The page answered without usable content.
    PageUnreadable { status: u16 },
    /// A model field was missing or mistyped and was replaced by its default.
    ModelRepaired { field: &'static str },
    /// An icon or image could not be downloaded.
    AssetFetchFailed,
    /// The CMS rejected an asset upload.
    AssetUploadFailed,
    /// Uploads were not attempted (disabled, read-only CMS, or a URL missing).
    AssetsSkipped,
}

/// Full outcome of one extraction run.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    pub submission_id: SubmissionId,
    pub draft: ListingDraft,
    /// Set when the draft came from the fallback builder.
    pub fallback: Option<FallbackReason>,
    pub degradations: Vec<Degradation>,
}

impl ExtractionReport {
    /// Whether the draft came from the model.
    pub fn is_extracted(&self) -> bool {
        self.fallback.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degradations_serialize_with_kind_tag() {
        let json = serde_json::to_value(Degradation::VocabularyUnavailable {
            vocabulary: VocabularyKind::CoreTechnology,
        })
        .unwrap();
        assert_eq!(json["kind"], "vocabulary_unavailable");
        assert_eq!(json["vocabulary"], "core_technology");

        let json = serde_json::to_value(Degradation::AssetsSkipped).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "assets_skipped"}));
    }

    #[test]
    fn fallback_reason_display_matches_serde() {
        let json = serde_json::to_value(FallbackReason::FetchFailed).unwrap();
        assert_eq!(json, FallbackReason::FetchFailed.to_string());
    }
}
