//! Core domain types for toolscout listing drafts.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name used when nothing better is known about a tool.
pub const DEFAULT_TOOL_NAME: &str = "Tool";

// ---------------------------------------------------------------------------
// SubmissionId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one extraction run (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub Uuid);

impl SubmissionId {
    /// Generate a new time-sortable submission identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Controlled vocabulary
// ---------------------------------------------------------------------------

/// The three label lists a listing may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VocabularyKind {
    Category,
    Tag,
    CoreTechnology,
}

impl VocabularyKind {
    /// Stable name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Tag => "tag",
            Self::CoreTechnology => "core_technology",
        }
    }

    /// CMS document type holding labels of this kind.
    pub fn document_type(&self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Tag => "tag",
            Self::CoreTechnology => "coreTechnology",
        }
    }
}

impl std::fmt::Display for VocabularyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Permitted labels, loaded fresh for every extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlledVocabulary {
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub core_technologies: Vec<String>,
}

impl ControlledVocabulary {
    /// Build a vocabulary, trimming labels and dropping blanks and duplicates.
    pub fn new(
        categories: Vec<String>,
        tags: Vec<String>,
        core_technologies: Vec<String>,
    ) -> Self {
        Self {
            categories: normalize_labels(categories),
            tags: normalize_labels(tags),
            core_technologies: normalize_labels(core_technologies),
        }
    }

    /// Labels of the given kind.
    pub fn labels(&self, kind: VocabularyKind) -> &[String] {
        match kind {
            VocabularyKind::Category => &self.categories,
            VocabularyKind::Tag => &self.tags,
            VocabularyKind::CoreTechnology => &self.core_technologies,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.tags.is_empty() && self.core_technologies.is_empty()
    }
}

/// Trim labels, drop blank ones, and keep the first occurrence of each.
pub fn normalize_labels(labels: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(labels.len());
    for label in labels {
        let trimmed = label.trim();
        if trimmed.is_empty() || out.iter().any(|l| l == trimmed) {
            continue;
        }
        out.push(trimmed.to_string());
    }
    out
}

// ---------------------------------------------------------------------------
// Listing enums
// ---------------------------------------------------------------------------

/// Yes / no / unknown answer for pricing questions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TriState {
    Yes,
    No,
    #[default]
    Unknown,
}

impl TriState {
    /// Interpret a loosely-typed model answer.
    pub fn parse_lenient(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "yes" | "true" | "y" => Some(Self::Yes),
            "no" | "false" | "n" => Some(Self::No),
            "unknown" | "unsure" | "n/a" | "" => Some(Self::Unknown),
            _ => None,
        }
    }
}

/// Rough time to get a first useful result out of the tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SetupTime {
    #[default]
    Minutes,
    Hours,
    Days,
}

impl SetupTime {
    pub fn parse_lenient(value: &str) -> Option<Self> {
        let v = value.trim().to_ascii_lowercase();
        if v.contains("minute") || v == "instant" || v == "quick" {
            Some(Self::Minutes)
        } else if v.contains("hour") {
            Some(Self::Hours)
        } else if v.contains("day") || v.contains("week") {
            Some(Self::Days)
        } else {
            None
        }
    }
}

/// How hard the tool is to learn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LearningCurve {
    Easy,
    #[default]
    Moderate,
    Steep,
}

impl LearningCurve {
    pub fn parse_lenient(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "easy" | "low" | "gentle" | "beginner" => Some(Self::Easy),
            "moderate" | "medium" | "intermediate" => Some(Self::Moderate),
            "steep" | "high" | "hard" | "advanced" => Some(Self::Steep),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ListingDraft
// ---------------------------------------------------------------------------

/// Pricing answers for a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PricingSnapshot {
    /// Whether a free tier or free plan exists.
    pub has_free_tier: TriState,
    /// Whether paid plans exist.
    pub has_paid_plans: TriState,
    /// Whether the source code is published under an open-source license.
    pub is_open_source: TriState,
    /// One sentence on pricing, e.g. "Free up to 3 projects, then $10/month".
    pub notes: String,
}

/// A competing tool and why someone would pick it instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Alternative {
    pub name: String,
    pub reason: String,
}

/// A question and answer pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

/// Structured description of a tool, used to pre-fill the submission form.
///
/// Every field has a default so a draft is structurally complete even when
/// extraction failed. Optional fields serialize as `null`, never omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListingDraft {
    pub name: String,
    pub one_liner: String,
    pub what_it_does: String,
    pub best_for: Vec<String>,
    pub key_features: Vec<String>,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub use_this_if: Vec<String>,
    pub skip_this_if: Vec<String>,
    pub pricing_snapshot: PricingSnapshot,
    pub setup_time: SetupTime,
    pub learning_curve: LearningCurve,
    pub alternatives: Vec<Alternative>,
    pub faq: Vec<FaqEntry>,
    pub tags: Vec<String>,
    pub category: String,

    // Legacy form fields.
    pub description: String,
    pub introduction: String,
    pub categories: Vec<String>,
    pub core_technologies: Vec<String>,

    pub image: Option<String>,
    pub icon: Option<String>,
    pub image_id: Option<String>,
    pub icon_id: Option<String>,
}

impl Default for ListingDraft {
    fn default() -> Self {
        Self {
            name: DEFAULT_TOOL_NAME.to_string(),
            one_liner: String::new(),
            what_it_does: String::new(),
            best_for: Vec::new(),
            key_features: Vec::new(),
            pros: Vec::new(),
            cons: Vec::new(),
            use_this_if: Vec::new(),
            skip_this_if: Vec::new(),
            pricing_snapshot: PricingSnapshot::default(),
            setup_time: SetupTime::default(),
            learning_curve: LearningCurve::default(),
            alternatives: Vec::new(),
            faq: Vec::new(),
            tags: Vec::new(),
            category: String::new(),
            description: String::new(),
            introduction: String::new(),
            categories: Vec::new(),
            core_technologies: Vec::new(),
            image: None,
            icon: None,
            image_id: None,
            icon_id: None,
        }
    }
}

// ---------------------------------------------------------------------------
// ActionResult
// ---------------------------------------------------------------------------

/// Discriminated result handed back to the submission form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ActionResult {
    Success { data: ListingDraft },
    Error { message: String },
}

impl ActionResult {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_draft_has_every_field() {
        let json = serde_json::to_value(ListingDraft::default()).expect("serialize");
        let obj = json.as_object().expect("object");
        for key in [
            "name",
            "oneLiner",
            "whatItDoes",
            "bestFor",
            "keyFeatures",
            "pros",
            "cons",
            "useThisIf",
            "skipThisIf",
            "pricingSnapshot",
            "setupTime",
            "learningCurve",
            "alternatives",
            "faq",
            "tags",
            "category",
            "description",
            "introduction",
            "categories",
            "coreTechnologies",
            "image",
            "icon",
            "imageId",
            "iconId",
        ] {
            assert!(obj.contains_key(key), "missing {key}");
        }
        assert_eq!(obj["name"], "Tool");
        assert_eq!(obj["image"], serde_json::Value::Null);
        assert_eq!(obj["pricingSnapshot"]["hasFreeTier"], "unknown");
    }

    #[test]
    fn action_result_is_tagged_by_status() {
        let err = ActionResult::error("AI submit is not supported");
        let json = serde_json::to_value(&err).expect("serialize");
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "AI submit is not supported");

        let ok = ActionResult::Success {
            data: ListingDraft::default(),
        };
        let json = serde_json::to_value(&ok).expect("serialize");
        assert_eq!(json["status"], "success");
        assert_eq!(json["data"]["name"], "Tool");
    }

    #[test]
    fn vocabulary_normalizes_labels() {
        let vocab = ControlledVocabulary::new(
            vec!["  AI ".into(), "".into(), "AI".into(), "Design".into()],
            vec!["   ".into()],
            vec![],
        );
        assert_eq!(vocab.categories, vec!["AI", "Design"]);
        assert!(vocab.tags.is_empty());
        assert_eq!(vocab.labels(VocabularyKind::Category).len(), 2);
    }

    #[test]
    fn lenient_enum_parsing() {
        assert_eq!(TriState::parse_lenient("TRUE"), Some(TriState::Yes));
        assert_eq!(TriState::parse_lenient("maybe"), None);
        assert_eq!(SetupTime::parse_lenient("a few hours"), Some(SetupTime::Hours));
        assert_eq!(LearningCurve::parse_lenient("High"), Some(LearningCurve::Steep));
    }

    #[test]
    fn submission_id_is_displayable() {
        let id = SubmissionId::new();
        assert_eq!(id.to_string().len(), 36);
    }
}
