//! The object the model is asked to produce, and its lenient parser.
//!
//! [`ModelListing`] is both the JSON Schema handed to the provider and the
//! type the completion is deserialized into. Each field is wrapped in
//! [`Lenient`], which never fails: a mistyped or missing value becomes the
//! field's default and is flagged as repaired.

use schemars::JsonSchema;
use schemars::r#gen::SchemaGenerator;
use schemars::schema::Schema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use toolscout_shared::{
    Alternative, FaqEntry, LearningCurve, PricingSnapshot, SetupTime, TriState,
};

// ---------------------------------------------------------------------------
// Lenient<T>
// ---------------------------------------------------------------------------

/// Interpretation of a loosely-typed model value.
pub trait Coerce: Sized + Default {
    /// Returns the interpreted value and whether it arrived in the expected shape.
    fn coerce(value: Value) -> (Self, bool);
}

/// A field value plus whether it had to be repaired.
///
/// A field absent from the completion deserializes to the default with
/// `repaired = true`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lenient<T> {
    pub value: T,
    pub repaired: bool,
}

impl<T> Lenient<T> {
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T: Default> Default for Lenient<T> {
    fn default() -> Self {
        Self {
            value: T::default(),
            repaired: true,
        }
    }
}

impl<'de, T: Coerce> Deserialize<'de> for Lenient<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        let (value, clean) = T::coerce(raw);
        Ok(Self {
            value,
            repaired: !clean,
        })
    }
}

impl<T: Serialize> Serialize for Lenient<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<T: JsonSchema> JsonSchema for Lenient<T> {
    fn is_referenceable() -> bool {
        T::is_referenceable()
    }

    fn schema_name() -> String {
        T::schema_name()
    }

    fn json_schema(generator: &mut SchemaGenerator) -> Schema {
        T::json_schema(generator)
    }
}

// ---------------------------------------------------------------------------
// Coerce impls
// ---------------------------------------------------------------------------

/// Scalars become strings; anything else is unusable.
fn scalar_to_string(value: Value) -> Option<(String, bool)> {
    match value {
        Value::String(s) => Some((s.trim().to_string(), true)),
        Value::Number(n) => Some((n.to_string(), false)),
        Value::Bool(b) => Some((b.to_string(), false)),
        _ => None,
    }
}

impl Coerce for String {
    fn coerce(value: Value) -> (Self, bool) {
        scalar_to_string(value).unwrap_or_default()
    }
}

impl Coerce for Option<String> {
    fn coerce(value: Value) -> (Self, bool) {
        match value {
            Value::Null => (None, true),
            Value::String(s) => {
                let s = s.trim();
                (if s.is_empty() { None } else { Some(s.to_string()) }, true)
            }
            _ => (None, false),
        }
    }
}

impl Coerce for Vec<String> {
    fn coerce(value: Value) -> (Self, bool) {
        let Value::Array(items) = value else {
            return (Vec::new(), false);
        };

        let mut clean = true;
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            match scalar_to_string(item) {
                Some((s, item_clean)) => {
                    clean &= item_clean;
                    if !s.is_empty() {
                        out.push(s);
                    }
                }
                None => clean = false,
            }
        }
        (out, clean)
    }
}

/// Reads a required string member of a model object.
fn member(object: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Arrays of objects keep only the entries that have every member.
fn object_list<T>(
    value: Value,
    build: impl Fn(&serde_json::Map<String, Value>) -> Option<T>,
) -> (Vec<T>, bool) {
    let Value::Array(items) = value else {
        return (Vec::new(), false);
    };

    let total = items.len();
    let out: Vec<T> = items
        .iter()
        .filter_map(Value::as_object)
        .filter_map(build)
        .collect();
    let clean = out.len() == total;
    (out, clean)
}

impl Coerce for Vec<Alternative> {
    fn coerce(value: Value) -> (Self, bool) {
        object_list(value, |o| {
            Some(Alternative {
                name: member(o, "name")?,
                reason: member(o, "reason")?,
            })
        })
    }
}

impl Coerce for Vec<FaqEntry> {
    fn coerce(value: Value) -> (Self, bool) {
        object_list(value, |o| {
            Some(FaqEntry {
                question: member(o, "question")?,
                answer: member(o, "answer")?,
            })
        })
    }
}

impl Coerce for TriState {
    fn coerce(value: Value) -> (Self, bool) {
        match value {
            Value::Bool(true) => (Self::Yes, true),
            Value::Bool(false) => (Self::No, true),
            Value::String(s) => match Self::parse_lenient(&s) {
                Some(v) => (v, true),
                None => (Self::default(), false),
            },
            _ => (Self::default(), false),
        }
    }
}

impl Coerce for SetupTime {
    fn coerce(value: Value) -> (Self, bool) {
        value
            .as_str()
            .and_then(Self::parse_lenient)
            .map_or((Self::default(), false), |v| (v, true))
    }
}

impl Coerce for LearningCurve {
    fn coerce(value: Value) -> (Self, bool) {
        value
            .as_str()
            .and_then(Self::parse_lenient)
            .map_or((Self::default(), false), |v| (v, true))
    }
}

impl Coerce for PricingSnapshot {
    fn coerce(value: Value) -> (Self, bool) {
        let Value::Object(mut object) = value else {
            return (Self::default(), false);
        };

        let mut take = |key: &str| object.remove(key).unwrap_or(Value::Null);
        let (has_free_tier, a) = TriState::coerce(take("hasFreeTier"));
        let (has_paid_plans, b) = TriState::coerce(take("hasPaidPlans"));
        let (is_open_source, c) = TriState::coerce(take("isOpenSource"));
        let (notes, d) = match take("notes") {
            Value::Null => (String::new(), true),
            other => String::coerce(other),
        };

        (
            Self {
                has_free_tier,
                has_paid_plans,
                is_open_source,
                notes,
            },
            a && b && c && d,
        )
    }
}

// ---------------------------------------------------------------------------
// ModelListing
// ---------------------------------------------------------------------------

/// Listing fields as requested from the model.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelListing {
    /// Product name as the vendor writes it.
    pub name: Lenient<String>,
    /// Tagline under 100 characters.
    pub one_liner: Lenient<String>,
    /// One paragraph on what the tool does and how.
    pub what_it_does: Lenient<String>,
    /// Audiences or situations the tool suits best (3-5 short phrases).
    pub best_for: Lenient<Vec<String>>,
    /// Headline features (3-8 short phrases).
    pub key_features: Lenient<Vec<String>>,
    /// Strengths (2-5 short phrases).
    pub pros: Lenient<Vec<String>>,
    /// Weaknesses or limitations (2-5 short phrases).
    pub cons: Lenient<Vec<String>>,
    /// Situations where this tool is the right pick.
    pub use_this_if: Lenient<Vec<String>>,
    /// Situations where another tool is a better pick.
    pub skip_this_if: Lenient<Vec<String>>,
    pub pricing_snapshot: Lenient<PricingSnapshot>,
    /// How long until a first useful result.
    pub setup_time: Lenient<SetupTime>,
    /// How hard the tool is to learn.
    pub learning_curve: Lenient<LearningCurve>,
    /// Competing tools, each with a one-sentence reason to pick it instead.
    pub alternatives: Lenient<Vec<Alternative>>,
    /// Questions a prospective user would ask, with short answers.
    pub faq: Lenient<Vec<FaqEntry>>,
    /// Tags, chosen only from the allowed tag list.
    pub tags: Lenient<Vec<String>>,
    /// Exactly one category from the allowed category list.
    pub category: Lenient<String>,
    /// Two or three sentence summary.
    pub description: Lenient<String>,
    /// Markdown introduction with short sections.
    pub introduction: Lenient<String>,
    /// Categories from the allowed category list.
    pub categories: Lenient<Vec<String>>,
    /// Core technologies from the allowed list.
    pub core_technologies: Lenient<Vec<String>>,
    /// Absolute URL of a screenshot or social preview image.
    pub image: Lenient<Option<String>>,
    /// Absolute URL of the logo or favicon.
    pub icon: Lenient<Option<String>>,
}

impl ModelListing {
    /// Parse a completion object. Never fails; a non-object yields all defaults.
    pub fn parse(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    /// Wire names of the fields that were missing or mistyped.
    pub fn repaired_fields(&self) -> Vec<&'static str> {
        [
            ("name", self.name.repaired),
            ("oneLiner", self.one_liner.repaired),
            ("whatItDoes", self.what_it_does.repaired),
            ("bestFor", self.best_for.repaired),
            ("keyFeatures", self.key_features.repaired),
            ("pros", self.pros.repaired),
            ("cons", self.cons.repaired),
            ("useThisIf", self.use_this_if.repaired),
            ("skipThisIf", self.skip_this_if.repaired),
            ("pricingSnapshot", self.pricing_snapshot.repaired),
            ("setupTime", self.setup_time.repaired),
            ("learningCurve", self.learning_curve.repaired),
            ("alternatives", self.alternatives.repaired),
            ("faq", self.faq.repaired),
            ("tags", self.tags.repaired),
            ("category", self.category.repaired),
            ("description", self.description.repaired),
            ("introduction", self.introduction.repaired),
            ("categories", self.categories.repaired),
            ("coreTechnologies", self.core_technologies.repaired),
            ("image", self.image.repaired),
            ("icon", self.icon.repaired),
        ]
        .into_iter()
        .filter_map(|(field, repaired)| repaired.then_some(field))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn complete() -> Value {
        json!({
            "name": "Acme",
            "oneLiner": "Ship faster",
            "whatItDoes": "Builds things.",
            "bestFor": ["Teams"],
            "keyFeatures": ["Speed"],
            "pros": ["Fast"],
            "cons": ["Pricey"],
            "useThisIf": ["You ship"],
            "skipThisIf": ["You don't"],
            "pricingSnapshot": {
                "hasFreeTier": "yes",
                "hasPaidPlans": "yes",
                "isOpenSource": "no",
                "notes": "Free tier"
            },
            "setupTime": "minutes",
            "learningCurve": "easy",
            "alternatives": [{"name": "Other", "reason": "Cheaper"}],
            "faq": [{"question": "Is it free?", "answer": "Partly."}],
            "tags": ["AI"],
            "category": "Developer Tools",
            "description": "Acme builds things.",
            "introduction": "## Acme",
            "categories": ["Developer Tools"],
            "coreTechnologies": ["Rust"],
            "image": "https://acme.dev/og.png",
            "icon": null
        })
    }

    #[test]
    fn complete_object_needs_no_repair() {
        let listing = ModelListing::parse(complete());
        assert!(listing.repaired_fields().is_empty());
        assert_eq!(listing.name.value, "Acme");
        assert_eq!(listing.pricing_snapshot.value.is_open_source, TriState::No);
        assert_eq!(listing.learning_curve.value, LearningCurve::Easy);
        assert_eq!(listing.icon.value, None);
    }

    #[test]
    fn non_arrays_become_empty_and_are_flagged() {
        let mut value = complete();
        value["pros"] = json!("Fast");
        value["faq"] = json!({"question": "?"});
        let listing = ModelListing::parse(value);

        assert!(listing.pros.value.is_empty());
        assert!(listing.faq.value.is_empty());
        assert_eq!(listing.repaired_fields(), vec!["pros", "faq"]);
    }

    #[test]
    fn scalars_are_stringified() {
        let mut value = complete();
        value["name"] = json!(42);
        value["keyFeatures"] = json!(["Speed", 10, true, null, "  "]);
        let listing = ModelListing::parse(value);

        assert_eq!(listing.name.value, "42");
        assert_eq!(listing.key_features.value, vec!["Speed", "10", "true"]);
        assert_eq!(listing.repaired_fields(), vec!["name", "keyFeatures"]);
    }

    #[test]
    fn incomplete_objects_are_skipped() {
        let mut value = complete();
        value["alternatives"] = json!([
            {"name": "Other", "reason": "Cheaper"},
            {"name": "NoReason"},
            "Loose string"
        ]);
        let listing = ModelListing::parse(value);
        assert_eq!(listing.alternatives.value.len(), 1);
        assert!(listing.alternatives.repaired);
    }

    #[test]
    fn enums_accept_synonyms_and_default_otherwise() {
        let mut value = complete();
        value["learningCurve"] = json!("High");
        value["setupTime"] = json!("eventually");
        value["pricingSnapshot"]["hasFreeTier"] = json!(true);
        let listing = ModelListing::parse(value);

        assert_eq!(listing.learning_curve.value, LearningCurve::Steep);
        assert_eq!(listing.setup_time.value, SetupTime::Minutes);
        assert_eq!(listing.pricing_snapshot.value.has_free_tier, TriState::Yes);
        assert_eq!(listing.repaired_fields(), vec!["setupTime"]);
    }

    #[test]
    fn missing_fields_are_flagged() {
        let listing = ModelListing::parse(json!({"name": "Acme"}));
        let repaired = listing.repaired_fields();
        assert!(!repaired.contains(&"name"));
        assert!(repaired.contains(&"tags"));
        assert!(listing.tags.value.is_empty());
    }

    #[test]
    fn non_object_yields_defaults() {
        let listing = ModelListing::parse(json!(["not", "an", "object"]));
        assert_eq!(listing.name.value, "");
        assert_eq!(listing.repaired_fields().len(), 22);
    }

    #[test]
    fn schema_lists_every_field_with_plain_types() {
        let schema = toolscout_llm::schema::schema_for_type::<ModelListing>();
        let properties = schema["properties"].as_object().unwrap();
        assert_eq!(properties.len(), 22);
        assert_eq!(properties["tags"]["type"], "array");
        assert_eq!(properties["learningCurve"]["enum"], json!(["easy", "moderate", "steep"]));
        assert_eq!(
            properties["pricingSnapshot"]["properties"]["hasFreeTier"]["enum"],
            json!(["yes", "no", "unknown"])
        );
    }
}
