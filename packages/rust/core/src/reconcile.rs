//! Turns a parsed model listing into a draft that only references known labels.

use tracing::debug;
use url::Url;

use toolscout_fetch::{PageHints, favicon_url};
use toolscout_shared::{
    ControlledVocabulary, DEFAULT_TOOL_NAME, ListingDraft, MatchPolicy, MatchingConfig,
};

use crate::listing::ModelListing;
use crate::report::Degradation;

/// Result of reconciliation. Never fails.
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub draft: ListingDraft,
    pub degradations: Vec<Degradation>,
}

/// Page-side context used to fill image and icon.
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    /// URL as submitted.
    pub raw_url: &'a str,
    /// Parsed URL; relative asset URLs resolve against it.
    pub url: &'a Url,
    pub hints: &'a PageHints,
}

// ---------------------------------------------------------------------------
// Label matching
// ---------------------------------------------------------------------------

/// Find the vocabulary entry a model label refers to.
///
/// Fuzzy matching tries, in order: exact, case-insensitive, containment in
/// either direction, then word-prefix. Containment prefers whole words over
/// raw substrings, and within each the entry sharing the most with the label
/// wins; remaining ties and the other stages go to the first entry.
pub fn match_label<'v>(
    candidate: &str,
    vocabulary: &'v [String],
    policy: MatchPolicy,
) -> Option<&'v str> {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return None;
    }

    if let Some(exact) = vocabulary.iter().find(|v| v.as_str() == candidate) {
        return Some(exact);
    }
    if policy == MatchPolicy::Exact {
        return None;
    }

    let needle = candidate.to_lowercase();
    let needle_words = words(&needle);
    let lowered: Vec<String> = vocabulary.iter().map(|v| v.to_lowercase()).collect();

    let index = lowered
        .iter()
        .position(|entry| *entry == needle)
        .or_else(|| {
            best_overlap(&lowered, |entry| {
                let entry_words = words(entry);
                (contains_words(&needle_words, &entry_words)
                    || contains_words(&entry_words, &needle_words))
                .then(|| entry_words.len().min(needle_words.len()))
            })
        })
        .or_else(|| {
            best_overlap(&lowered, |entry| {
                if needle.contains(entry) {
                    Some(entry.chars().count())
                } else if entry.contains(needle.as_str()) {
                    Some(needle.chars().count())
                } else {
                    None
                }
            })
        })
        .or_else(|| {
            lowered
                .iter()
                .position(|entry| !entry.is_empty() && word_prefix_match(entry, &needle))
        })?;

    Some(vocabulary[index].as_str())
}

/// Index of the non-empty entry with the highest score; ties keep the earlier entry.
fn best_overlap(entries: &[String], score: impl Fn(&str) -> Option<usize>) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (index, entry) in entries.iter().enumerate() {
        if entry.is_empty() {
            continue;
        }
        if let Some(value) = score(entry) {
            if best.is_none_or(|(_, top)| value > top) {
                best = Some((index, value));
            }
        }
    }
    best.map(|(index, _)| index)
}

/// Alphanumeric runs, so `CI/CD` is two words.
fn words(label: &str) -> Vec<&str> {
    label
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Whether `inner` occurs as a contiguous run of words in `outer`.
fn contains_words(outer: &[&str], inner: &[&str]) -> bool {
    !inner.is_empty() && outer.windows(inner.len()).any(|run| run == inner)
}

/// Same number of words, and each word of one is a prefix of the other's.
fn word_prefix_match(a: &str, b: &str) -> bool {
    let a_words: Vec<&str> = a.split_whitespace().collect();
    let b_words: Vec<&str> = b.split_whitespace().collect();

    a_words.len() == b_words.len()
        && a_words
            .iter()
            .zip(&b_words)
            .all(|(x, y)| x.starts_with(y) || y.starts_with(x))
}

/// Map every label through [`match_label`], dropping unknown ones and
/// duplicates. Vocabulary spelling is returned.
pub fn filter_labels(
    labels: &[String],
    vocabulary: &[String],
    policy: MatchPolicy,
) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for label in labels {
        if let Some(matched) = match_label(label, vocabulary, policy) {
            if !out.iter().any(|existing| existing == matched) {
                out.push(matched.to_string());
            }
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// Build the draft from a parsed listing.
pub fn reconcile(
    listing: ModelListing,
    vocabulary: &ControlledVocabulary,
    matching: &MatchingConfig,
    page: PageContext<'_>,
) -> Reconciled {
    let degradations: Vec<Degradation> = listing
        .repaired_fields()
        .into_iter()
        .map(|field| Degradation::ModelRepaired { field })
        .collect();

    let categories = filter_labels(
        &listing.categories.value,
        &vocabulary.categories,
        matching.category,
    );
    // an empty category may still be implied by the legacy list
    let category = match match_label(
        &listing.category.value,
        &vocabulary.categories,
        matching.category,
    ) {
        Some(matched) => matched.to_string(),
        None if listing.category.value.trim().is_empty() => {
            categories.first().cloned().unwrap_or_default()
        }
        None => String::new(),
    };

    let tags = filter_labels(&listing.tags.value, &vocabulary.tags, matching.tags);
    let core_technologies = filter_labels(
        &listing.core_technologies.value,
        &vocabulary.core_technologies,
        matching.core_technologies,
    );

    debug!(
        model_tags = listing.tags.value.len(),
        kept_tags = tags.len(),
        model_category = %listing.category.value,
        category = %category,
        "labels reconciled"
    );

    let name = match listing.name.value.trim() {
        "" => DEFAULT_TOOL_NAME.to_string(),
        name => name.to_string(),
    };

    let image = listing
        .image
        .value
        .as_deref()
        .and_then(|u| absolute_http_url(page.url, u))
        .or_else(|| page.hints.og_image.clone());
    let icon = listing
        .icon
        .value
        .as_deref()
        .and_then(|u| absolute_http_url(page.url, u))
        .or_else(|| page.hints.icon.clone())
        .unwrap_or_else(|| favicon_url(page.raw_url));

    let draft = ListingDraft {
        name,
        one_liner: listing.one_liner.into_inner(),
        what_it_does: listing.what_it_does.into_inner(),
        best_for: listing.best_for.into_inner(),
        key_features: listing.key_features.into_inner(),
        pros: listing.pros.into_inner(),
        cons: listing.cons.into_inner(),
        use_this_if: listing.use_this_if.into_inner(),
        skip_this_if: listing.skip_this_if.into_inner(),
        pricing_snapshot: listing.pricing_snapshot.into_inner(),
        setup_time: listing.setup_time.into_inner(),
        learning_curve: listing.learning_curve.into_inner(),
        alternatives: listing.alternatives.into_inner(),
        faq: listing.faq.into_inner(),
        tags,
        category,
        description: listing.description.into_inner(),
        introduction: listing.introduction.into_inner(),
        categories,
        core_technologies,
        image,
        icon: Some(icon),
        image_id: None,
        icon_id: None,
    };

    Reconciled {
        draft,
        degradations,
    }
}

/// Resolve a model-supplied URL against the page; only http(s) survives.
fn absolute_http_url(base: &Url, candidate: &str) -> Option<String> {
    let candidate = candidate.trim();
    if candidate.is_empty() || candidate.starts_with("data:") {
        return None;
    }
    let resolved = base.join(candidate).ok()?;
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}
