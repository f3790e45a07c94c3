//! Loads the three controlled vocabularies from the CMS.

use tracing::{debug, instrument, warn};

use toolscout_cms::CmsClient;
use toolscout_shared::{ControlledVocabulary, Result, VocabularyKind};

use crate::report::Degradation;

/// Query categories, tags, and core technologies concurrently.
///
/// A failed query is logged and replaced by an empty list; it never aborts
/// the other two.
#[instrument(skip_all, fields(cms = cms.name()))]
pub async fn load_vocabulary(cms: &dyn CmsClient) -> (ControlledVocabulary, Vec<Degradation>) {
    let (categories, tags, core_technologies) = tokio::join!(
        cms.list_labels(VocabularyKind::Category),
        cms.list_labels(VocabularyKind::Tag),
        cms.list_labels(VocabularyKind::CoreTechnology),
    );

    let mut degradations = Vec::new();
    let mut settle = |kind: VocabularyKind, outcome: Result<Vec<String>>| match outcome {
        Ok(labels) => labels,
        Err(e) => {
            warn!(kind = %kind, error = %e, "vocabulary query failed; using empty list");
            degradations.push(Degradation::VocabularyUnavailable { vocabulary: kind });
            Vec::new()
        }
    };

    let vocabulary = ControlledVocabulary::new(
        settle(VocabularyKind::Category, categories),
        settle(VocabularyKind::Tag, tags),
        settle(VocabularyKind::CoreTechnology, core_technologies),
    );

    debug!(
        categories = vocabulary.categories.len(),
        tags = vocabulary.tags.len(),
        core_technologies = vocabulary.core_technologies.len(),
        "vocabulary loaded"
    );
    (vocabulary, degradations)
}
