//! Minimal listing for when extraction cannot run or fails.

use url::Url;

use toolscout_fetch::{favicon_url, tool_name_from_url};
use toolscout_shared::{DEFAULT_TOOL_NAME, ListingDraft};

/// A draft with every field at its default, a name guessed from the
/// hostname, and the favicon-service icon. `raw_url` need not parse.
pub fn fallback_draft(raw_url: &str) -> ListingDraft {
    let name = Url::parse(raw_url.trim())
        .ok()
        .and_then(|url| tool_name_from_url(&url))
        .unwrap_or_else(|| DEFAULT_TOOL_NAME.to_string());

    ListingDraft {
        name,
        icon: Some(favicon_url(raw_url)),
        ..ListingDraft::default()
    }
}
