//! Metadata hints read from a page's `<head>`.
//!
//! These are used only as a backstop when the model leaves the icon or
//! screenshot empty.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use url::Url;

/// Head metadata found on a fetched page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageHints {
    /// Absolute `og:image` URL.
    pub og_image: Option<String>,
    /// Absolute URL of the first `<link rel="icon">`-like element.
    pub icon: Option<String>,
}

static OG_IMAGE_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[property="og:image"], meta[name="og:image"]"#)
        .expect("valid selector")
});
static LINK_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("link[rel][href]").expect("valid selector"));

/// Extract head hints from HTML, resolving relative URLs against `base`.
pub fn extract_hints(html: &str, base: &Url) -> PageHints {
    let doc = Html::parse_document(html);

    let og_image = doc
        .select(&OG_IMAGE_SEL)
        .next()
        .and_then(|el| el.value().attr("content"))
        .and_then(|href| resolve(base, href));

    let icon = doc
        .select(&LINK_SEL)
        .find(|el| {
            el.value()
                .attr("rel")
                .map(|rel| {
                    rel.split_ascii_whitespace().any(|r| {
                        r.eq_ignore_ascii_case("icon") || r.eq_ignore_ascii_case("apple-touch-icon")
                    })
                })
                .unwrap_or(false)
        })
        .and_then(|el| el.value().attr("href"))
        .and_then(|href| resolve(base, href));

    PageHints { og_image, icon }
}

/// Resolve an href to an absolute http(s) URL.
fn resolve(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with("data:") {
        return None;
    }
    let resolved = base.join(href).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}
