//! Optional HTML → Markdown conversion for prompt content.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use toolscout_shared::{Result, ToolscoutError};

/// Convert sanitized HTML into Markdown using `htmd`.
pub fn to_markdown(html: &str) -> Result<String> {
    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style", "svg", "noscript", "iframe", "head"])
        .build();

    let raw = converter
        .convert(html)
        .map_err(|e| ToolscoutError::parse(format!("htmd conversion failed: {e}")))?;

    let cleaned = collapse_blank_lines(&raw);
    debug!(html_len = html.len(), markdown_len = cleaned.len(), "converted page to markdown");
    Ok(cleaned)
}

/// Collapse runs of 3+ newlines into exactly 2 and trim the ends.
fn collapse_blank_lines(md: &str) -> String {
    static MULTI_BLANK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n[ \t]*(?:\n[ \t]*){2,}").expect("valid regex"));

    MULTI_BLANK_RE.replace_all(md, "\n\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_headings_and_lists() {
        let html = "<h1>Acme</h1><ul><li>Fast</li><li>Cheap</li></ul>";
        let md = to_markdown(html).unwrap();
        assert!(md.contains("# Acme"));
        assert!(md.contains("Fast"));
        assert!(md.contains("Cheap"));
    }

    #[test]
    fn drops_head_and_style() {
        let html = "<html><head><title>T</title><style>.a{}</style></head><body><p>Body</p></body></html>";
        let md = to_markdown(html).unwrap();
        assert!(!md.contains(".a{}"));
        assert!(md.contains("Body"));
    }

    #[test]
    fn collapse_blank_lines_keeps_paragraphs() {
        assert_eq!(collapse_blank_lines("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\n \n\t\nb"), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\n\nb"), "a\n\nb");
    }
}
