//! Token-reduction passes applied to fetched HTML before any model sees it.
//!
//! The contract is deliberately narrow: remove `<script>` blocks, inline
//! `<svg>` blocks, and `class` attributes. Everything else is left untouched.

use std::sync::LazyLock;

use regex::Regex;

/// Run all sanitization passes on raw HTML.
pub fn sanitize_html(html: &str) -> String {
    let mut result = strip_scripts(html);
    result = strip_svgs(&result);
    result = strip_class_attributes(&result);
    result
}

/// Remove `<script ...>...</script>` blocks, including their contents.
fn strip_scripts(html: &str) -> String {
    static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("valid regex")
    });

    SCRIPT_RE.replace_all(html, "").into_owned()
}

/// Remove inline `<svg ...>...</svg>` blocks.
fn strip_svgs(html: &str) -> String {
    static SVG_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?is)<svg\b[^>]*>.*?</svg\s*>").expect("valid regex")
    });

    SVG_RE.replace_all(html, "").into_owned()
}

/// Remove `class="..."` and `class='...'` attributes.
fn strip_class_attributes(html: &str) -> String {
    static CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
        // Leading whitespace keeps `data-class=` and friends intact
        Regex::new(r#"(?i)\s+class\s*=\s*(?:"[^"]*"|'[^']*')"#).expect("valid regex")
    });

    CLASS_RE.replace_all(html, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> String {
        let path = format!("../../../fixtures/html/{name}");
        std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing fixture: {path}"))
    }

    #[test]
    fn strip_scripts_removes_inline_and_external() {
        let input = r#"<p>a</p><script src="x.js"></script><SCRIPT type="module">let x = "<p>";</SCRIPT><p>b</p>"#;
        assert_eq!(strip_scripts(input), "<p>a</p><p>b</p>");
    }

    #[test]
    fn strip_scripts_spans_lines() {
        let input = "<p>a</p><script>\nconsole.log(1);\n</script>\n<p>b</p>";
        assert_eq!(strip_scripts(input), "<p>a</p>\n<p>b</p>");
    }

    #[test]
    fn strip_svgs_removes_nested_paths() {
        let input = r#"<a href="/"><svg viewBox="0 0 24 24"><path d="M0 0h24v24H0z"/></svg>Home</a>"#;
        assert_eq!(strip_svgs(input), r#"<a href="/">Home</a>"#);
    }

    #[test]
    fn strip_class_attributes_both_quote_styles() {
        let input = r#"<div class="hero big" id="top"><span class='x'>Hi</span></div>"#;
        assert_eq!(
            strip_class_attributes(input),
            r#"<div id="top"><span>Hi</span></div>"#
        );
    }

    #[test]
    fn strip_class_attributes_keeps_data_class() {
        let input = r#"<div data-class="keep">x</div>"#;
        assert_eq!(strip_class_attributes(input), input);
    }

    #[test]
    fn sanitize_leaves_styles_alone() {
        let input = "<style>.a{color:red}</style><p>x</p>";
        assert_eq!(sanitize_html(input), input);
    }

    #[test]
    fn sanitize_matches_landing_page_snapshot() {
        let input = fixture("tool-landing.html");
        let expected = fixture("tool-landing.sanitized.html");
        assert_eq!(sanitize_html(&input), expected);
    }
}
