//! URL extraction from raw text or HTML.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

/// Regex pattern for finding URLs in text.
///
/// The final character is drawn from a narrower class than the body so that
/// trailing sentence punctuation (`.`, `,`, `;`, `!`, `:`, `?`) is left out.
/// Backslashes count as path characters. The word boundary is ASCII-only, so
/// a URL glued to non-ASCII text is still found.
#[allow(clippy::expect_used)]
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?-u:\b)(?:https?|ftp|file)://[-A-Z0-9+&@#\\/%?=~_|!:,.;]*[-A-Z0-9+&@#\\/%=~_|]",
    )
    .expect("URL regex is valid") // Static pattern, safe to panic
});

/// Extracts URLs from text, deduplicated in first-occurrence order.
///
/// Accepts `http`, `https`, `ftp`, and `file` URLs. HTML-escaped ampersands
/// (`&amp;`) are unescaped, so a link copied from markup and the same link
/// typed by hand collapse into one entry. No validation beyond the pattern is
/// performed.
///
/// Running the extractor over its own output (joined by `", "`) returns the
/// same sequence.
///
/// # Examples
///
/// ```
/// use orchestrator_core::links::extract_links;
///
/// let links = extract_links(r#"<a href="https://a.test/?x=1&amp;y=2">go</a>, https://a.test/?x=1&y=2."#);
/// assert_eq!(links, vec!["https://a.test/?x=1&y=2"]);
/// ```
#[tracing::instrument(skip(content), fields(content_len = content.len()))]
#[must_use]
pub fn extract_links(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for url_match in URL_PATTERN.find_iter(content) {
        let link = url_match.as_str().replace("&amp;", "&");
        if link.is_empty() {
            continue;
        }
        trace!(url = %link, "found URL candidate");
        if seen.insert(link.clone()) {
            links.push(link);
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Schemes ====================

    #[test]
    fn test_extract_links_supported_schemes() {
        let input = "http://a.test/1 https://a.test/2 ftp://a.test/3 file:///tmp/4";
        assert_eq!(
            extract_links(input),
            vec![
                "http://a.test/1",
                "https://a.test/2",
                "ftp://a.test/3",
                "file:///tmp/4"
            ]
        );
    }

    #[test]
    fn test_extract_links_is_case_insensitive() {
        let links = extract_links("HTTPS://A.TEST/FILE.ZIP");
        assert_eq!(links, vec!["HTTPS://A.TEST/FILE.ZIP"]);
    }

    #[test]
    fn test_extract_links_ignores_other_schemes() {
        assert!(extract_links("mailto:user@a.test magnet:?xt=urn:btih:abc").is_empty());
    }

    #[test]
    fn test_extract_links_requires_scheme() {
        assert!(extract_links("go to a.test/file.zip").is_empty());
    }

    // ==================== Boundaries ====================

    #[test]
    fn test_extract_links_strips_trailing_punctuation() {
        for (input, expected) in [
            ("see https://a.test/doc.pdf.", "https://a.test/doc.pdf"),
            ("https://a.test/x, and more", "https://a.test/x"),
            ("really? https://a.test/x!", "https://a.test/x"),
            ("https://a.test/x;", "https://a.test/x"),
            ("https://a.test/search?", "https://a.test/search"),
        ] {
            assert_eq!(extract_links(input), vec![expected], "input: {input}");
        }
    }

    #[test]
    fn test_extract_links_keeps_backslash_paths() {
        assert_eq!(
            extract_links(r"see https://a.test\dir\f.zip now"),
            vec![r"https://a.test\dir\f.zip"]
        );
        assert_eq!(extract_links(r"file://C:\tmp\"), vec![r"file://C:\tmp\"]);
    }

    #[test]
    fn test_extract_links_after_non_ascii_text() {
        assert_eq!(
            extract_links("ダウンロードhttps://a.test/x.zip"),
            vec!["https://a.test/x.zip"]
        );
        assert_eq!(extract_links("éhttps://a.test/y.zip"), vec!["https://a.test/y.zip"]);
    }

    #[test]
    fn test_extract_links_needs_boundary_before_scheme() {
        assert!(extract_links("xhttps://a.test/x.zip").is_empty());
    }

    #[test]
    fn test_extract_links_stops_at_markup() {
        let html = r#"<a href="https://a.test/a.zip">A</a><img src='https://a.test/b.png'>"#;
        assert_eq!(
            extract_links(html),
            vec!["https://a.test/a.zip", "https://a.test/b.png"]
        );
    }

    #[test]
    fn test_extract_links_keeps_query_and_fragment() {
        let links = extract_links("https://a.test/get?id=5&part=2#top");
        assert_eq!(links, vec!["https://a.test/get?id=5&part=2#top"]);
    }

    // ==================== Post-processing ====================

    #[test]
    fn test_extract_links_unescapes_html_ampersands() {
        let links = extract_links("https://a.test/?a=1&amp;b=2");
        assert_eq!(links, vec!["https://a.test/?a=1&b=2"]);
    }

    #[test]
    fn test_extract_links_dedupes_entity_variant() {
        let input = "https://a.test/?a=1&amp;b=2 https://a.test/?a=1&b=2";
        assert_eq!(extract_links(input), vec!["https://a.test/?a=1&b=2"]);
    }

    #[test]
    fn test_extract_links_preserves_first_occurrence_order() {
        let input = "https://b.test https://a.test https://b.test https://c.test";
        assert_eq!(
            extract_links(input),
            vec!["https://b.test", "https://a.test", "https://c.test"]
        );
    }

    #[test]
    fn test_extract_links_empty_input() {
        assert!(extract_links("").is_empty());
    }

    #[test]
    fn test_extract_links_idempotent_on_own_output() {
        let input = r#"<p>Get https://a.test/x.zip, <a href="ftp://b.test/y?q=1&amp;r=2">y</a>.</p>
            Mirror: http://c.test/z.tar.gz; again https://a.test/x.zip"#;
        let first = extract_links(input);
        let second = extract_links(&first.join(", "));
        assert_eq!(first, second);
    }
}
