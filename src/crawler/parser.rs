//! Link extraction from seed page content
//!
//! Only article links are kept: same host as the page they were found on,
//! and a path of the form `<prefix><segment>` where the segment is a single
//! plain title. Namespaced pages (`File:`, `Special:`, ...) and nested paths
//! are left out.

use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Extracts the set of article links from HTML content
///
/// Links are resolved against `base_url`, stripped of query and fragment,
/// and deduplicated. Empty or malformed input yields an empty set.
///
/// # Example
///
/// ```
/// use recrawl::crawler::extract_article_links;
/// use url::Url;
///
/// let base = Url::parse("https://en.wikipedia.org/wiki/Main_Page").unwrap();
/// let links = extract_article_links("<a href='/wiki/Car'>Car</a>", &base, "/wiki/");
/// assert!(links.contains("https://en.wikipedia.org/wiki/Car"));
/// ```
pub fn extract_article_links(html: &str, base_url: &Url, prefix: &str) -> HashSet<String> {
    let mut links = HashSet::new();

    if html.trim().is_empty() {
        return links;
    }

    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&selector) {
        if let Some(href) = element.value().attr("href") {
            if let Some(link) = resolve_article_link(href, base_url, prefix) {
                links.insert(link);
            }
        }
    }

    links
}

/// Resolves an href and keeps it only if it points at an article
fn resolve_article_link(href: &str, base_url: &Url, prefix: &str) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let mut url = base_url.join(href).ok()?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }

    if url.host_str() != base_url.host_str()
        || url.port_or_known_default() != base_url.port_or_known_default()
    {
        return None;
    }

    let segment = url.path().strip_prefix(prefix)?;
    if !is_article_title(segment) {
        return None;
    }

    url.set_query(None);
    url.set_fragment(None);
    Some(url.to_string())
}

/// A single path segment made of title characters
///
/// Percent-encoded titles are accepted, except an encoded `:` which would
/// smuggle a namespace past the check.
fn is_article_title(segment: &str) -> bool {
    if segment.is_empty() {
        return false;
    }

    let plain = segment
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '(' | ')' | '%' | '-' | '.' | ','));

    plain && !segment.to_ascii_uppercase().contains("%3A") && segment != "." && segment != ".."
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://en.wikipedia.org/wiki/Main_Page").unwrap()
    }

    fn extract(html: &str) -> HashSet<String> {
        extract_article_links(html, &base_url(), "/wiki/")
    }

    #[test]
    fn test_extract_relative_article_link() {
        let links = extract("<a href='/wiki/Car'>Car</a>");
        assert_eq!(links.len(), 1);
        assert!(links.contains("https://en.wikipedia.org/wiki/Car"));
    }

    #[test]
    fn test_duplicates_collapse() {
        let html = r#"
            <a href="/wiki/Gondar_Airport">one</a>
            <a href="https://en.wikipedia.org/wiki/Gondar_Airport">two</a>
            <a href="/wiki/Gondar_Airport#History">three</a>
            <a href="/wiki/Car">car</a>
        "#;
        let links = extract(html);
        assert_eq!(links.len(), 2);
        assert!(links.contains("https://en.wikipedia.org/wiki/Gondar_Airport"));
        assert!(links.contains("https://en.wikipedia.org/wiki/Car"));
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let html = r#"
            <a href="/wiki/Sahrawi_Arab_Democratic_Republic">a</a>
            <a href="/wiki/Prime_Minister_of_Vietnam">b</a>
            <a href="/wiki/Car">c</a>
        "#;
        assert_eq!(extract(html), extract(html));
    }

    #[test]
    fn test_empty_and_malformed_input() {
        assert!(extract("").is_empty());
        assert!(extract("   \n").is_empty());
        assert!(extract("<a href=<<<>>> <<div").is_empty());
        assert!(extract("no markup at all /wiki/Car").is_empty());
    }

    #[test]
    fn test_skips_namespaced_pages() {
        let html = r#"
            <a href="/wiki/File:Example.jpg">file</a>
            <a href="/wiki/Special:Random">random</a>
            <a href="/wiki/Help%3AContents">help</a>
        "#;
        assert!(extract(html).is_empty());
    }

    #[test]
    fn test_skips_other_hosts_and_paths() {
        let html = r#"
            <a href="https://de.wikipedia.org/wiki/Auto">other language</a>
            <a href="/w/index.php?title=Car">index</a>
            <a href="/wiki/">bare prefix</a>
            <a href="/wiki/Car/Nested">nested</a>
        "#;
        assert!(extract(html).is_empty());
    }

    #[test]
    fn test_skips_special_schemes_and_fragments() {
        let html = r##"
            <a href="javascript:void(0)">js</a>
            <a href="mailto:someone@example.com">mail</a>
            <a href="tel:+123">tel</a>
            <a href="#section">jump</a>
        "##;
        assert!(extract(html).is_empty());
    }

    #[test]
    fn test_query_is_dropped() {
        let links = extract(r#"<a href="/wiki/Car?action=history">history</a>"#);
        assert!(links.contains("https://en.wikipedia.org/wiki/Car"));
    }

    #[test]
    fn test_titles_with_parentheses_and_encoding() {
        let html = r#"
            <a href="/wiki/Mercury_(planet)">planet</a>
            <a href="/wiki/Caf%C3%A9">cafe</a>
        "#;
        let links = extract(html);
        assert!(links.contains("https://en.wikipedia.org/wiki/Mercury_(planet)"));
        assert!(links.contains("https://en.wikipedia.org/wiki/Caf%C3%A9"));
    }

    #[test]
    fn test_custom_prefix() {
        let base = Url::parse("http://127.0.0.1:8080/docs/index").unwrap();
        let html = r#"<a href="/docs/Intro">intro</a><a href="/wiki/Car">car</a>"#;
        let links = extract_article_links(html, &base, "/docs/");
        assert_eq!(links.len(), 1);
        assert!(links.contains("http://127.0.0.1:8080/docs/Intro"));
    }
}
