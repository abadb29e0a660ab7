//! Canonical and hreflang extraction from HTML and the HTTP `Link` header.
//!
//! HTML declarations take precedence. The header only fills what the
//! document leaves out.

use scraper::{Html, Selector};

use crate::models::{HreflangMap, PageTags};

/// One entry of an HTTP `Link` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkEntry {
    pub url: String,
    /// Lowercased `rel` tokens.
    pub rel: Vec<String>,
    pub hreflang: Option<String>,
}

impl LinkEntry {
    fn has_rel(&self, token: &str) -> bool {
        self.rel.iter().any(|r| r == token)
    }
}

/// Extract canonical and hreflang signals from a page.
pub fn parse_tags(html: &str, link_header: Option<&str>) -> PageTags {
    let (mut canonical, mut hreflang) = parse_html_links(html);

    if let Some(header) = link_header {
        for entry in parse_link_header(header) {
            if canonical.is_none() && entry.has_rel("canonical") {
                canonical = Some(entry.url.clone());
            }
            if entry.has_rel("alternate") {
                if let Some(lang) = entry.hreflang.as_deref() {
                    hreflang
                        .entry(lang.to_lowercase())
                        .or_insert_with(|| entry.url.clone());
                }
            }
        }
    }

    PageTags {
        canonical,
        hreflang: (!hreflang.is_empty()).then_some(hreflang),
    }
}

fn parse_html_links(html: &str) -> (Option<String>, HreflangMap) {
    let mut canonical = None;
    let mut hreflang = HreflangMap::new();

    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("link[rel][href]") else {
        return (canonical, hreflang);
    };

    for element in document.select(&selector) {
        let value = element.value();
        let (Some(rel), Some(href)) = (value.attr("rel"), value.attr("href")) else {
            continue;
        };
        let href = href.trim();
        if href.is_empty() {
            continue;
        }

        let rel = rel.to_ascii_lowercase();
        let is_canonical = rel.split_ascii_whitespace().any(|t| t == "canonical");
        let is_alternate = rel.split_ascii_whitespace().any(|t| t == "alternate");

        if is_canonical && canonical.is_none() {
            canonical = Some(href.to_string());
        }
        if is_alternate {
            if let Some(lang) = value.attr("hreflang").map(str::trim).filter(|l| !l.is_empty()) {
                hreflang
                    .entry(lang.to_lowercase())
                    .or_insert_with(|| href.to_string());
            }
        }
    }

    (canonical, hreflang)
}

/// Parse an HTTP `Link` header into its entries.
///
/// Entries look like `<url>; rel="alternate"; hreflang="de"`. Malformed
/// entries are skipped.
pub fn parse_link_header(header: &str) -> Vec<LinkEntry> {
    split_entries(header)
        .into_iter()
        .filter_map(parse_link_entry)
        .collect()
}

/// Split on commas that are outside `<...>` and quoted strings.
fn split_entries(header: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut in_uri = false;
    let mut in_quotes = false;
    let mut start = 0;

    for (i, c) in header.char_indices() {
        match c {
            '<' if !in_quotes => in_uri = true,
            '>' if !in_quotes => in_uri = false,
            '"' if !in_uri => in_quotes = !in_quotes,
            ',' if !in_uri && !in_quotes => {
                entries.push(&header[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    entries.push(&header[start..]);
    entries
}

fn parse_link_entry(raw: &str) -> Option<LinkEntry> {
    let raw = raw.trim();
    let rest = raw.strip_prefix('<')?;
    let end = rest.find('>')?;
    let url = rest[..end].trim();
    if url.is_empty() {
        return None;
    }

    let mut entry = LinkEntry {
        url: url.to_string(),
        ..Default::default()
    };

    for param in rest[end + 1..].split(';') {
        let Some((name, value)) = param.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"').trim();
        match name.trim().to_ascii_lowercase().as_str() {
            "rel" => {
                entry.rel = value
                    .split_ascii_whitespace()
                    .map(str::to_ascii_lowercase)
                    .collect();
            }
            "hreflang" if !value.is_empty() => entry.hreflang = Some(value.to_string()),
            _ => {}
        }
    }

    Some(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!doctype html>
        <html><head>
            <link rel="canonical" href="https://a.com/page">
            <link rel="alternate" hreflang="en-US" href="https://a.com/page">
            <link rel="alternate" hreflang="de" href="https://a.com/de/page">
            <link rel="stylesheet" href="/style.css">
        </head><body></body></html>"#;

    #[test]
    fn test_html_canonical_and_hreflang() {
        let tags = parse_tags(PAGE, None);
        assert_eq!(tags.canonical.as_deref(), Some("https://a.com/page"));

        let hreflang = tags.hreflang.unwrap();
        assert_eq!(hreflang.len(), 2);
        assert_eq!(hreflang["en-us"], "https://a.com/page");
        assert_eq!(hreflang["de"], "https://a.com/de/page");
    }

    #[test]
    fn test_canonical_only_has_no_hreflang() {
        let html = r#"<html><head><link rel="canonical" href="https://a.com/"></head></html>"#;
        let tags = parse_tags(html, None);
        assert_eq!(tags.canonical.as_deref(), Some("https://a.com/"));
        assert_eq!(tags.hreflang, None);
    }

    #[test]
    fn test_parse_is_idempotent() {
        assert_eq!(parse_tags(PAGE, None), parse_tags(PAGE, None));
    }

    #[test]
    fn test_rel_tokens_case_insensitive() {
        let html = r#"<link rel="Canonical" href="https://a.com/x"><link rel="ALTERNATE" hreflang="FR" href="https://a.com/fr">"#;
        let tags = parse_tags(html, None);
        assert_eq!(tags.canonical.as_deref(), Some("https://a.com/x"));
        assert_eq!(tags.hreflang.unwrap()["fr"], "https://a.com/fr");
    }

    #[test]
    fn test_header_fills_gaps_html_wins() {
        let html = r#"<link rel="alternate" hreflang="de" href="https://a.com/de-html">"#;
        let header = r#"<https://a.com/canon>; rel="canonical", <https://a.com/de-header>; rel="alternate"; hreflang="de", <https://a.com/fr>; rel="alternate"; hreflang="fr""#;

        let tags = parse_tags(html, Some(header));
        assert_eq!(tags.canonical.as_deref(), Some("https://a.com/canon"));

        let hreflang = tags.hreflang.unwrap();
        assert_eq!(hreflang["de"], "https://a.com/de-html");
        assert_eq!(hreflang["fr"], "https://a.com/fr");
    }

    #[test]
    fn test_html_canonical_beats_header() {
        let html = r#"<link rel="canonical" href="https://a.com/html">"#;
        let header = r#"<https://a.com/header>; rel=canonical"#;
        let tags = parse_tags(html, Some(header));
        assert_eq!(tags.canonical.as_deref(), Some("https://a.com/html"));
    }

    #[test]
    fn test_link_header_with_commas_in_url() {
        let entries = parse_link_header(r#"<https://a.com/a,b>; rel="next", <https://a.com/c>; rel="prev""#);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].url, "https://a.com/a,b");
        assert_eq!(entries[1].rel, vec!["prev"]);
    }

    #[test]
    fn test_malformed_link_header() {
        assert!(parse_link_header("garbage").is_empty());
        assert!(parse_link_header("").is_empty());
        let tags = parse_tags("", Some("not a link header"));
        assert_eq!(tags, PageTags::default());
    }
}
