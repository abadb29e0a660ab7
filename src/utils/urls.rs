//! URL helpers for matching search results against tracked domains.

use url::Url;

/// Lowercased host of a URL with a leading `www.` removed.
///
/// Returns an empty string when the URL has no host.
pub fn extract_domain(link: &str) -> String {
    let host = Url::parse(link)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        .unwrap_or_default();
    match host.strip_prefix("www.") {
        Some(stripped) => stripped.to_string(),
        None => host,
    }
}

/// Normalize user input naming a domain.
///
/// Accepts a bare domain (`Example.com`) or a full URL
/// (`https://www.example.com/page`). Returns `None` if no host can be found.
pub fn normalize_domain(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let domain = if input.contains("://") {
        extract_domain(input)
    } else {
        extract_domain(&format!("https://{input}"))
    };

    (!domain.is_empty()).then_some(domain)
}
