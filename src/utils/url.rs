// src/utils/url.rs

//! URL manipulation utilities.

use url::Url;

/// Resolve a potentially relative URL against a base URL string.
///
/// # Examples
/// ```
/// use stockwatch::utils::url::resolve;
///
/// assert_eq!(
///     resolve("https://us.jellycat.com", "/bashful-bunny/"),
///     "https://us.jellycat.com/bashful-bunny/"
/// );
/// ```
pub fn resolve(base: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    if let Some(rest) = href.strip_prefix("//") {
        return format!("https://{rest}");
    }

    Url::parse(base)
        .and_then(|b| b.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| format!("{}/{}", base.trim_end_matches('/'), href.trim_start_matches('/')))
}

/// Parse a URL, adding an `https://` scheme when it is missing.
pub fn parse_lenient(input: &str) -> Option<Url> {
    let input = input.trim();
    if input.is_empty() || input.contains(char::is_whitespace) {
        return None;
    }

    match Url::parse(input) {
        Ok(url) if url.host_str().is_some() => Some(url),
        _ => Url::parse(&format!("https://{input}"))
            .ok()
            .filter(|u| u.host_str().is_some_and(|h| h.contains('.'))),
    }
}

/// Whether `host` is `domain` or one of its subdomains.
pub fn host_matches(host: &str, domain: &str) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    let domain = domain.trim_start_matches('.').to_ascii_lowercase();
    host == domain || host.ends_with(&format!(".{domain}"))
}

/// Last non-empty path segment of a URL, e.g. the product slug.
pub fn last_segment(url: &Url) -> Option<String> {
    url.path_segments()?
        .filter(|s| !s.is_empty())
        .last()
        .map(|s| s.to_string())
}
