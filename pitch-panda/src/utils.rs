//! Small string helpers shared by the store, the renderer and the CLI

use url::Url;

/// Reduce a URL to its bare domain: no scheme, no path, no `www.`, lowercase.
///
/// `https://www.Stripe.com/pricing?x=1` becomes `stripe.com`.
pub fn get_domain(url: &str) -> String {
    let trimmed = url.trim();
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    // Unparseable input is keyed by its lowercased text
    let host = match Url::parse(&candidate) {
        Ok(parsed) => parsed.host_str().unwrap_or_default().to_lowercase(),
        Err(_) => trimmed.to_lowercase(),
    };

    match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    }
}

/// Lowercase, replace runs of `[^a-z0-9_-]` with `-`, trim leading/trailing `-`
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            if pending_dash {
                slug.push('-');
                pending_dash = false;
            }
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug.trim_matches('-').to_string()
}

/// Truncate to at most `max_chars` characters, appending `…` when cut.
/// Trailing whitespace before the ellipsis is trimmed.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let cut: String = text.chars().take(max_chars).collect();
    format!("{}…", cut.trim_end())
}

/// Collapse all whitespace runs to a single space and trim
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_domain_strips_scheme_path_and_www() {
        assert_eq!(get_domain("https://www.Stripe.com/pricing"), "stripe.com");
        assert_eq!(get_domain("http://stripe.com"), "stripe.com");
        assert_eq!(get_domain("stripe.com/about?ref=x"), "stripe.com");
        assert_eq!(get_domain("www.example.io#team"), "example.io");
    }

    #[test]
    fn test_get_domain_drops_port_and_credentials() {
        assert_eq!(get_domain("http://user:pw@localhost:8080/x"), "localhost");
    }

    #[test]
    fn test_get_domain_bare_and_ipv6_hosts() {
        assert_eq!(get_domain("Acme.io"), "acme.io");
        assert_eq!(get_domain("  www.acme.io:3000 "), "acme.io");
        assert_eq!(get_domain("http://[::1]:8080/pricing"), "[::1]");
        assert_eq!(get_domain("[2001:db8::1]"), "[2001:db8::1]");
        assert_eq!(get_domain(""), "");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("stripe.com"), "stripe-com");
        assert_eq!(slugify("  Hello, World!! "), "hello-world");
        assert_eq!(slugify("already-slug_ok"), "already-slug_ok");
        assert_eq!(slugify("..."), "");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("hello world", 6), "hello…");
        assert_eq!(truncate_chars("ééééé", 3), "ééé…");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b   c "), "a b c");
    }
}
