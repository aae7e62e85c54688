//! Website ingestion: fetch pages and turn them into located text chunks
//!
//! The landing page is always scraped. Same-host links to the usual company
//! pages (`/about`, `/team`, `/product`, ...) are followed up to a page limit;
//! a failure on one of those is logged and skipped.

use ::scraper::{ElementRef, Html, Selector};
use reqwest::Client;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::schemas::TextChunk;
use crate::utils::collapse_whitespace;

pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; PitchPanda/1.0)";

/// Elements whose whole subtree carries no readable page content
const DROPPED_ELEMENTS: &[&str] = &["script", "style", "nav", "footer", "iframe", "noscript"];

/// Elements walked for text, in document order
const TEXT_ELEMENTS: &[&str] = &["h1", "h2", "h3", "p", "li", "blockquote"];

/// Content roots tried in order before falling back to the whole document
const CONTENT_ROOTS: &[&str] = &["main", "article", "body"];

/// Secondary pages worth following from the landing page
const FOLLOWED_PREFIXES: &[&str] = &[
    "/about",
    "/team",
    "/product",
    "/pricing",
    "/company",
    "/customers",
];

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Failed to fetch {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to fetch {url}: HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Invalid CSS selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },
}

/// Everything scraped from one site
#[derive(Debug, Clone, Default)]
pub struct CrawlResult {
    /// Raw HTML of the landing page
    pub html: String,
    pub chunks: Vec<TextChunk>,
    /// Paths that were scraped successfully, landing page first
    pub pages: Vec<String>,
}

/// Selectors shared by every page of a crawl
struct PageSelectors {
    text: Selector,
    links: Selector,
    content_roots: Vec<Selector>,
}

impl PageSelectors {
    fn new() -> Result<Self, ScrapeError> {
        Ok(Self {
            text: parse_selector(&TEXT_ELEMENTS.join(", "))?,
            links: parse_selector("a[href]")?,
            content_roots: CONTENT_ROOTS
                .iter()
                .map(|css| parse_selector(css))
                .collect::<Result<_, _>>()?,
        })
    }
}

fn parse_selector(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|e| ScrapeError::Selector {
        selector: css.to_string(),
        reason: e.to_string(),
    })
}

/// Build the HTTP client used for website fetches
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
}

/// Add `https://` when no scheme is given and validate the result
pub fn normalize_url(input: &str) -> Result<Url, ScrapeError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ScrapeError::InvalidUrl {
            url: input.to_string(),
            reason: "empty URL".to_string(),
        });
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&candidate).map_err(|e| ScrapeError::InvalidUrl {
        url: input.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        scheme => Err(ScrapeError::InvalidUrl {
            url: input.to_string(),
            reason: format!("unsupported scheme or missing host ({})", scheme),
        }),
    }
}

/// GET a page; non-2xx is an error
pub async fn fetch_html(client: &Client, url: &Url) -> Result<String, ScrapeError> {
    tracing::debug!(%url, "fetching page");

    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|source| ScrapeError::Http {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ScrapeError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(|source| ScrapeError::Http {
        url: url.to_string(),
        source,
    })
}

/// Scrape the landing page plus same-host company pages, up to `max_pages` in total
pub async fn crawl_website(
    client: &Client,
    url: &str,
    max_pages: usize,
) -> Result<CrawlResult, ScrapeError> {
    let landing = normalize_url(url)?;
    let selectors = PageSelectors::new()?;
    let html = fetch_html(client, &landing).await?;

    // The parsed document is not Send; it must be gone before the next await
    let (mut sections, followed) = {
        let document = Html::parse_document(&html);
        (
            extract_sections(&document, &selectors),
            discover_pages(&document, &selectors, &landing, max_pages.saturating_sub(1)),
        )
    };
    let mut pages = vec![landing.path().to_string()];

    for page in followed {
        let path = page.path().to_string();
        match fetch_html(client, &page).await {
            Ok(page_html) => {
                let found = extract_sections(&Html::parse_document(&page_html), &selectors);
                tracing::debug!(page = %path, sections = found.len(), "scraped secondary page");
                sections.extend(found.into_iter().map(|(location, text)| {
                    (prefix_location(&path, &location), text)
                }));
                pages.push(path);
            }
            Err(e) => {
                tracing::warn!("Skipping {}: {}", path, e);
            }
        }
    }

    Ok(CrawlResult {
        html,
        chunks: number_chunks(sections),
        pages,
    })
}

/// Split page HTML into text chunks, one per heading section
pub fn extract_text_chunks(html: &str) -> Result<Vec<TextChunk>, ScrapeError> {
    let selectors = PageSelectors::new()?;
    let document = Html::parse_document(html);
    Ok(number_chunks(extract_sections(&document, &selectors)))
}

fn number_chunks(sections: Vec<(String, String)>) -> Vec<TextChunk> {
    sections
        .into_iter()
        .enumerate()
        .map(|(i, (location, text))| TextChunk::website(format!("chunk-{}", i), text, location))
        .collect()
}

/// `/about` + `Our Story` -> `/about#Our Story`; landing-page locations stay as they are
fn prefix_location(path: &str, location: &str) -> String {
    if location == "/" {
        path.to_string()
    } else {
        format!("{}#{}", path, location)
    }
}

/// (location, text) pairs in document order
fn extract_sections(document: &Html, selectors: &PageSelectors) -> Vec<(String, String)> {
    let root = content_root(document, selectors);
    let mut sections: Vec<(String, Vec<String>)> = Vec::new();

    for element in root.select(&selectors.text) {
        if element.id() == root.id() || is_nested(element, root) {
            continue;
        }

        let text = collapse_whitespace(&visible_text(element));
        if text.is_empty() {
            continue;
        }

        if matches!(element.value().name(), "h1" | "h2" | "h3") {
            sections.push((text.clone(), vec![text]));
        } else {
            match sections.last_mut() {
                Some((_, lines)) => lines.push(text),
                None => sections.push(("/".to_string(), vec![text])),
            }
        }
    }

    sections
        .into_iter()
        .map(|(location, lines)| (location, lines.join("\n")))
        .collect()
}

/// `<main>`, else `<article>`, else `<body>`, else the whole document
fn content_root<'a>(document: &'a Html, selectors: &PageSelectors) -> ElementRef<'a> {
    selectors
        .content_roots
        .iter()
        .find_map(|selector| document.select(selector).next())
        .unwrap_or_else(|| document.root_element())
}

/// Inside another text element (already covered by it) or inside a dropped element
fn is_nested(element: ElementRef<'_>, root: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .take_while(|ancestor| ancestor.id() != root.id())
        .any(|ancestor| {
            let name = ancestor.value().name();
            TEXT_ELEMENTS.contains(&name) || DROPPED_ELEMENTS.contains(&name)
        })
}

/// Text nodes under `element`, skipping dropped subtrees
fn visible_text(element: ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    collect_text(element, &mut parts);
    parts.join(" ")
}

fn collect_text<'a>(element: ElementRef<'a>, parts: &mut Vec<&'a str>) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            parts.push(&**text);
        } else if let Some(child) = ElementRef::wrap(child) {
            if !DROPPED_ELEMENTS.contains(&child.value().name()) {
                collect_text(child, parts);
            }
        }
    }
}

/// Same-host links whose path starts with a followed prefix, first seen first
fn discover_pages(
    document: &Html,
    selectors: &PageSelectors,
    base: &Url,
    limit: usize,
) -> Vec<Url> {
    if limit == 0 {
        return Vec::new();
    }

    let mut seen: HashSet<String> = HashSet::new();
    seen.insert(base.path().trim_end_matches('/').to_string());

    let mut pages = Vec::new();
    for anchor in document.select(&selectors.links) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Ok(mut link) = base.join(href.trim()) else {
            continue;
        };
        if link.host_str() != base.host_str() {
            continue;
        }
        link.set_query(None);
        link.set_fragment(None);

        let path = link.path().to_lowercase();
        let followed = FOLLOWED_PREFIXES
            .iter()
            .any(|prefix| path.starts_with(prefix));
        if !followed || !seen.insert(path.trim_end_matches('/').to_string()) {
            continue;
        }

        pages.push(link);
        if pages.len() >= limit {
            break;
        }
    }

    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<html>
<head><title>Acme</title><style>body { color: red; }</style></head>
<body>
  <nav><a href="/about">About us</a><a href="/pricing">Pricing</a></nav>
  <script>var tracking = "ignored";</script>
  <main>
    <p>Intro before any heading &amp; more.</p>
    <h1>Acme Robotics</h1>
    <p>We build   warehouse
       robots.</p>
    <ul><li>Fast</li><li>Cheap</li></ul>
    <h2>Our Customers</h2>
    <blockquote><p>Acme changed our ops.</p></blockquote>
    <noscript><p>Enable JS</p></noscript>
  </main>
  <footer><p>© Acme</p></footer>
</body>
</html>
"#;

    #[test]
    fn test_normalize_url_adds_scheme() {
        assert_eq!(normalize_url("acme.com").unwrap().as_str(), "https://acme.com/");
        assert_eq!(normalize_url("http://acme.com/x").unwrap().as_str(), "http://acme.com/x");
        assert!(normalize_url("").is_err());
        assert!(normalize_url("ftp://acme.com").is_err());
    }

    #[test]
    fn test_chunks_split_on_headings() {
        let chunks = extract_text_chunks(PAGE).unwrap();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].location, "/");
        assert_eq!(chunks[0].text, "Intro before any heading & more.");
        assert_eq!(chunks[1].location, "Acme Robotics");
        assert_eq!(chunks[1].text, "Acme Robotics\nWe build warehouse robots.\nFast\nCheap");
        assert_eq!(chunks[2].location, "Our Customers");
        assert_eq!(chunks[2].text, "Our Customers\nAcme changed our ops.");
        assert_eq!(chunks[2].id, "chunk-2");
        assert!(chunks.iter().all(|c| c.source_type == "website"));
    }

    #[test]
    fn test_scripts_styles_nav_and_footer_ignored() {
        let text: String = extract_text_chunks(PAGE)
            .unwrap()
            .into_iter()
            .map(|c| c.text)
            .collect();

        assert!(!text.contains("tracking"));
        assert!(!text.contains("color: red"));
        assert!(!text.contains("About us"));
        assert!(!text.contains("© Acme"));
        assert!(!text.contains("Enable JS"));
    }

    #[test]
    fn test_falls_back_to_body_without_main() {
        let html = "<html><body><h3>Team</h3><p>Ada &#8211; CEO</p></body></html>";
        let chunks = extract_text_chunks(html).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Team\nAda – CEO");
    }

    #[test]
    fn test_unclosed_list_items_keep_following_content() {
        let html = "<html><body><ul><li>One<li>Two</ul><h2>Team</h2><p>Ada Lovelace, CEO</p></body></html>";
        let chunks = extract_text_chunks(html).unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].location, "/");
        assert_eq!(chunks[0].text, "One\nTwo");
        assert_eq!(chunks[1].location, "Team");
        assert_eq!(chunks[1].text, "Team\nAda Lovelace, CEO");
    }

    #[test]
    fn test_unclosed_paragraph_before_heading() {
        let chunks = extract_text_chunks("<p>Intro paragraph<h2>Pricing</h2><p>$10 per seat</p>").unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "Intro paragraph");
        assert_eq!(chunks[1].location, "Pricing");
        assert_eq!(chunks[1].text, "Pricing\n$10 per seat");
    }

    #[test]
    fn test_inline_script_inside_paragraph_skipped() {
        let chunks = extract_text_chunks("<body><p>Hello<script>track()</script> <b>world</b></p></body>").unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Hello world");
    }

    #[test]
    fn test_discover_pages_same_host_prefixes_only() {
        let base = Url::parse("https://acme.com/").unwrap();
        let html = r#"
            <a href="/about">About</a>
            <a href="/about#team">About again</a>
            <a href="https://acme.com/pricing?plan=pro">Pricing</a>
            <a href="https://other.com/team">Elsewhere</a>
            <a href="/blog/post">Blog</a>
            <a href="/products/robot">Product</a>
            <a href="/customers">Customers</a>
        "#;

        let document = Html::parse_document(html);
        let selectors = PageSelectors::new().unwrap();

        let pages = discover_pages(&document, &selectors, &base, 4);
        let paths: Vec<&str> = pages.iter().map(|u| u.path()).collect();
        assert_eq!(paths, vec!["/about", "/pricing", "/products/robot", "/customers"]);

        assert_eq!(discover_pages(&document, &selectors, &base, 1).len(), 1);
        assert!(discover_pages(&document, &selectors, &base, 0).is_empty());
    }

    #[test]
    fn test_prefix_location() {
        assert_eq!(prefix_location("/about", "Our Story"), "/about#Our Story");
        assert_eq!(prefix_location("/about", "/"), "/about");
    }
}
