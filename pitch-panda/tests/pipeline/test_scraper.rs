//! Website crawling against a local server

use super::common::*;
use pitch_panda::scraper::{build_http_client, crawl_website, ScrapeError};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn http() -> reqwest::Client {
    build_http_client(Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_crawl_follows_company_pages() {
    let site = website().await;

    let crawl = crawl_website(&http(), &site.uri(), 3).await.unwrap();

    assert_eq!(crawl.pages, vec!["/", "/about"]);
    assert!(crawl.html.contains("<h1>Acme</h1>"));

    let locations: Vec<&str> = crawl.chunks.iter().map(|c| c.location.as_str()).collect();
    assert!(locations.contains(&"Acme"));
    assert!(locations.contains(&"/about#Our Team"));

    // Chunk ids are sequential across pages
    for (i, chunk) in crawl.chunks.iter().enumerate() {
        assert_eq!(chunk.id, format!("chunk-{}", i));
    }
}

#[tokio::test]
async fn test_page_limit_of_one_stays_on_landing_page() {
    let site = website().await;

    let crawl = crawl_website(&http(), &site.uri(), 1).await.unwrap();
    assert_eq!(crawl.pages, vec!["/"]);
    assert!(!crawl.chunks.iter().any(|c| c.text.contains("Stripe")));
}

#[tokio::test]
async fn test_broken_secondary_page_is_skipped() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LANDING_HTML))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let crawl = crawl_website(&http(), &server.uri(), 5).await.unwrap();
    assert_eq!(crawl.pages, vec!["/"]);
    assert!(!crawl.chunks.is_empty());
}

#[tokio::test]
async fn test_landing_page_error_fails_crawl() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = crawl_website(&http(), &server.uri(), 5).await.unwrap_err();
    assert!(matches!(err, ScrapeError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_invalid_url_is_rejected() {
    let err = crawl_website(&http(), "ftp://acme.io", 5).await.unwrap_err();
    assert!(matches!(err, ScrapeError::InvalidUrl { .. }));
}
