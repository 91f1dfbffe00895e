use std::sync::Arc;

use chrono::{TimeZone, Utc};
use newsroom_core::{Category, PageSelectors, SourceDescriptor};
use newsroom_engine::{Clock, FetchSettings, ReqwestFetcher, SourceFailure, SourceReader};
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fixed_clock() -> Clock {
    Arc::new(|| Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap())
}

fn reader() -> SourceReader {
    SourceReader::new(
        Arc::new(ReqwestFetcher::new(FetchSettings::default())),
        &PageSelectors::default(),
        fixed_clock(),
    )
}

fn rss(items: usize) -> String {
    let entries: String = (0..items)
        .map(|i| {
            format!(
                "<item><title>Post {i}</title><link>https://blog.example.com/p/{i}</link>\
                 <description>Summary {i}</description>\
                 <pubDate>Mon, 06 May 2024 0{}:00:00 GMT</pubDate></item>",
                i % 10
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0"?><rss version="2.0"><channel><title>Blog</title>{entries}</channel></rss>"#
    )
}

#[tokio::test]
async fn feed_is_truncated_to_ten_items_in_feed_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(rss(15), "application/rss+xml"))
        .mount(&server)
        .await;

    let source = SourceDescriptor::feed(Category::Docker, &format!("{}/feed", server.uri()));
    let items = reader().read(&source).await.unwrap();

    assert_eq!(items.len(), 10);
    assert_eq!(items[0].title, "Post 0");
    assert_eq!(items[9].link, "https://blog.example.com/p/9");
    assert_eq!(
        items[3].published_at,
        Utc.with_ymd_and_hms(2024, 5, 6, 3, 0, 0).unwrap()
    );
}

#[tokio::test]
async fn feed_media_content_wins_over_inline_images() {
    let server = MockServer::start().await;
    let xml = r#"<?xml version="1.0"?>
        <rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/"><channel><title>T</title>
        <item><title>With media</title><link>https://blog.example.com/m</link>
        <media:content url="https://cdn.example.com/hero.png" medium="image"/>
        <description><![CDATA[<img src="https://cdn.example.com/inline.jpg"/> text]]></description>
        </item></channel></rss>"#;
    Mock::given(method("GET"))
        .and(path("/media"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(xml, "application/rss+xml"))
        .mount(&server)
        .await;

    let source = SourceDescriptor::feed(Category::Kubernetes, &format!("{}/media", server.uri()));
    let items = reader().read(&source).await.unwrap();

    assert_eq!(
        items[0].candidate_image_url.as_deref(),
        Some("https://cdn.example.com/hero.png")
    );
    assert_eq!(items[0].published_at, Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap());
}

#[tokio::test]
async fn listing_page_yields_blocks_with_absolute_links() {
    let server = MockServer::start().await;
    let html = r#"<html><body>
        <article><h2>First</h2><a href="/blog/first/">more</a><p>One</p><img src="/img/1.png"></article>
        <article><h3>Second</h3><a href="https://other.example.com/second">more</a></article>
        </body></html>"#;
    Mock::given(method("GET"))
        .and(path("/blog/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html"))
        .mount(&server)
        .await;

    let endpoint = format!("{}/blog/", server.uri());
    let source = SourceDescriptor::page(Category::Docker, &endpoint);
    let items = reader().read(&source).await.unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].link, format!("{}/blog/first/", server.uri()));
    assert_eq!(
        items[0].candidate_image_url,
        Some(format!("{}/img/1.png", server.uri()))
    );
    assert_eq!(items[1].title, "Second");
    assert_eq!(items[1].summary_html, "");
    assert_eq!(items[1].source_endpoint, endpoint);
}

#[tokio::test]
async fn listing_page_is_truncated_to_ten_blocks_in_document_order() {
    let server = MockServer::start().await;
    let blocks: String = (0..15)
        .map(|i| format!(r#"<article><h2>Entry {i}</h2><a href="/blog/{i}">read</a></article>"#))
        .collect();
    Mock::given(method("GET"))
        .and(path("/blog/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(format!("<html><body>{blocks}</body></html>"), "text/html"),
        )
        .mount(&server)
        .await;

    let source = SourceDescriptor::page(Category::Kubernetes, &format!("{}/blog/", server.uri()));
    let items = reader().read(&source).await.unwrap();

    assert_eq!(items.len(), 10);
    let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
    let expected: Vec<String> = (0..10).map(|i| format!("Entry {i}")).collect();
    assert_eq!(titles, expected);
    assert_eq!(items[9].link, format!("{}/blog/9", server.uri()));
}

#[tokio::test]
async fn unreachable_source_is_a_source_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let source = SourceDescriptor::feed(Category::Container, &format!("{}/rss", server.uri()));
    let err = reader().read(&source).await.unwrap_err();
    assert!(matches!(err, SourceFailure::Fetch(_)));

    let bad = SourceDescriptor::feed(Category::Container, "not a url");
    assert!(matches!(
        reader().read(&bad).await.unwrap_err(),
        SourceFailure::InvalidEndpoint(_)
    ));
}
