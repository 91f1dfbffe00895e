use std::sync::Arc;

use newsroom_core::{ContentSelectors, SelectorChain};
use newsroom_engine::{
    decode_text, ContentExtractor, Converter, ExtractionFailure, Extractor, FetchSettings,
    Html2MdConverter, ReqwestFetcher, SelectorExtractor,
};
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn content_extractor() -> ContentExtractor {
    ContentExtractor::new(
        Arc::new(ReqwestFetcher::new(FetchSettings::default())),
        &ContentSelectors::default(),
    )
}

#[test]
fn boilerplate_is_stripped_before_container_choice() {
    let html = r#"
    <html><body>
        <header>Site header</header>
        <main>
            <nav>Home | Blog</nav>
            <div class="post-content"><p>Real text</p><div class="advertisement">Buy now</div></div>
            <aside class="sidebar">Popular</aside>
        </main>
        <footer>Copyright</footer>
    </body></html>
    "#;
    let content = SelectorExtractor::default().extract(html).unwrap();
    assert!(content.contains("Real text"));
    for noise in ["Site header", "Home | Blog", "Buy now", "Popular", "Copyright"] {
        assert!(!content.contains(noise), "{noise:?} survived: {content}");
    }
}

#[test]
fn container_priority_beats_document_order() {
    // `.entry-content` appears first but `article` has higher priority.
    let html = r#"<html><body>
        <div class="entry-content"><p>Second choice</p></div>
        <article><p>First choice</p></article>
    </body></html>"#;
    let content = SelectorExtractor::default().extract(html).unwrap();
    assert!(content.contains("First choice"));
    assert!(!content.contains("Second choice"));
}

#[test]
fn body_is_used_when_no_container_matches() {
    let html = "<html><body><div><p>Loose text</p></div><script>var x;</script></body></html>";
    let content = SelectorExtractor::default().extract(html).unwrap();
    assert!(content.contains("Loose text"));
    assert!(!content.contains("var x"));
}

#[test]
fn custom_containers_come_from_configuration() {
    let selectors = ContentSelectors {
        containers: SelectorChain::new(["#story"]),
        ..ContentSelectors::default()
    };
    let html = r#"<html><body><article>Teaser</article><section id="story">Full story</section></body></html>"#;
    let content = SelectorExtractor::new(&selectors).extract(html).unwrap();
    assert!(content.contains("Full story"));
    assert!(!content.contains("Teaser"));
}

#[test]
fn converter_turns_html_into_markdown() {
    let md = Html2MdConverter.to_markdown(r#"<h1>Hello</h1><p>see <a href="https://docs.docker.com">docs</a></p>"#);
    assert!(
        md.starts_with("# Hello") || md.starts_with("Hello\n=="),
        "unexpected markdown output: {md:?}"
    );
    assert!(md.contains("[docs](https://docs.docker.com)"));
}

#[test]
fn decode_extract_convert_is_deterministic() {
    let bytes = br#"<html><head><title>X</title></head><body><article><p>A</p><p>B</p></article></body></html>"#;
    let decoded = decode_text(bytes, Some("text/html; charset=utf-8"));
    let extracted = SelectorExtractor::default().extract(&decoded.text).unwrap();
    assert_eq!(Html2MdConverter.to_markdown(&extracted), "A\nB");
}

#[tokio::test]
async fn unreachable_article_is_an_extraction_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/post"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = content_extractor()
        .extract(&format!("{}/post", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractionFailure::Fetch(_)));
}

#[tokio::test]
async fn fetched_article_becomes_markdown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/post"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "<html><body><nav>menu</nav><article><p>Kubernetes 1.30 is out</p></article></body></html>",
            "text/html; charset=utf-8",
        ))
        .mount(&server)
        .await;

    let text = content_extractor()
        .extract(&format!("{}/post", server.uri()))
        .await
        .unwrap();
    assert_eq!(text, "Kubernetes 1.30 is out");
}
