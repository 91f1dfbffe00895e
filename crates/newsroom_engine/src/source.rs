use std::sync::Arc;

use chrono::{DateTime, Utc};
use feed_rs::model::Entry;
use newsroom_core::{CompiledChain, PageSelectors, RawItem, SourceDescriptor, SourceKind};
use newsroom_logging::{news_debug, news_trace};
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::config::Clock;
use crate::decode::decode_text;
use crate::fetch::{Fetcher, ANY_CONTENT_TYPE, HTML_CONTENT_TYPES};
use crate::types::SourceFailure;

pub const MAX_ITEMS_PER_SOURCE: usize = 10;

#[derive(Debug, Clone)]
struct CompiledPageSelectors {
    blocks: CompiledChain,
    title: CompiledChain,
    link: CompiledChain,
    summary: CompiledChain,
    image: CompiledChain,
}

impl CompiledPageSelectors {
    fn new(selectors: &PageSelectors) -> Self {
        Self {
            blocks: selectors.blocks.compile(),
            title: selectors.title.compile(),
            link: selectors.link.compile(),
            summary: selectors.summary.compile(),
            image: selectors.image.compile(),
        }
    }
}

/// Turns a source descriptor into at most `limit` raw items.
pub struct SourceReader {
    fetcher: Arc<dyn Fetcher>,
    page: CompiledPageSelectors,
    limit: usize,
    clock: Clock,
}

impl SourceReader {
    pub fn new(fetcher: Arc<dyn Fetcher>, selectors: &PageSelectors, clock: Clock) -> Self {
        Self {
            fetcher,
            page: CompiledPageSelectors::new(selectors),
            limit: MAX_ITEMS_PER_SOURCE,
            clock,
        }
    }

    /// Lowers the per-source cap; it can never exceed [`MAX_ITEMS_PER_SOURCE`].
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.min(MAX_ITEMS_PER_SOURCE);
        self
    }

    pub async fn read(&self, source: &SourceDescriptor) -> Result<Vec<RawItem>, SourceFailure> {
        let endpoint = Url::parse(source.endpoint.trim())
            .map_err(|_| SourceFailure::InvalidEndpoint(source.endpoint.clone()))?;
        let now = (self.clock)();

        let items = match source.kind {
            SourceKind::Feed => {
                let output = self.fetcher.fetch(endpoint.as_str(), ANY_CONTENT_TYPE).await?;
                parse_feed(&output.bytes, &endpoint, now, self.limit)?
            }
            SourceKind::Page => {
                let output = self.fetcher.fetch(endpoint.as_str(), HTML_CONTENT_TYPES).await?;
                let decoded = decode_text(&output.bytes, output.metadata.content_type.as_deref());
                parse_page(&decoded.text, &endpoint, now, self.limit, &self.page)
            }
        };
        news_debug!("Read {} items from {}", items.len(), endpoint);
        Ok(items)
    }
}

fn parse_feed(
    bytes: &[u8],
    endpoint: &Url,
    now: DateTime<Utc>,
    limit: usize,
) -> Result<Vec<RawItem>, SourceFailure> {
    let feed = feed_rs::parser::parse(bytes).map_err(|e| SourceFailure::Parse(e.to_string()))?;

    // Feed order is assumed newest-first.
    let items = feed
        .entries
        .iter()
        .take(limit)
        .filter_map(|entry| feed_item(entry, endpoint, now))
        .collect();
    Ok(items)
}

fn feed_item(entry: &Entry, endpoint: &Url, now: DateTime<Utc>) -> Option<RawItem> {
    let title = entry
        .title
        .as_ref()
        .map(|t| t.content.trim().to_string())
        .filter(|t| !t.is_empty());
    let link = entry_link(entry).and_then(|href| resolve_url(&href, Some(endpoint)));
    let (Some(title), Some(link)) = (title, link) else {
        news_trace!("Skipping feed entry {:?} without title or link", entry.id);
        return None;
    };

    let content_body = entry.content.as_ref().and_then(|c| c.body.clone());
    let summary_html = entry
        .summary
        .as_ref()
        .map(|s| s.content.clone())
        .or_else(|| content_body.clone())
        .unwrap_or_default();

    let candidate_image_url = entry
        .media
        .iter()
        .flat_map(|media| media.content.iter())
        .find_map(|content| content.url.as_ref().map(|u| u.to_string()))
        .or_else(|| content_body.as_deref().and_then(first_image_src))
        .or_else(|| entry.summary.as_ref().and_then(|s| first_image_src(&s.content)))
        .and_then(|src| resolve_url(&src, Some(endpoint)))
        .map(String::from);

    Some(RawItem {
        title,
        link: link.into(),
        published_at: entry.published.or(entry.updated).unwrap_or(now),
        summary_html,
        candidate_image_url,
        source_endpoint: endpoint.to_string(),
        local_image: None,
    })
}

fn entry_link(entry: &Entry) -> Option<String> {
    let hrefs = || entry.links.iter().filter(|l| !l.href.trim().is_empty());
    hrefs()
        .find(|l| {
            l.rel
                .as_deref()
                .is_none_or(|rel| rel.eq_ignore_ascii_case("alternate"))
        })
        .or_else(|| hrefs().next())
        .map(|l| l.href.trim().to_string())
        .or_else(|| {
            let id = entry.id.trim();
            (id.starts_with("http://") || id.starts_with("https://")).then(|| id.to_string())
        })
}

fn first_image_src(html: &str) -> Option<String> {
    let selector = Selector::parse("img[src]").ok()?;
    Html::parse_fragment(html)
        .select(&selector)
        .find_map(|img| img.value().attr("src").map(str::trim).map(str::to_string))
        .filter(|src| !src.is_empty())
}

fn parse_page(
    html: &str,
    base: &Url,
    now: DateTime<Utc>,
    limit: usize,
    selectors: &CompiledPageSelectors,
) -> Vec<RawItem> {
    let doc = Html::parse_document(html);
    selectors
        .blocks
        .all_of_first(&doc)
        .into_iter()
        .take(limit)
        .filter_map(|block| page_item(block, base, now, selectors))
        .collect()
}

fn page_item(
    block: ElementRef<'_>,
    base: &Url,
    now: DateTime<Utc>,
    selectors: &CompiledPageSelectors,
) -> Option<RawItem> {
    let title = selectors.title.first_value(block, visible_text)?;
    let link = selectors.link.first_value(block, |a| {
        a.value().attr("href").and_then(|href| resolve_url(href, Some(base)))
    })?;
    let summary_html = selectors
        .summary
        .first_value(block, |el| visible_text(el).map(|_| el.inner_html()))
        .unwrap_or_default();
    let candidate_image_url = selectors
        .image
        .first_value(block, |img| {
            img.value().attr("src").and_then(|src| resolve_url(src, Some(base)))
        })
        .map(String::from);

    Some(RawItem {
        title,
        link: link.into(),
        published_at: now,
        summary_html: summary_html.trim().to_string(),
        candidate_image_url,
        source_endpoint: base.to_string(),
        local_image: None,
    })
}

fn visible_text(element: ElementRef<'_>) -> Option<String> {
    let text = element.text().collect::<String>();
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}

/// Absolute URL for `reference`, joined onto `base` when relative.
/// Fragments and `javascript:` links are not navigable and yield `None`.
pub(crate) fn resolve_url(reference: &str, base: Option<&Url>) -> Option<Url> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with('#') || lower.starts_with("javascript:") {
        return None;
    }
    if let Ok(url) = Url::parse(trimmed) {
        return Some(url);
    }
    base.and_then(|base| base.join(trimmed).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn resolve_url_joins_relative_references() {
        let base = Url::parse("https://www.docker.com/blog/").unwrap();
        assert_eq!(
            resolve_url("/img/a.png", Some(&base)).unwrap().as_str(),
            "https://www.docker.com/img/a.png"
        );
        assert_eq!(
            resolve_url("post-1/", Some(&base)).unwrap().as_str(),
            "https://www.docker.com/blog/post-1/"
        );
        assert!(resolve_url("#comments", Some(&base)).is_none());
        assert!(resolve_url("javascript:void(0)", Some(&base)).is_none());
    }

    #[test]
    fn page_blocks_without_link_are_skipped() {
        let base = Url::parse("https://kubernetes.io/blog/").unwrap();
        let html = r#"<html><body>
            <article><h2>No link here</h2></article>
            <article><h2>Linked</h2><a href="/blog/linked/">read</a><p>Teaser</p></article>
        </body></html>"#;
        let selectors = CompiledPageSelectors::new(&PageSelectors::default());
        let items = parse_page(html, &base, now(), 10, &selectors);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Linked");
        assert_eq!(items[0].link, "https://kubernetes.io/blog/linked/");
        assert_eq!(items[0].summary_html, "Teaser");
        assert_eq!(items[0].published_at, now());
    }

    #[test]
    fn feed_summary_image_is_used_when_no_media() {
        let base = Url::parse("https://www.cncf.io/feed/").unwrap();
        let xml = r#"<?xml version="1.0"?>
            <rss version="2.0"><channel><title>CNCF</title>
            <item><title>KubeCon recap</title><link>https://www.cncf.io/blog/recap/</link>
            <description><![CDATA[<p><img src="/wp/recap.jpg"/>Highlights</p>]]></description></item>
            </channel></rss>"#;
        let items = parse_feed(xml.as_bytes(), &base, now(), 10).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0].candidate_image_url.as_deref(),
            Some("https://www.cncf.io/wp/recap.jpg")
        );
        assert_eq!(items[0].published_at, now());
    }

    #[test]
    fn garbage_feed_is_a_parse_failure() {
        let base = Url::parse("https://example.com/feed").unwrap();
        let err = parse_feed(b"<html>not a feed", &base, now(), 10).unwrap_err();
        assert!(matches!(err, SourceFailure::Parse(_)));
    }
}
