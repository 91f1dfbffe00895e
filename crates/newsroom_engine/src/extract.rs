use std::sync::Arc;

use ego_tree::NodeId;
use newsroom_core::{CompiledChain, ContentSelectors};
use newsroom_logging::news_debug;
use scraper::{Html, Selector};

use crate::convert::{Converter, Html2MdConverter};
use crate::decode::decode_text;
use crate::fetch::{Fetcher, HTML_CONTENT_TYPES};
use crate::types::ExtractionFailure;

pub trait Extractor: Send + Sync {
    /// Main-content HTML of a full document, if any.
    fn extract(&self, html: &str) -> Option<String>;
}

/// Readability-lite extractor driven by [`ContentSelectors`]:
/// - removes every element matched by the strip chain
/// - returns the first content container in priority order
/// - otherwise the `<body>`, otherwise the whole document.
#[derive(Debug, Clone)]
pub struct SelectorExtractor {
    strip: CompiledChain,
    containers: CompiledChain,
    body: Option<Selector>,
}

impl SelectorExtractor {
    pub fn new(selectors: &ContentSelectors) -> Self {
        Self {
            strip: selectors.strip.compile(),
            containers: selectors.containers.compile(),
            body: Selector::parse("body").ok(),
        }
    }
}

impl Default for SelectorExtractor {
    fn default() -> Self {
        Self::new(&ContentSelectors::default())
    }
}

impl Extractor for SelectorExtractor {
    fn extract(&self, html: &str) -> Option<String> {
        let mut doc = Html::parse_document(html);

        let doomed: Vec<NodeId> = self.strip.every_match(&doc).iter().map(|e| e.id()).collect();
        for id in doomed {
            if let Some(mut node) = doc.tree.get_mut(id) {
                node.detach();
            }
        }

        let root = doc.root_element();
        let content = self
            .containers
            .first_in(root)
            .or_else(|| self.body.as_ref().and_then(|sel| doc.select(sel).next()))
            .map(|node| node.html())
            .unwrap_or_else(|| root.html());

        Some(content).filter(|c| !c.trim().is_empty())
    }
}

/// Fetches an article link and reduces it to canonical markdown text.
pub struct ContentExtractor {
    fetcher: Arc<dyn Fetcher>,
    extractor: Box<dyn Extractor>,
    converter: Box<dyn Converter>,
}

impl ContentExtractor {
    pub fn new(fetcher: Arc<dyn Fetcher>, selectors: &ContentSelectors) -> Self {
        Self {
            fetcher,
            extractor: Box::new(SelectorExtractor::new(selectors)),
            converter: Box::new(Html2MdConverter),
        }
    }

    pub async fn extract(&self, link: &str) -> Result<String, ExtractionFailure> {
        let output = self.fetcher.fetch(link, HTML_CONTENT_TYPES).await?;
        let decoded = decode_text(&output.bytes, output.metadata.content_type.as_deref());
        if decoded.lossy {
            news_debug!("Lossy {} decode for {}", decoded.encoding_label, link);
        }
        self.extract_html(&decoded.text).ok_or(ExtractionFailure::Empty)
    }

    pub fn extract_html(&self, html: &str) -> Option<String> {
        let content = self.extractor.extract(html)?;
        Some(self.converter.to_markdown(&content)).filter(|md| !md.is_empty())
    }
}
