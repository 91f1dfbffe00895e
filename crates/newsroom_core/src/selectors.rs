//! Ordered "first match wins" selector strategies.
//!
//! Scraping heuristics are data, not code: each chain is a list of CSS
//! selectors tried in priority order. Chains are serde types so a catalog file
//! can extend them for new sources.

use newsroom_logging::news_warn;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectorChain(Vec<String>);

impl SelectorChain {
    pub fn new<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(candidates.into_iter().map(Into::into).collect())
    }

    pub fn candidates(&self) -> &[String] {
        &self.0
    }

    /// Parses every candidate; invalid selectors are logged and dropped.
    pub fn compile(&self) -> CompiledChain {
        let selectors = self
            .0
            .iter()
            .filter_map(|raw| match Selector::parse(raw) {
                Ok(selector) => Some(selector),
                Err(err) => {
                    news_warn!("Ignoring invalid selector {:?}: {}", raw, err);
                    None
                }
            })
            .collect();
        CompiledChain { selectors }
    }
}

#[derive(Debug, Clone)]
pub struct CompiledChain {
    selectors: Vec<Selector>,
}

impl CompiledChain {
    /// First candidate (in priority order) that matches anything inside `scope`.
    pub fn first_in<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        self.selectors
            .iter()
            .find_map(|selector| scope.select(selector).next())
    }

    /// First candidate for which `map` yields a value.
    pub fn first_value<'a, T>(
        &self,
        scope: ElementRef<'a>,
        mut map: impl FnMut(ElementRef<'a>) -> Option<T>,
    ) -> Option<T> {
        self.selectors
            .iter()
            .find_map(|selector| scope.select(selector).find_map(&mut map))
    }

    /// All matches of the first candidate that matches anything in `doc`.
    pub fn all_of_first<'a>(&self, doc: &'a Html) -> Vec<ElementRef<'a>> {
        for selector in &self.selectors {
            let found: Vec<_> = doc.select(selector).collect();
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }

    /// Every element matched by any candidate, in candidate order.
    pub fn every_match<'a>(&self, doc: &'a Html) -> Vec<ElementRef<'a>> {
        self.selectors
            .iter()
            .flat_map(|selector| doc.select(selector))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }
}

/// Strategies for turning a listing page into items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSelectors {
    pub blocks: SelectorChain,
    pub title: SelectorChain,
    pub link: SelectorChain,
    pub summary: SelectorChain,
    pub image: SelectorChain,
}

impl Default for PageSelectors {
    fn default() -> Self {
        Self {
            blocks: SelectorChain::new(["article", ".post", ".blog-post", ".entry"]),
            title: SelectorChain::new(["h1", "h2", "h3", ".title", ".entry-title"]),
            link: SelectorChain::new(["a[href]"]),
            summary: SelectorChain::new(["p", ".summary", ".excerpt", ".entry-summary"]),
            image: SelectorChain::new(["img[src]"]),
        }
    }
}

/// Strategies for reducing an article page to its main content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentSelectors {
    /// Removed from the document before a container is chosen.
    pub strip: SelectorChain,
    /// Content containers in priority order; the body is the fallback.
    pub containers: SelectorChain,
}

impl Default for ContentSelectors {
    fn default() -> Self {
        Self {
            strip: SelectorChain::new([
                "nav",
                "header",
                "footer",
                "aside",
                ".sidebar",
                ".comments",
                ".related-posts",
                ".advertisement",
                "script",
                "style",
            ]),
            containers: SelectorChain::new([
                "article",
                ".post-content",
                ".entry-content",
                ".content",
                "main",
                ".post-body",
            ]),
        }
    }
}
