use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::IdentityKey;

/// Topic bucket a source (and every post derived from it) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Docker,
    Kubernetes,
    Container,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Docker, Category::Kubernetes, Category::Container];

    pub fn name(self) -> &'static str {
        match self {
            Category::Docker => "docker",
            Category::Kubernetes => "kubernetes",
            Category::Container => "container",
        }
    }

    /// Capitalized form used in titles, footers and remote category names.
    pub fn display_name(self) -> &'static str {
        match self {
            Category::Docker => "Docker",
            Category::Kubernetes => "Kubernetes",
            Category::Container => "Container",
        }
    }

    /// Tags added on top of the shared `{category, container, cloud-native}` set.
    pub fn extra_tags(self) -> &'static [&'static str] {
        match self {
            Category::Docker => &["containers", "dockerhub", "docker-compose"],
            Category::Kubernetes => &["k8s", "cncf", "cloud-native"],
            Category::Container => &[],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category {0:?}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// RSS/Atom feed.
    Feed,
    /// HTML listing page scraped with block selectors.
    Page,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub category: Category,
    pub kind: SourceKind,
    pub endpoint: String,
}

impl SourceDescriptor {
    pub fn feed(category: Category, endpoint: &str) -> Self {
        Self {
            category,
            kind: SourceKind::Feed,
            endpoint: endpoint.to_string(),
        }
    }

    pub fn page(category: Category, endpoint: &str) -> Self {
        Self {
            category,
            kind: SourceKind::Page,
            endpoint: endpoint.to_string(),
        }
    }
}

/// Static category -> sources configuration. Order of `sources` is the fetch order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCatalog {
    pub sources: Vec<SourceDescriptor>,
}

impl SourceCatalog {
    /// Categories in first-appearance order.
    pub fn categories(&self) -> Vec<Category> {
        let mut seen = Vec::new();
        for source in &self.sources {
            if !seen.contains(&source.category) {
                seen.push(source.category);
            }
        }
        seen
    }

    pub fn for_category(&self, category: Category) -> impl Iterator<Item = &SourceDescriptor> {
        self.sources.iter().filter(move |s| s.category == category)
    }
}

impl Default for SourceCatalog {
    fn default() -> Self {
        use Category::*;
        Self {
            sources: vec![
                SourceDescriptor::feed(Docker, "https://www.docker.com/blog/feed/"),
                SourceDescriptor::feed(Docker, "https://docs.docker.com/release-notes/feed/"),
                SourceDescriptor::page(Docker, "https://www.docker.com/blog/"),
                SourceDescriptor::feed(Kubernetes, "https://kubernetes.io/feed.xml"),
                SourceDescriptor::feed(Kubernetes, "https://www.cncf.io/feed/"),
                SourceDescriptor::page(Kubernetes, "https://kubernetes.io/blog/"),
                SourceDescriptor::feed(Container, "https://www.linkedin.com/company/docker/rss"),
                SourceDescriptor::feed(
                    Container,
                    "https://www.redhat.com/en/rss/blog/channel/kubernetes",
                ),
            ],
        }
    }
}

/// One entry read from a source, before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawItem {
    pub title: String,
    pub link: String,
    pub published_at: DateTime<Utc>,
    pub summary_html: String,
    pub candidate_image_url: Option<String>,
    pub source_endpoint: String,
    /// Filled in by the asset cache during the fetch phase.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_image: Option<PathBuf>,
}

/// Canonical post ready for publishing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Record name only (`{category}_{index}_{stamp}`); never used for identity.
    pub post_id: String,
    pub identity_key: IdentityKey,
    pub title: String,
    pub body_markdown: String,
    pub excerpt: String,
    pub category: Category,
    pub tags: BTreeSet<String>,
    pub local_image_path: Option<PathBuf>,
    pub remote_image_url: Option<String>,
    pub source_link: String,
    pub created_at: DateTime<Utc>,
}

/// Proof that an identity key reached the remote target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub identity_key: IdentityKey,
    pub remote_id: String,
    pub remote_url: String,
    pub published_at: DateTime<Utc>,
}

/// Per-post document written under `posts/`; `published` is set after a successful publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    #[serde(flatten)]
    pub post: Post,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<LedgerEntry>,
}

/// Counters reported at the end of each phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub fetched: usize,
    pub generated: usize,
    pub published: usize,
    pub skipped_already_published: usize,
    pub skipped_duplicate: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn merge(&mut self, other: RunSummary) {
        self.fetched += other.fetched;
        self.generated += other.generated;
        self.published += other.published;
        self.skipped_already_published += other.skipped_already_published;
        self.skipped_duplicate += other.skipped_duplicate;
        self.failed += other.failed;
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fetched={} generated={} published={} skipped_published={} skipped_duplicate={} failed={}",
            self.fetched,
            self.generated,
            self.published,
            self.skipped_already_published,
            self.skipped_duplicate,
            self.failed
        )
    }
}
