use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use newsroom_core::{ContentSelectors, PageSelectors, SourceCatalog, SourceDescriptor};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::fetch::FetchSettings;
use crate::pacing::Pacing;
use crate::source::MAX_ITEMS_PER_SOURCE;

pub const ENV_USERNAME: &str = "WP_USERNAME";
pub const ENV_PASSWORD: &str = "WP_PASSWORD";
pub const ENV_API_URL: &str = "WP_API_URL";
const API_ROOT_SUFFIX: &str = "/wp-json";

/// Injected source of "now" so runs are reproducible in tests.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    MissingCredential(&'static str),
    #[error("invalid api endpoint {0:?}")]
    InvalidEndpoint(String),
    #[error("catalog {path:?}: {message}")]
    Catalog { path: PathBuf, message: String },
}

/// Content-management credentials. All three values are required.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    /// Normalized API root, always ending in `/wp-json`.
    pub api_root: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("api_root", &self.api_root)
            .finish()
    }
}

impl Credentials {
    pub fn new(username: &str, password: &str, api_url: &str) -> Result<Self, ConfigError> {
        Self::from_lookup(|name| match name {
            ENV_USERNAME => Some(username.to_string()),
            ENV_PASSWORD => Some(password.to_string()),
            ENV_API_URL => Some(api_url.to_string()),
            _ => None,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingCredential(name))
        };
        let username = required(ENV_USERNAME)?;
        let password = required(ENV_PASSWORD)?;
        let api_root = normalize_api_root(&required(ENV_API_URL)?)?;
        Ok(Self {
            username,
            password,
            api_root,
        })
    }
}

/// `https://site/` and `https://site/wp-json/` both become `https://site/wp-json`.
pub fn normalize_api_root(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let root = if trimmed.ends_with(API_ROOT_SUFFIX) {
        trimmed.to_string()
    } else {
        format!("{trimmed}{API_ROOT_SUFFIX}")
    };
    match Url::parse(&root) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(root),
        _ => Err(ConfigError::InvalidEndpoint(raw.to_string())),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub page: PageSelectors,
    pub content: ContentSelectors,
}

/// On-disk catalog (RON): sources plus optional selector overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogFile {
    pub sources: Vec<SourceDescriptor>,
    pub selectors: SelectorConfig,
}

impl Default for CatalogFile {
    fn default() -> Self {
        Self {
            sources: SourceCatalog::default().sources,
            selectors: SelectorConfig::default(),
        }
    }
}

impl CatalogFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Catalog {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(&text).map_err(|message| ConfigError::Catalog {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn parse(text: &str) -> Result<Self, String> {
        ron::from_str(text).map_err(|e| e.to_string())
    }

    pub fn catalog(&self) -> SourceCatalog {
        SourceCatalog {
            sources: self.sources.clone(),
        }
    }
}

/// Everything a run needs besides credentials.
#[derive(Clone)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub catalog: SourceCatalog,
    pub selectors: SelectorConfig,
    pub fetch: FetchSettings,
    pub pacing: Pacing,
    pub items_per_source: usize,
    pub posts_per_category: usize,
    pub clock: Clock,
}

impl PipelineConfig {
    pub fn default_with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            catalog: SourceCatalog::default(),
            selectors: SelectorConfig::default(),
            fetch: FetchSettings::default(),
            pacing: Pacing::default(),
            items_per_source: MAX_ITEMS_PER_SOURCE,
            posts_per_category: 3,
            clock: system_clock(),
        }
    }

    pub fn with_catalog_file(mut self, file: CatalogFile) -> Self {
        self.catalog = file.catalog();
        self.selectors = file.selectors;
        self
    }
}
