//! Content-management target: a WordPress REST API (`/wp-json/wp/v2`).

use std::path::Path;

use newsroom_logging::{news_debug, news_trace};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::Credentials;
use crate::fetch::FetchSettings;
use crate::types::RemoteApiFailure;

const MAX_ERROR_BODY_CHARS: usize = 500;

/// Body of a post-creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub status: &'static str,
    pub categories: Vec<u64>,
    pub tags: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_media: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemotePost {
    pub id: u64,
    pub link: String,
}

/// Operations the publisher needs from a content-management system.
#[async_trait::async_trait]
pub trait ContentTarget: Send + Sync {
    async fn upload_media(&self, path: &Path) -> Result<u64, RemoteApiFailure>;

    /// Id of the category named `name` (case-insensitive), creating it if absent.
    async fn category_id(&self, name: &str) -> Result<u64, RemoteApiFailure>;

    /// Id of the tag named `name` (case-insensitive), creating it if absent.
    async fn tag_id(&self, name: &str) -> Result<u64, RemoteApiFailure>;

    async fn create_post(&self, draft: &PostDraft) -> Result<RemotePost, RemoteApiFailure>;
}

#[derive(Debug, Deserialize)]
struct Term {
    id: u64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct MediaItem {
    id: u64,
}

#[derive(Debug, Serialize)]
struct NewTerm<'a> {
    name: &'a str,
}

/// `400 term_exists` carries the id of the clashing term.
#[derive(Debug, Deserialize)]
struct TermExists {
    code: String,
    data: Option<TermExistsData>,
}

#[derive(Debug, Deserialize)]
struct TermExistsData {
    term_id: Option<u64>,
}

#[derive(Debug, Clone, Copy)]
enum Taxonomy {
    Categories,
    Tags,
}

impl Taxonomy {
    fn path(self) -> &'static str {
        match self {
            Taxonomy::Categories => "categories",
            Taxonomy::Tags => "tags",
        }
    }

    fn operation(self) -> &'static str {
        match self {
            Taxonomy::Categories => "category",
            Taxonomy::Tags => "tag",
        }
    }
}

pub struct WordPressClient {
    http: reqwest::Client,
    credentials: Credentials,
}

impl WordPressClient {
    pub fn new(credentials: Credentials, settings: &FetchSettings) -> Result<Self, RemoteApiFailure> {
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .user_agent(settings.user_agent.as_str())
            .build()
            .map_err(|e| RemoteApiFailure::Transport {
                operation: "client",
                message: e.to_string(),
            })?;
        Ok(Self { http, credentials })
    }

    fn endpoint(&self, operation: &'static str, path: &str) -> Result<Url, RemoteApiFailure> {
        let raw = format!("{}/wp/v2/{path}", self.credentials.api_root);
        Url::parse(&raw).map_err(|e| RemoteApiFailure::Transport {
            operation,
            message: format!("bad endpoint {raw}: {e}"),
        })
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.basic_auth(&self.credentials.username, Some(&self.credentials.password))
    }

    async fn send(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<(StatusCode, String), RemoteApiFailure> {
        let response = self
            .authed(request)
            .send()
            .await
            .map_err(|e| transport(operation, e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| transport(operation, e))?;
        news_trace!("{} -> {}", operation, status);
        Ok((status, body))
    }

    async fn find_term(&self, taxonomy: Taxonomy, name: &str) -> Result<Option<u64>, RemoteApiFailure> {
        let operation = taxonomy.operation();
        let mut url = self.endpoint(operation, taxonomy.path())?;
        url.query_pairs_mut().append_pair("search", name);

        let (status, body) = self.send(operation, self.http.get(url)).await?;
        if !status.is_success() {
            news_debug!("{} search for {:?} returned {}", operation, name, status);
            return Ok(None);
        }
        let terms: Vec<Term> = parse_body(operation, &body)?;
        Ok(terms
            .into_iter()
            .find(|t| t.name.trim().eq_ignore_ascii_case(name))
            .map(|t| t.id))
    }

    async fn create_term(&self, taxonomy: Taxonomy, name: &str) -> Result<u64, RemoteApiFailure> {
        let operation = taxonomy.operation();
        let url = self.endpoint(operation, taxonomy.path())?;
        let (status, body) = self
            .send(operation, self.http.post(url).json(&NewTerm { name }))
            .await?;

        if status == StatusCode::BAD_REQUEST {
            if let Some(id) = existing_term_id(&body) {
                news_debug!("{} {:?} already exists as {}", operation, name, id);
                return Ok(id);
            }
        }
        let term: Term = expect_success(operation, status, &body)?;
        news_debug!("Created {} {:?} as {}", operation, term.name, term.id);
        Ok(term.id)
    }

    async fn term_id(&self, taxonomy: Taxonomy, name: &str) -> Result<u64, RemoteApiFailure> {
        match self.find_term(taxonomy, name).await? {
            Some(id) => Ok(id),
            None => self.create_term(taxonomy, name).await,
        }
    }
}

#[async_trait::async_trait]
impl ContentTarget for WordPressClient {
    async fn upload_media(&self, path: &Path) -> Result<u64, RemoteApiFailure> {
        const OPERATION: &str = "media upload";
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| RemoteApiFailure::Io(format!("{path:?}: {e}")))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image.jpg".to_string());

        let url = self.endpoint(OPERATION, "media")?;
        let request = self
            .http
            .post(url)
            .header(CONTENT_DISPOSITION, format!("attachment; filename={file_name}"))
            .header(CONTENT_TYPE, media_type_for(path))
            .body(bytes);
        let (status, body) = self.send(OPERATION, request).await?;
        let media: MediaItem = expect_success(OPERATION, status, &body)?;
        Ok(media.id)
    }

    async fn category_id(&self, name: &str) -> Result<u64, RemoteApiFailure> {
        self.term_id(Taxonomy::Categories, name).await
    }

    async fn tag_id(&self, name: &str) -> Result<u64, RemoteApiFailure> {
        self.term_id(Taxonomy::Tags, name).await
    }

    async fn create_post(&self, draft: &PostDraft) -> Result<RemotePost, RemoteApiFailure> {
        const OPERATION: &str = "post creation";
        let url = self.endpoint(OPERATION, "posts")?;
        let (status, body) = self.send(OPERATION, self.http.post(url).json(draft)).await?;
        expect_success(OPERATION, status, &body)
    }
}

/// Image MIME type from the file extension; unknown extensions are sent as JPEG.
pub fn media_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "avif" => "image/avif",
        _ => "image/jpeg",
    }
}

fn expect_success<T: DeserializeOwned>(
    operation: &'static str,
    status: StatusCode,
    body: &str,
) -> Result<T, RemoteApiFailure> {
    if !status.is_success() {
        return Err(RemoteApiFailure::Status {
            operation,
            status: status.as_u16(),
            body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        });
    }
    parse_body(operation, body)
}

fn parse_body<T: DeserializeOwned>(operation: &'static str, body: &str) -> Result<T, RemoteApiFailure> {
    serde_json::from_str(body).map_err(|e| RemoteApiFailure::MalformedResponse {
        operation,
        message: e.to_string(),
    })
}

fn existing_term_id(body: &str) -> Option<u64> {
    let conflict: TermExists = serde_json::from_str(body).ok()?;
    if conflict.code != "term_exists" {
        return None;
    }
    conflict.data?.term_id
}

fn transport(operation: &'static str, err: reqwest::Error) -> RemoteApiFailure {
    RemoteApiFailure::Transport {
        operation,
        message: err.to_string(),
    }
}
