use std::collections::HashMap;
use std::sync::Arc;

use newsroom_core::Post;
use newsroom_logging::{news_debug, news_info, news_warn};

use crate::types::RemoteApiFailure;
use crate::wordpress::{ContentTarget, PostDraft};

pub const PUBLISH_STATUS: &str = "publish";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub remote_id: String,
    pub remote_url: String,
    pub media_id: Option<u64>,
}

/// Pushes one post at a time to a [`ContentTarget`].
///
/// Image, category and tag steps degrade on failure; only the final post
/// creation decides the outcome. Term ids are cached for the life of the value.
pub struct Publisher {
    target: Arc<dyn ContentTarget>,
    category_ids: HashMap<String, u64>,
    tag_ids: HashMap<String, u64>,
}

impl Publisher {
    pub fn new(target: Arc<dyn ContentTarget>) -> Self {
        Self {
            target,
            category_ids: HashMap::new(),
            tag_ids: HashMap::new(),
        }
    }

    pub async fn publish(&mut self, post: &Post) -> Result<Published, RemoteApiFailure> {
        let media_id = self.upload_image(post).await;

        let categories = match self.category_id(post.category.display_name()).await {
            Ok(id) => vec![id],
            Err(failure) => {
                news_warn!("No category for {:?}: {}", post.title, failure);
                Vec::new()
            }
        };

        let mut tags = Vec::with_capacity(post.tags.len());
        for tag in &post.tags {
            match self.tag_id(tag).await {
                Ok(id) => tags.push(id),
                Err(failure) => news_warn!("Skipping tag {:?}: {}", tag, failure),
            }
        }

        let draft = PostDraft {
            title: post.title.clone(),
            content: post.body_markdown.clone(),
            excerpt: post.excerpt.clone(),
            status: PUBLISH_STATUS,
            categories,
            tags,
            featured_media: media_id,
        };
        let created = self.target.create_post(&draft).await?;
        news_info!("Published {:?} -> {}", post.title, created.link);

        Ok(Published {
            remote_id: created.id.to_string(),
            remote_url: created.link,
            media_id,
        })
    }

    async fn upload_image(&self, post: &Post) -> Option<u64> {
        let path = post.local_image_path.as_deref()?;
        if !path.is_file() {
            news_warn!("Image {:?} for {:?} is missing; publishing without it", path, post.title);
            return None;
        }
        match self.target.upload_media(path).await {
            Ok(id) => {
                news_debug!("Uploaded {:?} as media {}", path, id);
                Some(id)
            }
            Err(failure) => {
                news_warn!("Image upload failed for {:?}: {}", post.title, failure);
                None
            }
        }
    }

    async fn category_id(&mut self, name: &str) -> Result<u64, RemoteApiFailure> {
        let key = name.to_lowercase();
        if let Some(id) = self.category_ids.get(&key) {
            return Ok(*id);
        }
        let id = self.target.category_id(name).await?;
        self.category_ids.insert(key, id);
        Ok(id)
    }

    async fn tag_id(&mut self, name: &str) -> Result<u64, RemoteApiFailure> {
        let key = name.to_lowercase();
        if let Some(id) = self.tag_ids.get(&key) {
            return Ok(*id);
        }
        let id = self.target.tag_id(&key).await?;
        self.tag_ids.insert(key, id);
        Ok(id)
    }
}
