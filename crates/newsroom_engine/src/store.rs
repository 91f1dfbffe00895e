use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use newsroom_core::{Category, Post, PostRecord, RawItem};

use crate::persist::{read_json, AtomicFileWriter, PersistError};

pub const COMBINED_SNAPSHOT: &str = "all_news.json";
pub const POSTS_FILE: &str = "posts.json";
pub const LEDGER_FILE: &str = "published_posts.json";

/// Layout of the data directory shared by all phases.
///
/// ```text
/// data/
///   {category}_news.json   fetch snapshot per category
///   all_news.json          every snapshot, keyed by category
///   images/                asset cache
///   posts/{post_id}.json   one record per generated post
///   posts.json             all posts from the last generate
///   published_posts.json   publish ledger
/// ```
#[derive(Debug, Clone)]
pub struct DataStore {
    root: PathBuf,
    writer: AtomicFileWriter,
    posts: AtomicFileWriter,
}

impl DataStore {
    pub fn new(root: PathBuf) -> Self {
        Self {
            writer: AtomicFileWriter::new(root.clone()),
            posts: AtomicFileWriter::new(root.join("posts")),
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join("images")
    }

    pub fn posts_dir(&self) -> &Path {
        self.posts.dir()
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.root.join(LEDGER_FILE)
    }

    pub fn posts_path(&self) -> PathBuf {
        self.root.join(POSTS_FILE)
    }

    pub fn snapshot_path(&self, category: Category) -> PathBuf {
        self.root.join(snapshot_name(category))
    }

    pub fn write_snapshot(&self, category: Category, items: &[RawItem]) -> Result<PathBuf, PersistError> {
        self.writer.write_json(&snapshot_name(category), items)
    }

    pub fn read_snapshot(&self, category: Category) -> Result<Option<Vec<RawItem>>, PersistError> {
        read_json(&self.snapshot_path(category))
    }

    pub fn write_combined(&self, all: &BTreeMap<Category, Vec<RawItem>>) -> Result<PathBuf, PersistError> {
        self.writer.write_json(COMBINED_SNAPSHOT, all)
    }

    pub fn write_posts(&self, posts: &[Post]) -> Result<PathBuf, PersistError> {
        self.writer.write_json(POSTS_FILE, posts)
    }

    pub fn read_posts(&self) -> Result<Option<Vec<Post>>, PersistError> {
        read_json(&self.posts_path())
    }

    pub fn write_record(&self, record: &PostRecord) -> Result<PathBuf, PersistError> {
        self.posts
            .write_json(&format!("{}.json", record.post.post_id), record)
    }

    pub fn read_record(&self, post_id: &str) -> Result<Option<PostRecord>, PersistError> {
        read_json(&self.posts_dir().join(format!("{post_id}.json")))
    }
}

fn snapshot_name(category: Category) -> String {
    format!("{}_news.json", category.name())
}
