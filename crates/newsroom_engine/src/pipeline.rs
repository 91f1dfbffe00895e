//! Fetch -> generate -> publish orchestration.
//!
//! Per-item and per-source failures are logged and counted; only
//! configuration, ledger and local persistence errors abort a phase.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use newsroom_core::{
    normalize, plan_publish, Category, LedgerError, Post, PostRecord, PublishLedger, RawItem,
    RunSummary,
};
use newsroom_logging::{news_debug, news_info, news_warn};

use crate::asset::AssetResolver;
use crate::config::{ConfigError, PipelineConfig};
use crate::extract::ContentExtractor;
use crate::fetch::{Fetcher, ReqwestFetcher};
use crate::persist::PersistError;
use crate::publish::Publisher;
use crate::source::SourceReader;
use crate::store::DataStore;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("ledger: {0}")]
    Ledger(#[from] LedgerError),
    #[error("local storage: {0}")]
    Persist(#[from] PersistError),
    #[error("nothing to {phase}: {path:?} does not exist")]
    MissingInput { phase: &'static str, path: PathBuf },
}

/// Items read during one fetch phase, per category in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchReport {
    pub items: BTreeMap<Category, Vec<RawItem>>,
    pub summary: RunSummary,
}

pub struct Pipeline {
    config: PipelineConfig,
    store: DataStore,
    reader: SourceReader,
    assets: AssetResolver,
    extractor: ContentExtractor,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let fetcher: Arc<dyn Fetcher> = Arc::new(ReqwestFetcher::new(config.fetch.clone()));
        Self::with_fetcher(config, fetcher)
    }

    pub fn with_fetcher(config: PipelineConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        let store = DataStore::new(config.data_dir.clone());
        let reader = SourceReader::new(fetcher.clone(), &config.selectors.page, config.clock.clone())
            .with_limit(config.items_per_source);
        let assets = AssetResolver::new(store.images_dir(), fetcher.clone(), config.pacing.after_download);
        let extractor = ContentExtractor::new(fetcher, &config.selectors.content);
        Self {
            config,
            store,
            reader,
            assets,
            extractor,
        }
    }

    pub fn store(&self) -> &DataStore {
        &self.store
    }

    /// Reads every source, caches images and writes per-category snapshots.
    pub async fn fetch(&self) -> Result<FetchReport, PipelineError> {
        let mut report = FetchReport::default();

        for category in self.config.catalog.categories() {
            let mut items = Vec::new();
            for source in self.config.catalog.for_category(category) {
                self.config.pacing.between_sources.pause().await;
                match self.reader.read(source).await {
                    Ok(batch) => items.extend(batch),
                    Err(failure) => {
                        news_warn!("Source {} failed: {}", source.endpoint, failure);
                        report.summary.failed += 1;
                    }
                }
            }

            for item in &mut items {
                self.attach_image(item).await;
            }

            self.store.write_snapshot(category, &items)?;
            news_info!("Fetched {} {} items", items.len(), category);
            report.summary.fetched += items.len();
            report.items.insert(category, items);
        }

        self.store.write_combined(&report.items)?;
        Ok(report)
    }

    async fn attach_image(&self, item: &mut RawItem) {
        let Some(url) = item.candidate_image_url.as_deref() else {
            return;
        };
        match self.assets.resolve(url, &item.title).await {
            Ok(path) => item.local_image = Some(path),
            Err(failure) => news_warn!("Image for {:?} not cached: {}", item.title, failure),
        }
    }

    /// Turns the newest snapshot items of each category into posts.
    pub async fn generate(&self) -> Result<(Vec<Post>, RunSummary), PipelineError> {
        let mut posts = Vec::new();
        let mut summary = RunSummary::default();

        for category in self.config.catalog.categories() {
            let items = match self.store.read_snapshot(category) {
                Ok(Some(items)) => items,
                Ok(None) => {
                    news_warn!("No snapshot for {}; run fetch first", category);
                    summary.failed += 1;
                    continue;
                }
                Err(err) => {
                    news_warn!("Skipping {}: {}", category, err);
                    summary.failed += 1;
                    continue;
                }
            };
            for (index, raw) in items.iter().take(self.config.posts_per_category).enumerate() {
                self.config.pacing.between_posts.pause().await;
                let post = self.generate_one(raw, category, index).await?;
                posts.push(post);
            }
        }

        self.store.write_posts(&posts)?;
        summary.generated = posts.len();
        news_info!("Generated {} posts", posts.len());
        Ok((posts, summary))
    }

    async fn generate_one(
        &self,
        raw: &RawItem,
        category: Category,
        index: usize,
    ) -> Result<Post, PipelineError> {
        let extracted = match self.extractor.extract(&raw.link).await {
            Ok(text) => Some(text),
            Err(failure) => {
                news_warn!("Using summary for {}: {}", raw.link, failure);
                None
            }
        };
        let post = normalize(raw, extracted.as_deref(), category, index, (self.config.clock)());
        self.store.write_record(&PostRecord {
            post: post.clone(),
            published: None,
        })?;
        news_debug!("Generated {} from {}", post.post_id, raw.link);
        Ok(post)
    }

    /// Posts from the last generate run.
    pub fn load_posts(&self) -> Result<Vec<Post>, PipelineError> {
        self.store
            .read_posts()?
            .ok_or_else(|| PipelineError::MissingInput {
                phase: "publish",
                path: self.store.posts_path(),
            })
    }

    /// Publishes each identity at most once, ever.
    ///
    /// The ledger is checked immediately before every remote call and updated
    /// immediately after every success; a ledger write failure stops the phase.
    pub async fn publish(
        &self,
        posts: Vec<Post>,
        ledger: &mut dyn PublishLedger,
        publisher: &mut Publisher,
    ) -> Result<RunSummary, PipelineError> {
        let plan = plan_publish(posts, &*ledger);
        let mut summary = RunSummary {
            skipped_already_published: plan.already_published.len(),
            skipped_duplicate: plan.duplicates.len(),
            ..RunSummary::default()
        };
        for post in &plan.already_published {
            news_debug!("Already published: {}", post.source_link);
        }
        for post in &plan.duplicates {
            news_debug!("Duplicate in batch: {}", post.source_link);
        }
        news_info!("{} posts queued for publishing", plan.queue.len());

        for (i, post) in plan.queue.into_iter().enumerate() {
            if i > 0 {
                self.config.pacing.between_publishes.pause().await;
            }
            if ledger.has(&post.identity_key) {
                summary.skipped_already_published += 1;
                continue;
            }

            let published = match publisher.publish(&post).await {
                Ok(published) => published,
                Err(failure) => {
                    news_warn!("Failed to publish {:?}: {}", post.title, failure);
                    summary.failed += 1;
                    continue;
                }
            };

            ledger.record(
                post.identity_key.clone(),
                &published.remote_id,
                &published.remote_url,
                (self.config.clock)(),
            )?;
            summary.published += 1;

            let record = PostRecord {
                published: ledger.get(&post.identity_key).cloned(),
                post,
            };
            if let Err(err) = self.store.write_record(&record) {
                news_warn!(
                    "Published {} but could not update its record: {}",
                    record.post.post_id,
                    err
                );
            }
        }

        ledger.flush()?;
        news_info!("Published {} posts ({} failed)", summary.published, summary.failed);
        Ok(summary)
    }

    /// All three phases back to back.
    pub async fn run(
        &self,
        ledger: &mut dyn PublishLedger,
        publisher: &mut Publisher,
    ) -> Result<RunSummary, PipelineError> {
        let mut summary = self.fetch().await?.summary;
        let (posts, generated) = self.generate().await?;
        summary.merge(generated);
        summary.merge(self.publish(posts, ledger, publisher).await?);
        Ok(summary)
    }
}
