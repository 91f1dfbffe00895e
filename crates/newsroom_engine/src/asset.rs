use std::path::{Path, PathBuf};
use std::sync::Arc;

use newsroom_logging::news_debug;
use url::Url;

use crate::fetch::Fetcher;
use crate::filename::asset_filename;
use crate::pacing::DelayRange;
use crate::persist::ensure_output_dir;
use crate::types::AssetFailure;

/// Write-once, content-addressed image cache.
///
/// An existing file at the computed path is trusted as-is and never fetched
/// again; stale images are accepted.
pub struct AssetResolver {
    dir: PathBuf,
    fetcher: Arc<dyn Fetcher>,
    after_download: DelayRange,
}

impl AssetResolver {
    pub fn new(dir: PathBuf, fetcher: Arc<dyn Fetcher>, after_download: DelayRange) -> Self {
        Self {
            dir,
            fetcher,
            after_download,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, candidate_url: &str, title: &str) -> PathBuf {
        self.dir.join(asset_filename(title, candidate_url))
    }

    pub async fn resolve(&self, candidate_url: &str, title: &str) -> Result<PathBuf, AssetFailure> {
        let url = candidate_url.trim();
        if Url::parse(url).is_err() {
            return Err(AssetFailure::InvalidUrl(url.to_string()));
        }

        let path = self.path_for(url, title);
        if path.is_file() {
            news_debug!("Asset cache hit {:?} for {}", path, url);
            return Ok(path);
        }

        ensure_output_dir(&self.dir).map_err(|e| AssetFailure::Io(e.to_string()))?;
        let written = self.fetcher.download(url, &path).await?;
        news_debug!("Cached {} bytes from {} at {:?}", written, url, path);

        self.after_download.pause().await;
        Ok(path)
    }
}
