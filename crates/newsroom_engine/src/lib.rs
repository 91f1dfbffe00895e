//! Newsroom engine: network, filesystem and content-management IO around the
//! pure rules in `newsroom_core`.
mod asset;
mod config;
mod convert;
mod decode;
mod extract;
mod fetch;
mod filename;
mod ledger;
mod pacing;
mod persist;
mod pipeline;
mod publish;
mod source;
mod store;
mod types;
mod wordpress;

pub use asset::AssetResolver;
pub use config::{
    normalize_api_root, system_clock, CatalogFile, Clock, ConfigError, Credentials,
    PipelineConfig, SelectorConfig, ENV_API_URL, ENV_PASSWORD, ENV_USERNAME,
};
pub use convert::{tidy_markdown, Converter, Html2MdConverter};
pub use decode::{decode_text, DecodedText};
pub use extract::{ContentExtractor, Extractor, SelectorExtractor};
pub use fetch::{
    FetchSettings, Fetcher, ReqwestFetcher, ANY_CONTENT_TYPE, BROWSER_USER_AGENT,
    HTML_CONTENT_TYPES,
};
pub use filename::{asset_filename, extension_from_url};
pub use ledger::JsonFileLedger;
pub use pacing::{DelayRange, Pacing};
pub use persist::{ensure_output_dir, read_json, AtomicFileWriter, PersistError};
pub use pipeline::{FetchReport, Pipeline, PipelineError};
pub use publish::{Published, Publisher, PUBLISH_STATUS};
pub use source::{SourceReader, MAX_ITEMS_PER_SOURCE};
pub use store::{DataStore, COMBINED_SNAPSHOT, LEDGER_FILE, POSTS_FILE};
pub use types::{
    AssetFailure, ExtractionFailure, FailureKind, FetchError, FetchMetadata, FetchOutput,
    RemoteApiFailure, SourceFailure,
};
pub use wordpress::{media_type_for, ContentTarget, PostDraft, RemotePost, WordPressClient};
