//! Newsroom core: pure domain model, identity and normalization rules.
//!
//! Nothing in this crate touches the network or the filesystem.
mod identity;
mod ledger;
mod model;
mod normalize;
mod plan;
mod selectors;

pub use identity::{canonicalize_link, IdentityKey};
pub use ledger::{InMemoryLedger, LedgerError, LedgerState, PublishLedger, RecordOutcome};
pub use model::{
    Category, LedgerEntry, Post, PostRecord, RawItem, RunSummary, SourceCatalog,
    SourceDescriptor, SourceKind, UnknownCategory,
};
pub use normalize::{format_title, normalize, post_id, summary_text, tags_for, MAX_EXCERPT_CHARS};
pub use plan::{plan_publish, PublishPlan};
pub use selectors::{CompiledChain, ContentSelectors, PageSelectors, SelectorChain};
