use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use newsroom_logging::news_warn;

use crate::identity::IdentityKey;
use crate::model::LedgerEntry;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("ledger at {path:?} is corrupt: {message}")]
    Corrupt { path: PathBuf, message: String },
    #[error("failed to persist ledger: {0}")]
    Persist(String),
}

/// Single source of truth for "has this identity been published".
///
/// Each key moves `unknown -> published` exactly once; there is no way back.
pub trait PublishLedger: Send {
    fn has(&self, key: &IdentityKey) -> bool;

    fn get(&self, key: &IdentityKey) -> Option<&LedgerEntry>;

    /// Marks `key` as published. Recording the same data twice is a no-op.
    fn record(
        &mut self,
        key: IdentityKey,
        remote_id: &str,
        remote_url: &str,
        when: DateTime<Utc>,
    ) -> Result<RecordOutcome, LedgerError>;

    fn entries(&self) -> Vec<LedgerEntry>;

    fn len(&self) -> usize {
        self.entries().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Makes pending writes durable; no-op for in-memory ledgers.
    fn flush(&mut self) -> Result<(), LedgerError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Inserted,
    Unchanged,
    /// Same key recorded again with different remote data; the last write wins.
    Replaced,
}

/// Unique-key entry map shared by every ledger backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerState {
    entries: BTreeMap<IdentityKey, LedgerEntry>,
}

impl LedgerState {
    /// Builds state from stored entries; later duplicates of a key win.
    pub fn from_entries(entries: impl IntoIterator<Item = LedgerEntry>) -> Self {
        let mut state = Self::default();
        for entry in entries {
            state.entries.insert(entry.identity_key.clone(), entry);
        }
        state
    }

    pub fn contains(&self, key: &IdentityKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &IdentityKey) -> Option<&LedgerEntry> {
        self.entries.get(key)
    }

    pub fn apply(&mut self, entry: LedgerEntry) -> RecordOutcome {
        match self.entries.get(&entry.identity_key) {
            Some(existing) if same_remote(existing, &entry) => RecordOutcome::Unchanged,
            Some(existing) => {
                news_warn!(
                    "Ledger key {} re-recorded: remote {} -> {}",
                    entry.identity_key,
                    existing.remote_id,
                    entry.remote_id
                );
                self.entries.insert(entry.identity_key.clone(), entry);
                RecordOutcome::Replaced
            }
            None => {
                self.entries.insert(entry.identity_key.clone(), entry);
                RecordOutcome::Inserted
            }
        }
    }

    /// Entries in key order.
    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.entries.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// The publish time is not part of the remote identity of an entry.
fn same_remote(a: &LedgerEntry, b: &LedgerEntry) -> bool {
    a.remote_id == b.remote_id && a.remote_url == b.remote_url
}

/// Ledger that lives only for the current process.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    state: LedgerState,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: impl IntoIterator<Item = LedgerEntry>) -> Self {
        Self {
            state: LedgerState::from_entries(entries),
        }
    }
}

impl PublishLedger for InMemoryLedger {
    fn has(&self, key: &IdentityKey) -> bool {
        self.state.contains(key)
    }

    fn get(&self, key: &IdentityKey) -> Option<&LedgerEntry> {
        self.state.get(key)
    }

    fn record(
        &mut self,
        key: IdentityKey,
        remote_id: &str,
        remote_url: &str,
        when: DateTime<Utc>,
    ) -> Result<RecordOutcome, LedgerError> {
        Ok(self.state.apply(LedgerEntry {
            identity_key: key,
            remote_id: remote_id.to_string(),
            remote_url: remote_url.to_string(),
            published_at: when,
        }))
    }

    fn entries(&self) -> Vec<LedgerEntry> {
        self.state.entries()
    }

    fn len(&self) -> usize {
        self.state.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn key(link: &str) -> IdentityKey {
        IdentityKey::from_link(link)
    }

    #[test]
    fn record_moves_key_to_published() {
        let mut ledger = InMemoryLedger::new();
        let k = key("https://docker.com/blog/a");
        assert!(!ledger.has(&k));

        let when = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let outcome = ledger.record(k.clone(), "42", "https://site/42", when).unwrap();

        assert_eq!(outcome, RecordOutcome::Inserted);
        assert!(ledger.has(&k));
        assert_eq!(ledger.get(&k).unwrap().remote_id, "42");
    }

    #[test]
    fn recording_twice_keeps_one_entry() {
        let mut ledger = InMemoryLedger::new();
        let k = key("https://docker.com/blog/a");
        let when = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();

        ledger.record(k.clone(), "42", "https://site/42", when).unwrap();
        let again = ledger.record(k.clone(), "42", "https://site/42", later).unwrap();

        assert_eq!(again, RecordOutcome::Unchanged);
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.get(&k).unwrap().published_at, when);
    }

    #[test]
    fn state_from_entries_deduplicates_keys() {
        let when = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let entry = |id: &str| LedgerEntry {
            identity_key: key("https://docker.com/blog/a"),
            remote_id: id.to_string(),
            remote_url: format!("https://site/{id}"),
            published_at: when,
        };
        let state = LedgerState::from_entries([entry("1"), entry("2")]);
        assert_eq!(state.len(), 1);
        assert_eq!(state.entries()[0].remote_id, "2");
    }
}
