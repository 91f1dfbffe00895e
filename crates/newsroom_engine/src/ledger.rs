use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use newsroom_core::{IdentityKey, LedgerEntry, LedgerError, LedgerState, PublishLedger, RecordOutcome};
use newsroom_logging::{news_debug, news_info};

use crate::persist::AtomicFileWriter;

/// Ledger persisted as a JSON array of entries.
///
/// The whole file is read at open. Every state change is written back
/// atomically before `record` returns, so a crash after a successful publish
/// cannot lose the entry.
#[derive(Debug)]
pub struct JsonFileLedger {
    path: PathBuf,
    writer: AtomicFileWriter,
    file_name: String,
    state: LedgerState,
}

impl JsonFileLedger {
    /// A missing file is an empty ledger; unreadable JSON is fatal.
    pub fn open(path: &Path) -> Result<Self, LedgerError> {
        let state = match fs::read_to_string(path) {
            Ok(text) if text.trim().is_empty() => LedgerState::default(),
            Ok(text) => {
                let entries: Vec<LedgerEntry> =
                    serde_json::from_str(&text).map_err(|e| LedgerError::Corrupt {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    })?;
                LedgerState::from_entries(entries)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => LedgerState::default(),
            Err(source) => {
                return Err(LedgerError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        news_info!("Ledger {:?} holds {} published keys", path, state.len());

        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| LedgerError::Persist(format!("{path:?} has no file name")))?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: AtomicFileWriter::new(dir),
            file_name,
            state,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), LedgerError> {
        self.writer
            .write_json(&self.file_name, &self.state.entries())
            .map(|_| ())
            .map_err(|e| LedgerError::Persist(e.to_string()))
    }
}

impl PublishLedger for JsonFileLedger {
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
        let outcome = self.state.apply(LedgerEntry {
            identity_key: key,
            remote_id: remote_id.to_string(),
            remote_url: remote_url.to_string(),
            published_at: when,
        });
        if outcome != RecordOutcome::Unchanged {
            self.persist()?;
            news_debug!("Ledger written to {:?} ({} keys)", self.path, self.state.len());
        }
        Ok(outcome)
    }

    fn entries(&self) -> Vec<LedgerEntry> {
        self.state.entries()
    }

    fn len(&self) -> usize {
        self.state.len()
    }

    fn flush(&mut self) -> Result<(), LedgerError> {
        self.persist()
    }
}
