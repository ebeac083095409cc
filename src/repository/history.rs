use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::HISTORY_CAPACITY;
use crate::domain::identity::IdentityKey;
use crate::domain::ledger::HistoryLedger;
use crate::repository::{HistoryError, HistoryResult, HistoryStore};

/// History ledger stored as a JSON array of hex digests, newest last.
pub struct JsonHistoryStore {
    path: PathBuf,
}

impl JsonHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn write_error(&self, reason: impl ToString) -> HistoryError {
        HistoryError::Write {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

impl HistoryStore for JsonHistoryStore {
    fn try_load(&self) -> HistoryResult<HistoryLedger> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("No history at {}, starting fresh", self.path.display());
                return Ok(HistoryLedger::new());
            }
            Err(e) => return Err(HistoryError::Io(e)),
        };

        let keys: Vec<String> = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| HistoryError::Corrupt(format!("{}: {e}", self.path.display())))?;

        let ledger = HistoryLedger::from_keys(keys.into_iter().map(IdentityKey::from_hex));
        log::debug!(
            "Loaded {} history entries from {}",
            ledger.len(),
            self.path.display()
        );
        Ok(ledger)
    }

    /// Writes through a temporary file in the destination directory which is
    /// renamed over the target once fully flushed. The temporary file is
    /// removed on every error path when it is dropped.
    fn save(&self, ledger: &HistoryLedger) -> HistoryResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let keys: Vec<&str> = ledger
            .most_recent(HISTORY_CAPACITY)
            .map(IdentityKey::as_str)
            .collect();

        let temp = NamedTempFile::new_in(dir).map_err(|e| self.write_error(e))?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            serde_json::to_writer(&mut writer, &keys).map_err(|e| self.write_error(e))?;
            writer.flush().map_err(|e| self.write_error(e))?;
        }
        temp.as_file().sync_all().map_err(|e| self.write_error(e))?;
        temp.persist(&self.path)
            .map_err(|e| self.write_error(e.error))?;

        log::debug!("Saved {} history entries to {}", keys.len(), self.path.display());
        Ok(())
    }
}
