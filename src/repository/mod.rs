use thiserror::Error;

use crate::domain::ledger::HistoryLedger;

pub mod history;

pub use history::JsonHistoryStore;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to read history: {0}")]
    Io(#[from] std::io::Error),
    #[error("history is corrupt: {0}")]
    Corrupt(String),
    #[error("failed to write history to {path}: {reason}")]
    Write { path: String, reason: String },
}

pub type HistoryResult<T> = Result<T, HistoryError>;

/// Durable storage for the processed-items ledger.
pub trait HistoryStore {
    /// Reads the persisted ledger.
    ///
    /// A missing backing store yields an empty ledger. A corrupt one also
    /// yields an empty ledger after logging a warning, so a bad file never
    /// stops a run.
    fn load(&self) -> HistoryLedger {
        match self.try_load() {
            Ok(ledger) => ledger,
            Err(e) => {
                log::warn!("Ignoring unreadable history, starting with an empty ledger: {e}");
                HistoryLedger::new()
            }
        }
    }

    /// Reads the persisted ledger, reporting corruption to the caller.
    fn try_load(&self) -> HistoryResult<HistoryLedger>;

    /// Persists the most recent [`crate::HISTORY_CAPACITY`] keys in insertion
    /// order, replacing whatever was stored before.
    fn save(&self, ledger: &HistoryLedger) -> HistoryResult<()>;
}
