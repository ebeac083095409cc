//! Run-level error taxonomy.

use thiserror::Error;

use crate::repository::HistoryError;

/// Errors surfaced by the monitor pipeline and its core components.
///
/// Only [`MonitorError::Configuration`] and [`MonitorError::PersistenceWrite`]
/// end a run. The other variants are reported per item and the run carries on.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("embedding error: {0}")]
    Embedding(String),
    #[error("failed to persist history: {0}")]
    PersistenceWrite(#[source] HistoryError),
}

pub type MonitorResult<T> = Result<T, MonitorError>;
