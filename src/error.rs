//! Error types shared by the store, the study session and import/export.

use crate::models::SessionState;
use thiserror::Error;

/// Failures raised by the SQLite-backed card store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("set '{0}' not found")]
    SetNotFound(String),
    #[error("card {0} not found")]
    CardNotFound(i64),
    #[error("a set named '{0}' already exists")]
    DuplicateSet(String),
    #[error("invalid set: {0}")]
    InvalidSet(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// What a failed write was trying to persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistTarget {
    CardLoad,
    CardStatistics(i64),
    SessionRecord,
}

impl std::fmt::Display for PersistTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistTarget::CardLoad => write!(f, "loading cards"),
            PersistTarget::CardStatistics(id) => write!(f, "statistics for card {id}"),
            PersistTarget::SessionRecord => write!(f, "session record"),
        }
    }
}

/// A store failure observed by a study session.
///
/// During a running session this is a warning: the in-memory transition has
/// already happened and is kept.
#[derive(Debug, Error)]
#[error("failed to persist {target}: {source}")]
pub struct PersistenceError {
    pub target: PersistTarget,
    #[source]
    pub source: StoreError,
}

impl PersistenceError {
    pub fn new(target: PersistTarget, source: StoreError) -> Self {
        Self { target, source }
    }
}

/// Failures of the in-memory deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeckError {
    #[error("cannot build a deck from zero cards")]
    Empty,
    #[error("no cards left in the deck")]
    Exhausted,
}

/// Errors surfaced by the study session state machine and the engine.
#[derive(Debug, Error)]
pub enum StudyError {
    #[error("set '{0}' has no cards to study")]
    EmptySet(String),
    #[error("set '{0}' not found")]
    SetNotFound(String),
    #[error("cannot {action} while the session is {state}")]
    InvalidTransition {
        action: &'static str,
        state: SessionState,
    },
    #[error("no cards left in the deck")]
    Exhausted,
    #[error("unknown session handle {0}")]
    UnknownSession(u64),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

pub type StudyResult<T> = Result<T, StudyError>;

/// Failures while reading or writing set exports.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}
