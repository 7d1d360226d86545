pub mod config;
pub mod database;
pub mod engine;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;

pub use database::{CardStore, SessionRecorder, Store};
pub use engine::{SessionHandle, StudyEngine};
pub use error::{PersistenceError, StoreError, StudyError};
pub use models::{CardView, DeckPolicy, FlashcardSet, SessionState, SetDraft, StudyCard, Summary};
