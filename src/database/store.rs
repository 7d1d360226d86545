//! Store seams used by study sessions, and the SQLite store behind them.

use super::db::{self, LibraryStats};
use crate::error::StoreResult;
use crate::models::{
    CardStats, Flashcard, FlashcardSet, NewCard, SetDraft, StudyCard, StudySessionRecord,
};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::path::Path;

/// Read side and per-card write side of the card repository.
pub trait CardStore {
    /// Cards of the named set, in storage order.
    fn fetch_cards_for_set(&self, set_name: &str) -> StoreResult<Vec<StudyCard>>;

    /// Applies one judgment to a card atomically and returns the new statistics.
    fn record_judgment(
        &mut self,
        card_id: i64,
        known: bool,
        at: DateTime<Utc>,
    ) -> StoreResult<CardStats>;
}

/// Append-only log of finished study sessions.
pub trait SessionRecorder {
    fn record_session(
        &mut self,
        set_name: &str,
        known: u32,
        practice: u32,
        at: DateTime<Utc>,
    ) -> StoreResult<StudySessionRecord>;
}

/// SQLite-backed library of sets, cards and study history.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = db::init_database(path)?;
        tracing::debug!(path = %path.display(), "opened flashcard database");
        Ok(Self { conn })
    }

    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        db::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn create_set(&mut self, draft: &SetDraft) -> StoreResult<FlashcardSet> {
        db::create_set(draft, &mut self.conn)
    }

    pub fn add_card(&mut self, set_name: &str, card: &NewCard) -> StoreResult<i64> {
        db::add_card(set_name, card, &mut self.conn)
    }

    pub fn find_set(&self, name: &str) -> StoreResult<Option<FlashcardSet>> {
        db::find_set(name, &self.conn)
    }

    pub fn list_sets(&self) -> StoreResult<Vec<FlashcardSet>> {
        db::list_sets(&self.conn)
    }

    pub fn cards_in_set(&self, set_name: &str) -> StoreResult<Vec<Flashcard>> {
        db::cards_in_set(set_name, &self.conn)
    }

    pub fn session_history(&self, set_name: &str) -> StoreResult<Vec<StudySessionRecord>> {
        db::session_history(set_name, &self.conn)
    }

    pub fn library_stats(&self) -> StoreResult<LibraryStats> {
        db::library_stats(&self.conn)
    }
}

impl CardStore for Store {
    fn fetch_cards_for_set(&self, set_name: &str) -> StoreResult<Vec<StudyCard>> {
        db::get_flashcards_for_set(set_name, &self.conn)
    }

    fn record_judgment(
        &mut self,
        card_id: i64,
        known: bool,
        at: DateTime<Utc>,
    ) -> StoreResult<CardStats> {
        db::record_judgment(card_id, known, at, &mut self.conn)
    }
}

impl SessionRecorder for Store {
    fn record_session(
        &mut self,
        set_name: &str,
        known: u32,
        practice: u32,
        at: DateTime<Utc>,
    ) -> StoreResult<StudySessionRecord> {
        db::record_session(set_name, known, practice, at, &self.conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_file_database_twice() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flashcards.db");

        let mut draft = SetDraft::new("Capitals", "geography");
        draft.add_card("France", "Paris", "");
        {
            let mut store = Store::open(&path).unwrap();
            store.create_set(&draft).unwrap();
        }

        let store = Store::open(&path).unwrap();
        let cards = store.fetch_cards_for_set("Capitals").unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].definition, "Paris");
    }

    #[test]
    fn test_store_traits_round_trip_statistics() {
        let mut store = Store::in_memory().unwrap();
        let mut draft = SetDraft::new("Capitals", "");
        draft.add_card("Poland", "Warsaw", "");
        store.create_set(&draft).unwrap();

        let card = store.fetch_cards_for_set("Capitals").unwrap().remove(0);
        store.record_judgment(card.id, true, Utc::now()).unwrap();
        let record = store.record_session("Capitals", 1, 0, Utc::now()).unwrap();

        assert_eq!(record.total_cards, 1);
        assert_eq!(store.cards_in_set("Capitals").unwrap()[0].stats.review_count, 1);
        let history = store.session_history("Capitals").unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, record.id);
    }
}
