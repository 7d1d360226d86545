//! Database operations for the flashcard library
//!
//! Handles SQLite schema initialization, set authoring, card statistics
//! updates and the study session history.

use crate::error::{StoreError, StoreResult};
use crate::models::mastery::apply_judgment;
use crate::models::{
    CardStats, Flashcard, FlashcardSet, NewCard, SetDraft, StudyCard, StudySessionRecord,
};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;

/// Totals shown on the statistics tab.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LibraryStats {
    pub total_sets: u32,
    pub total_cards: u32,
}

/// Opens (or creates) the database file and makes sure the schema exists
pub fn init_database(path: &Path) -> StoreResult<Connection> {
    let conn = Connection::open(path)?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Creates tables for sets, cards and study sessions.
///
/// Foreign keys are switched on for this connection so deleting a set cascades.
pub fn init_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS flashcard_sets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            tags TEXT,
            total_cards INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS flashcards (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            set_id INTEGER NOT NULL,
            word TEXT NOT NULL,
            definition TEXT NOT NULL,
            example TEXT,
            review_count INTEGER NOT NULL DEFAULT 0,
            correct_count INTEGER NOT NULL DEFAULT 0,
            mastery_score REAL NOT NULL DEFAULT 0,
            last_reviewed TEXT,
            FOREIGN KEY (set_id) REFERENCES flashcard_sets(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS study_sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            set_id INTEGER NOT NULL,
            total_cards INTEGER NOT NULL,
            known_cards INTEGER NOT NULL,
            practice_cards INTEGER NOT NULL,
            study_date TEXT NOT NULL,
            FOREIGN KEY (set_id) REFERENCES flashcard_sets(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_flashcards_set ON flashcards(set_id);
        CREATE INDEX IF NOT EXISTS idx_sessions_set ON study_sessions(set_id);",
    )?;
    Ok(())
}

/// Saves a drafted set and all of its cards in one transaction
///
/// The set only becomes visible once every card is written.
pub fn create_set(draft: &SetDraft, conn: &mut Connection) -> StoreResult<FlashcardSet> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(StoreError::InvalidSet("set name is required".to_string()));
    }
    if draft.cards.is_empty() {
        return Err(StoreError::InvalidSet(format!(
            "set '{name}' needs at least one card"
        )));
    }
    if let Some(card) = draft
        .cards
        .iter()
        .find(|c| c.word.trim().is_empty() || c.definition.trim().is_empty())
    {
        return Err(StoreError::InvalidSet(format!(
            "card '{}' needs both a word and a definition",
            card.word
        )));
    }
    if find_set(name, conn)?.is_some() {
        return Err(StoreError::DuplicateSet(name.to_string()));
    }

    let created_at = Utc::now();
    let total_cards = u32::try_from(draft.cards.len())
        .map_err(|_| StoreError::InvalidSet(format!("set '{name}' has too many cards")))?;

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO flashcard_sets (name, tags, total_cards, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![name, draft.tags, total_cards, created_at],
    )?;
    let set_id = tx.last_insert_rowid();

    for card in &draft.cards {
        insert_card(set_id, card, &tx)?;
    }
    tx.commit()?;

    tracing::info!(set = name, cards = total_cards, "flashcard set created");

    Ok(FlashcardSet {
        id: set_id,
        name: name.to_string(),
        tags: draft.tags.clone(),
        total_cards,
        created_at,
    })
}

/// Appends a card to an existing set and keeps `total_cards` in step
pub fn add_card(set_name: &str, card: &NewCard, conn: &mut Connection) -> StoreResult<i64> {
    if card.word.trim().is_empty() || card.definition.trim().is_empty() {
        return Err(StoreError::InvalidSet(
            "a card needs both a word and a definition".to_string(),
        ));
    }
    let set = require_set(set_name, conn)?;

    let tx = conn.transaction()?;
    let card_id = insert_card(set.id, card, &tx)?;
    tx.execute(
        "UPDATE flashcard_sets SET total_cards = total_cards + 1 WHERE id = ?1",
        params![set.id],
    )?;
    tx.commit()?;

    Ok(card_id)
}

fn insert_card(set_id: i64, card: &NewCard, conn: &Connection) -> StoreResult<i64> {
    conn.execute(
        "INSERT INTO flashcards (set_id, word, definition, example) VALUES (?1, ?2, ?3, ?4)",
        params![set_id, card.word, card.definition, card.example],
    )?;
    Ok(conn.last_insert_rowid())
}

fn require_set(name: &str, conn: &Connection) -> StoreResult<FlashcardSet> {
    find_set(name, conn)?.ok_or_else(|| StoreError::SetNotFound(name.to_string()))
}

/// Looks a set up by its unique name
pub fn find_set(name: &str, conn: &Connection) -> StoreResult<Option<FlashcardSet>> {
    let set = conn
        .query_row(
            "SELECT id, name, tags, total_cards, created_at FROM flashcard_sets WHERE name = ?1",
            params![name],
            set_from_row,
        )
        .optional()?;
    Ok(set)
}

/// Retrieves all sets, ordered by name
pub fn list_sets(conn: &Connection) -> StoreResult<Vec<FlashcardSet>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, tags, total_cards, created_at FROM flashcard_sets ORDER BY name",
    )?;
    let sets = stmt
        .query_map([], set_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(sets)
}

fn set_from_row(row: &Row<'_>) -> rusqlite::Result<FlashcardSet> {
    Ok(FlashcardSet {
        id: row.get(0)?,
        name: row.get(1)?,
        tags: row.get(2)?,
        total_cards: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Retrieves the cards of a set in insertion order, ready for a study session
///
/// Fails with `SetNotFound` when no set has this name.
pub fn get_flashcards_for_set(set_name: &str, conn: &Connection) -> StoreResult<Vec<StudyCard>> {
    let set = require_set(set_name, conn)?;

    let mut stmt = conn.prepare(
        "SELECT id, word, definition, example FROM flashcards WHERE set_id = ?1 ORDER BY id",
    )?;
    let cards = stmt
        .query_map(params![set.id], |row| {
            Ok(StudyCard {
                id: row.get(0)?,
                word: row.get(1)?,
                definition: row.get(2)?,
                example: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(cards)
}

/// Retrieves the cards of a set together with their review statistics
pub fn cards_in_set(set_name: &str, conn: &Connection) -> StoreResult<Vec<Flashcard>> {
    let set = require_set(set_name, conn)?;

    let mut stmt = conn.prepare(
        "SELECT id, set_id, word, definition, example,
                review_count, correct_count, mastery_score, last_reviewed
         FROM flashcards WHERE set_id = ?1 ORDER BY id",
    )?;
    let cards = stmt
        .query_map(params![set.id], |row| {
            Ok(Flashcard {
                id: row.get(0)?,
                set_id: row.get(1)?,
                word: row.get(2)?,
                definition: row.get(3)?,
                example: row.get(4)?,
                stats: CardStats {
                    review_count: row.get(5)?,
                    correct_count: row.get(6)?,
                    mastery_score: row.get(7)?,
                    last_reviewed: row.get(8)?,
                },
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(cards)
}

/// Records one judgment against a card and returns its new statistics
///
/// The read of the current statistics and the write of all updated fields
/// happen in one transaction: either every field changes or none does.
pub fn record_judgment(
    card_id: i64,
    known: bool,
    at: DateTime<Utc>,
    conn: &mut Connection,
) -> StoreResult<CardStats> {
    let tx = conn.transaction()?;

    let current = tx
        .query_row(
            "SELECT review_count, correct_count, mastery_score, last_reviewed
             FROM flashcards WHERE id = ?1",
            params![card_id],
            |row| {
                Ok(CardStats {
                    review_count: row.get(0)?,
                    correct_count: row.get(1)?,
                    mastery_score: row.get(2)?,
                    last_reviewed: row.get(3)?,
                })
            },
        )
        .optional()?
        .ok_or(StoreError::CardNotFound(card_id))?;

    let updated = apply_judgment(&current, known, at);

    tx.execute(
        "UPDATE flashcards
         SET review_count = ?1, correct_count = ?2, mastery_score = ?3, last_reviewed = ?4
         WHERE id = ?5",
        params![
            updated.review_count,
            updated.correct_count,
            updated.mastery_score,
            updated.last_reviewed,
            card_id
        ],
    )?;
    tx.commit()?;

    Ok(updated)
}

/// Appends one study session to the history
///
/// `total_cards` is always `known + practice`.
pub fn record_session(
    set_name: &str,
    known: u32,
    practice: u32,
    at: DateTime<Utc>,
    conn: &Connection,
) -> StoreResult<StudySessionRecord> {
    let set = require_set(set_name, conn)?;
    let total = known.saturating_add(practice);

    conn.execute(
        "INSERT INTO study_sessions (set_id, total_cards, known_cards, practice_cards, study_date)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![set.id, total, known, practice, at],
    )?;

    Ok(StudySessionRecord {
        id: conn.last_insert_rowid(),
        set_id: set.id,
        total_cards: total,
        known_cards: known,
        practice_cards: practice,
        study_date: at,
    })
}

/// Retrieves the study history of a set, newest first
pub fn session_history(set_name: &str, conn: &Connection) -> StoreResult<Vec<StudySessionRecord>> {
    let set = require_set(set_name, conn)?;

    let mut stmt = conn.prepare(
        "SELECT id, set_id, total_cards, known_cards, practice_cards, study_date
         FROM study_sessions WHERE set_id = ?1
         ORDER BY study_date DESC, id DESC",
    )?;
    let records = stmt
        .query_map(params![set.id], |row| {
            Ok(StudySessionRecord {
                id: row.get(0)?,
                set_id: row.get(1)?,
                total_cards: row.get(2)?,
                known_cards: row.get(3)?,
                practice_cards: row.get(4)?,
                study_date: row.get(5)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(records)
}

/// Counts sets and cards across the whole library
pub fn library_stats(conn: &Connection) -> StoreResult<LibraryStats> {
    let total_sets = conn.query_row("SELECT COUNT(*) FROM flashcard_sets", [], |row| row.get(0))?;
    let total_cards = conn.query_row("SELECT COUNT(*) FROM flashcards", [], |row| row.get(0))?;
    Ok(LibraryStats {
        total_sets,
        total_cards,
    })
}
