//! Results of a study session: the in-memory summary and the persisted record.
use super::StudyCard;
use chrono::{DateTime, Utc};

/// One row of the study history. Written once when a session ends.
#[derive(Clone, Debug, PartialEq)]
pub struct StudySessionRecord {
    pub id: i64,
    pub set_id: i64,
    pub total_cards: u32,
    pub known_cards: u32,
    pub practice_cards: u32,
    pub study_date: DateTime<Utc>,
}

/// Tally of a finished session, built from the cards resolved during it.
///
/// Cards still waiting in the deck when the user quits are not part of it.
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    pub set_name: String,
    pub known: Vec<StudyCard>,
    pub practice: Vec<StudyCard>,
    /// Number of judgments made, including repeated ones on requeued cards.
    pub judgments: usize,
    pub ended_early: bool,
}

impl Summary {
    pub fn known_count(&self) -> usize {
        self.known.len()
    }

    pub fn practice_count(&self) -> usize {
        self.practice.len()
    }

    pub fn total_cards(&self) -> usize {
        self.known.len() + self.practice.len()
    }
}
