//! Flashcard is a pair <word, definition> with an optional usage example.
use super::CardStats;
use serde::{Deserialize, Serialize};

/// A persisted card together with its review statistics.
#[derive(Clone, Debug, PartialEq)]
pub struct Flashcard {
    pub id: i64,
    pub set_id: i64,
    pub word: String,
    pub definition: String,
    pub example: Option<String>,
    pub stats: CardStats,
}

/// The part of a card a study session needs: what to show, and which row to update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StudyCard {
    pub id: i64,
    pub word: String,
    pub definition: String,
    pub example: Option<String>,
}

impl StudyCard {
    /// Text shown once the card is flipped.
    pub fn back_text(&self) -> String {
        match self.example.as_deref() {
            Some(example) => format!("{}\n\nExample: {}", self.definition, example),
            None => self.definition.clone(),
        }
    }
}

/// A card that has not been saved yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCard {
    pub word: String,
    pub definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

impl NewCard {
    /// Builds a card from raw form input, trimming every field.
    ///
    /// Returns `None` when the word or definition is blank. A blank example is dropped.
    pub fn from_input(word: &str, definition: &str, example: &str) -> Option<Self> {
        let word = word.trim();
        let definition = definition.trim();
        if word.is_empty() || definition.is_empty() {
            return None;
        }
        let example = example.trim();
        Some(Self {
            word: word.to_string(),
            definition: definition.to_string(),
            example: (!example.is_empty()).then(|| example.to_string()),
        })
    }
}
