//! A flashcard set is a named collection of cards.
use super::NewCard;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A saved set, as listed in the library.
#[derive(Clone, Debug, PartialEq)]
pub struct FlashcardSet {
    pub id: i64,
    pub name: String,
    pub tags: Option<String>,
    pub total_cards: u32,
    pub created_at: DateTime<Utc>,
}

/// A set being authored. Nothing is persisted until the draft is finalized.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetDraft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(default)]
    pub cards: Vec<NewCard>,
}

impl SetDraft {
    pub fn new(name: &str, tags: &str) -> Self {
        let tags = tags.trim();
        Self {
            name: name.trim().to_string(),
            tags: (!tags.is_empty()).then(|| tags.to_string()),
            cards: Vec::new(),
        }
    }

    /// Adds a card from form input. Returns false if the word or definition is blank.
    pub fn add_card(&mut self, word: &str, definition: &str, example: &str) -> bool {
        match NewCard::from_input(word, definition, example) {
            Some(card) => {
                self.cards.push(card);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_trims_name_and_tags() {
        let draft = SetDraft::new("  Polish Vocabulary ", "  ");
        assert_eq!(draft.name, "Polish Vocabulary");
        assert_eq!(draft.tags, None);
        assert!(draft.cards.is_empty());
    }

    #[test]
    fn test_draft_add_card() {
        let mut draft = SetDraft::new("Polish", "language");
        assert!(draft.add_card("dziękuję", "thank you", ""));
        assert!(!draft.add_card("", "please", ""));
        assert_eq!(draft.cards.len(), 1);
        assert_eq!(draft.tags.as_deref(), Some("language"));
    }
}
