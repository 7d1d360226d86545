//! Deck is the working queue of cards a study session has not resolved yet.
//!
//! Resolving the current card as known removes it for good. Resolving it as
//! needs-practice depends on the [`DeckPolicy`]: with `Requeue` the card moves
//! to the back and comes up again later (straight away if it is the only card
//! left); with `Drop` it leaves the deck like a known card.
use super::StudyCard;
use crate::error::DeckError;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// What happens to a card judged "needs practice".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeckPolicy {
    /// Move the card to the end of the deck so it is tested again this session.
    #[default]
    Requeue,
    /// Take the card out of the deck; it is not tested again this session.
    Drop,
}

impl std::fmt::Display for DeckPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeckPolicy::Requeue => write!(f, "requeue"),
            DeckPolicy::Drop => write!(f, "drop"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Deck {
    cards: Vec<StudyCard>,
    index: usize,
    policy: DeckPolicy,
}

impl Deck {
    /// Shuffles the cards with the thread-local generator.
    pub fn build(cards: Vec<StudyCard>, policy: DeckPolicy) -> Result<Self, DeckError> {
        Self::build_with_rng(cards, policy, &mut rand::thread_rng())
    }

    /// Shuffles the cards uniformly with `rng` and positions the deck at the first one.
    pub fn build_with_rng<R: Rng + ?Sized>(
        mut cards: Vec<StudyCard>,
        policy: DeckPolicy,
        rng: &mut R,
    ) -> Result<Self, DeckError> {
        if cards.is_empty() {
            return Err(DeckError::Empty);
        }
        cards.shuffle(rng);
        Ok(Self::in_order(cards, policy))
    }

    /// Keeps the given order. Used when the order is already decided.
    pub(crate) fn in_order(cards: Vec<StudyCard>, policy: DeckPolicy) -> Self {
        Self {
            cards,
            index: 0,
            policy,
        }
    }

    pub fn current(&self) -> Result<&StudyCard, DeckError> {
        self.cards.get(self.index).ok_or(DeckError::Exhausted)
    }

    /// Removes the current card permanently and returns it.
    pub fn resolve_known(&mut self) -> Result<StudyCard, DeckError> {
        let card = self.take_current()?;
        self.wrap_index();
        Ok(card)
    }

    /// Applies the deck policy to the current card.
    ///
    /// Returns the card when it left the deck (`Drop`), `None` when it was requeued.
    pub fn resolve_needs_practice(&mut self) -> Result<Option<StudyCard>, DeckError> {
        let card = self.take_current()?;
        let dropped = match self.policy {
            DeckPolicy::Requeue => {
                self.cards.push(card);
                None
            }
            DeckPolicy::Drop => Some(card),
        };
        self.wrap_index();
        Ok(dropped)
    }

    pub fn is_exhausted(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn policy(&self) -> DeckPolicy {
        self.policy
    }

    /// Remaining cards, starting from the current one.
    pub fn remaining(&self) -> impl Iterator<Item = &StudyCard> {
        let (before, from_current) = self.cards.split_at(self.index.min(self.cards.len()));
        from_current.iter().chain(before.iter())
    }

    fn take_current(&mut self) -> Result<StudyCard, DeckError> {
        if self.index >= self.cards.len() {
            return Err(DeckError::Exhausted);
        }
        Ok(self.cards.remove(self.index))
    }

    fn wrap_index(&mut self) {
        if self.index >= self.cards.len() {
            self.index = 0;
        }
    }
}
