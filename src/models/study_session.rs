//! Study session state machine.
//!
//! A session walks the cards of one set through `Loading -> Front -> Back`
//! and back to `Front` for the next card, until the deck runs out or the user
//! quits, both of which end in `Completed`. Each judgment is written to the
//! card store right away; the session summary is written once at the end.
//! Store failures during a session are returned as warnings and never undo the
//! in-memory transition.

use super::{CardStats, Deck, DeckPolicy, StudyCard, StudySessionRecord, Summary};
use crate::database::{CardStore, SessionRecorder};
use crate::error::{
    DeckError, PersistTarget, PersistenceError, StoreError, StudyError, StudyResult,
};
use chrono::Utc;
use rand::Rng;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    /// Showing the word of the current card.
    Front,
    /// Showing the definition; waiting for a judgment.
    Back,
    Completed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Loading => "loading",
            SessionState::Front => "showing the front",
            SessionState::Back => "showing the back",
            SessionState::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// What the UI should render for a session right now.
#[derive(Clone, Debug, PartialEq)]
pub struct CardView {
    pub display_text: String,
    pub state: SessionState,
    pub remaining: usize,
    pub known: usize,
    pub practice: usize,
}

/// End of a session: the summary the user sees, and how saving it went.
#[derive(Debug)]
pub struct SessionEnd {
    pub summary: Summary,
    pub record: Option<StudySessionRecord>,
    pub warning: Option<PersistenceError>,
}

/// Result of one judgment.
#[derive(Debug)]
pub struct Judged {
    pub state: SessionState,
    /// New statistics of the judged card, `None` if they could not be saved.
    pub card_stats: Option<CardStats>,
    pub warning: Option<PersistenceError>,
    /// Set when this judgment emptied the deck.
    pub end: Option<SessionEnd>,
}

pub struct StudySession {
    set_name: String,
    policy: DeckPolicy,
    state: SessionState,
    deck: Option<Deck>,
    known: Vec<StudyCard>,
    practice: Vec<StudyCard>,
    initial_count: usize,
    judgments: usize,
    summary: Option<Summary>,
}

impl StudySession {
    pub fn new(set_name: impl Into<String>, policy: DeckPolicy) -> Self {
        Self {
            set_name: set_name.into(),
            policy,
            state: SessionState::Loading,
            deck: None,
            known: Vec::new(),
            practice: Vec::new(),
            initial_count: 0,
            judgments: 0,
            summary: None,
        }
    }

    /// Session over an already ordered deck, skipping the store read.
    pub(crate) fn with_deck(set_name: impl Into<String>, deck: Deck) -> Self {
        let mut session = Self::new(set_name, deck.policy());
        session.initial_count = deck.len();
        session.deck = Some(deck);
        session.state = SessionState::Front;
        session
    }

    /// Reads the set's cards, shuffles them into a deck and shows the first card.
    ///
    /// A missing set, an empty set or a failed read ends the session in
    /// `Completed` with nothing studied and returns the error.
    pub fn load<S, R>(&mut self, store: &S, rng: &mut R) -> StudyResult<()>
    where
        S: CardStore + ?Sized,
        R: Rng + ?Sized,
    {
        if self.state != SessionState::Loading {
            return Err(self.invalid_transition("load"));
        }

        let cards = match store.fetch_cards_for_set(&self.set_name) {
            Ok(cards) => cards,
            Err(err) => {
                self.state = SessionState::Completed;
                return Err(match err {
                    StoreError::SetNotFound(name) => StudyError::SetNotFound(name),
                    other => {
                        tracing::error!(
                            set = %self.set_name,
                            error = %other,
                            "failed to load cards"
                        );
                        PersistenceError::new(PersistTarget::CardLoad, other).into()
                    }
                });
            }
        };

        match Deck::build_with_rng(cards, self.policy, rng) {
            Ok(deck) => {
                tracing::info!(
                    set = %self.set_name,
                    cards = deck.len(),
                    policy = %self.policy,
                    "study session started"
                );
                self.initial_count = deck.len();
                self.deck = Some(deck);
                self.state = SessionState::Front;
                Ok(())
            }
            Err(_) => {
                self.state = SessionState::Completed;
                self.summary = Some(self.build_summary(false));
                Err(StudyError::EmptySet(self.set_name.clone()))
            }
        }
    }

    /// Turns the current card over and returns the text on its back.
    pub fn flip(&mut self) -> StudyResult<String> {
        if self.state != SessionState::Front {
            return Err(self.invalid_transition("flip"));
        }
        let text = self.current_card()?.back_text();
        self.state = SessionState::Back;
        Ok(text)
    }

    /// Records a judgment on the current card and moves on.
    ///
    /// Known cards leave the deck. Cards needing practice follow the deck
    /// policy. When the deck runs out the session completes and its summary is
    /// recorded.
    pub fn judge<S>(&mut self, known: bool, store: &mut S) -> StudyResult<Judged>
    where
        S: CardStore + SessionRecorder + ?Sized,
    {
        if self.state != SessionState::Back {
            let action = if known { "mark known" } else { "mark for practice" };
            return Err(self.invalid_transition(action));
        }
        let card_id = self.current_card()?.id;

        let (card_stats, warning) = match store.record_judgment(card_id, known, Utc::now()) {
            Ok(stats) => (Some(stats), None),
            Err(err) => {
                tracing::warn!(card_id, error = %err, "card statistics were not saved");
                (
                    None,
                    Some(PersistenceError::new(PersistTarget::CardStatistics(card_id), err)),
                )
            }
        };

        let deck = self.deck.as_mut().ok_or(StudyError::Exhausted)?;
        if known {
            let card = deck.resolve_known().map_err(deck_error)?;
            self.known.push(card);
        } else if let Some(card) = deck.resolve_needs_practice().map_err(deck_error)? {
            self.practice.push(card);
        }
        self.judgments += 1;

        let end = if deck.is_exhausted() {
            Some(self.finish(store, false))
        } else {
            self.state = SessionState::Front;
            None
        };

        Ok(Judged {
            state: self.state,
            card_stats,
            warning,
            end,
        })
    }

    /// Ends the session early. Cards still in the deck are left out of the summary.
    pub fn quit<S>(&mut self, store: &mut S) -> StudyResult<SessionEnd>
    where
        S: SessionRecorder + ?Sized,
    {
        if !matches!(self.state, SessionState::Front | SessionState::Back) {
            return Err(self.invalid_transition("quit"));
        }
        Ok(self.finish(store, true))
    }

    pub fn current_view(&self) -> CardView {
        let display_text = match self.state {
            SessionState::Front => self
                .current_card()
                .map(|card| card.word.clone())
                .unwrap_or_default(),
            SessionState::Back => self
                .current_card()
                .map(StudyCard::back_text)
                .unwrap_or_default(),
            SessionState::Loading | SessionState::Completed => String::new(),
        };
        CardView {
            display_text,
            state: self.state,
            remaining: self.remaining_count(),
            known: self.known.len(),
            practice: self.practice.len(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn current_card(&self) -> StudyResult<&StudyCard> {
        self.deck
            .as_ref()
            .ok_or(StudyError::Exhausted)?
            .current()
            .map_err(deck_error)
    }

    pub fn remaining_count(&self) -> usize {
        self.deck.as_ref().map_or(0, Deck::len)
    }

    pub fn initial_count(&self) -> usize {
        self.initial_count
    }

    pub fn known_cards(&self) -> &[StudyCard] {
        &self.known
    }

    pub fn practice_cards(&self) -> &[StudyCard] {
        &self.practice
    }

    /// Summary of a completed session.
    pub fn summary(&self) -> Option<&Summary> {
        self.summary.as_ref()
    }

    fn finish<S>(&mut self, store: &mut S, ended_early: bool) -> SessionEnd
    where
        S: SessionRecorder + ?Sized,
    {
        self.state = SessionState::Completed;
        let summary = self.build_summary(ended_early);
        self.summary = Some(summary.clone());

        let known = u32::try_from(summary.known_count()).unwrap_or(u32::MAX);
        let practice = u32::try_from(summary.practice_count()).unwrap_or(u32::MAX);
        let recorded = store.record_session(&self.set_name, known, practice, Utc::now());
        let (record, warning) = match recorded {
            Ok(record) => (Some(record), None),
            Err(err) => {
                tracing::warn!(
                    set = %self.set_name,
                    error = %err,
                    "study session was not recorded"
                );
                (None, Some(PersistenceError::new(PersistTarget::SessionRecord, err)))
            }
        };

        tracing::info!(
            set = %self.set_name,
            known,
            practice,
            judgments = self.judgments,
            ended_early,
            "study session finished"
        );

        SessionEnd {
            summary,
            record,
            warning,
        }
    }

    fn build_summary(&self, ended_early: bool) -> Summary {
        Summary {
            set_name: self.set_name.clone(),
            known: self.known.clone(),
            practice: self.practice.clone(),
            judgments: self.judgments,
            ended_early,
        }
    }

    fn invalid_transition(&self, action: &'static str) -> StudyError {
        tracing::warn!(
            set = %self.set_name,
            action,
            state = %self.state,
            "invalid study transition"
        );
        StudyError::InvalidTransition {
            action,
            state: self.state,
        }
    }
}

fn deck_error(err: DeckError) -> StudyError {
    match err {
        DeckError::Empty | DeckError::Exhausted => StudyError::Exhausted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreResult;
    use chrono::DateTime;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryStore {
        sets: HashMap<String, Vec<StudyCard>>,
        stats: HashMap<i64, CardStats>,
        sessions: Vec<(String, u32, u32)>,
        fail_judgments: bool,
        fail_sessions: bool,
    }

    impl MemoryStore {
        fn with_set(name: &str, cards: Vec<StudyCard>) -> Self {
            let mut store = Self::default();
            store.sets.insert(name.to_string(), cards);
            store
        }
    }

    impl CardStore for MemoryStore {
        fn fetch_cards_for_set(&self, set_name: &str) -> StoreResult<Vec<StudyCard>> {
            self.sets
                .get(set_name)
                .cloned()
                .ok_or_else(|| StoreError::SetNotFound(set_name.to_string()))
        }

        fn record_judgment(
            &mut self,
            card_id: i64,
            known: bool,
            at: DateTime<Utc>,
        ) -> StoreResult<CardStats> {
            if self.fail_judgments {
                return Err(StoreError::CardNotFound(card_id));
            }
            let stats = self.stats.entry(card_id).or_default();
            let next = crate::models::mastery::apply_judgment(stats, known, at);
            *stats = next.clone();
            Ok(next)
        }
    }

    impl SessionRecorder for MemoryStore {
        fn record_session(
            &mut self,
            set_name: &str,
            known: u32,
            practice: u32,
            at: DateTime<Utc>,
        ) -> StoreResult<StudySessionRecord> {
            if self.fail_sessions {
                return Err(StoreError::SetNotFound(set_name.to_string()));
            }
            self.sessions.push((set_name.to_string(), known, practice));
            Ok(StudySessionRecord {
                id: self.sessions.len() as i64,
                set_id: 1,
                total_cards: known + practice,
                known_cards: known,
                practice_cards: practice,
                study_date: at,
            })
        }
    }

    fn card(id: i64, word: &str) -> StudyCard {
        StudyCard {
            id,
            word: word.to_string(),
            definition: format!("definition of {word}"),
            example: None,
        }
    }

    fn abc() -> Vec<StudyCard> {
        vec![card(1, "A"), card(2, "B"), card(3, "C")]
    }

    fn loaded(store: &MemoryStore, name: &str) -> StudySession {
        let mut session = StudySession::new(name, DeckPolicy::Requeue);
        session.load(store, &mut StdRng::seed_from_u64(1)).unwrap();
        session
    }

    fn judge(session: &mut StudySession, known: bool, store: &mut MemoryStore) -> Judged {
        session.flip().unwrap();
        session.judge(known, store).unwrap()
    }

    #[test]
    fn test_load_starts_on_front() {
        let store = MemoryStore::with_set("Letters", abc());
        let session = loaded(&store, "Letters");
        assert_eq!(session.state(), SessionState::Front);
        assert_eq!(session.initial_count(), 3);
        let view = session.current_view();
        assert_eq!(view.display_text, session.current_card().unwrap().word);
        assert_eq!(view.remaining, 3);
    }

    #[test]
    fn test_load_unknown_set() {
        let store = MemoryStore::default();
        let mut session = StudySession::new("Nope", DeckPolicy::Requeue);
        let err = session.load(&store, &mut StdRng::seed_from_u64(1)).unwrap_err();
        assert!(matches!(err, StudyError::SetNotFound(name) if name == "Nope"));
        assert_eq!(session.state(), SessionState::Completed);
    }

    #[test]
    fn test_load_empty_set() {
        let store = MemoryStore::with_set("Empty", Vec::new());
        let mut session = StudySession::new("Empty", DeckPolicy::Requeue);
        let err = session.load(&store, &mut StdRng::seed_from_u64(1)).unwrap_err();
        assert!(matches!(err, StudyError::EmptySet(name) if name == "Empty"));
        assert_eq!(session.state(), SessionState::Completed);
        assert_eq!(session.summary().unwrap().total_cards(), 0);
    }

    #[test]
    fn test_flip_shows_definition_and_example() {
        let mut with_example = card(1, "dom");
        with_example.example = Some("Mój dom jest duży.".to_string());
        let store = MemoryStore::with_set("Polish", vec![with_example]);
        let mut session = loaded(&store, "Polish");

        let back = session.flip().unwrap();
        assert_eq!(back, "definition of dom\n\nExample: Mój dom jest duży.");
        assert_eq!(session.state(), SessionState::Back);
        assert_eq!(session.current_view().display_text, back);
    }

    #[test]
    fn test_invalid_transitions_leave_state_unchanged() {
        let mut store = MemoryStore::with_set("Letters", abc());
        let mut session = loaded(&store, "Letters");

        let err = session.judge(true, &mut store).unwrap_err();
        assert!(matches!(
            err,
            StudyError::InvalidTransition { state: SessionState::Front, .. }
        ));
        assert_eq!(session.state(), SessionState::Front);

        session.flip().unwrap();
        let err = session.flip().unwrap_err();
        assert!(matches!(
            err,
            StudyError::InvalidTransition { action: "flip", state: SessionState::Back }
        ));
        assert_eq!(session.state(), SessionState::Back);

        let err = session.load(&store, &mut StdRng::seed_from_u64(1)).unwrap_err();
        assert!(matches!(err, StudyError::InvalidTransition { action: "load", .. }));
        assert!(store.stats.is_empty());
    }

    #[test]
    fn test_all_known_completes_session() {
        let mut store = MemoryStore::with_set("Letters", abc());
        let mut session = loaded(&store, "Letters");

        for _ in 0..2 {
            let judged = judge(&mut session, true, &mut store);
            assert_eq!(judged.state, SessionState::Front);
            assert!(judged.end.is_none());
        }
        let judged = judge(&mut session, true, &mut store);
        assert_eq!(judged.state, SessionState::Completed);

        let end = judged.end.unwrap();
        assert_eq!(end.summary.known_count(), 3);
        assert_eq!(end.summary.practice_count(), 0);
        assert!(!end.summary.ended_early);
        assert_eq!(end.record.unwrap().total_cards, 3);
        assert_eq!(store.sessions, vec![("Letters".to_string(), 3, 0)]);
    }

    #[test]
    fn test_completed_session_rejects_everything() {
        let mut store = MemoryStore::with_set("Solo", vec![card(1, "A")]);
        let mut session = loaded(&store, "Solo");
        judge(&mut session, true, &mut store);

        assert!(session.flip().is_err());
        assert!(session.judge(true, &mut store).is_err());
        assert!(session.quit(&mut store).is_err());
        assert_eq!(session.state(), SessionState::Completed);
        assert_eq!(store.sessions.len(), 1);
        assert_eq!(session.current_view().display_text, "");
    }

    #[test]
    fn test_sole_card_needs_practice_is_shown_again() {
        let mut store = MemoryStore::with_set("Solo", vec![card(1, "A")]);
        let mut session = loaded(&store, "Solo");

        let judged = judge(&mut session, false, &mut store);
        assert_eq!(judged.state, SessionState::Front);
        assert_eq!(session.current_view().display_text, "A");
        assert_eq!(session.remaining_count(), 1);
        assert!(store.sessions.is_empty());
    }

    #[test]
    fn test_scenario_practice_then_known_counts_once() {
        let mut store = MemoryStore::with_set("Letters", abc());
        let deck = Deck::in_order(abc(), DeckPolicy::Requeue);
        let mut session = StudySession::with_deck("Letters", deck);

        let order: Vec<(&str, bool)> = vec![("A", true), ("B", false), ("C", true), ("B", true)];
        for (word, known) in order {
            assert_eq!(session.current_card().unwrap().word, word);
            judge(&mut session, known, &mut store);
        }

        assert_eq!(session.state(), SessionState::Completed);
        let summary = session.summary().unwrap();
        assert_eq!(summary.total_cards(), 3);
        assert_eq!(summary.known_count(), 3);
        assert_eq!(summary.practice_count(), 0);
        assert_eq!(summary.judgments, 4);
        assert_eq!(store.stats[&2].review_count, 2);
        assert!((store.stats[&2].mastery_score - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_drop_policy_fills_practice_list() {
        let mut store = MemoryStore::with_set("Letters", abc());
        let deck = Deck::in_order(abc(), DeckPolicy::Drop);
        let mut session = StudySession::with_deck("Letters", deck);

        judge(&mut session, false, &mut store);
        judge(&mut session, true, &mut store);
        let judged = judge(&mut session, false, &mut store);

        let end = judged.end.unwrap();
        assert_eq!(end.summary.known_count(), 1);
        assert_eq!(end.summary.practice_count(), 2);
        assert_eq!(store.sessions, vec![("Letters".to_string(), 1, 2)]);
    }

    #[test]
    fn test_quit_excludes_unresolved_cards() {
        let mut store = MemoryStore::with_set("Letters", abc());
        let deck = Deck::in_order(abc(), DeckPolicy::Requeue);
        let mut session = StudySession::with_deck("Letters", deck);

        judge(&mut session, true, &mut store);
        judge(&mut session, false, &mut store);
        session.flip().unwrap();
        let end = session.quit(&mut store).unwrap();

        assert!(end.summary.ended_early);
        assert_eq!(end.summary.total_cards(), 1);
        assert_eq!(end.summary.known_count(), 1);
        assert_eq!(end.summary.practice_count(), 0);
        assert_eq!(session.state(), SessionState::Completed);
        assert_eq!(store.sessions, vec![("Letters".to_string(), 1, 0)]);
    }

    #[test]
    fn test_quit_before_any_judgment() {
        let mut store = MemoryStore::with_set("Letters", abc());
        let mut session = loaded(&store, "Letters");
        let end = session.quit(&mut store).unwrap();
        assert_eq!(end.summary.total_cards(), 0);
        assert_eq!(store.sessions, vec![("Letters".to_string(), 0, 0)]);
    }

    #[test]
    fn test_failed_card_write_is_not_fatal() {
        let mut store = MemoryStore::with_set("Letters", abc());
        store.fail_judgments = true;
        let mut session = loaded(&store, "Letters");
        let first = session.current_card().unwrap().id;

        let judged = judge(&mut session, true, &mut store);
        assert_eq!(judged.state, SessionState::Front);
        assert!(judged.card_stats.is_none());
        let warning = judged.warning.unwrap();
        assert_eq!(warning.target, PersistTarget::CardStatistics(first));
        assert_eq!(session.known_cards().len(), 1);
        assert_eq!(session.remaining_count(), 2);
    }

    #[test]
    fn test_failed_session_record_still_returns_summary() {
        let mut store = MemoryStore::with_set("Solo", vec![card(1, "A")]);
        store.fail_sessions = true;
        let mut session = loaded(&store, "Solo");

        let end = judge(&mut session, true, &mut store).end.unwrap();
        assert!(end.record.is_none());
        assert_eq!(end.warning.unwrap().target, PersistTarget::SessionRecord);
        assert_eq!(end.summary.known_count(), 1);
    }

    proptest! {
        #[test]
        fn cards_are_never_lost_or_duplicated(
            size in 1usize..8,
            judgments in proptest::collection::vec(any::<bool>(), 0..40),
            drop_policy in any::<bool>(),
            seed in any::<u64>(),
        ) {
            let cards: Vec<StudyCard> =
                (0..size as i64).map(|i| card(i, &format!("w{i}"))).collect();
            let mut store = MemoryStore::with_set("Prop", cards);
            let policy = if drop_policy { DeckPolicy::Drop } else { DeckPolicy::Requeue };
            let mut session = StudySession::new("Prop", policy);
            session.load(&store, &mut StdRng::seed_from_u64(seed)).unwrap();

            for known in judgments {
                if session.state() == SessionState::Completed {
                    break;
                }
                session.flip().unwrap();
                session.judge(known, &mut store).unwrap();

                let total = session.remaining_count()
                    + session.known_cards().len()
                    + session.practice_cards().len();
                prop_assert_eq!(total, size);
                for stats in store.stats.values() {
                    prop_assert!((0.0..=1.0).contains(&stats.mastery_score));
                }
            }

            let mut ids: Vec<i64> = session.known_cards().iter()
                .chain(session.practice_cards())
                .map(|c| c.id)
                .collect();
            ids.sort();
            ids.dedup();
            let resolved = session.known_cards().len() + session.practice_cards().len();
            prop_assert_eq!(ids.len(), resolved);
        }
    }
}
