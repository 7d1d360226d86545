pub mod card_stats;
pub mod deck;
pub mod flashcard;
pub mod flashcard_set;
pub mod mastery;
pub mod study_record;
pub mod study_session;

pub use card_stats::CardStats;
pub use deck::{Deck, DeckPolicy};
pub use flashcard::{Flashcard, NewCard, StudyCard};
pub use flashcard_set::{FlashcardSet, SetDraft};
pub use study_record::{StudySessionRecord, Summary};
pub use study_session::{CardView, Judged, SessionEnd, SessionState, StudySession};
