use chrono::{DateTime, Utc};

/// Per-card review statistics that survive across sessions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CardStats {
    pub review_count: u32,
    pub correct_count: u32,
    pub mastery_score: f64,
    pub last_reviewed: Option<DateTime<Utc>>,
}
