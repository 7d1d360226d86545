//! Mastery score update applied after every judgment.
//!
//! The mastery score is the running mean of all historical outcomes for a card,
//! where "known" counts as 1 and "needs practice" as 0:
//! - `mastery' = (mastery * reviews + outcome) / (reviews + 1)`
//! - `reviews' = reviews + 1`
//! - `correct' = correct + outcome`
//!
//! Being a weighted mean of values in [0, 1], the score stays in [0, 1].

use super::CardStats;
use chrono::{DateTime, Utc};

/// Calculates the statistics a card has after one more judgment.
pub fn apply_judgment(stats: &CardStats, known: bool, now: DateTime<Utc>) -> CardStats {
    let outcome = if known { 1.0 } else { 0.0 };
    let reviews = f64::from(stats.review_count);
    let mastery = (stats.mastery_score * reviews + outcome) / (reviews + 1.0);

    CardStats {
        review_count: stats.review_count.saturating_add(1),
        correct_count: stats.correct_count.saturating_add(u32::from(known)),
        // Guards against rows written by other tools with an out-of-range score.
        mastery_score: mastery.clamp(0.0, 1.0),
        last_reviewed: Some(now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn stats(review_count: u32, correct_count: u32, mastery_score: f64) -> CardStats {
        CardStats {
            review_count,
            correct_count,
            mastery_score,
            last_reviewed: None,
        }
    }

    #[test]
    fn test_first_review_known() {
        let next = apply_judgment(&CardStats::default(), true, Utc::now());
        assert_eq!(next.review_count, 1);
        assert_eq!(next.correct_count, 1);
        assert_eq!(next.mastery_score, 1.0);
        assert!(next.last_reviewed.is_some());
    }

    #[test]
    fn test_first_review_needs_practice() {
        let next = apply_judgment(&CardStats::default(), false, Utc::now());
        assert_eq!(next.review_count, 1);
        assert_eq!(next.correct_count, 0);
        assert_eq!(next.mastery_score, 0.0);
    }

    #[test]
    fn test_known_after_four_reviews() {
        let next = apply_judgment(&stats(4, 2, 0.5), true, Utc::now());
        assert!((next.mastery_score - 0.6).abs() < 1e-12);
        assert_eq!(next.review_count, 5);
        assert_eq!(next.correct_count, 3);
    }

    #[test]
    fn test_needs_practice_after_four_reviews() {
        let next = apply_judgment(&stats(4, 2, 0.5), false, Utc::now());
        assert!((next.mastery_score - 0.4).abs() < 1e-12);
        assert_eq!(next.correct_count, 2);
    }

    #[test]
    fn test_last_reviewed_is_the_given_time() {
        let now = Utc::now();
        let next = apply_judgment(&stats(3, 1, 0.3), true, now);
        assert_eq!(next.last_reviewed, Some(now));
    }

    proptest! {
        #[test]
        fn mastery_stays_in_unit_interval(
            outcomes in proptest::collection::vec(any::<bool>(), 0..200)
        ) {
            let mut current = CardStats::default();
            let now = Utc::now();
            for known in &outcomes {
                current = apply_judgment(&current, *known, now);
                prop_assert!((0.0..=1.0).contains(&current.mastery_score));
                prop_assert!(current.correct_count <= current.review_count);
            }
            prop_assert_eq!(current.review_count as usize, outcomes.len());
        }

        #[test]
        fn mastery_is_the_mean_of_outcomes(
            outcomes in proptest::collection::vec(any::<bool>(), 1..100)
        ) {
            let mut current = CardStats::default();
            let now = Utc::now();
            for known in &outcomes {
                current = apply_judgment(&current, *known, now);
            }
            let known = outcomes.iter().filter(|k| **k).count() as f64;
            prop_assert!((current.mastery_score - known / outcomes.len() as f64).abs() < 1e-9);
        }
    }
}
