/// Serializable copy of a ranking session, for saving and resuming.
use thiserror::Error;

use crate::types::{IndexedPair, RankedItem};

/// Every field of a ranking session, in display order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankingSnapshot<P> {
    /// Items sorted descending by rating.
    pub items: Vec<RankedItem<P>>,
    pub active_pair: Option<IndexedPair>,
    pub total_rounds: usize,
}

/// Reasons a snapshot cannot be turned back into a live session.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SnapshotError {
    #[error("item {index} has a non-finite rating ({rating})")]
    NonFiniteRating { index: usize, rating: f64 },

    #[error("items are not sorted by rating: position {index} ({rating}) is above position {previous_index} ({previous_rating})")]
    Unsorted {
        previous_index: usize,
        previous_rating: f64,
        index: usize,
        rating: f64,
    },

    #[error("active pair ({0}, {1}) must reference two distinct items out of {2}")]
    InvalidActivePair(usize, usize, usize),

    #[error("snapshot with {0} items has no active pair")]
    MissingActivePair(usize),

    #[error("snapshot with {0} items cannot have an active pair")]
    UnexpectedActivePair(usize),
}

impl<P> RankingSnapshot<P> {
    /// Check the invariants a live session relies on.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let n = self.items.len();

        for (index, item) in self.items.iter().enumerate() {
            if !item.rating.is_finite() {
                return Err(SnapshotError::NonFiniteRating { index, rating: item.rating });
            }
        }

        for (index, pair) in self.items.windows(2).enumerate() {
            if pair[0].rating < pair[1].rating {
                return Err(SnapshotError::Unsorted {
                    previous_index: index,
                    previous_rating: pair[0].rating,
                    index: index + 1,
                    rating: pair[1].rating,
                });
            }
        }

        match self.active_pair {
            Some(_) if n < 2 => Err(SnapshotError::UnexpectedActivePair(n)),
            Some((a, b)) if a == b || a >= n || b >= n => Err(SnapshotError::InvalidActivePair(a, b, n)),
            None if n >= 2 => Err(SnapshotError::MissingActivePair(n)),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(ratings: &[f64], active_pair: Option<IndexedPair>) -> RankingSnapshot<&'static str> {
        RankingSnapshot {
            items: ratings
                .iter()
                .map(|&rating| RankedItem { payload: "x", rating, round: 1, last_difference: 0.0 })
                .collect(),
            active_pair,
            total_rounds: 1,
        }
    }

    #[test]
    fn test_valid_snapshot() {
        assert_eq!(snapshot(&[1216.0, 1200.0, 1184.0], Some((2, 0))).validate(), Ok(()));
        assert_eq!(snapshot(&[1200.0], None).validate(), Ok(()));
        assert_eq!(snapshot(&[], None).validate(), Ok(()));
    }

    #[test]
    fn test_rejects_non_finite_rating() {
        let err = snapshot(&[1200.0, f64::NAN], Some((0, 1))).validate().unwrap_err();
        assert!(matches!(err, SnapshotError::NonFiniteRating { index: 1, .. }));
    }

    #[test]
    fn test_rejects_unsorted_items() {
        let err = snapshot(&[1184.0, 1216.0], Some((0, 1))).validate().unwrap_err();
        assert!(matches!(err, SnapshotError::Unsorted { previous_index: 0, index: 1, .. }));
    }

    #[test]
    fn test_rejects_bad_active_pair() {
        assert_eq!(
            snapshot(&[1200.0, 1200.0], Some((1, 1))).validate(),
            Err(SnapshotError::InvalidActivePair(1, 1, 2))
        );
        assert_eq!(
            snapshot(&[1200.0, 1200.0], Some((0, 2))).validate(),
            Err(SnapshotError::InvalidActivePair(0, 2, 2))
        );
        assert_eq!(
            snapshot(&[1200.0, 1200.0], None).validate(),
            Err(SnapshotError::MissingActivePair(2))
        );
        assert_eq!(
            snapshot(&[1200.0], Some((0, 1))).validate(),
            Err(SnapshotError::UnexpectedActivePair(1))
        );
    }
}
