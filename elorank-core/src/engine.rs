/// Ranking engine: owns the items, applies ELO updates and picks the next pair.
///
/// Pure computation. The caller presents the active pair to a judge and
/// reports the winner back; persistence and rendering live outside.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::constants::K_FACTOR;
use crate::elo::{elo_update, EloUpdate};
use crate::pairing::select_pair;
use crate::snapshot::{RankingSnapshot, SnapshotError};
use crate::transitivity::enforce_transitivity;
use crate::types::{IndexedPair, RankedItem};

#[derive(Debug, Clone)]
pub struct RankingEngine<P, R = StdRng> {
    /// Sorted descending by rating after every update.
    items: Vec<RankedItem<P>>,
    /// Positions into `items` currently up for comparison. `None` when
    /// fewer than two items exist.
    active_pair: Option<IndexedPair>,
    total_rounds: usize,
    rng: R,
}

impl<P> RankingEngine<P, StdRng> {
    /// Start a session with an OS-seeded random source.
    pub fn new(payloads: impl IntoIterator<Item = P>) -> Self {
        Self::with_rng(payloads, StdRng::from_os_rng())
    }

    /// Start a session whose pair selection is reproducible from `seed`.
    pub fn with_seed(payloads: impl IntoIterator<Item = P>, seed: u64) -> Self {
        Self::with_rng(payloads, StdRng::seed_from_u64(seed))
    }
}

impl<P, R: Rng> RankingEngine<P, R> {
    /// Start a session drawing pairs from `rng`.
    ///
    /// Zero or one payloads give a valid engine with no active pair.
    pub fn with_rng(payloads: impl IntoIterator<Item = P>, rng: R) -> Self {
        let items: Vec<RankedItem<P>> = payloads.into_iter().map(RankedItem::new).collect();

        let mut engine = RankingEngine {
            items,
            active_pair: None,
            total_rounds: 0,
            rng,
        };
        engine.select_next_pair();
        engine
    }

    /// Resume a saved session. The snapshot is validated first.
    pub fn restore(snapshot: RankingSnapshot<P>, rng: R) -> Result<Self, SnapshotError> {
        snapshot.validate()?;
        Ok(RankingEngine {
            items: snapshot.items,
            active_pair: snapshot.active_pair,
            total_rounds: snapshot.total_rounds,
            rng,
        })
    }

    /// Draw a fresh active pair, favoring items with fewer comparisons.
    ///
    /// Returns `None`, and clears the active pair, when fewer than two
    /// items exist.
    pub fn select_next_pair(&mut self) -> Option<IndexedPair> {
        let rounds: Vec<usize> = self.items.iter().map(|item| item.round).collect();
        self.active_pair = select_pair(&rounds, &mut self.rng);
        self.active_pair
    }

    /// Record the outcome of comparing the items at `index_a` and `index_b`.
    ///
    /// The indices must be the active pair, in either order. Afterwards the
    /// items are re-sorted, so previously held indices are stale; a new
    /// active pair is selected.
    ///
    /// # Panics
    ///
    /// When an index is out of range, the indices are equal, or they do not
    /// match the active pair.
    pub fn report_comparison(&mut self, index_a: usize, index_b: usize, winner_is_a: bool) -> EloUpdate {
        let num_items = self.items.len();
        assert!(
            index_a < num_items && index_b < num_items,
            "comparison indices ({}, {}) out of range for {} items",
            index_a, index_b, num_items
        );
        assert!(index_a != index_b, "cannot compare item {} with itself", index_a);
        assert!(
            self.is_active_pair(index_a, index_b),
            "comparison ({}, {}) does not match the active pair {:?}",
            index_a, index_b, self.active_pair
        );

        let update = elo_update(
            self.items[index_a].rating,
            self.items[index_b].rating,
            winner_is_a,
            K_FACTOR,
        );

        for item in &mut self.items {
            item.last_difference = 0.0;
        }

        let a = &mut self.items[index_a];
        a.rating += update.diff_a;
        a.round += 1;
        a.last_difference = update.diff_a;

        let b = &mut self.items[index_b];
        b.rating += update.diff_b;
        b.round += 1;
        b.last_difference = update.diff_b;

        self.items.sort_by(|x, y| y.rating.total_cmp(&x.rating));
        let corrections = enforce_transitivity(&mut self.items);

        self.total_rounds += 1;
        self.select_next_pair();

        debug!(
            round = self.total_rounds,
            expected_a = update.expected_a,
            diff_a = update.diff_a,
            diff_b = update.diff_b,
            corrections,
            next_pair = ?self.active_pair,
            "comparison recorded"
        );

        update
    }
}

impl<P, R> RankingEngine<P, R> {
    /// Items sorted descending by rating.
    pub fn items(&self) -> &[RankedItem<P>] {
        &self.items
    }

    pub fn item(&self, index: usize) -> Option<&RankedItem<P>> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Comparisons recorded over the whole session.
    pub fn total_rounds(&self) -> usize {
        self.total_rounds
    }

    pub fn active_pair(&self) -> Option<IndexedPair> {
        self.active_pair
    }

    /// The two items currently up for comparison.
    pub fn active_items(&self) -> Option<(&RankedItem<P>, &RankedItem<P>)> {
        self.active_pair.map(|(a, b)| (&self.items[a], &self.items[b]))
    }

    fn is_active_pair(&self, index_a: usize, index_b: usize) -> bool {
        match self.active_pair {
            Some((a, b)) => (a, b) == (index_a, index_b) || (b, a) == (index_a, index_b),
            None => false,
        }
    }
}

impl<P: Clone, R> RankingEngine<P, R> {
    pub fn snapshot(&self) -> RankingSnapshot<P> {
        RankingSnapshot {
            items: self.items.clone(),
            active_pair: self.active_pair,
            total_rounds: self.total_rounds,
        }
    }
}
