/// Single-pass transitivity correction over a rating-sorted item list.
use tracing::trace;

use crate::constants::TRANSITIVITY_MARGIN;
use crate::types::RankedItem;

/// Sweep every triple of positions i < j < k once. When
/// rating(i) > rating(j) > rating(k) but rating(i) <= rating(k), pull
/// rating(k) down to rating(i) - 1.
///
/// Corrections made earlier in the sweep are visible to later triples, and
/// the sweep is not repeated until nothing changes. Ratings are only ever
/// lowered. Returns the number of corrections applied.
pub fn enforce_transitivity<P>(items: &mut [RankedItem<P>]) -> usize {
    let n = items.len();
    let mut corrections = 0;

    for i in 0..n {
        for j in (i + 1)..n {
            // Only position k > j is written below, so ri and rj hold for the k loop.
            let (ri, rj) = (items[i].rating, items[j].rating);
            if !(ri > rj) {
                continue;
            }
            for k in (j + 1)..n {
                let rk = items[k].rating;
                if rj > rk && ri <= rk {
                    let corrected = ri - TRANSITIVITY_MARGIN;
                    trace!(i, j, k, from = rk, to = corrected, "transitivity correction");
                    items[k].rating = corrected;
                    corrections += 1;
                }
            }
        }
    }

    corrections
}
