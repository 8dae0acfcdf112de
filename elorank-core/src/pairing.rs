/// Pair selection for the next comparison.
///
/// Items are drawn with weight 1 / (round + 1)^2, so items that have been
/// compared least are strongly preferred. The second item is drawn from the
/// same weights with the first item excluded, which is the distribution of
/// redrawing until the two differ.
use rand::Rng;

use crate::types::IndexedPair;

/// Selection weight of an item that has taken part in `round` comparisons.
pub fn selection_weight(round: usize) -> f64 {
    let r = round as f64 + 1.0;
    1.0 / (r * r)
}

/// Selection weights for every item, in the same order as `rounds`.
pub fn selection_weights(rounds: &[usize]) -> Vec<f64> {
    rounds.iter().map(|&r| selection_weight(r)).collect()
}

/// Select two distinct indices by round-weighted sampling.
///
/// `rounds[i]` is the comparison count of item `i`. Returns `None` when
/// fewer than two items exist.
pub fn select_pair(rounds: &[usize], rng: &mut impl Rng) -> Option<IndexedPair> {
    if rounds.len() < 2 {
        return None;
    }

    let weights = selection_weights(rounds);
    let total_weight: f64 = weights.iter().sum();

    let a = weighted_random_select(&weights, total_weight, rng);

    // Summed afresh: one dominant weight can absorb the rest of total_weight.
    let mut rest = weights;
    rest[a] = 0.0;
    let rest_weight: f64 = rest.iter().sum();
    let b = weighted_random_select(&rest, rest_weight, rng);

    Some((a, b))
}

fn weighted_random_select(weights: &[f64], total_weight: f64, rng: &mut impl Rng) -> usize {
    let mut r = rng.random::<f64>() * total_weight;
    for (j, &w) in weights.iter().enumerate() {
        r -= w;
        if r < 0.0 {
            return j;
        }
    }
    // Rounding left r >= 0: take the last item that can be drawn at all.
    weights.iter().rposition(|&w| w > 0.0).unwrap_or(weights.len() - 1)
}
