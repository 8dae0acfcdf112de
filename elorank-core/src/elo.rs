/// ELO expected-score and update math for a single pairwise outcome.
use crate::constants::ELO_SCALE;

/// Result of applying one comparison to a pair of ratings.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EloUpdate {
    /// P(A wins) implied by the ratings before the update.
    pub expected_a: f64,
    pub diff_a: f64,
    pub diff_b: f64,
}

/// Probability that an item rated `rating_a` beats one rated `rating_b`.
pub fn expected_score(rating_a: f64, rating_b: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((rating_b - rating_a) / ELO_SCALE))
}

/// Compute the rating deltas for a decided comparison between A and B.
///
/// Ties are not modeled: the caller resolves every comparison to a winner.
pub fn elo_update(rating_a: f64, rating_b: f64, winner_is_a: bool, k_factor: f64) -> EloUpdate {
    let expected_a = expected_score(rating_a, rating_b);
    let expected_b = 1.0 - expected_a;

    let score_a = if winner_is_a { 1.0 } else { 0.0 };
    let score_b = 1.0 - score_a;

    EloUpdate {
        expected_a,
        diff_a: k_factor * (score_a - expected_a),
        diff_b: k_factor * (score_b - expected_b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::K_FACTOR;

    #[test]
    fn test_expected_score_equal_ratings() {
        assert!((expected_score(1200.0, 1200.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_expected_score_400_point_gap() {
        // 10:1 odds at a 400 point gap
        let p = expected_score(1600.0, 1200.0);
        assert!((p - 10.0 / 11.0).abs() < 1e-12);
        assert!((expected_score(1200.0, 1600.0) - 1.0 / 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_equal_ratings_win() {
        let update = elo_update(1200.0, 1200.0, true, K_FACTOR);
        assert_eq!(update.diff_a, 16.0);
        assert_eq!(update.diff_b, -16.0);
    }

    #[test]
    fn test_equal_ratings_loss() {
        let update = elo_update(1200.0, 1200.0, false, K_FACTOR);
        assert_eq!(update.diff_a, -16.0);
        assert_eq!(update.diff_b, 16.0);
    }

    #[test]
    fn test_underdog_gains_more() {
        let underdog = elo_update(1000.0, 1400.0, true, K_FACTOR);
        let favorite = elo_update(1400.0, 1000.0, true, K_FACTOR);
        assert!(underdog.diff_a > 16.0);
        assert!(favorite.diff_a < 16.0);
        assert!(underdog.diff_a < K_FACTOR);
    }

    #[test]
    fn test_diffs_cancel_out() {
        for &(a, b) in &[(1200.0, 1200.0), (1500.0, 1100.0), (900.0, 1750.5)] {
            for winner_is_a in [true, false] {
                let update = elo_update(a, b, winner_is_a, K_FACTOR);
                assert!((update.diff_a + update.diff_b).abs() < 1e-9);
            }
        }
    }
}
