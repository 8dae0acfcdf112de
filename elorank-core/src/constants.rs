/// Rating every item starts from before its first comparison.
pub const INITIAL_ELO_RATING: f64 = 1200.0;

/// Maximum rating swing a single comparison can apply to one item.
pub const K_FACTOR: f64 = 32.0;

/// Logistic scale of the expected-score curve: a 400 point gap means
/// the stronger item is expected to win 10 times out of 11.
pub const ELO_SCALE: f64 = 400.0;

/// Gap the transitivity pass leaves between a corrected item and the
/// item it was measured against.
pub const TRANSITIVITY_MARGIN: f64 = 1.0;
