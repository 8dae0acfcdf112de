use std::collections::BTreeMap;

use crate::constants::INITIAL_ELO_RATING;

/// Default payload for callers without their own item type: a display
/// name plus free-form string metadata (artist, album, URL, ...).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemPayload {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "BTreeMap::is_empty"))]
    pub metadata: BTreeMap<String, String>,
}

impl ItemPayload {
    pub fn new(name: impl Into<String>) -> Self {
        ItemPayload {
            name: name.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl From<&str> for ItemPayload {
    fn from(name: &str) -> Self {
        ItemPayload::new(name)
    }
}

impl From<String> for ItemPayload {
    fn from(name: String) -> Self {
        ItemPayload::new(name)
    }
}

/// One item under ranking, with its ELO bookkeeping.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankedItem<P> {
    /// Caller-supplied identifying data. Opaque to the engine.
    pub payload: P,
    pub rating: f64,
    /// Number of comparisons this item has taken part in.
    pub round: usize,
    /// Signed rating delta from the latest comparison. Zero when the item
    /// sat out the latest comparison.
    pub last_difference: f64,
}

impl<P> RankedItem<P> {
    pub fn new(payload: P) -> Self {
        RankedItem {
            payload,
            rating: INITIAL_ELO_RATING,
            round: 0,
            last_difference: 0.0,
        }
    }
}

/// A pairing: two positions into the rating-sorted item list.
pub type IndexedPair = (usize, usize);
