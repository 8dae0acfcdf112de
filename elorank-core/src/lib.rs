//! elorank-core: Pure-computation pairwise ELO ranking engine.
//!
//! Items → repeated pairwise judgments → ELO ratings → ranked list.
//! No IO, no threads, no global state. Bring your own judge.
//!
//! The engine suggests which two items to compare next (favoring items that
//! have been compared least), applies the ELO update for the reported winner,
//! keeps the items sorted by rating and runs a transitivity pass.
//!
//! # Quick start
//!
//! ```rust
//! use elorank_core::{ItemPayload, RankingEngine};
//!
//! let songs = ["Hey Jude", "Yesterday", "Let It Be"].map(ItemPayload::from);
//! let mut engine = RankingEngine::with_seed(songs, 42);
//!
//! while engine.total_rounds() < 10 {
//!     let (a, b) = engine.active_pair().expect("three items always have a pair");
//!     // Ask a human (or anything else) which one wins.
//!     let a_wins = engine.items()[a].payload.name < engine.items()[b].payload.name;
//!     engine.report_comparison(a, b, a_wins);
//! }
//!
//! for (rank, item) in engine.items().iter().enumerate() {
//!     println!("{}. {} ({:.0})", rank + 1, item.payload.name, item.rating);
//! }
//! ```

pub mod constants;
pub mod elo;
pub mod engine;
pub mod pairing;
pub mod snapshot;
pub mod transitivity;
pub mod types;

// Re-export primary public API at crate root.
pub use elo::{elo_update, expected_score, EloUpdate};
pub use engine::RankingEngine;
pub use pairing::{select_pair, selection_weight, selection_weights};
pub use snapshot::{RankingSnapshot, SnapshotError};
pub use transitivity::enforce_transitivity;
pub use types::{IndexedPair, ItemPayload, RankedItem};
