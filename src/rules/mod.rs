//! Turn arbitration and the deterministic match rules.
//!
//! The board decides matched/failed, the arbiter decides whose turn it is,
//! and `MatchRules` composes the two. Which arbiter is used is chosen per
//! mode and injected, so solo and networked play share one code path.

pub mod engine;
pub mod arbiter;
pub mod table;

pub use engine::TurnArbiter;
pub use arbiter::{PeerArbiter, SoloArbiter};
pub use table::{FlipEffect, MatchRules, TurnEnd};
