//! Board model: deterministic layout, reveal/match logic, tiers.

mod layout;
mod model;
mod tier;

pub use layout::{build_layout, grid_for_seed, Layout, Seeds, SymbolId};
pub use model::{BoardModel, Cell, PairResolution, Pending, Resolution};
pub use tier::{tier_for, Tier};
