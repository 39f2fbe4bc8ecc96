//! Core types: seats, RNG, configuration, seed encoding.

pub mod player;
pub mod rng;
pub mod config;
pub mod seeds;

pub use player::{Seat, SeatMap};
pub use rng::GameRng;
pub use config::{Difficulty, GridSize, MatchConfig, SoloConfig, DEFAULT_SYMBOLS};
pub use seeds::{parse_serialized_array, serialize};
