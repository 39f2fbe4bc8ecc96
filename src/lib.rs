//! # pairsync
//!
//! A two-player pair-matching card game kept consistent between peers that
//! share nothing but an eventually-consistent, observable document.
//!
//! ## Design Principles
//!
//! 1. **Deterministic Replica**: Both peers rebuild the same board from two
//!    seeds and apply the same flips in the same order. The board itself is
//!    never synchronized.
//!
//! 2. **Single Writer Per Field**: Every shared field has one legitimate
//!    writer at any instant, checked by `WriteGuard` before each write.
//!
//! 3. **Tolerant Observers**: Replayed, duplicated and stale deliveries are
//!    expected. Convergence never depends on delivery counts.
//!
//! ## Architecture
//!
//! - **Injected Arbitration**: Turn policy is a `TurnArbiter`, so solo and
//!   networked play run the same `MatchRules`.
//!
//! - **Message-Passing Channel**: `SharedChannel::observe` returns a handle
//!   and changes are pulled with `poll`. No callbacks hold session state.
//!
//! - **Persistent Data Structures**: O(1) board snapshots via `im-rs`.
//!
//! ## Modules
//!
//! - `core`: Seats, RNG, configuration, seed codec
//! - `board`: Seed decoding, board model, tiers
//! - `rules`: Turn arbiters and the shared match rules
//! - `timer`: Per-turn countdown driven by the shared reset counter
//! - `channel`: Shared document abstraction and an in-memory store
//! - `session`: Lobby, session document, role guard, `MatchSession`
//! - `solo`: Single-player variant

pub mod board;
pub mod channel;
pub mod core;
pub mod error;
pub mod rules;
pub mod session;
pub mod solo;
pub mod timer;

// Re-export commonly used types
pub use crate::core::{
    Difficulty, GameRng, GridSize, MatchConfig, Seat, SeatMap, SoloConfig, DEFAULT_SYMBOLS,
};

pub use crate::board::{
    build_layout, BoardModel, Cell, Layout, PairResolution, Resolution, Seeds, SymbolId, Tier,
};

pub use crate::rules::{FlipEffect, MatchRules, PeerArbiter, SoloArbiter, TurnArbiter};

pub use crate::timer::{TimerController, TimerSignal};

pub use crate::channel::{Change, DocPath, MemoryChannel, MemoryStore, SharedChannel, SubscriptionId};

pub use crate::session::{
    EventQueue, Intent, Lobby, LobbyOutcome, MatchEvent, MatchOutcome, MatchSession, Phase,
    Seating, SessionDocument, WriteGuard, WriteIntent,
};

pub use crate::solo::SoloGame;

pub use crate::error::{BoardError, ChannelError, LayoutError, SeedError, SessionError, TimerError};
