//! Networked two-player sessions.
//!
//! Peers never talk to each other directly. Each one mirrors the shared
//! session document, applies remote changes to its own deterministic copy
//! of the board, and writes only the fields its current role owns.
//!
//! ## Lifecycle
//!
//! ```text
//! Forming ──► Joining ──► Ready ──► Active ──► Ended
//!  (lobby)    (lobby)   (session)  (session)
//! ```
//!
//! The lobby phases are reported by `LobbyOutcome::phase`; a
//! `MatchSession` starts in `Ready`.
//!
//! - `Forming`: the initiator wrote a fresh document and waits for an
//!   opponent.
//! - `Joining`: the second peer attached and validated the document.
//! - `Ready`: both peers observe each other's ready flag.
//! - `Active`: flips, resolutions and turn timeouts.
//! - `Ended`: completion or abandonment. Observers are detached and the
//!   document removed; further deliveries are ignored.

pub mod document;
pub mod events;
pub mod lobby;
pub mod match_session;
pub mod roles;

pub use document::{session_root, CardFlip, Field, PlayerEntry, SessionDocument};
pub use events::{EventQueue, Intent, MatchEvent, MatchOutcome};
pub use lobby::{Lobby, LobbyOutcome, Seating};
pub use match_session::MatchSession;
pub use roles::{RoleViolation, WriteGuard, WriteIntent};

use serde::{Deserialize, Serialize};

/// Session lifecycle phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Forming,
    Joining,
    Ready,
    Active,
    Ended,
}

impl Phase {
    /// Whether deliveries are still processed.
    #[must_use]
    pub fn is_live(self) -> bool {
        self != Phase::Ended
    }
}
