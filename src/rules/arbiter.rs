//! Arbiter implementations.

use serde::{Deserialize, Serialize};

use super::engine::TurnArbiter;
use crate::board::Resolution;
use crate::core::Seat;

/// Two-seat alternation for networked play.
///
/// A failure or a timeout passes the turn. A match keeps it, rewarding the
/// player with another attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerArbiter {
    turn: Seat,
}

impl Default for PeerArbiter {
    fn default() -> Self {
        Self::new()
    }
}

impl PeerArbiter {
    /// Start with `Player1` to act.
    #[must_use]
    pub fn new() -> Self {
        Self { turn: Seat::Player1 }
    }

    fn pass(&mut self) -> Option<Seat> {
        self.turn = self.turn.other();
        Some(self.turn)
    }
}

impl TurnArbiter for PeerArbiter {
    fn current(&self) -> Seat {
        self.turn
    }

    fn on_resolution(&mut self, outcome: Resolution) -> Option<Seat> {
        match outcome {
            Resolution::Matched => None,
            Resolution::Failed => self.pass(),
        }
    }

    fn on_expiry(&mut self) -> Option<Seat> {
        self.pass()
    }

    fn adopt(&mut self, seat: Seat) -> bool {
        let changed = self.turn != seat;
        self.turn = seat;
        changed
    }
}

/// Single-player policy: the sole seat always acts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoloArbiter;

impl TurnArbiter for SoloArbiter {
    fn current(&self) -> Seat {
        Seat::Player1
    }

    fn on_resolution(&mut self, _outcome: Resolution) -> Option<Seat> {
        None
    }

    fn on_expiry(&mut self) -> Option<Seat> {
        None
    }

    fn adopt(&mut self, _seat: Seat) -> bool {
        false
    }
}
