//! Board + arbiter composition.
//!
//! `MatchRules` is the deterministic core shared by solo and networked play:
//! given the same flip sequence it produces the same reveals, verdicts and
//! turn changes on every client.

use smallvec::SmallVec;

use super::engine::TurnArbiter;
use crate::board::{BoardModel, PairResolution};
use crate::core::Seat;
use crate::error::SessionError;

/// Outcome of an accepted flip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlipEffect {
    /// First card of a pair is face-up.
    Revealed { cell: usize },

    /// Second card revealed and the pair resolved.
    Resolved {
        cell: usize,
        resolution: PairResolution,
        /// New seat if the verdict moved the turn.
        next_turn: Option<Seat>,
    },
}

impl FlipEffect {
    #[must_use]
    pub fn cell(&self) -> usize {
        match self {
            FlipEffect::Revealed { cell } | FlipEffect::Resolved { cell, .. } => *cell,
        }
    }
}

/// Result of a turn ending without a resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnEnd {
    /// Cells turned back face-down.
    pub released: SmallVec<[usize; 2]>,
    /// New seat if the turn moved.
    pub next_turn: Option<Seat>,
}

/// Board model driven by a turn arbiter.
#[derive(Clone, Debug)]
pub struct MatchRules<A: TurnArbiter> {
    board: BoardModel,
    arbiter: A,
}

impl<A: TurnArbiter> MatchRules<A> {
    #[must_use]
    pub fn new(board: BoardModel, arbiter: A) -> Self {
        Self { board, arbiter }
    }

    #[must_use]
    pub fn board(&self) -> &BoardModel {
        &self.board
    }

    #[must_use]
    pub fn arbiter(&self) -> &A {
        &self.arbiter
    }

    #[must_use]
    pub fn current_turn(&self) -> Seat {
        self.arbiter.current()
    }

    /// Validate a flip without applying it.
    pub fn check_flip(&self, cell: usize, by: Seat) -> Result<(), SessionError> {
        self.arbiter.check(by)?;
        self.board.check_reveal(cell)?;
        Ok(())
    }

    /// Apply a flip by `by`.
    ///
    /// Fails with `IllegalTurn` if `by` is not the current seat and with
    /// `InvalidCell` if the cell cannot be revealed. A failed flip leaves
    /// the state untouched.
    pub fn apply_flip(&mut self, cell: usize, by: Seat) -> Result<FlipEffect, SessionError> {
        self.arbiter.check(by)?;
        self.board.reveal(cell)?;

        Ok(match self.board.resolve_pending() {
            None => FlipEffect::Revealed { cell },
            Some(resolution) => FlipEffect::Resolved {
                cell,
                resolution,
                next_turn: self.arbiter.on_resolution(resolution.outcome),
            },
        })
    }

    /// End the current turn on timeout, treated like a failed pair.
    pub fn expire_turn(&mut self) -> TurnEnd {
        TurnEnd {
            released: self.board.release_pending(),
            next_turn: self.arbiter.on_expiry(),
        }
    }

    /// Turn pending cells face-down without moving the turn.
    pub fn release_pending(&mut self) -> SmallVec<[usize; 2]> {
        self.board.release_pending()
    }

    /// Adopt an externally decided turn.
    ///
    /// If the seat changed, any pending reveal belonged to a turn that has
    /// already ended elsewhere and is released. Returns `None` when the seat
    /// was already current.
    pub fn adopt_turn(&mut self, seat: Seat) -> Option<TurnEnd> {
        if !self.arbiter.adopt(seat) {
            return None;
        }
        Some(TurnEnd {
            released: self.board.release_pending(),
            next_turn: Some(seat),
        })
    }
}
