//! Turn arbitration trait.
//!
//! An arbiter decides whose action is legal and how the turn moves after a
//! resolution or a timeout. Networked play alternates between two seats;
//! solo play always answers with the single seat.

use crate::board::Resolution;
use crate::core::Seat;
use crate::error::SessionError;

/// Turn arbitration policy.
///
/// ## Implementation Notes
///
/// - `on_resolution`: return the new seat only when the turn moved
/// - `on_expiry`: a timeout with nothing pending behaves like a failure
/// - `adopt`: reconcile with an externally observed turn value
pub trait TurnArbiter {
    /// Seat whose action is currently legal.
    fn current(&self) -> Seat;

    /// Apply a pair verdict. Returns the new seat if the turn changed.
    fn on_resolution(&mut self, outcome: Resolution) -> Option<Seat>;

    /// Apply a turn timeout. Returns the new seat if the turn changed.
    fn on_expiry(&mut self) -> Option<Seat>;

    /// Replace the current seat with an observed value.
    ///
    /// Returns true if this changed the current seat.
    fn adopt(&mut self, seat: Seat) -> bool;

    // === Convenience Methods ===

    /// Legality check for an action by `by`.
    fn check(&self, by: Seat) -> Result<(), SessionError> {
        let turn = self.current();
        if by == turn {
            Ok(())
        } else {
            Err(SessionError::IllegalTurn { by, turn })
        }
    }

    fn is_legal(&self, by: Seat) -> bool {
        self.check(by).is_ok()
    }
}
