//! Error types.
//!
//! Nothing here is fatal to the process. The worst outcome is a stalled
//! session that the player abandons and rejoins.

use std::time::Duration;

use crate::core::Seat;
use crate::session::Phase;

/// Seed string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeedError {
    #[error("invalid seed entry {entry:?} at position {position}")]
    InvalidEntry { position: usize, entry: String },
}

/// Seeds do not describe a valid board.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("layout seed has {actual} entries, expected {expected}")]
    LayoutLength { expected: usize, actual: usize },

    #[error("layout seed is not a permutation of 0..{cells}")]
    NotPermutation { cells: usize },

    #[error("content seed has {actual} entries, expected {expected}")]
    ContentLength { expected: usize, actual: usize },

    #[error("content symbol {index} is outside a catalog of {catalog} symbols")]
    UnknownSymbol { index: u32, catalog: usize },

    #[error("content symbol {index} appears more than once")]
    DuplicateSymbol { index: u32 },

    #[error("{cells} cells is not a supported board size")]
    UnsupportedSize { cells: usize },

    #[error("a board of {pairs} pairs needs more than {catalog} symbols")]
    CatalogTooSmall { pairs: usize, catalog: usize },
}

/// Timer settings that cannot drive a countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TimerError {
    #[error("freeze window {freeze:?} exceeds turn duration {duration:?}")]
    FreezeExceedsTurn { freeze: Duration, duration: Duration },
}

/// A reveal that the board refuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("cell {0} is already matched or revealed")]
    InvalidCell(usize),

    #[error("cell {cell} is outside a board of {cells} cells")]
    OutOfRange { cell: usize, cells: usize },

    #[error("two cells are already revealed")]
    PendingFull,
}

/// Shared channel failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    #[error("write to {path} failed")]
    WriteFailed { path: String },

    #[error("stored value at {path} is not valid: {reason}")]
    Decode { path: String, reason: String },
}

/// Errors surfaced by the rules layer and the match session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Board(#[from] BoardError),

    #[error("{by} acted during {turn}'s turn")]
    IllegalTurn { by: Seat, turn: Seat },

    #[error("session document is missing fields: {}", missing.join(", "))]
    MalformedSession { missing: Vec<String> },

    #[error("session is {0:?}, not active")]
    NotActive(Phase),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Seed(#[from] SeedError),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Timer(#[from] TimerError),
}

impl SessionError {
    /// Whether this error is an expected consequence of stale or duplicate
    /// deliveries, to be dropped without surfacing.
    #[must_use]
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            SessionError::IllegalTurn { .. } | SessionError::Board(BoardError::InvalidCell(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_message_lists_fields() {
        let err = SessionError::MalformedSession {
            missing: vec!["turn".to_string(), "exit".to_string()],
        };
        assert_eq!(err.to_string(), "session document is missing fields: turn, exit");
    }

    #[test]
    fn test_board_error_converts() {
        let err: SessionError = BoardError::InvalidCell(4).into();
        assert_eq!(err, SessionError::Board(BoardError::InvalidCell(4)));
        assert!(err.is_benign());
    }

    #[test]
    fn test_benign_classification() {
        let illegal = SessionError::IllegalTurn {
            by: Seat::Player1,
            turn: Seat::Player2,
        };
        assert!(illegal.is_benign());
        let write = ChannelError::WriteFailed {
            path: "tables/default".to_string(),
        };
        assert!(!SessionError::Channel(write).is_benign());
        assert!(!SessionError::Board(BoardError::PendingFull).is_benign());
    }
}
