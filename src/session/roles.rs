//! Single-writer guard.
//!
//! Every shared field has exactly one legitimate writer at any instant.
//! Each write a session performs is described by a `WriteIntent`, and the
//! guard decides whether the local seat holds the role that intent
//! requires. A session never writes without asking the guard first.
//!
//! | Intent               | Writer                                   |
//! |----------------------|------------------------------------------|
//! | `CreateSession`      | the initiator (`player1`)                |
//! | `SetNickname`        | owner of that seat                       |
//! | `MarkReady`          | owner of that seat                       |
//! | `DispatchFlip`       | seat whose turn it is                    |
//! | `Score`              | owner of that seat, after its own match  |
//! | `PassTurn`           | seat whose turn just failed              |
//! | `ResetTimer`         | seat that just resolved a pair           |
//! | `PassTurnOnTimeout`  | authoritative seat                       |
//! | `ResetTimerOnTimeout`| authoritative seat                       |
//! | `Pause`, `Exit`      | either peer; both converge on the value  |
//! | `RemoveSession`      | either peer; removal is idempotent       |

use crate::core::Seat;
use crate::session::document::Field;

/// A write the session wants to perform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WriteIntent {
    CreateSession,
    SetNickname(Seat),
    MarkReady(Seat),
    DispatchFlip { by: Seat },
    Score { seat: Seat },
    PassTurn { from: Seat },
    ResetTimer { by: Seat },
    PassTurnOnTimeout,
    ResetTimerOnTimeout,
    Pause,
    Exit,
    RemoveSession,
}

impl WriteIntent {
    /// Field touched by this intent, or `None` for whole-document writes.
    #[must_use]
    pub fn field(self) -> Option<Field> {
        match self {
            WriteIntent::CreateSession | WriteIntent::RemoveSession => None,
            WriteIntent::SetNickname(seat) => Some(Field::Nickname(seat)),
            WriteIntent::MarkReady(seat) => Some(Field::Ready(seat)),
            WriteIntent::DispatchFlip { .. } => Some(Field::CardFlip),
            WriteIntent::Score { seat } => Some(Field::Score(seat)),
            WriteIntent::PassTurn { .. } | WriteIntent::PassTurnOnTimeout => Some(Field::Turn),
            WriteIntent::ResetTimer { .. } | WriteIntent::ResetTimerOnTimeout => {
                Some(Field::TimeBarReset)
            }
            WriteIntent::Pause => Some(Field::Paused),
            WriteIntent::Exit => Some(Field::Exit),
        }
    }
}

/// Local seat attempted a write it does not own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{local} does not own the write {intent:?}")]
pub struct RoleViolation {
    pub intent: WriteIntent,
    pub local: Seat,
}

/// Role check for one peer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriteGuard {
    local: Seat,
}

impl WriteGuard {
    #[must_use]
    pub fn new(local: Seat) -> Self {
        Self { local }
    }

    #[must_use]
    pub fn local(&self) -> Seat {
        self.local
    }

    /// Whether the local seat owns `intent`.
    #[must_use]
    pub fn permits(&self, intent: WriteIntent) -> bool {
        match intent {
            WriteIntent::CreateSession
            | WriteIntent::PassTurnOnTimeout
            | WriteIntent::ResetTimerOnTimeout => self.local.is_authority(),
            WriteIntent::SetNickname(seat)
            | WriteIntent::MarkReady(seat)
            | WriteIntent::Score { seat }
            | WriteIntent::DispatchFlip { by: seat }
            | WriteIntent::PassTurn { from: seat }
            | WriteIntent::ResetTimer { by: seat } => seat == self.local,
            WriteIntent::Pause | WriteIntent::Exit | WriteIntent::RemoveSession => true,
        }
    }

    pub fn authorize(&self, intent: WriteIntent) -> Result<(), RoleViolation> {
        if self.permits(intent) {
            Ok(())
        } else {
            Err(RoleViolation {
                intent,
                local: self.local,
            })
        }
    }
}
