//! Presentation boundary: outbound events and inbound intents.
//!
//! Sessions push `MatchEvent`s into an `EventQueue`; whatever renders the
//! game drains it after each `pump`/`tick`. User actions come back as
//! `Intent`s. Nothing in the synchronization core depends on a renderer.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::board::{Resolution, Tier};
use crate::core::Seat;

/// How a session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchOutcome {
    /// Every pair was matched. The winner is the higher score; equal
    /// scores are a draw.
    Completed,
    /// A peer exited or the session document disappeared.
    Abandoned,
    /// Solo: every pair matched within the try budget.
    Won,
    /// Solo: try budget exhausted.
    Lost,
}

/// Something the presentation layer should show.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchEvent {
    /// Both peers are ready; play starts.
    SessionStarted,
    TurnChanged(Seat),
    CardRevealed { cell: usize, by: Seat },
    /// Pending cells turned face-down without a verdict.
    CardsHidden { cells: Vec<usize> },
    PairResolved { outcome: Resolution, cells: [usize; 2] },
    TierChanged(Tier),
    ScoreChanged { seat: Seat, score: u32 },
    /// The countdown restarted from the full duration.
    TimerRestarted,
    PausedChanged(bool),
    /// Solo only.
    TriesChanged { used: u32, max: u32 },
    SessionEnded {
        outcome: MatchOutcome,
        winner: Option<Seat>,
    },
}

/// User action forwarded to a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    Flip(usize),
    Ready,
    Pause(bool),
    Exit,
}

/// FIFO of events waiting to be drained.
#[derive(Clone, Debug, Default)]
pub struct EventQueue {
    events: VecDeque<MatchEvent>,
}

impl EventQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: MatchEvent) {
        tracing::trace!(?event, "event");
        self.events.push_back(event);
    }

    /// Remove and return everything queued, oldest first.
    pub fn drain(&mut self) -> Vec<MatchEvent> {
        self.events.drain(..).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MatchEvent> {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_is_fifo() {
        let mut queue = EventQueue::new();
        queue.push(MatchEvent::SessionStarted);
        queue.push(MatchEvent::TurnChanged(Seat::Player1));
        assert_eq!(queue.len(), 2);

        let drained = queue.drain();
        assert_eq!(
            drained,
            vec![MatchEvent::SessionStarted, MatchEvent::TurnChanged(Seat::Player1)]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_events_serialize() {
        let event = MatchEvent::SessionEnded {
            outcome: MatchOutcome::Completed,
            winner: Some(Seat::Player2),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: MatchEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
