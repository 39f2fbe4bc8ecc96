//! Per-turn countdown.
//!
//! Every client runs its own countdown and restarts it whenever it observes
//! a new value of the shared `timeBarReset` counter. Expiry is detected by
//! both clients, but only the authoritative seat acts on it; see
//! `MatchSession`.
//!
//! Time is driven explicitly through `advance`, so the controller has no
//! clock of its own.
//!
//! ```
//! use std::time::Duration;
//! use pairsync::timer::{TimerController, TimerSignal};
//!
//! let mut timer = TimerController::new(Duration::from_secs(20), Duration::from_secs(2)).unwrap();
//! assert!(timer.observe_counter(0));
//! assert_eq!(timer.advance(Duration::from_secs(18)), Some(TimerSignal::Frozen));
//! assert_eq!(timer.advance(Duration::from_secs(2)), Some(TimerSignal::Expired));
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::MatchConfig;
use crate::error::TimerError;

/// Pre-session value of the reset counter. Never triggers a reset.
pub const COUNTER_SENTINEL: i64 = -1;

/// Threshold crossed during `advance`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerSignal {
    /// Entered the freeze window: local flips are refused from now on.
    Frozen,
    /// Countdown reached zero. Implies `Frozen`.
    Expired,
}

/// Countdown phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Countdown {
    Idle,
    Running,
    Expired,
}

/// Local countdown mirroring the shared reset counter.
#[derive(Clone, Debug)]
pub struct TimerController {
    duration: Duration,
    freeze_window: Duration,
    elapsed: Duration,
    countdown: Countdown,
    frozen: bool,
    paused: bool,
    last_seen: Option<i64>,
    last_written: Option<i64>,
}

impl TimerController {
    /// Create an idle timer. The freeze window may not be longer than the
    /// countdown.
    pub fn new(duration: Duration, freeze_window: Duration) -> Result<Self, TimerError> {
        if freeze_window > duration {
            return Err(TimerError::FreezeExceedsTurn {
                freeze: freeze_window,
                duration,
            });
        }
        Ok(Self {
            duration,
            freeze_window,
            elapsed: Duration::ZERO,
            countdown: Countdown::Idle,
            frozen: false,
            paused: false,
            last_seen: None,
            last_written: None,
        })
    }

    pub fn from_config(config: &MatchConfig) -> Result<Self, TimerError> {
        Self::new(config.turn_duration, config.freeze_window)
    }

    /// Start a fresh countdown.
    pub fn restart(&mut self) {
        self.elapsed = Duration::ZERO;
        self.countdown = Countdown::Running;
        self.frozen = false;
    }

    /// Stop counting without expiring.
    pub fn stop(&mut self) {
        self.countdown = Countdown::Idle;
    }

    /// Suspend the countdown.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Lift a pause. A countdown that was started restarts from the full
    /// duration rather than resuming the frozen remainder.
    pub fn resume(&mut self) {
        if !self.paused {
            return;
        }
        self.paused = false;
        if self.countdown != Countdown::Idle {
            self.restart();
        }
    }

    /// Advance local time by `dt`.
    pub fn advance(&mut self, dt: Duration) -> Option<TimerSignal> {
        if self.paused || self.countdown != Countdown::Running {
            return None;
        }

        self.elapsed = self.elapsed.saturating_add(dt);
        if self.elapsed >= self.duration {
            self.elapsed = self.duration;
            self.countdown = Countdown::Expired;
            self.frozen = true;
            return Some(TimerSignal::Expired);
        }

        if !self.frozen && self.remaining() <= self.freeze_window {
            self.frozen = true;
            return Some(TimerSignal::Frozen);
        }
        None
    }

    #[must_use]
    pub fn countdown(&self) -> Countdown {
        self.countdown
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether local flips are refused: idle, paused, expired, or inside
    /// the freeze window.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.paused || self.frozen || self.countdown != Countdown::Running
    }

    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.duration.saturating_sub(self.elapsed)
    }

    /// Last counter value observed from the channel.
    #[must_use]
    pub fn last_seen(&self) -> Option<i64> {
        self.last_seen
    }

    /// Feed an observed counter value. Returns true if it restarted the
    /// countdown.
    ///
    /// The sentinel never resets. A value equal to the last one seen (the
    /// subscription replay, or a redundant delivery) never resets, and
    /// neither does a value older than it.
    pub fn observe_counter(&mut self, value: i64) -> bool {
        if value <= COUNTER_SENTINEL {
            self.last_seen.get_or_insert(COUNTER_SENTINEL);
            return false;
        }
        if self.last_seen.is_some_and(|last| value <= last) {
            return false;
        }

        self.last_seen = Some(value);
        self.restart();
        true
    }

    /// Next counter value to write: one past the highest value this peer
    /// has either observed or written.
    pub fn next_counter(&mut self) -> i64 {
        let base = self
            .last_seen
            .into_iter()
            .chain(self.last_written)
            .max()
            .unwrap_or(COUNTER_SENTINEL)
            .max(COUNTER_SENTINEL);
        let next = base.saturating_add(1);
        self.last_written = Some(next);
        next
    }
}
