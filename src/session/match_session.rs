//! One peer's view of a networked match.
//!
//! `MatchSession` owns the peer's channel endpoint, its copy of the board
//! and its countdown. Remote changes arrive through `pump`, local time
//! through `tick`, and user actions through the `request_*` methods.
//!
//! ## Consistency
//!
//! Both peers start from the same seeds and apply the same flips in the
//! same order, so the board needs no synchronization of its own. Only
//! three things cross the channel after setup:
//!
//! - `cardFlip`, written by the seat whose turn it is and applied by the
//!   other seat as if it were local input;
//! - `turn`, `score` and `timeBarReset`, each written by the one seat that
//!   owns the decision (see `roles`);
//! - `paused` and `exit`, shared flags both peers converge on.
//!
//! The local flip is applied immediately as a prediction; its own echo is
//! ignored. An observed turn that differs from the local arbiter means the
//! turn ended elsewhere (a timeout), and any pending reveal is released.

use std::cmp::Ordering;
use std::time::Duration;

use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::board::{build_layout, grid_for_seed, BoardModel, PairResolution, Resolution};
use crate::channel::{Change, DocPath, SharedChannel, SubscriptionId};
use crate::core::{MatchConfig, Seat, SeatMap};
use crate::error::SessionError;
use crate::rules::{FlipEffect, MatchRules, PeerArbiter, TurnArbiter};
use crate::session::document::{session_root, CardFlip, Field};
use crate::session::events::{EventQueue, Intent, MatchEvent, MatchOutcome};
use crate::session::lobby::Seating;
use crate::session::roles::{WriteGuard, WriteIntent};
use crate::session::Phase;
use crate::timer::{TimerController, TimerSignal};

/// Fields every peer observes for the whole session.
const OBSERVED: [Field; 9] = [
    Field::Turn,
    Field::Score(Seat::Player1),
    Field::Score(Seat::Player2),
    Field::Ready(Seat::Player1),
    Field::Ready(Seat::Player2),
    Field::CardFlip,
    Field::Paused,
    Field::TimeBarReset,
    Field::Exit,
];

/// A seated peer in a two-player match.
pub struct MatchSession<C: SharedChannel, A: TurnArbiter = PeerArbiter> {
    channel: C,
    config: MatchConfig,
    seating: Seating,
    root: DocPath,
    guard: WriteGuard,
    phase: Phase,
    rules: MatchRules<A>,
    timer: TimerController,
    scores: SeatMap<u32>,
    written_score: Option<u32>,
    ready: SeatMap<bool>,
    paused: bool,
    subscriptions: FxHashMap<SubscriptionId, Field>,
    events: EventQueue,
}

impl<C: SharedChannel> MatchSession<C, PeerArbiter> {
    /// Build the board from the seating's seeds and attach observers.
    pub fn new(channel: C, config: MatchConfig, seating: Seating) -> Result<Self, SessionError> {
        Self::with_arbiter(channel, config, seating, PeerArbiter::new())
    }
}

impl<C: SharedChannel, A: TurnArbiter> MatchSession<C, A> {
    /// Like `new`, with an explicit turn arbiter.
    pub fn with_arbiter(
        channel: C,
        config: MatchConfig,
        seating: Seating,
        arbiter: A,
    ) -> Result<Self, SessionError> {
        let seeds = &seating.seeds;
        let grid = grid_for_seed(&seeds.layout)?;
        let layout = build_layout(&seeds.layout, &seeds.content, grid, config.symbols.len())?;
        let root = session_root(&config.table_root, &seating.session_id);
        let timer = TimerController::from_config(&config)?;

        let mut session = Self {
            channel,
            timer,
            config,
            root,
            guard: WriteGuard::new(seating.seat),
            seating,
            phase: Phase::Ready,
            rules: MatchRules::new(BoardModel::new(&layout), arbiter),
            scores: SeatMap::with_value(0),
            written_score: None,
            ready: SeatMap::with_value(false),
            paused: false,
            subscriptions: FxHashMap::default(),
            events: EventQueue::new(),
        };

        if let Err(err) = session.attach() {
            session.detach_all();
            return Err(err);
        }
        tracing::info!(
            session = %session.seating.session_id,
            seat = %session.seat(),
            cells = session.rules.board().len(),
            "attached to session"
        );
        Ok(session)
    }

    fn attach(&mut self) -> Result<(), SessionError> {
        for field in OBSERVED {
            let subscription = self.channel.observe(&field.path(&self.root))?;
            self.subscriptions.insert(subscription, field);
        }
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub fn id(&self) -> &str {
        &self.seating.session_id
    }

    #[must_use]
    pub fn seat(&self) -> Seat {
        self.guard.local()
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn seating(&self) -> &Seating {
        &self.seating
    }

    #[must_use]
    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    #[must_use]
    pub fn board(&self) -> &BoardModel {
        self.rules.board()
    }

    #[must_use]
    pub fn current_turn(&self) -> Seat {
        self.rules.current_turn()
    }

    /// Scores as last observed on the channel.
    #[must_use]
    pub fn scores(&self) -> &SeatMap<u32> {
        &self.scores
    }

    #[must_use]
    pub fn is_ready(&self, seat: Seat) -> bool {
        self.ready[seat]
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[must_use]
    pub fn timer(&self) -> &TimerController {
        &self.timer
    }

    /// Whether a local flip would currently be accepted.
    #[must_use]
    pub fn can_flip(&self) -> bool {
        self.phase == Phase::Active
            && !self.paused
            && !self.timer.is_frozen()
            && self.rules.current_turn() == self.seat()
    }

    #[must_use]
    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Active subscriptions held by this session.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Take every queued event, oldest first.
    pub fn drain_events(&mut self) -> Vec<MatchEvent> {
        self.events.drain()
    }

    #[must_use]
    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    // ========================================================================
    // Driving
    // ========================================================================

    /// Apply every delivery waiting on the channel. Returns how many were
    /// taken off the channel, including ignored ones.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Some(change) = self.channel.poll() {
            handled += 1;
            if self.phase.is_live() {
                self.apply_change(&change);
            }
        }
        handled
    }

    /// Advance local time.
    pub fn tick(&mut self, dt: Duration) {
        if self.phase != Phase::Active {
            return;
        }
        match self.timer.advance(dt) {
            Some(TimerSignal::Expired) => self.on_expired(),
            Some(TimerSignal::Frozen) => {
                tracing::trace!(session = %self.id(), "flips frozen");
            }
            None => {}
        }
    }

    /// Dispatch a presentation intent.
    pub fn handle(&mut self, intent: Intent) -> Result<(), SessionError> {
        match intent {
            Intent::Flip(cell) => self.request_flip(cell).map(|_| ()),
            Intent::Ready => self.request_ready(),
            Intent::Pause(paused) => self.request_pause(paused),
            Intent::Exit => {
                self.request_exit();
                Ok(())
            }
        }
    }

    // ========================================================================
    // Local intents
    // ========================================================================

    /// Flip `cell` for the local seat.
    ///
    /// Returns `Ok(false)` when the flip is silently dropped: not our turn,
    /// paused, or inside the freeze window. Returns an error only for a
    /// cell the board refuses.
    pub fn request_flip(&mut self, cell: usize) -> Result<bool, SessionError> {
        if self.phase != Phase::Active {
            return Err(SessionError::NotActive(self.phase));
        }
        if self.paused || self.timer.is_frozen() {
            tracing::debug!(session = %self.id(), cell, "flip refused while frozen");
            return Ok(false);
        }

        let seat = self.seat();
        match self.rules.check_flip(cell, seat) {
            Ok(()) => {}
            Err(err @ SessionError::IllegalTurn { .. }) => {
                tracing::debug!(session = %self.id(), error = %err, "flip dropped");
                return Ok(false);
            }
            Err(err) => return Err(err),
        }

        self.write(WriteIntent::DispatchFlip { by: seat }, &CardFlip::new(cell, seat));
        let effect = self.rules.apply_flip(cell, seat)?;
        self.on_effect(effect, seat);
        Ok(true)
    }

    /// Mark the local seat ready. Idempotent.
    pub fn request_ready(&mut self) -> Result<(), SessionError> {
        match self.phase {
            Phase::Ready => {}
            Phase::Active => return Ok(()),
            other => return Err(SessionError::NotActive(other)),
        }
        let seat = self.seat();
        if !self.ready[seat] {
            self.write(WriteIntent::MarkReady(seat), &true);
        }
        Ok(())
    }

    /// Ask both peers to pause or resume.
    pub fn request_pause(&mut self, paused: bool) -> Result<(), SessionError> {
        if self.phase != Phase::Active {
            return Err(SessionError::NotActive(self.phase));
        }
        if self.paused != paused {
            self.write(WriteIntent::Pause, &paused);
        }
        Ok(())
    }

    /// Leave the match. Both peers end the session once `exit` is observed.
    pub fn request_exit(&mut self) {
        if self.phase.is_live() {
            self.write(WriteIntent::Exit, &true);
        }
    }

    // ========================================================================
    // Remote changes
    // ========================================================================

    fn apply_change(&mut self, change: &Change) {
        let Some(&field) = self.subscriptions.get(&change.subscription) else {
            tracing::trace!(path = %change.path, "delivery for a detached subscription");
            return;
        };

        match field {
            Field::Turn => {
                if let Some(seat) = self.decode::<Seat>(change) {
                    self.on_turn(seat);
                }
            }
            Field::Score(seat) => {
                if let Some(score) = self.decode::<u32>(change) {
                    self.on_score(seat, score);
                }
            }
            Field::Ready(seat) => {
                if self.decode::<bool>(change) == Some(true) {
                    self.on_ready(seat);
                }
            }
            Field::CardFlip => {
                if let Some(flip) = self.decode::<CardFlip>(change) {
                    self.on_card_flip(flip);
                }
            }
            Field::Paused => {
                let paused = self.decode::<bool>(change).unwrap_or(false);
                self.on_paused(paused);
            }
            Field::TimeBarReset => {
                if let Some(counter) = self.decode::<i64>(change) {
                    self.on_counter(counter);
                }
            }
            Field::Exit => match change.value {
                None => {
                    tracing::info!(session = %self.id(), "session document removed");
                    self.end(MatchOutcome::Abandoned, None);
                }
                Some(_) => {
                    if self.decode::<bool>(change) == Some(true) {
                        tracing::info!(session = %self.id(), "peer exited");
                        self.end(MatchOutcome::Abandoned, None);
                    }
                }
            },
            Field::Nickname(_) | Field::LayoutSeed | Field::ContentSeed => {}
        }
    }

    fn decode<T: DeserializeOwned>(&self, change: &Change) -> Option<T> {
        let value = change.value.clone()?;
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                tracing::warn!(
                    session = %self.id(),
                    path = %change.path,
                    error = %err,
                    "ignoring undecodable value"
                );
                None
            }
        }
    }

    fn on_turn(&mut self, seat: Seat) {
        if let Some(end) = self.rules.adopt_turn(seat) {
            tracing::debug!(session = %self.id(), turn = %seat, "adopted observed turn");
            self.hide(end.released.to_vec());
            self.events.push(MatchEvent::TurnChanged(seat));
        }
    }

    fn on_score(&mut self, seat: Seat, score: u32) {
        if score > self.scores[seat] {
            self.scores[seat] = score;
            self.events.push(MatchEvent::ScoreChanged { seat, score });
        }
        self.check_completion();
    }

    fn on_ready(&mut self, seat: Seat) {
        self.ready[seat] = true;
        if self.phase == Phase::Ready && Seat::ALL.iter().all(|s| self.ready[*s]) {
            self.activate();
        }
    }

    fn activate(&mut self) {
        self.phase = Phase::Active;
        let ready: Vec<SubscriptionId> = self
            .subscriptions
            .iter()
            .filter(|(_, field)| matches!(field, Field::Ready(_)))
            .map(|(id, _)| *id)
            .collect();
        for subscription in ready {
            self.subscriptions.remove(&subscription);
            self.channel.unobserve(subscription);
        }

        self.timer.restart();
        tracing::info!(session = %self.id(), seat = %self.seat(), "session active");
        self.events.push(MatchEvent::SessionStarted);
        self.events.push(MatchEvent::TurnChanged(self.rules.current_turn()));
    }

    fn on_card_flip(&mut self, flip: CardFlip) {
        let Some(cell) = flip.cell() else {
            return;
        };
        if flip.by == self.seat() {
            tracing::trace!(session = %self.id(), cell, "own flip echoed");
            return;
        }
        if self.phase != Phase::Active {
            tracing::debug!(session = %self.id(), cell, "flip before activation ignored");
            return;
        }

        match self.rules.apply_flip(cell, flip.by) {
            Ok(effect) => self.on_effect(effect, flip.by),
            Err(err) if err.is_benign() => {
                tracing::debug!(session = %self.id(), cell, error = %err, "stale flip dropped");
            }
            Err(err) => {
                tracing::warn!(session = %self.id(), cell, error = %err, "remote flip rejected");
            }
        }
    }

    fn on_paused(&mut self, paused: bool) {
        if self.paused == paused {
            return;
        }
        self.paused = paused;
        if paused {
            self.timer.pause();
        } else {
            self.timer.resume();
        }
        tracing::info!(session = %self.id(), paused, "pause toggled");
        self.events.push(MatchEvent::PausedChanged(paused));
    }

    fn on_counter(&mut self, counter: i64) {
        if self.timer.observe_counter(counter) && self.phase == Phase::Active {
            self.events.push(MatchEvent::TimerRestarted);
        }
    }

    // ========================================================================
    // Rule outcomes
    // ========================================================================

    fn on_effect(&mut self, effect: FlipEffect, by: Seat) {
        self.events.push(MatchEvent::CardRevealed {
            cell: effect.cell(),
            by,
        });
        if let FlipEffect::Resolved {
            resolution,
            next_turn,
            ..
        } = effect
        {
            self.on_resolution(resolution, next_turn, by);
        }
    }

    fn on_resolution(&mut self, resolution: PairResolution, next_turn: Option<Seat>, by: Seat) {
        self.events.push(MatchEvent::PairResolved {
            outcome: resolution.outcome,
            cells: resolution.cells,
        });
        if let Some(tier) = resolution.tier {
            self.events.push(MatchEvent::TierChanged(tier));
        }

        if resolution.outcome == Resolution::Matched {
            let intent = WriteIntent::Score { seat: by };
            if self.guard.permits(intent) {
                let score = self.scores[by]
                    .max(self.written_score.unwrap_or(0))
                    .saturating_add(1);
                self.written_score = Some(score);
                self.write(intent, &score);
            }
        }

        if let Some(next) = next_turn {
            let intent = WriteIntent::PassTurn { from: by };
            if self.guard.permits(intent) {
                self.write(intent, &next);
            }
            self.events.push(MatchEvent::TurnChanged(next));
        }

        let reset = WriteIntent::ResetTimer { by };
        if self.guard.permits(reset) {
            self.reset_timer(reset);
        }
    }

    fn on_expired(&mut self) {
        tracing::debug!(session = %self.id(), turn = %self.rules.current_turn(), "turn expired");

        if !self.guard.permits(WriteIntent::PassTurnOnTimeout) {
            let released = self.rules.release_pending();
            self.hide(released.to_vec());
            return;
        }

        let end = self.rules.expire_turn();
        self.hide(end.released.to_vec());
        if let Some(next) = end.next_turn {
            self.write(WriteIntent::PassTurnOnTimeout, &next);
            self.events.push(MatchEvent::TurnChanged(next));
        }
        self.reset_timer(WriteIntent::ResetTimerOnTimeout);
    }

    fn hide(&mut self, cells: Vec<usize>) {
        if !cells.is_empty() {
            self.events.push(MatchEvent::CardsHidden { cells });
        }
    }

    fn check_completion(&mut self) {
        let total = self.rules.board().total_pairs() as u32;
        let (first, second) = (self.scores[Seat::Player1], self.scores[Seat::Player2]);
        if first.saturating_add(second) < total {
            return;
        }
        let winner = match first.cmp(&second) {
            Ordering::Greater => Some(Seat::Player1),
            Ordering::Less => Some(Seat::Player2),
            Ordering::Equal => None,
        };
        self.end(MatchOutcome::Completed, winner);
    }

    // ========================================================================
    // Writes and teardown
    // ========================================================================

    fn reset_timer(&mut self, intent: WriteIntent) {
        let counter = self.timer.next_counter();
        self.write(intent, &counter);
    }

    /// Write `value` for `intent`, provided the local seat owns it. Failures
    /// are logged and not retried.
    fn write<T: Serialize>(&mut self, intent: WriteIntent, value: &T) {
        if let Err(violation) = self.guard.authorize(intent) {
            tracing::error!(session = %self.id(), %violation, "refused write");
            return;
        }
        let Some(field) = intent.field() else {
            return;
        };
        let path = field.path(&self.root);
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(session = %self.id(), %path, error = %err, "unencodable value");
                return;
            }
        };

        match self.channel.write(&path, value) {
            Ok(()) => tracing::trace!(session = %self.seating.session_id, %path, "wrote"),
            Err(err) => tracing::warn!(
                session = %self.seating.session_id,
                %path,
                error = %err,
                "write failed, not retried"
            ),
        }
    }

    fn end(&mut self, outcome: MatchOutcome, winner: Option<Seat>) {
        if self.phase == Phase::Ended {
            return;
        }
        self.phase = Phase::Ended;
        self.timer.stop();
        self.detach_all();

        if self.guard.permits(WriteIntent::RemoveSession) {
            if let Err(err) = self.channel.remove(&self.root) {
                tracing::warn!(session = %self.seating.session_id, error = %err, "could not remove session");
            }
        }

        tracing::info!(
            session = %self.seating.session_id,
            ?outcome,
            winner = ?winner,
            "session ended"
        );
        self.events.push(MatchEvent::SessionEnded { outcome, winner });
    }

    /// Cancel every subscription this session holds. Safe to call again.
    pub fn detach_all(&mut self) {
        for (subscription, _) in self.subscriptions.drain() {
            self.channel.unobserve(subscription);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Seeds;
    use crate::channel::MemoryStore;
    use crate::core::{GameRng, GridSize};

    fn seating(seat: Seat) -> Seating {
        Seating {
            session_id: "s1".to_string(),
            seat,
            nicknames: SeatMap::new(|s| Some(s.key().to_string())),
            seeds: Seeds::generate(&GameRng::new(9), GridSize::Small, 43).unwrap(),
        }
    }

    #[test]
    fn test_attach_observes_every_field() {
        let store = MemoryStore::new();
        let session =
            MatchSession::new(store.connect(), MatchConfig::default(), seating(Seat::Player1))
                .unwrap();
        assert_eq!(session.subscription_count(), OBSERVED.len());
        assert_eq!(session.phase(), Phase::Ready);
        assert_eq!(session.board().len(), 20);
    }

    #[test]
    fn test_detach_all_is_idempotent() {
        let store = MemoryStore::new();
        let mut session =
            MatchSession::new(store.connect(), MatchConfig::default(), seating(Seat::Player2))
                .unwrap();
        session.detach_all();
        session.detach_all();
        assert_eq!(session.subscription_count(), 0);
        assert_eq!(store.subscription_count(), 0);
    }

    #[test]
    fn test_bad_seeds_are_rejected() {
        let store = MemoryStore::new();
        let mut bad = seating(Seat::Player1);
        bad.seeds.layout.truncate(7);
        assert!(matches!(
            MatchSession::new(store.connect(), MatchConfig::default(), bad),
            Err(SessionError::Layout(_))
        ));
    }

    #[test]
    fn test_flip_before_activation_is_refused() {
        let store = MemoryStore::new();
        let mut session =
            MatchSession::new(store.connect(), MatchConfig::default(), seating(Seat::Player1))
                .unwrap();
        assert_eq!(
            session.request_flip(0),
            Err(SessionError::NotActive(Phase::Ready))
        );
    }
}
