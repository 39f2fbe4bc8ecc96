//! Single-player variant.
//!
//! Same board and rules as a networked match, with the sole-seat arbiter
//! and no channel. Every failed pair uses one try; matching every pair
//! before the budget runs out wins.

use crate::board::{build_layout, BoardModel, Resolution, Seeds};
use crate::core::{GameRng, Seat, SoloConfig};
use crate::error::SessionError;
use crate::rules::{FlipEffect, MatchRules, SoloArbiter};
use crate::session::{EventQueue, Intent, MatchEvent, MatchOutcome, Phase};

/// A single-player game in progress.
#[derive(Clone, Debug)]
pub struct SoloGame {
    rules: MatchRules<SoloArbiter>,
    config: SoloConfig,
    seeds: Seeds,
    used_tries: u32,
    outcome: Option<MatchOutcome>,
    events: EventQueue,
}

impl SoloGame {
    /// Deal a fresh board.
    pub fn new(config: SoloConfig, rng: &GameRng) -> Result<Self, SessionError> {
        let seeds = Seeds::generate(rng, config.difficulty.grid(), config.symbols.len())?;
        Self::from_seeds(config, seeds)
    }

    /// Replay a known deal.
    pub fn from_seeds(config: SoloConfig, seeds: Seeds) -> Result<Self, SessionError> {
        let layout = build_layout(
            &seeds.layout,
            &seeds.content,
            config.difficulty.grid(),
            config.symbols.len(),
        )?;
        tracing::debug!(difficulty = ?config.difficulty, tries = config.tries(), "solo game dealt");
        Ok(Self {
            rules: MatchRules::new(BoardModel::new(&layout), SoloArbiter),
            config,
            seeds,
            used_tries: 0,
            outcome: None,
            events: EventQueue::new(),
        })
    }

    #[must_use]
    pub fn board(&self) -> &BoardModel {
        self.rules.board()
    }

    #[must_use]
    pub fn seeds(&self) -> &Seeds {
        &self.seeds
    }

    #[must_use]
    pub fn used_tries(&self) -> u32 {
        self.used_tries
    }

    #[must_use]
    pub fn max_tries(&self) -> u32 {
        self.config.tries()
    }

    #[must_use]
    pub fn remaining_tries(&self) -> u32 {
        self.max_tries().saturating_sub(self.used_tries)
    }

    #[must_use]
    pub fn outcome(&self) -> Option<MatchOutcome> {
        self.outcome
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        if self.outcome.is_some() {
            Phase::Ended
        } else {
            Phase::Active
        }
    }

    pub fn drain_events(&mut self) -> Vec<MatchEvent> {
        self.events.drain()
    }

    /// Dispatch a presentation intent. Pausing and readiness mean nothing
    /// without an opponent.
    pub fn handle(&mut self, intent: Intent) -> Result<(), SessionError> {
        match intent {
            Intent::Flip(cell) => self.request_flip(cell),
            Intent::Ready | Intent::Pause(_) => Ok(()),
            Intent::Exit => {
                self.finish(MatchOutcome::Abandoned);
                Ok(())
            }
        }
    }

    /// Flip `cell`.
    pub fn request_flip(&mut self, cell: usize) -> Result<(), SessionError> {
        if self.outcome.is_some() {
            return Err(SessionError::NotActive(Phase::Ended));
        }

        let effect = self.rules.apply_flip(cell, Seat::Player1)?;
        self.events.push(MatchEvent::CardRevealed {
            cell: effect.cell(),
            by: Seat::Player1,
        });

        let FlipEffect::Resolved { resolution, .. } = effect else {
            return Ok(());
        };
        self.events.push(MatchEvent::PairResolved {
            outcome: resolution.outcome,
            cells: resolution.cells,
        });
        if let Some(tier) = resolution.tier {
            self.events.push(MatchEvent::TierChanged(tier));
        }

        match resolution.outcome {
            Resolution::Matched if self.rules.board().is_complete() => {
                self.finish(MatchOutcome::Won);
            }
            Resolution::Matched => {}
            Resolution::Failed => {
                self.used_tries += 1;
                self.events.push(MatchEvent::TriesChanged {
                    used: self.used_tries,
                    max: self.max_tries(),
                });
                if self.used_tries >= self.max_tries() {
                    self.finish(MatchOutcome::Lost);
                }
            }
        }
        Ok(())
    }

    fn finish(&mut self, outcome: MatchOutcome) {
        if self.outcome.is_some() {
            return;
        }
        self.outcome = Some(outcome);
        let winner = (outcome == MatchOutcome::Won).then_some(Seat::Player1);
        tracing::info!(?outcome, tries = self.used_tries, "solo game over");
        self.events.push(MatchEvent::SessionEnded { outcome, winner });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::SymbolId;
    use crate::core::Difficulty;
    use crate::error::LayoutError;

    fn game(max_tries: u32) -> SoloGame {
        let config = SoloConfig::default().with_max_tries(max_tries);
        SoloGame::new(config, &GameRng::new(5)).unwrap()
    }

    /// Two cells holding `symbol`.
    fn pair_of(game: &SoloGame, symbol: SymbolId) -> [usize; 2] {
        let cells: Vec<usize> = game
            .board()
            .cells()
            .enumerate()
            .filter(|(_, c)| c.symbol == symbol)
            .map(|(i, _)| i)
            .collect();
        [cells[0], cells[1]]
    }

    fn mismatch(game: &SoloGame) -> [usize; 2] {
        let first = game.board().cell(0).unwrap().symbol;
        let other = (1..game.board().len())
            .find(|&i| game.board().cell(i).unwrap().symbol != first)
            .unwrap();
        [0, other]
    }

    #[test]
    fn test_difficulty_picks_board() {
        let easy = SoloGame::new(SoloConfig::default(), &GameRng::new(1)).unwrap();
        assert_eq!(easy.board().len(), 20);
        assert_eq!(easy.max_tries(), 20);

        let hard = SoloGame::new(
            SoloConfig::default().with_difficulty(Difficulty::Hard),
            &GameRng::new(1),
        )
        .unwrap();
        assert_eq!(hard.board().len(), 40);
        assert_eq!(hard.max_tries(), 60);
    }

    #[test]
    fn test_small_catalog_is_an_error() {
        let config = SoloConfig::default().with_symbols(["cat"]);
        let result = SoloGame::new(config, &GameRng::new(1));
        assert!(matches!(
            result,
            Err(SessionError::Layout(LayoutError::CatalogTooSmall { pairs: 10, catalog: 1 }))
        ));
    }

    #[test]
    fn test_failures_use_tries_until_lost() {
        let mut game = game(2);
        for _ in 0..2 {
            let [a, b] = mismatch(&game);
            game.request_flip(a).unwrap();
            game.request_flip(b).unwrap();
        }
        assert_eq!(game.used_tries(), 2);
        assert_eq!(game.outcome(), Some(MatchOutcome::Lost));
        assert_eq!(
            game.request_flip(3),
            Err(SessionError::NotActive(Phase::Ended))
        );

        let events = game.drain_events();
        assert!(events.contains(&MatchEvent::TriesChanged { used: 2, max: 2 }));
        assert_eq!(
            events.last(),
            Some(&MatchEvent::SessionEnded {
                outcome: MatchOutcome::Lost,
                winner: None
            })
        );
    }

    #[test]
    fn test_matching_everything_wins() {
        let mut game = game(20);
        let symbols: Vec<SymbolId> = {
            let mut seen = Vec::new();
            for cell in game.board().cells() {
                if !seen.contains(&cell.symbol) {
                    seen.push(cell.symbol);
                }
            }
            seen
        };
        for symbol in symbols {
            let [a, b] = pair_of(&game, symbol);
            game.request_flip(a).unwrap();
            game.request_flip(b).unwrap();
        }

        assert_eq!(game.used_tries(), 0);
        assert_eq!(game.outcome(), Some(MatchOutcome::Won));
        let events = game.drain_events();
        assert_eq!(
            events.iter().filter(|e| matches!(e, MatchEvent::TierChanged(_))).count(),
            3
        );
        assert_eq!(
            events.last(),
            Some(&MatchEvent::SessionEnded {
                outcome: MatchOutcome::Won,
                winner: Some(Seat::Player1)
            })
        );
    }

    #[test]
    fn test_invalid_flip_is_an_error_and_free() {
        let mut game = game(20);
        game.request_flip(0).unwrap();
        assert!(game.request_flip(0).is_err());
        assert_eq!(game.used_tries(), 0);
        assert_eq!(game.board().revealed(), &[0]);
    }

    #[test]
    fn test_exit_abandons_once() {
        let mut game = game(20);
        game.handle(Intent::Exit).unwrap();
        game.handle(Intent::Exit).unwrap();
        assert_eq!(game.outcome(), Some(MatchOutcome::Abandoned));
        assert_eq!(game.drain_events().len(), 1);
    }
}
