//! Board state and pair resolution.
//!
//! The board is local and never shared. Both peers build it from the same
//! seeds and feed it the same flip sequence, so the matched/failed verdict
//! for any two cell indices is identical on both sides.

use im::Vector;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::layout::{Layout, SymbolId};
use super::tier::{tier_for, Tier};
use crate::error::BoardError;

/// One card position on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub symbol: SymbolId,
    pub matched: bool,
}

/// Verdict for two revealed cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    Matched,
    Failed,
}

/// Result of resolving a completed pair of reveals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PairResolution {
    pub outcome: Resolution,
    pub cells: [usize; 2],
    /// Tier entered by this match, if it landed exactly on a threshold.
    pub tier: Option<Tier>,
}

/// Pending reveals after a successful `reveal`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pending {
    /// One cell face-up, waiting for the second.
    One,
    /// Two cells face-up; call `resolve_pending`.
    Two,
}

/// Card layout, reveal state and matched-pair bookkeeping.
///
/// Uses `im::Vector` so snapshots handed to presentation are O(1).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoardModel {
    cells: Vector<Cell>,
    revealed: SmallVec<[usize; 2]>,
    matched_pairs: usize,
    tier: Tier,
}

impl BoardModel {
    /// Create a board with every cell face-down.
    #[must_use]
    pub fn new(layout: &Layout) -> Self {
        Self::from_symbols(layout.symbols().iter().copied())
    }

    /// Create a board from symbols in cell order.
    ///
    /// Callers are responsible for each symbol appearing exactly twice.
    pub fn from_symbols(symbols: impl IntoIterator<Item = SymbolId>) -> Self {
        Self {
            cells: symbols
                .into_iter()
                .map(|symbol| Cell { symbol, matched: false })
                .collect(),
            revealed: SmallVec::new(),
            matched_pairs: 0,
            tier: Tier::First,
        }
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[must_use]
    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Cells currently face-up and pending resolution.
    #[must_use]
    pub fn revealed(&self) -> &[usize] {
        &self.revealed
    }

    #[must_use]
    pub fn matched_pairs(&self) -> usize {
        self.matched_pairs
    }

    #[must_use]
    pub fn total_pairs(&self) -> usize {
        self.cells.len() / 2
    }

    /// Current presentation tier.
    #[must_use]
    pub fn tier(&self) -> Tier {
        self.tier
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.matched_pairs == self.total_pairs()
    }

    /// Whether `index` can be revealed right now.
    pub fn check_reveal(&self, index: usize) -> Result<(), BoardError> {
        let cell = self.cells.get(index).ok_or(BoardError::OutOfRange {
            cell: index,
            cells: self.cells.len(),
        })?;
        if cell.matched || self.revealed.contains(&index) {
            return Err(BoardError::InvalidCell(index));
        }
        if self.revealed.len() == 2 {
            return Err(BoardError::PendingFull);
        }
        Ok(())
    }

    /// Turn a face-down cell face-up.
    pub fn reveal(&mut self, index: usize) -> Result<Pending, BoardError> {
        self.check_reveal(index)?;
        self.revealed.push(index);

        Ok(if self.revealed.len() == 2 {
            Pending::Two
        } else {
            Pending::One
        })
    }

    /// Resolve two revealed cells.
    ///
    /// Matching compares symbols, not positions. Returns `None` unless
    /// exactly two cells are pending.
    pub fn resolve_pending(&mut self) -> Option<PairResolution> {
        let [a, b] = match self.revealed.as_slice() {
            [a, b] => [*a, *b],
            _ => return None,
        };
        self.revealed.clear();

        if self.cells[a].symbol != self.cells[b].symbol {
            return Some(PairResolution {
                outcome: Resolution::Failed,
                cells: [a, b],
                tier: None,
            });
        }

        self.cells[a].matched = true;
        self.cells[b].matched = true;
        self.matched_pairs += 1;

        let tier = tier_for(self.matched_pairs, self.total_pairs()).filter(|t| *t > self.tier);
        if let Some(tier) = tier {
            self.tier = tier;
        }

        Some(PairResolution {
            outcome: Resolution::Matched,
            cells: [a, b],
            tier,
        })
    }

    /// Turn pending cells back face-down without resolving them.
    ///
    /// Used when a turn ends with a single card revealed.
    pub fn release_pending(&mut self) -> SmallVec<[usize; 2]> {
        std::mem::take(&mut self.revealed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Board of `pairs` pairs laid out as 0,0,1,1,2,2,...
    fn paired_board(pairs: u32) -> BoardModel {
        BoardModel::from_symbols((0..pairs).flat_map(|s| [SymbolId(s), SymbolId(s)]))
    }

    #[test]
    fn test_new_board() {
        let board = paired_board(10);
        assert_eq!(board.len(), 20);
        assert_eq!(board.total_pairs(), 10);
        assert_eq!(board.matched_pairs(), 0);
        assert!(board.revealed().is_empty());
        assert!(!board.is_complete());
    }

    #[test]
    fn test_reveal_sequence() {
        let mut board = paired_board(10);
        assert_eq!(board.reveal(0), Ok(Pending::One));
        assert_eq!(board.reveal(1), Ok(Pending::Two));
        assert_eq!(board.revealed(), &[0, 1]);
    }

    #[test]
    fn test_reveal_rejects_revealed_and_matched() {
        let mut board = paired_board(10);
        board.reveal(0).unwrap();
        assert_eq!(board.reveal(0), Err(BoardError::InvalidCell(0)));

        board.reveal(1).unwrap();
        board.resolve_pending().unwrap();
        assert_eq!(board.reveal(1), Err(BoardError::InvalidCell(1)));
    }

    #[test]
    fn test_reveal_rejects_out_of_range_and_full() {
        let mut board = paired_board(10);
        assert_eq!(board.reveal(20), Err(BoardError::OutOfRange { cell: 20, cells: 20 }));

        board.reveal(0).unwrap();
        board.reveal(2).unwrap();
        assert_eq!(board.reveal(4), Err(BoardError::PendingFull));
    }

    #[test]
    fn test_match() {
        let mut board = paired_board(10);
        board.reveal(2).unwrap();
        board.reveal(3).unwrap();

        let resolution = board.resolve_pending().unwrap();
        assert_eq!(resolution.outcome, Resolution::Matched);
        assert_eq!(resolution.cells, [2, 3]);
        assert_eq!(board.matched_pairs(), 1);
        assert!(board.cell(2).unwrap().matched);
        assert!(board.revealed().is_empty());
    }

    #[test]
    fn test_failure_hides_cells() {
        let mut board = paired_board(10);
        board.reveal(0).unwrap();
        board.reveal(2).unwrap();

        let resolution = board.resolve_pending().unwrap();
        assert_eq!(resolution.outcome, Resolution::Failed);
        assert_eq!(board.matched_pairs(), 0);
        assert!(!board.cell(0).unwrap().matched);
        assert!(board.revealed().is_empty());
        assert!(board.reveal(0).is_ok());
    }

    #[test]
    fn test_resolve_needs_two() {
        let mut board = paired_board(10);
        assert!(board.resolve_pending().is_none());
        board.reveal(0).unwrap();
        assert!(board.resolve_pending().is_none());
        assert_eq!(board.revealed(), &[0]);
    }

    #[test]
    fn test_release_pending() {
        let mut board = paired_board(10);
        board.reveal(5).unwrap();
        let released = board.release_pending();
        assert_eq!(released.as_slice(), &[5]);
        assert!(board.revealed().is_empty());
        assert!(board.reveal(5).is_ok());
    }

    #[test]
    fn test_completion_and_tiers() {
        let mut board = paired_board(20);
        let mut tiers = Vec::new();

        for pair in 0..20 {
            board.reveal(pair * 2).unwrap();
            board.reveal(pair * 2 + 1).unwrap();
            if let Some(tier) = board.resolve_pending().unwrap().tier {
                tiers.push((board.matched_pairs(), tier));
            }
        }

        assert!(board.is_complete());
        assert_eq!(
            tiers,
            vec![(5, Tier::Second), (10, Tier::Third), (15, Tier::Fourth)]
        );
        assert_eq!(board.tier(), Tier::Fourth);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut board = paired_board(10);
        let snapshot = board.clone();
        board.reveal(0).unwrap();
        board.reveal(1).unwrap();
        board.resolve_pending();

        assert_eq!(snapshot.matched_pairs(), 0);
        assert!(!snapshot.cell(0).unwrap().matched);
    }
}
