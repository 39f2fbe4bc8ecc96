//! Match configuration.
//!
//! Both peers of a session must run with equal configuration: the grid size,
//! the symbol catalog and the timing constants all feed directly into how
//! each client interprets the shared document.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Symbol names available to a board, indexed by `contentSeed` entries.
pub const DEFAULT_SYMBOLS: [&str; 43] = [
    "avocado", "barbarian", "carousel", "cash", "clubs",
    "comb", "console-controller", "cpu", "drill", "gingerbread-man",
    "goblin-camp", "honeypot", "moai", "orange", "processor",
    "robot", "sliced-bread", "spanner", "spectre", "tesla-turret",
    "acorn", "button-finger", "famas", "fizzing-flask", "gem-pendant",
    "guitar", "helicopter", "jeep", "key", "light-bulb",
    "mushroom-cloud", "plague-doctor-profile", "pumpkin-mask", "revolver",
    "round-straw-bale", "rupee", "satellite", "space-suit", "tank",
    "trombone", "twister", "ufo", "whistle",
];

/// Board dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GridSize {
    /// 5 x 4, 20 cells.
    Small,
    /// 8 x 5, 40 cells.
    Large,
}

impl GridSize {
    /// Number of cells on the board.
    #[must_use]
    pub const fn cells(self) -> usize {
        match self {
            GridSize::Small => 20,
            GridSize::Large => 40,
        }
    }

    /// Number of pairs on the board.
    #[must_use]
    pub const fn pairs(self) -> usize {
        self.cells() / 2
    }

    /// Grid size with the given cell count, if any.
    #[must_use]
    pub const fn from_cells(cells: usize) -> Option<Self> {
        match cells {
            20 => Some(GridSize::Small),
            40 => Some(GridSize::Large),
            _ => None,
        }
    }
}

/// Configuration for a networked match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Board dimensions. Multiplayer matches default to the large grid.
    pub grid: GridSize,

    /// Countdown length of one turn.
    pub turn_duration: Duration,

    /// Trailing part of the countdown during which local flips are refused,
    /// so no flip lands after the authoritative expiry fired.
    pub freeze_window: Duration,

    /// Document path under which session subtrees live.
    pub table_root: String,

    /// Symbol catalog shared by both peers.
    pub symbols: Vec<String>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            grid: GridSize::Large,
            turn_duration: Duration::from_secs(20),
            freeze_window: Duration::from_secs(2),
            table_root: "game/table".to_string(),
            symbols: DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl MatchConfig {
    /// Set the grid size.
    pub fn with_grid(mut self, grid: GridSize) -> Self {
        self.grid = grid;
        self
    }

    /// Set the turn countdown length.
    pub fn with_turn_duration(mut self, duration: Duration) -> Self {
        self.turn_duration = duration;
        self
    }

    /// Set the freeze window at the end of each countdown.
    pub fn with_freeze_window(mut self, window: Duration) -> Self {
        self.freeze_window = window;
        self
    }

    /// Set the document root for session subtrees.
    pub fn with_table_root(mut self, root: impl Into<String>) -> Self {
        self.table_root = root.into();
        self
    }

    /// Replace the symbol catalog.
    pub fn with_symbols<S: Into<String>>(mut self, symbols: impl IntoIterator<Item = S>) -> Self {
        self.symbols = symbols.into_iter().map(Into::into).collect();
        self
    }

    /// Total pairs on the configured board.
    #[must_use]
    pub fn total_pairs(&self) -> usize {
        self.grid.pairs()
    }
}

/// Single-player difficulty.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Hard,
}

impl Difficulty {
    /// Board used at this difficulty.
    #[must_use]
    pub const fn grid(self) -> GridSize {
        match self {
            Difficulty::Easy => GridSize::Small,
            Difficulty::Hard => GridSize::Large,
        }
    }

    /// Failed pairs allowed before the game is lost.
    #[must_use]
    pub const fn max_tries(self) -> u32 {
        match self {
            Difficulty::Easy => 20,
            Difficulty::Hard => 60,
        }
    }
}

/// Configuration for a single-player game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoloConfig {
    pub difficulty: Difficulty,

    /// Overrides the difficulty's try budget when set.
    pub max_tries: Option<u32>,

    pub symbols: Vec<String>,
}

impl Default for SoloConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Easy,
            max_tries: None,
            symbols: DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl SoloConfig {
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_max_tries(mut self, tries: u32) -> Self {
        self.max_tries = Some(tries);
        self
    }

    pub fn with_symbols<S: Into<String>>(mut self, symbols: impl IntoIterator<Item = S>) -> Self {
        self.symbols = symbols.into_iter().map(Into::into).collect();
        self
    }

    /// Effective try budget.
    #[must_use]
    pub fn tries(&self) -> u32 {
        self.max_tries.unwrap_or_else(|| self.difficulty.max_tries())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MatchConfig::default();
        assert_eq!(config.grid, GridSize::Large);
        assert_eq!(config.turn_duration, Duration::from_secs(20));
        assert_eq!(config.freeze_window, Duration::from_secs(2));
        assert_eq!(config.table_root, "game/table");
        assert_eq!(config.symbols.len(), 43);
        assert_eq!(config.total_pairs(), 20);
    }

    #[test]
    fn test_builder_pattern() {
        let config = MatchConfig::default()
            .with_grid(GridSize::Small)
            .with_turn_duration(Duration::from_secs(5))
            .with_table_root("test/table")
            .with_symbols(["cat", "dog"]);

        assert_eq!(config.grid.cells(), 20);
        assert_eq!(config.turn_duration, Duration::from_secs(5));
        assert_eq!(config.table_root, "test/table");
        assert_eq!(config.symbols, vec!["cat".to_string(), "dog".to_string()]);
    }

    #[test]
    fn test_grid_from_cells() {
        assert_eq!(GridSize::from_cells(20), Some(GridSize::Small));
        assert_eq!(GridSize::from_cells(40), Some(GridSize::Large));
        assert_eq!(GridSize::from_cells(30), None);
    }

    #[test]
    fn test_difficulty_budgets() {
        assert_eq!(Difficulty::Easy.grid(), GridSize::Small);
        assert_eq!(Difficulty::Easy.max_tries(), 20);
        assert_eq!(Difficulty::Hard.grid(), GridSize::Large);
        assert_eq!(Difficulty::Hard.max_tries(), 60);

        let solo = SoloConfig::default().with_difficulty(Difficulty::Hard);
        assert_eq!(solo.tries(), 60);
        assert_eq!(solo.with_max_tries(3).tries(), 3);
    }

    #[test]
    fn test_serialization() {
        let config = MatchConfig::default().with_grid(GridSize::Small);
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: MatchConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }
}
