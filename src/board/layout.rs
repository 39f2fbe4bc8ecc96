//! Deterministic board construction from seeds.
//!
//! Card `k` of the deck carries symbol `content[k / 2]`, so each content
//! entry appears on exactly two cards. Cell `i` holds card `layout[i]`.
//! No randomness happens here; both peers decode the same seeds into the
//! same sequence of symbols.

use serde::{Deserialize, Serialize};

use crate::core::{GameRng, GridSize};
use crate::error::LayoutError;

/// Index into the symbol catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId(pub u32);

impl SymbolId {
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Catalog name of this symbol, if the catalog has one.
    #[must_use]
    pub fn name<'a, S: AsRef<str>>(self, catalog: &'a [S]) -> Option<&'a str> {
        catalog.get(self.0 as usize).map(AsRef::as_ref)
    }
}

impl std::fmt::Display for SymbolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Symbol({})", self.0)
    }
}

/// The two seeds written once at session creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seeds {
    pub layout: Vec<u32>,
    pub content: Vec<u32>,
}

impl Seeds {
    /// Draw fresh seeds for a board of `grid` cells over a catalog of
    /// `catalog_len` symbols.
    pub fn generate(rng: &GameRng, grid: GridSize, catalog_len: usize) -> Result<Self, LayoutError> {
        let content = rng
            .for_context("content")
            .sample_distinct(grid.pairs(), catalog_len)
            .ok_or(LayoutError::CatalogTooSmall {
                pairs: grid.pairs(),
                catalog: catalog_len,
            })?;
        let layout = rng.for_context("layout").shuffled_indices(grid.cells());
        Ok(Self { layout, content })
    }
}

/// Decoded board: one symbol per cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    grid: GridSize,
    symbols: Vec<SymbolId>,
}

impl Layout {
    #[must_use]
    pub fn grid(&self) -> GridSize {
        self.grid
    }

    /// Symbols in cell order.
    #[must_use]
    pub fn symbols(&self) -> &[SymbolId] {
        &self.symbols
    }

    /// Cells showing `symbol`.
    pub fn cells_with(&self, symbol: SymbolId) -> impl Iterator<Item = usize> + '_ {
        self.symbols
            .iter()
            .enumerate()
            .filter(move |(_, s)| **s == symbol)
            .map(|(i, _)| i)
    }
}

/// Rebuild the board described by the two seeds.
///
/// `layout_seed` must be a permutation of `0..grid.cells()`; `content_seed`
/// must hold `grid.pairs()` distinct indices below `catalog_len`.
pub fn build_layout(
    layout_seed: &[u32],
    content_seed: &[u32],
    grid: GridSize,
    catalog_len: usize,
) -> Result<Layout, LayoutError> {
    let cells = grid.cells();
    if layout_seed.len() != cells {
        return Err(LayoutError::LayoutLength {
            expected: cells,
            actual: layout_seed.len(),
        });
    }
    if content_seed.len() != grid.pairs() {
        return Err(LayoutError::ContentLength {
            expected: grid.pairs(),
            actual: content_seed.len(),
        });
    }

    let mut seen = vec![false; cells];
    for &card in layout_seed {
        match seen.get_mut(card as usize) {
            Some(slot) if !*slot => *slot = true,
            _ => return Err(LayoutError::NotPermutation { cells }),
        }
    }

    let mut used = rustc_hash::FxHashSet::default();
    for &index in content_seed {
        if index as usize >= catalog_len {
            return Err(LayoutError::UnknownSymbol {
                index,
                catalog: catalog_len,
            });
        }
        if !used.insert(index) {
            return Err(LayoutError::DuplicateSymbol { index });
        }
    }

    let symbols = layout_seed
        .iter()
        .map(|&card| SymbolId(content_seed[card as usize / 2]))
        .collect();

    Ok(Layout { grid, symbols })
}

/// Infer the grid size from a layout seed's length.
pub fn grid_for_seed(layout_seed: &[u32]) -> Result<GridSize, LayoutError> {
    GridSize::from_cells(layout_seed.len()).ok_or(LayoutError::UnsupportedSize {
        cells: layout_seed.len(),
    })
}
