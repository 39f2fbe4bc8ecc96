//! Matched-pair milestones.
//!
//! A tier is entered at an exact matched-pair count. Passing a threshold
//! without landing on it (a replayed or skipped event) never applies that
//! tier retroactively.

use serde::{Deserialize, Serialize};

/// Presentation tier, in increasing order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    #[default]
    First,
    Second,
    Third,
    Fourth,
}

impl Tier {
    /// Matched-pair count at which `self` is entered, for a board of
    /// `total_pairs` pairs. `First` is entered at zero.
    #[must_use]
    pub fn threshold(self, total_pairs: usize) -> usize {
        match self {
            Tier::First => 0,
            Tier::Second => total_pairs / 4,
            Tier::Third => total_pairs / 2,
            Tier::Fourth => total_pairs * 3 / 4,
        }
    }
}

/// Tier entered when the matched-pair count becomes exactly `matched_pairs`.
///
/// Returns `None` between thresholds. When small boards make several
/// thresholds coincide, the highest tier wins.
///
/// ```
/// use pairsync::board::{tier_for, Tier};
///
/// assert_eq!(tier_for(5, 20), Some(Tier::Second));
/// assert_eq!(tier_for(6, 20), None);
/// assert_eq!(tier_for(15, 20), Some(Tier::Fourth));
/// ```
#[must_use]
pub fn tier_for(matched_pairs: usize, total_pairs: usize) -> Option<Tier> {
    if matched_pairs == 0 {
        return None;
    }

    [Tier::Fourth, Tier::Third, Tier::Second]
        .into_iter()
        .find(|tier| tier.threshold(total_pairs) == matched_pairs)
}
