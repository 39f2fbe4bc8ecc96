//! Seat identification and per-seat data storage.
//!
//! ## Seat
//!
//! A match has exactly two seats. `Player1` is the session initiator and the
//! authoritative peer for timeout-driven turn passes; `Player2` is the joiner.
//!
//! ## SeatMap
//!
//! Fixed two-slot storage indexed by `Seat`.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// One of the two seats at a match.
///
/// Serializes as `"player1"` / `"player2"`, which is also the document key
/// for that seat's subtree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Seat {
    Player1,
    Player2,
}

impl Seat {
    /// Both seats, in joining order.
    pub const ALL: [Seat; 2] = [Seat::Player1, Seat::Player2];

    /// The other seat.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Seat::Player1 => Seat::Player2,
            Seat::Player2 => Seat::Player1,
        }
    }

    /// Slot index (0 for `Player1`).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Seat::Player1 => 0,
            Seat::Player2 => 1,
        }
    }

    /// Document key for this seat's subtree.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Seat::Player1 => "player1",
            Seat::Player2 => "player2",
        }
    }

    /// Parse a document key back into a seat.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "player1" => Some(Seat::Player1),
            "player2" => Some(Seat::Player2),
            _ => None,
        }
    }

    /// Whether this seat originates timeout-driven turn passes.
    #[must_use]
    pub const fn is_authority(self) -> bool {
        matches!(self, Seat::Player1)
    }
}

impl std::fmt::Display for Seat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Per-seat data storage.
///
/// ## Example
///
/// ```
/// use pairsync::core::{Seat, SeatMap};
///
/// let mut scores: SeatMap<u32> = SeatMap::with_value(0);
/// scores[Seat::Player2] += 3;
///
/// assert_eq!(scores[Seat::Player1], 0);
/// assert_eq!(scores[Seat::Player2], 3);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeatMap<T> {
    data: [T; 2],
}

impl<T> SeatMap<T> {
    /// Create a SeatMap with values from a factory function.
    pub fn new(factory: impl Fn(Seat) -> T) -> Self {
        Self {
            data: [factory(Seat::Player1), factory(Seat::Player2)],
        }
    }

    /// Create a SeatMap with both entries set to the same value.
    pub fn with_value(value: T) -> Self
    where
        T: Clone,
    {
        Self {
            data: [value.clone(), value],
        }
    }

    /// Get a reference to a seat's data.
    #[must_use]
    pub fn get(&self, seat: Seat) -> &T {
        &self.data[seat.index()]
    }

    /// Get a mutable reference to a seat's data.
    pub fn get_mut(&mut self, seat: Seat) -> &mut T {
        &mut self.data[seat.index()]
    }

    /// Iterate over (Seat, &T) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Seat, &T)> {
        Seat::ALL.into_iter().zip(self.data.iter())
    }
}

impl<T> Index<Seat> for SeatMap<T> {
    type Output = T;

    fn index(&self, seat: Seat) -> &Self::Output {
        self.get(seat)
    }
}

impl<T> IndexMut<Seat> for SeatMap<T> {
    fn index_mut(&mut self, seat: Seat) -> &mut Self::Output {
        self.get_mut(seat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seat_other() {
        assert_eq!(Seat::Player1.other(), Seat::Player2);
        assert_eq!(Seat::Player2.other(), Seat::Player1);
        assert_eq!(Seat::Player1.other().other(), Seat::Player1);
    }

    #[test]
    fn test_seat_keys() {
        for seat in Seat::ALL {
            assert_eq!(Seat::from_key(seat.key()), Some(seat));
        }
        assert_eq!(Seat::from_key("player3"), None);
        assert_eq!(format!("{}", Seat::Player2), "player2");
    }

    #[test]
    fn test_seat_serde_matches_key() {
        let json = serde_json::to_string(&Seat::Player1).unwrap();
        assert_eq!(json, "\"player1\"");
        let back: Seat = serde_json::from_str("\"player2\"").unwrap();
        assert_eq!(back, Seat::Player2);
    }

    #[test]
    fn test_only_player1_is_authority() {
        assert!(Seat::Player1.is_authority());
        assert!(!Seat::Player2.is_authority());
    }

    #[test]
    fn test_seat_map_new_and_iter() {
        let map = SeatMap::new(|s| s.index() * 10);
        let pairs: Vec<_> = map.iter().collect();
        assert_eq!(pairs, vec![(Seat::Player1, &0), (Seat::Player2, &10)]);
    }

    #[test]
    fn test_seat_map_mutation() {
        let mut map: SeatMap<i32> = SeatMap::with_value(0);
        map[Seat::Player1] = 7;
        *map.get_mut(Seat::Player2) += 2;
        assert_eq!(map[Seat::Player1], 7);
        assert_eq!(map[Seat::Player2], 2);
    }
}
