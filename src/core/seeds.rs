//! Seed serialization.
//!
//! Seeds travel through the shared document as `;`-joined decimal lists.
//! The empty sequence serializes to the empty string.

use crate::error::SeedError;

/// Delimiter between seed entries.
pub const SEED_DELIMITER: char = ';';

/// Join a sequence of non-negative integers with `;`.
///
/// ```
/// use pairsync::core::seeds::serialize;
///
/// assert_eq!(serialize(&[3, 0, 12]), "3;0;12");
/// ```
#[must_use]
pub fn serialize(values: &[u32]) -> String {
    let mut out = String::with_capacity(values.len() * 3);
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            out.push(SEED_DELIMITER);
        }
        out.push_str(&value.to_string());
    }
    out
}

/// Parse a `;`-joined list of non-negative integers.
///
/// Entries must be canonical decimal (no sign, no whitespace, no leading
/// zeros) so that `serialize(parse(s)) == s` holds for every accepted input.
pub fn parse_serialized_array(serialized: &str) -> Result<Vec<u32>, SeedError> {
    if serialized.is_empty() {
        return Ok(Vec::new());
    }

    serialized
        .split(SEED_DELIMITER)
        .enumerate()
        .map(|(position, entry)| parse_entry(position, entry))
        .collect()
}

fn parse_entry(position: usize, entry: &str) -> Result<u32, SeedError> {
    let canonical = !entry.is_empty()
        && entry.bytes().all(|b| b.is_ascii_digit())
        && (entry == "0" || !entry.starts_with('0'));
    if !canonical {
        return Err(SeedError::InvalidEntry {
            position,
            entry: entry.to_string(),
        });
    }

    entry.parse().map_err(|_| SeedError::InvalidEntry {
        position,
        entry: entry.to_string(),
    })
}
