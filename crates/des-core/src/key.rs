//! Key types for DES.

use crate::error::{DesError, Result};

/// A 64 bits DES secret key, parity bits included.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DesKey(pub u64);

impl From<u64> for DesKey {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<[u8; 8]> for DesKey {
    fn from(value: [u8; 8]) -> Self {
        Self(u64::from_be_bytes(value))
    }
}

/// The sixteen 48 bits round keys, round 1 first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundKeys(pub [u64; 16]);

impl RoundKeys {
    /// Returns the round key of `round` (1..=16).
    pub fn get(&self, round: usize) -> Result<u64> {
        match round {
            1..=16 => Ok(self.0[round - 1]),
            _ => Err(DesError::InvalidRound(round)),
        }
    }

    /// Iterates over the round keys from round 1 to round 16.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = u64> + '_ {
        self.0.iter().copied()
    }
}
