//! Bit permutations of the standard and their inverses.
//!
//! All words are right-aligned in a `u64`: a `w` bits value occupies the low
//! `w` bits and position 1 is its most significant bit. Every public function
//! rejects inputs wider than its declared width instead of truncating them.

use crate::error::{DesError, Result};
use crate::tables;

const HALF_MASK: u64 = 0x0fff_ffff;

/// Fails with [`DesError::TooWide`] if `value` has bits set at or above `bits`.
#[inline]
pub(crate) fn check_width(value: u64, bits: u32) -> Result<()> {
    if bits < 64 && value >> bits != 0 {
        return Err(DesError::TooWide { value, bits });
    }
    Ok(())
}

/// A permutation table and the width of the word it reads from.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Permutation {
    table: &'static [u8],
    input_bits: u32,
}

impl Permutation {
    const fn new(table: &'static [u8], input_bits: u32) -> Self {
        Self { table, input_bits }
    }

    #[inline]
    pub(crate) const fn output_bits(&self) -> u32 {
        self.table.len() as u32
    }

    /// Forward direction. `value` must fit in the input width.
    pub(crate) fn select(&self, value: u64) -> u64 {
        self.table.iter().fold(0u64, |acc, &src| {
            (acc << 1) | ((value >> (self.input_bits - u32::from(src))) & 1)
        })
    }

    /// Backward direction: every output bit goes back to the input position it
    /// was read from. Positions nothing reads from stay 0.
    ///
    /// Returns the rebuilt word and a mask of the input positions whose
    /// duplicated copies disagree (always 0 for tables without repeats).
    pub(crate) fn scatter(&self, value: u64) -> (u64, u64) {
        let width = self.output_bits();
        let mut word = 0u64;
        let mut seen = 0u64;
        let mut mismatch = 0u64;
        for (i, &src) in self.table.iter().enumerate() {
            let bit = (value >> (width - 1 - i as u32)) & 1;
            let pos = self.input_bits - u32::from(src);
            let flag = 1u64 << pos;
            if seen & flag == 0 {
                word |= bit << pos;
                seen |= flag;
            } else if (word >> pos) & 1 != bit {
                mismatch |= flag;
            }
        }
        (word, mismatch)
    }

    fn forward(&self, value: u64) -> Result<u64> {
        check_width(value, self.input_bits)?;
        Ok(self.select(value))
    }

    fn backward(&self, value: u64) -> Result<u64> {
        check_width(value, self.output_bits())?;
        match self.scatter(value) {
            (word, 0) => Ok(word),
            (_, mismatch) => Err(DesError::AmbiguousExpansion { value, mismatch }),
        }
    }
}

pub(crate) const IP: Permutation = Permutation::new(&tables::IP, 64);
pub(crate) const FP: Permutation = Permutation::new(&tables::FP, 64);
pub(crate) const E: Permutation = Permutation::new(&tables::E, 32);
pub(crate) const P: Permutation = Permutation::new(&tables::P, 32);
pub(crate) const PC1: Permutation = Permutation::new(&tables::PC1, 64);
pub(crate) const PC2: Permutation = Permutation::new(&tables::PC2, 56);

/// Initial permutation (64 to 64 bits). Same as [`inv_fp`].
pub fn ip(value: u64) -> Result<u64> {
    IP.forward(value)
}

/// Inverse of the initial permutation (64 to 64 bits). Same as [`fp`].
pub fn inv_ip(value: u64) -> Result<u64> {
    FP.forward(value)
}

/// Final permutation (64 to 64 bits). Same as [`inv_ip`].
pub fn fp(value: u64) -> Result<u64> {
    FP.forward(value)
}

/// Inverse of the final permutation (64 to 64 bits). Same as [`ip`].
pub fn inv_fp(value: u64) -> Result<u64> {
    IP.forward(value)
}

/// E expansion (32 to 48 bits).
pub fn e(value: u64) -> Result<u64> {
    E.forward(value)
}

/// Inverse of the E expansion (48 to 32 bits).
///
/// Each duplicated input bit appears twice in the expanded word; both copies
/// must agree, otherwise [`DesError::AmbiguousExpansion`] is returned.
pub fn inv_e(value: u64) -> Result<u64> {
    E.backward(value)
}

/// P permutation (32 to 32 bits).
pub fn p(value: u64) -> Result<u64> {
    P.forward(value)
}

/// Inverse of the P permutation (32 to 32 bits).
pub fn inv_p(value: u64) -> Result<u64> {
    P.backward(value)
}

/// PC1 selection (64 to 56 bits). Parity bits are ignored, not checked.
pub fn pc1(value: u64) -> Result<u64> {
    PC1.forward(value)
}

/// Inverse of PC1 (56 to 64 bits). The parity bits are recomputed.
pub fn inv_pc1(value: u64) -> Result<u64> {
    check_width(value, 56)?;
    Ok(expand_c0d0(value))
}

/// PC2 selection (56 to 48 bits).
pub fn pc2(value: u64) -> Result<u64> {
    PC2.forward(value)
}

/// Inverse of PC2 (48 to 56 bits). The 8 bits PC2 drops come back as 0.
pub fn inv_pc2(value: u64) -> Result<u64> {
    PC2.backward(value)
}

/// Sets the parity bit (rightmost bit) of every byte so that each byte has an
/// odd number of set bits.
pub fn set_parity_bits(value: u64) -> u64 {
    (0..8).fold(value & 0xfefe_fefe_fefe_fefe, |acc, byte| {
        let data = (value >> (8 * byte)) & 0xfe;
        if data.count_ones() % 2 == 0 {
            acc | (1u64 << (8 * byte))
        } else {
            acc
        }
    })
}

/// Rotates both 28 bits halves of a 56 bits word one position to the left.
pub fn rotate_left(value: u64) -> Result<u64> {
    check_width(value, 56)?;
    Ok(ls(value))
}

/// Rotates both 28 bits halves of a 56 bits word one position to the right.
pub fn rotate_right(value: u64) -> Result<u64> {
    check_width(value, 56)?;
    Ok(rs(value))
}

/// PC1⁻¹ followed by parity recomputation, for a 56 bits C0D0.
pub(crate) fn expand_c0d0(c0d0: u64) -> u64 {
    set_parity_bits(PC1.scatter(c0d0).0)
}

#[inline]
pub(crate) fn ls(value: u64) -> u64 {
    let rot = |half: u64| ((half << 1) | (half >> 27)) & HALF_MASK;
    (rot(value >> 28) << 28) | rot(value & HALF_MASK)
}

#[inline]
pub(crate) fn rs(value: u64) -> u64 {
    let rot = |half: u64| ((half >> 1) | (half << 27)) & HALF_MASK;
    (rot(value >> 28) << 28) | rot(value & HALF_MASK)
}

/// Applies the left rotations of `round` (1..=16) to a 56 bits CD word.
#[inline]
pub(crate) fn rotate_for_round(value: u64, round: usize) -> u64 {
    let once = ls(value);
    if tables::LEFT_SHIFTS[round - 1] == 1 {
        ls(once)
    } else {
        once
    }
}
