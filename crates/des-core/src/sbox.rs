//! DES S-box lookups.

use crate::error::{DesError, Result};
use crate::permute::check_width;
use crate::tables::S_BOXES;

/// Looks up a 6 bits input in S-box `index` (0-based). The outer bits select
/// the row and the four middle bits the column.
#[inline]
pub(crate) fn lookup(index: usize, value: u64) -> u64 {
    let row = ((value >> 4) & 0b10) | (value & 1);
    let col = (value >> 1) & 0xf;
    u64::from(S_BOXES[index][(row * 16 + col) as usize])
}

/// Runs the eight S-boxes on a 48 bits word. S-box 1 reads the leftmost six bits.
#[inline]
pub(crate) fn substitute(value: u64) -> u64 {
    (0..8).fold(0u64, |acc, i| (acc << 4) | lookup(i, (value >> (42 - 6 * i)) & 0x3f))
}

/// Single S-box computation (6 to 4 bits). `sbox` ranges from 1 to 8.
pub fn sbox(sbox: usize, value: u64) -> Result<u64> {
    if !(1..=8).contains(&sbox) {
        return Err(DesError::InvalidSbox(sbox));
    }
    check_width(value, 6)?;
    Ok(lookup(sbox - 1, value))
}

/// All S-boxes computation (48 to 32 bits).
pub fn sboxes(value: u64) -> Result<u64> {
    check_width(value, 48)?;
    Ok(substitute(value))
}
