//! The DES round function.

use crate::error::Result;
use crate::permute::{check_width, E, P};
use crate::sbox::substitute;

/// `P(S(E(value) ^ round_key))`, both inputs already width-checked.
#[inline]
pub(crate) fn feistel(round_key: u64, value: u64) -> u64 {
    P.select(substitute(E.select(value) ^ round_key))
}

/// The F function of the standard (48 bits round key, 32 bits input, 32 bits output).
pub fn f(round_key: u64, value: u64) -> Result<u64> {
    check_width(round_key, 48)?;
    check_width(value, 32)?;
    Ok(feistel(round_key, value))
}
