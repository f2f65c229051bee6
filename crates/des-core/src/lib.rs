//! Bit-exact DES primitives and a manager for partial knowledge of a DES key.
//!
//! This crate provides:
//! - The permutations of FIPS 46-3 (IP, FP, E, P, PC1, PC2) and their inverses,
//!   the S-boxes and the key schedule rotations, on right-aligned `u64` words.
//! - The key schedule and single-block encipherment/decipherment.
//! - [`KeyManager`], which merges key fragments learned at subkey, round key,
//!   C0D0 or full key granularity, detects conflicts between them, and
//!   enumerates every key consistent with what is known.
//!
//! Bit positions follow the standard: position 1 is the most significant bit
//! of a word. The implementation is not side-channel hardened; it is meant to
//! model the cipher when attacking it.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod block;
mod cipher;
mod completions;
mod error;
mod key;
mod manager;
mod permute;
mod round;
mod sbox;
mod tables;

pub use crate::block::{hamming_distance, hamming_weight, left_half, right_half};
pub use crate::cipher::{decipher, encipher, key_schedule, self_test};
pub use crate::completions::Completions;
pub use crate::error::{DesError, Result};
pub use crate::key::{DesKey, RoundKeys};
pub use crate::manager::{KeyManager, Knowledge, Merge};
pub use crate::permute::{
    e, fp, inv_e, inv_fp, inv_ip, inv_p, inv_pc1, inv_pc2, ip, p, pc1, pc2, rotate_left,
    rotate_right, set_parity_bits,
};
pub use crate::round::f;
pub use crate::sbox::{sbox, sboxes};
pub use crate::tables::LEFT_SHIFTS;
