//! Partial knowledge about a DES secret key.
//!
//! Everything known is kept as a single `(key, mask)` pair over C0D0, the 56
//! bits output of PC1. Because the key schedule rotations add up to a full
//! turn, C0D0 is also C16D16, and knowledge injected at any granularity
//! (subkey, round key, C0D0 or full key) is folded back to that one word
//! before being merged.

use crate::completions::Completions;
use crate::error::{DesError, Result};
use crate::permute::{check_width, expand_c0d0, rotate_for_round, PC1, PC2};

/// Mask of the 56 bits C0D0 word.
pub(crate) const C0D0_MASK: u64 = 0x00ff_ffff_ffff_ffff;

/// A right-aligned value and the mask of its known bits.
///
/// Bits of `value` outside `mask` carry no meaning.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Knowledge {
    /// The (partially) known value.
    pub value: u64,
    /// Set bits mark the known bits of `value`.
    pub mask: u64,
}

impl Knowledge {
    /// Builds a fragment from a value and the mask of its known bits.
    pub const fn new(value: u64, mask: u64) -> Self {
        Self { value, mask }
    }

    /// Number of known bits.
    pub const fn known_bits(&self) -> u32 {
        self.mask.count_ones()
    }

    fn check(&self, bits: u32) -> Result<()> {
        check_width(self.mask, bits)?;
        check_width(self.value, bits)
    }

    fn map(self, f: impl Fn(u64) -> u64) -> Self {
        Self::new(f(self.value), f(self.mask))
    }
}

/// What happened to a fragment merged into a [`KeyManager`].
#[must_use]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Merge {
    /// The fragment agreed with everything already known and was recorded.
    Clean,
    /// The fragment disagreed with known bits and overwrote them (forced merge).
    Forced,
    /// The fragment disagreed with known bits and was discarded.
    Conflict,
}

impl Merge {
    /// True when the fragment was recorded.
    pub const fn applied(self) -> bool {
        !matches!(self, Merge::Conflict)
    }

    /// True when the fragment disagreed with previous knowledge.
    pub const fn conflicted(self) -> bool {
        !matches!(self, Merge::Clean)
    }
}

fn check_round(round: usize) -> Result<()> {
    match round {
        1..=16 => Ok(()),
        _ => Err(DesError::InvalidRound(round)),
    }
}

fn subkey_shift(subkey: usize) -> Result<usize> {
    match subkey {
        1..=8 => Ok(6 * (8 - subkey)),
        _ => Err(DesError::InvalidSubkey(subkey)),
    }
}

/// Accumulates partial knowledge about one secret key.
///
/// A manager is a plain value: mutation goes through `&mut self`, so merges are
/// serialized by the borrow checker. Share one between threads behind a lock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyManager {
    /// C0D0; bits outside `mask` are kept at 0.
    key: u64,
    mask: u64,
}

impl KeyManager {
    /// A manager with zero knowledge.
    pub const fn new() -> Self {
        Self { key: 0, mask: 0 }
    }

    /// Number of known bits of C0D0 (0 to 56).
    pub const fn known(&self) -> u32 {
        self.mask.count_ones()
    }

    /// Number of unknown bits of C0D0 (0 to 56).
    pub const fn unknown(&self) -> u32 {
        56 - self.known()
    }

    /// Injects a 6 bits subkey of round key `round` (1..=16). Subkey 1 is the
    /// leftmost one, feeding S-box 1, and subkey 8 the rightmost.
    pub fn set_subkey(
        &mut self,
        round: usize,
        subkey: usize,
        fragment: Knowledge,
        force: bool,
    ) -> Result<Merge> {
        let shift = subkey_shift(subkey)?;
        fragment.check(6)?;
        self.set_round_key(round, fragment.map(|w| w << shift), force)
    }

    /// Injects a 48 bits round key of round `round` (1..=16).
    pub fn set_round_key(
        &mut self,
        round: usize,
        fragment: Knowledge,
        force: bool,
    ) -> Result<Merge> {
        check_round(round)?;
        fragment.check(48)?;
        // CrDr rotated by the shifts of rounds r+1..=16 is C16D16 = C0D0.
        let c0d0 = ((round + 1)..=16).fold(fragment.map(|w| PC2.scatter(w).0), |cd, r| {
            cd.map(|w| rotate_for_round(w, r))
        });
        Ok(self.merge(c0d0, force))
    }

    /// Injects a 56 bits C0D0 (the secret key after PC1).
    pub fn set_c0d0(&mut self, fragment: Knowledge, force: bool) -> Result<Merge> {
        fragment.check(56)?;
        Ok(self.merge(fragment, force))
    }

    /// Injects a 64 bits secret key. Parity bits are ignored.
    pub fn set_key(&mut self, fragment: Knowledge, force: bool) -> Merge {
        self.merge(fragment.map(|w| PC1.select(w)), force)
    }

    /// Knowledge about subkey `subkey` (1..=8) of round key `round` (1..=16).
    pub fn get_subkey(&self, round: usize, subkey: usize) -> Result<Knowledge> {
        let shift = subkey_shift(subkey)?;
        Ok(self.get_round_key(round)?.map(|w| (w >> shift) & 0x3f))
    }

    /// Knowledge about round key `round` (1..=16).
    pub fn get_round_key(&self, round: usize) -> Result<Knowledge> {
        check_round(round)?;
        let cd = (1..=round).fold(self.get_c0d0(), |cd, r| cd.map(|w| rotate_for_round(w, r)));
        Ok(cd.map(|w| PC2.select(w)))
    }

    /// Knowledge about C0D0.
    pub const fn get_c0d0(&self) -> Knowledge {
        Knowledge::new(self.key, self.mask)
    }

    /// Knowledge about the 64 bits secret key, parity bits computed.
    ///
    /// A parity bit is reported known only when the 7 data bits of its byte
    /// are all known.
    pub fn get_key(&self) -> Knowledge {
        let data_mask = PC1.scatter(self.mask).0;
        let parity_mask = (0..8u32)
            .filter(|&byte| (data_mask >> (8 * byte + 1)) & 0x7f == 0x7f)
            .fold(0u64, |acc, byte| acc | (1u64 << (8 * byte)));
        Knowledge::new(expand_c0d0(self.key), data_mask | parity_mask)
    }

    /// Iterates over every full key consistent with the known bits, unknown
    /// bits counting up from all zeros.
    ///
    /// The iterator works on a snapshot of the manager. It yields
    /// `2^unknown()` keys, so callers should bound [`Self::unknown`] first:
    /// the cost is exponential in the number of unknown bits.
    pub fn completions(&self) -> Completions {
        Completions::new(self.key, self.mask)
    }

    fn merge(&mut self, fragment: Knowledge, force: bool) -> Merge {
        let value = fragment.value & fragment.mask;
        let conflict = (self.key ^ value) & self.mask & fragment.mask;
        if conflict == 0 || force {
            self.mask |= fragment.mask;
            self.key = (self.key & !fragment.mask) | value;
        }
        match (conflict == 0, force) {
            (true, _) => Merge::Clean,
            (false, true) => Merge::Forced,
            (false, false) => Merge::Conflict,
        }
    }
}
