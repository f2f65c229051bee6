//! Exhaustive enumeration of the unknown bits of a partially known key.

use core::iter::FusedIterator;

use crate::manager::C0D0_MASK;
use crate::permute::expand_c0d0;

/// Iterator over every full key consistent with a [`crate::KeyManager`]
/// snapshot. Created by [`crate::KeyManager::completions`].
///
/// Unknown C0D0 bits count up in binary from all zeros, known bits stay fixed.
/// Each item is a 64 bits key with parity bits computed. The sequence has
/// exactly `2^k` items for `k` unknown bits and cannot be restarted; build a
/// new iterator to go again.
#[derive(Clone, Debug)]
pub struct Completions {
    current: u64,
    mask: u64,
    done: bool,
}

impl Completions {
    pub(crate) fn new(key: u64, mask: u64) -> Self {
        Self {
            current: key & mask,
            mask,
            done: false,
        }
    }

    fn free(&self) -> u64 {
        !self.mask & C0D0_MASK
    }

    /// Number of keys still to be produced.
    pub fn remaining(&self) -> u64 {
        if self.done {
            return 0;
        }
        let free = self.free();
        // Rank of the current unknown bits among the 2^k combinations.
        let (rank, _) = (0..56u32)
            .filter(|&bit| (free >> bit) & 1 == 1)
            .fold((0u64, 0u32), |(rank, digit), bit| {
                (rank | (((self.current >> bit) & 1) << digit), digit + 1)
            });
        (1u64 << free.count_ones()) - rank
    }
}

impl Iterator for Completions {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.done {
            return None;
        }
        let key = expand_c0d0(self.current);
        // Adding mask + 1 carries straight through the known positions, which
        // turns it into a binary increment of the unknown positions only.
        let free = self.free();
        let unknown = ((self.current & free) + self.mask + 1) & free;
        self.current = (self.current & self.mask) | unknown;
        self.done = unknown == 0;
        Some(key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.remaining()) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}

impl FusedIterator for Completions {}
