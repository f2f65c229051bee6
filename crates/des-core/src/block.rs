//! Block and word helpers.

/// Returns the 32 bits left half of a 64 bits word.
#[inline]
pub fn left_half(value: u64) -> u64 {
    value >> 32
}

/// Returns the 32 bits right half of a 64 bits word.
#[inline]
pub fn right_half(value: u64) -> u64 {
    value & 0xffff_ffff
}

/// Number of set bits of a word.
#[inline]
pub fn hamming_weight(value: u64) -> u32 {
    value.count_ones()
}

/// Number of bit positions at which two words differ.
#[inline]
pub fn hamming_distance(a: u64, b: u64) -> u32 {
    (a ^ b).count_ones()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halves_split_a_block() {
        let block = 0x0123_4567_89ab_cdef;
        assert_eq!(left_half(block), 0x0123_4567);
        assert_eq!(right_half(block), 0x89ab_cdef);
        assert_eq!((left_half(block) << 32) | right_half(block), block);
    }

    #[test]
    fn weights_and_distances() {
        assert_eq!(hamming_weight(0), 0);
        assert_eq!(hamming_weight(0xf000_0000), 4);
        assert_eq!(hamming_distance(0xff, 0x0f), 4);
        assert_eq!(hamming_distance(u64::MAX, u64::MAX), 0);
    }
}
