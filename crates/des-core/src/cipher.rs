//! DES key schedule and block encipherment/decipherment.

use crate::block::{left_half, right_half};
use crate::key::{DesKey, RoundKeys};
use crate::permute::{rotate_for_round, FP, IP, PC1, PC2};
use crate::round::feistel;

/// Known-answer vectors: `(key, plaintext, ciphertext)`.
const CHECK_VECTORS: [(u64, u64, u64); 4] = [
    (0x1334_5779_9bbc_dff1, 0x0123_4567_89ab_cdef, 0x85e8_1354_0f0a_b405),
    (0x0e32_9232_ea6d_0d73, 0x8787_8787_8787_8787, 0x0000_0000_0000_0000),
    (0x0123_4567_89ab_cdef, 0x4e6f_7720_6973_2074, 0x3fa4_0e8a_984d_4815),
    (0x0101_0101_0101_0101, 0x8000_0000_0000_0000, 0x95f8_a5e5_dd31_d900),
];

/// Computes the sixteen round keys of a secret key. Parity bits are ignored.
pub fn key_schedule(key: &DesKey) -> RoundKeys {
    let mut cd = PC1.select(key.0);
    let mut round_keys = [0u64; 16];
    for (round, rk) in (1..=16).zip(round_keys.iter_mut()) {
        cd = rotate_for_round(cd, round);
        *rk = PC2.select(cd);
    }
    RoundKeys(round_keys)
}

fn feistel_network(block: u64, round_keys: impl Iterator<Item = u64>) -> u64 {
    let permuted = IP.select(block);
    let (left, right) = round_keys.fold(
        (left_half(permuted), right_half(permuted)),
        |(left, right), rk| (right, left ^ feistel(rk, right)),
    );
    // The halves are swapped after the last round.
    FP.select((right << 32) | left)
}

/// Enciphers a 64 bits block with a pre-computed key schedule.
pub fn encipher(block: u64, round_keys: &RoundKeys) -> u64 {
    feistel_network(block, round_keys.iter())
}

/// Deciphers a 64 bits block with a pre-computed key schedule.
pub fn decipher(block: u64, round_keys: &RoundKeys) -> u64 {
    feistel_network(block, round_keys.iter().rev())
}

/// Functional verification against known-answer vectors, in both directions.
pub fn self_test() -> bool {
    CHECK_VECTORS.iter().all(|&(key, plaintext, ciphertext)| {
        let round_keys = key_schedule(&DesKey(key));
        encipher(plaintext, &round_keys) == ciphertext
            && decipher(ciphertext, &round_keys) == plaintext
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permute::set_parity_bits;
    use rand::RngCore;

    const REF_KEY: u64 = 0x1334_5779_9bbc_dff1;
    const REF_PLAIN: u64 = 0x0123_4567_89ab_cdef;
    const REF_CIPHER: u64 = 0x85e8_1354_0f0a_b405;

    #[test]
    fn key_schedule_matches_reference() {
        let round_keys = key_schedule(&DesKey(REF_KEY));
        assert_eq!(round_keys.get(1).unwrap(), 0x1b02_effc_7072);
        assert_eq!(round_keys.get(16).unwrap(), 0xcb3d_8b0e_17f5);
        assert!(round_keys.get(0).is_err());
        assert!(round_keys.get(17).is_err());
    }

    #[test]
    fn encipher_matches_reference_vector() {
        let round_keys = key_schedule(&DesKey::from(REF_KEY.to_be_bytes()));
        assert_eq!(encipher(REF_PLAIN, &round_keys), REF_CIPHER);
    }

    #[test]
    fn decipher_matches_reference_vector() {
        let round_keys = key_schedule(&DesKey(REF_KEY));
        assert_eq!(decipher(REF_CIPHER, &round_keys), REF_PLAIN);
    }

    #[test]
    fn self_test_passes() {
        assert!(self_test());
    }

    #[test]
    fn parity_bits_do_not_change_the_schedule() {
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let key = rng.next_u64();
            assert_eq!(
                key_schedule(&DesKey(key)),
                key_schedule(&DesKey(set_parity_bits(key)))
            );
        }
    }

    #[test]
    fn encipher_decipher_round_trip_random() {
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let round_keys = key_schedule(&DesKey(rng.next_u64()));
            let block = rng.next_u64();
            let ct = encipher(block, &round_keys);
            assert_eq!(decipher(ct, &round_keys), block);
        }
    }
}
