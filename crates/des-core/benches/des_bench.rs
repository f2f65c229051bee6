use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

use des_core::{encipher, key_schedule, DesKey, KeyManager, Knowledge};

fn bench_cipher(c: &mut Criterion) {
    let mut rng = ChaCha20Rng::from_seed([1u8; 32]);
    let key = DesKey(rng.next_u64());
    let round_keys = key_schedule(&key);
    let block = rng.next_u64();

    let mut group = c.benchmark_group("cipher");
    group.bench_function("key_schedule", |b| b.iter(|| key_schedule(black_box(&key))));
    group.bench_function("encipher", |b| {
        b.iter(|| encipher(black_box(block), &round_keys))
    });
    group.finish();
}

fn bench_key_manager(c: &mut Criterion) {
    let mut rng = ChaCha20Rng::from_seed([2u8; 32]);
    let key = DesKey(rng.next_u64());
    let round_keys = key_schedule(&key);

    let mut group = c.benchmark_group("key_manager");
    group.bench_function("set_subkeys_round_16", |b| {
        b.iter(|| {
            let mut km = KeyManager::new();
            for subkey in 1..=8 {
                let sk = (round_keys.0[15] >> (6 * (8 - subkey))) & 0x3f;
                let _ = km.set_subkey(16, subkey, Knowledge::new(sk, 0x3f), false);
            }
            km
        })
    });

    let mut km = KeyManager::new();
    let _ = km.set_round_key(16, Knowledge::new(round_keys.0[15], 0xffff_ffff_ffff), false);
    group.bench_function("completions_8_unknown", |b| {
        b.iter(|| km.completions().fold(0u64, |acc, k| acc ^ k))
    });
    group.finish();
}

criterion_group!(benches, bench_cipher, bench_key_manager);
criterion_main!(benches);
