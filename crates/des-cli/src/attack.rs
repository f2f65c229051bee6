//! Last-round correlation attack and leakage simulation.

use anyhow::{bail, Context, Result};
use des_core::{
    e, encipher, hamming_weight, ip, key_schedule, right_half, sbox, sboxes, DesKey, KeyManager,
    Knowledge, Merge,
};
use des_pcc::PccContext;
use rand::{Rng, RngCore};

/// One ciphertext and the side-channel measurement taken while producing it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Trace {
    /// Ciphertext of the experiment.
    pub ciphertext: u64,
    /// Timing or power measurement.
    pub measurement: f64,
}

/// Knobs shared by the attack, the completion search and the demo.
#[derive(Clone, Copy, Debug)]
pub struct AttackConfig {
    /// Number of experiments to use (all available when `None`).
    pub experiments: Option<usize>,
    /// Amplitude of the uniform noise added to simulated measurements.
    pub noise: f64,
    /// Refuse to enumerate more than `2^max_unknown` completions.
    pub max_unknown: u32,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            experiments: None,
            noise: 1.0,
            max_unknown: 24,
        }
    }
}

/// Outcome of the last-round attack.
#[derive(Clone, Debug)]
pub struct Recovered {
    /// Best subkey guess of round 16, S-box 1 first.
    pub subkeys: [u64; 8],
    /// Correlation of each best guess.
    pub scores: [f64; 8],
    /// Knowledge gathered from the guesses.
    pub manager: KeyManager,
}

/// Parses `"<ciphertext-hex> <measurement>"` lines. Blank lines are skipped.
pub fn parse_traces(text: &str) -> Result<Vec<Trace>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(number, line)| -> Result<Trace> {
            let mut fields = line.split_whitespace();
            let (Some(ct), Some(m), None) = (fields.next(), fields.next(), fields.next()) else {
                bail!("line {}: expected a ciphertext and a measurement", number + 1);
            };
            let ciphertext =
                crate::parse_hex(ct, 64).with_context(|| format!("line {}", number + 1))?;
            let measurement = m
                .parse::<f64>()
                .with_context(|| format!("line {}: invalid measurement {m:?}", number + 1))?;
            Ok(Trace {
                ciphertext,
                measurement,
            })
        })
        .collect()
}

/// E(R15) for each trace. R15 is L16, the right half of IP(ciphertext).
fn expanded_r15(traces: &[Trace]) -> Result<Vec<u64>> {
    traces
        .iter()
        .map(|t| -> Result<u64> { Ok(e(right_half(ip(t.ciphertext)?))?) })
        .collect()
}

/// For every S-box, correlates the Hamming weight of its round-16 output under
/// each of the 64 subkey guesses with the measurements, keeps the best guess
/// and injects it into a fresh [`KeyManager`].
pub fn last_round_attack(traces: &[Trace]) -> Result<Recovered> {
    let expanded = expanded_r15(traces)?;
    let mut subkeys = [0u64; 8];
    let mut scores = [0f64; 8];
    let mut manager = KeyManager::new();
    for n in 1..=8usize {
        let mut ctx = PccContext::new(64)?;
        for (trace, &er) in traces.iter().zip(&expanded) {
            ctx.insert_x(trace.measurement)?;
            let chunk = (er >> (6 * (8 - n))) & 0x3f;
            for guess in 0..64u64 {
                let hw = hamming_weight(sbox(n, chunk ^ guess)?);
                ctx.insert_y(guess as usize, f64::from(hw))?;
            }
        }
        let pcc = ctx.consolidate()?;
        let (best, score) = pcc
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, v)| !v.is_nan())
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .context("no usable correlation (constant measurements?)")?;
        subkeys[n - 1] = best as u64;
        scores[n - 1] = score;
        let merge = manager.set_subkey(16, n, Knowledge::new(best as u64, 0x3f), false)?;
        debug_assert_eq!(merge, Merge::Clean);
    }
    Ok(Recovered {
        subkeys,
        scores,
        manager,
    })
}

/// Looks for the completion of `manager` that enciphers `plaintext` into
/// `ciphertext`.
pub fn search_completions(
    manager: &KeyManager,
    plaintext: u64,
    ciphertext: u64,
    config: &AttackConfig,
) -> Result<Option<u64>> {
    if manager.unknown() > config.max_unknown {
        bail!(
            "{} unknown bits exceed the limit of {} (2^{} candidate keys)",
            manager.unknown(),
            config.max_unknown,
            manager.unknown()
        );
    }
    Ok(manager
        .completions()
        .find(|&key| encipher(plaintext, &key_schedule(&DesKey(key))) == ciphertext))
}

/// Simulated acquisition: random plaintexts enciphered under `key`, each
/// measurement being the Hamming weight of the round-16 S-box outputs plus
/// uniform noise in `[-noise, noise]`. Also returns the first plaintext.
pub fn simulate(
    key: &DesKey,
    experiments: usize,
    noise: f64,
    rng: &mut impl RngCore,
) -> Result<(u64, Vec<Trace>)> {
    let round_keys = key_schedule(key);
    let k16 = round_keys.get(16)?;
    let mut first = None;
    let mut traces = Vec::with_capacity(experiments);
    for _ in 0..experiments {
        let plaintext = rng.next_u64();
        first.get_or_insert(plaintext);
        let ciphertext = encipher(plaintext, &round_keys);
        let r15 = right_half(ip(ciphertext)?);
        let leak = f64::from(hamming_weight(sboxes(e(r15)? ^ k16)?));
        let jitter = if noise > 0.0 {
            rng.gen_range(-noise..=noise)
        } else {
            0.0
        };
        traces.push(Trace {
            ciphertext,
            measurement: leak + jitter,
        });
    }
    let plaintext = first.context("at least one experiment is required")?;
    Ok((plaintext, traces))
}

#[cfg(test)]
mod tests {
    use super::*;
    use des_core::set_parity_bits;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn parses_trace_lines() {
        let traces = parse_traces("0x85e813540f0ab405 12.5\n\n00000000000000ff 3\n").unwrap();
        assert_eq!(
            traces,
            vec![
                Trace {
                    ciphertext: 0x85e8_1354_0f0a_b405,
                    measurement: 12.5,
                },
                Trace {
                    ciphertext: 0xff,
                    measurement: 3.0,
                },
            ]
        );
        assert!(parse_traces("00ff").is_err());
        assert!(parse_traces("00ff 1.0 extra").is_err());
        assert!(parse_traces("zz 1.0").is_err());
        assert!(parse_traces("00ff fast").is_err());
    }

    #[test]
    fn noiseless_simulation_recovers_the_key() {
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let key = DesKey(set_parity_bits(rng.next_u64()));
        let (plaintext, traces) = simulate(&key, 5000, 0.0, &mut rng).unwrap();

        let recovered = last_round_attack(&traces).unwrap();
        let k16 = key_schedule(&key).get(16).unwrap();
        let expected: Vec<u64> = (1..=8).map(|n| (k16 >> (6 * (8 - n))) & 0x3f).collect();
        assert_eq!(recovered.subkeys.to_vec(), expected);
        assert_eq!(recovered.manager.known(), 48);

        let config = AttackConfig::default();
        let ciphertext = traces[0].ciphertext;
        let found = search_completions(&recovered.manager, plaintext, ciphertext, &config);
        assert_eq!(found.unwrap(), Some(key.0));
    }

    #[test]
    fn completion_search_is_bounded() {
        let config = AttackConfig {
            max_unknown: 8,
            ..AttackConfig::default()
        };
        let err = search_completions(&KeyManager::new(), 0, 0, &config).unwrap_err();
        assert!(err.to_string().contains("56 unknown bits"));
    }
}
