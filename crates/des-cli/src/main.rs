//! Command-line interface for DES key schedules and partial-key recovery.

#![forbid(unsafe_code)]

mod attack;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use des_core::{
    decipher, encipher, key_schedule, self_test, set_parity_bits, DesKey, KeyManager, Knowledge,
};
use rand::{CryptoRng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::attack::{last_round_attack, parse_traces, search_completions, simulate, AttackConfig};

/// DES partial-key recovery CLI.
#[derive(Parser)]
#[command(
    name = "deskm",
    version,
    author,
    about = "DES primitives, key schedules and partial-key recovery"
)]
struct Cli {
    /// Do not print progress messages on stderr.
    #[arg(long, global = true, default_value_t = false)]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the known-answer self test of the DES implementation.
    Check,
    /// Print the sixteen round keys of a secret key.
    Schedule {
        /// 64 bits secret key as hex.
        #[arg(long, value_name = "HEX")]
        key: String,
    },
    /// Encipher one 64 bits block.
    Enc {
        /// 64 bits secret key as hex.
        #[arg(long, value_name = "HEX")]
        key: String,
        /// 64 bits plaintext as hex.
        #[arg(long, value_name = "HEX")]
        block: String,
    },
    /// Decipher one 64 bits block.
    Dec {
        /// 64 bits secret key as hex.
        #[arg(long, value_name = "HEX")]
        key: String,
        /// 64 bits ciphertext as hex.
        #[arg(long, value_name = "HEX")]
        block: String,
    },
    /// Recover the last round key from "<ciphertext> <measurement>" lines.
    Attack {
        /// Data file with one experiment per line.
        #[arg(long, value_name = "FILE")]
        data: PathBuf,
        /// Number of experiments to use (default: all).
        #[arg(long)]
        experiments: Option<usize>,
        /// Known plaintext, to search the remaining key bits.
        #[arg(long, value_name = "HEX", requires = "ciphertext")]
        plaintext: Option<String>,
        /// Ciphertext of the known plaintext.
        #[arg(long, value_name = "HEX", requires = "plaintext")]
        ciphertext: Option<String>,
        /// Maximum number of unknown bits to enumerate.
        #[arg(long, default_value_t = 24)]
        max_unknown: u32,
    },
    /// Search the completions of a partially known key with a known pair.
    Complete {
        /// Known bits of the 64 bits key as hex.
        #[arg(long, value_name = "HEX")]
        value: String,
        /// Mask of the known bits as hex (parity bits are ignored).
        #[arg(long, value_name = "HEX")]
        mask: String,
        /// Known plaintext.
        #[arg(long, value_name = "HEX")]
        plaintext: String,
        /// Ciphertext of the known plaintext.
        #[arg(long, value_name = "HEX")]
        ciphertext: String,
        /// Maximum number of unknown bits to enumerate.
        #[arg(long, default_value_t = 24)]
        max_unknown: u32,
    },
    /// Simulate leakage for a random key, attack it and search the rest.
    Demo {
        /// Optional RNG seed for reproducibility.
        #[arg(long)]
        seed: Option<u64>,
        /// Number of simulated experiments.
        #[arg(long, default_value_t = 5000)]
        experiments: usize,
        /// Amplitude of the uniform measurement noise.
        #[arg(long, default_value_t = 1.0)]
        noise: f64,
    },
}

/// Progress messages go to stderr unless `--quiet` was given.
struct Reporter {
    quiet: bool,
}

impl Reporter {
    fn progress(&self, message: impl std::fmt::Display) {
        if !self.quiet {
            eprintln!("{message}");
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let reporter = Reporter { quiet: cli.quiet };
    match cli.command {
        Commands::Check => cmd_check(&reporter),
        Commands::Schedule { key } => cmd_schedule(&key),
        Commands::Enc { key, block } => cmd_cipher(&key, &block, true),
        Commands::Dec { key, block } => cmd_cipher(&key, &block, false),
        Commands::Attack {
            data,
            experiments,
            plaintext,
            ciphertext,
            max_unknown,
        } => {
            let config = AttackConfig {
                experiments,
                max_unknown,
                ..AttackConfig::default()
            };
            let pair = match (plaintext, ciphertext) {
                (Some(p), Some(c)) => Some((parse_hex(&p, 64)?, parse_hex(&c, 64)?)),
                _ => None,
            };
            cmd_attack(&reporter, &data, pair, &config)
        }
        Commands::Complete {
            value,
            mask,
            plaintext,
            ciphertext,
            max_unknown,
        } => {
            let config = AttackConfig {
                max_unknown,
                ..AttackConfig::default()
            };
            let known = Knowledge::new(parse_hex(&value, 64)?, parse_hex(&mask, 64)?);
            let pair = (parse_hex(&plaintext, 64)?, parse_hex(&ciphertext, 64)?);
            cmd_complete(&reporter, known, pair, &config)
        }
        Commands::Demo {
            seed,
            experiments,
            noise,
        } => {
            let config = AttackConfig {
                experiments: Some(experiments),
                noise,
                ..AttackConfig::default()
            };
            cmd_demo(&reporter, seed, &config)
        }
    }
}

fn cmd_check(reporter: &Reporter) -> Result<()> {
    if !self_test() {
        bail!("DES functional test failed");
    }
    reporter.progress("DES functional test passed");
    Ok(())
}

fn cmd_schedule(key_hex: &str) -> Result<()> {
    let key = DesKey(parse_hex(key_hex, 64)?);
    let round_keys = key_schedule(&key);
    for (round, rk) in (1..=16).zip(round_keys.iter()) {
        println!("K{round:02}: {rk:012x}");
    }
    Ok(())
}

fn cmd_cipher(key_hex: &str, block_hex: &str, encrypt: bool) -> Result<()> {
    let round_keys = key_schedule(&DesKey(parse_hex(key_hex, 64)?));
    let block = parse_hex(block_hex, 64)?;
    let out = if encrypt {
        encipher(block, &round_keys)
    } else {
        decipher(block, &round_keys)
    };
    println!("{out:016x}");
    Ok(())
}

fn cmd_attack(
    reporter: &Reporter,
    data: &Path,
    pair: Option<(u64, u64)>,
    config: &AttackConfig,
) -> Result<()> {
    if !self_test() {
        bail!("DES functional test failed");
    }
    let text = fs::read_to_string(data).with_context(|| format!("read {}", data.display()))?;
    let mut traces = parse_traces(&text)?;
    if let Some(n) = config.experiments {
        if n > traces.len() {
            bail!("{} experiments requested, {} available", n, traces.len());
        }
        traces.truncate(n);
    }
    if traces.len() < 2 {
        bail!("at least 2 experiments are required ({} given)", traces.len());
    }
    reporter.progress(format!("attacking with {} experiments", traces.len()));
    let km = report_attack(reporter, &traces)?;
    if let Some((plaintext, ciphertext)) = pair {
        let key = search_completions(&km, plaintext, ciphertext, config)?
            .context("no completion matches the known plaintext/ciphertext pair")?;
        println!("key: {key:016x}");
    }
    Ok(())
}

fn report_attack(reporter: &Reporter, traces: &[attack::Trace]) -> Result<KeyManager> {
    let recovered = last_round_attack(traces)?;
    for (n, (sk, score)) in recovered.subkeys.iter().zip(&recovered.scores).enumerate() {
        reporter.progress(format!("S-box {}: subkey {sk:02x} (pcc {score:.4})", n + 1));
    }
    let rk = recovered.manager.get_round_key(16)?;
    println!("K16: {:012x}", rk.value);
    reporter.progress(format!("{} of 56 key bits known", recovered.manager.known()));
    Ok(recovered.manager)
}

fn cmd_complete(
    reporter: &Reporter,
    known: Knowledge,
    (plaintext, ciphertext): (u64, u64),
    config: &AttackConfig,
) -> Result<()> {
    let mut km = KeyManager::new();
    let _ = km.set_key(known, false);
    reporter.progress(format!(
        "{} unknown bits, {} candidate keys",
        km.unknown(),
        1u64 << km.unknown()
    ));
    let key = search_completions(&km, plaintext, ciphertext, config)?
        .context("no completion matches the known plaintext/ciphertext pair")?;
    println!("key: {key:016x}");
    Ok(())
}

fn cmd_demo(reporter: &Reporter, seed: Option<u64>, config: &AttackConfig) -> Result<()> {
    let mut rng = seeded_rng(seed);
    let key = DesKey(set_parity_bits(rng.next_u64()));
    let experiments = config.experiments.unwrap_or(5000);
    reporter.progress(format!(
        "simulating {experiments} experiments (noise ±{})",
        config.noise
    ));
    let (plaintext, traces) = simulate(&key, experiments, config.noise, &mut rng)?;
    let km = report_attack(reporter, &traces)?;
    let ciphertext = traces[0].ciphertext;
    let found = search_completions(&km, plaintext, ciphertext, config)?;

    println!("demo key: {:016x}", key.0);
    match found {
        Some(k) if k == key.0 => {
            println!("recovered: {k:016x}");
            Ok(())
        }
        Some(k) => bail!("recovered key {k:016x} differs from the demo key"),
        None => bail!("attack failed: no completion matches (try more experiments)"),
    }
}

/// Parses a hex value (optional `0x` prefix) of at most `bits` bits.
pub(crate) fn parse_hex(text: &str, bits: u32) -> Result<u64> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.is_empty() {
        bail!("empty hex value");
    }
    let padded = if digits.len() % 2 == 1 {
        format!("0{digits}")
    } else {
        digits.to_string()
    };
    let bytes = hex::decode(&padded).with_context(|| format!("decode hex {text:?}"))?;
    let bytes = &bytes[bytes.iter().take_while(|&&b| b == 0).count()..];
    if bytes.len() > 8 {
        bail!("{text} does not fit in 64 bits");
    }
    let value = bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b));
    if bits < 64 && value >> bits != 0 {
        bail!("{text} does not fit in {bits} bits");
    }
    Ok(value)
}

fn seeded_rng(seed: Option<u64>) -> impl RngCore + CryptoRng {
    match seed {
        Some(value) => ChaCha20Rng::seed_from_u64(value),
        None => {
            let mut seed_bytes = [0u8; 32];
            rand::rngs::OsRng.fill_bytes(&mut seed_bytes);
            ChaCha20Rng::from_seed(seed_bytes)
        }
    }
}
