//! Error types for the DES primitives and the key manager.

use thiserror::Error;

/// Failures reported by the DES primitives and the key manager.
///
/// A merge conflict is not an error; see [`crate::Merge`].
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DesError {
    /// A value has set bits above its declared width.
    #[error("value {value:#x} does not fit in {bits} bits")]
    TooWide {
        /// The offending value.
        value: u64,
        /// The declared width in bits.
        bits: u32,
    },

    /// A round key number outside `1..=16`.
    #[error("invalid round key number: {0} (expected 1..=16)")]
    InvalidRound(usize),

    /// A subkey number outside `1..=8`.
    #[error("invalid subkey number: {0} (expected 1..=8)")]
    InvalidSubkey(usize),

    /// An S-box number outside `1..=8`.
    #[error("invalid S-box number: {0} (expected 1..=8)")]
    InvalidSbox(usize),

    /// Duplicated bits of an expanded word disagree, so it has no E preimage.
    #[error("duplicated bits of {value:#014x} disagree (input positions {mismatch:#010x})")]
    AmbiguousExpansion {
        /// The 48 bits word that was inverted.
        value: u64,
        /// Right-aligned 32 bits mask of the input positions whose copies differ.
        mismatch: u64,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DesError>;
