//! Streaming Pearson correlation coefficients.
//!
//! A [`PccContext`] correlates one random variable X with `ny` random variables
//! Y. Realizations are inserted one X at a time, each followed by exactly one
//! realization of every Y; only running sums are kept, so the number of
//! realizations is unbounded.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

use thiserror::Error;

/// Errors raised by a [`PccContext`].
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PccError {
    /// A context needs at least one Y variable.
    #[error("invalid number of Y random variables: 0")]
    NoVariables,

    /// A Y index outside `0..ny`.
    #[error("invalid Y index: {index} (expected 0..{ny})")]
    InvalidIndex {
        /// The rejected index.
        index: usize,
        /// Number of Y variables of the context.
        ny: usize,
    },

    /// A Y realization was inserted before any X realization.
    #[error("no X realization inserted yet")]
    MissingX,

    /// The same Y received two realizations for one X.
    #[error("Y realization #{0} inserted twice")]
    DuplicateRealization(usize),

    /// Some Y realizations are missing for the current X.
    #[error("missing {0} Y realizations")]
    MissingRealizations(usize),

    /// Fewer than two realizations were inserted.
    #[error("not enough realizations ({0}, min 2)")]
    NotEnoughRealizations(usize),
}

/// Result alias for correlation operations.
pub type Result<T> = std::result::Result<T, PccError>;

/// Running sums for the correlation of X with several Y.
#[derive(Clone, Debug)]
pub struct PccContext {
    nr: usize,
    rx: f64,
    x: f64,
    x2: f64,
    y: Vec<f64>,
    y2: Vec<f64>,
    xy: Vec<f64>,
    filled: Vec<bool>,
    pending: usize,
}

impl PccContext {
    /// Creates a context for `ny` Y variables.
    pub fn new(ny: usize) -> Result<Self> {
        if ny == 0 {
            return Err(PccError::NoVariables);
        }
        Ok(Self {
            nr: 0,
            rx: 0.0,
            x: 0.0,
            x2: 0.0,
            y: vec![0.0; ny],
            y2: vec![0.0; ny],
            xy: vec![0.0; ny],
            filled: vec![false; ny],
            pending: 0,
        })
    }

    /// Number of Y variables.
    pub fn ny(&self) -> usize {
        self.y.len()
    }

    /// Number of X realizations inserted so far.
    pub fn realizations(&self) -> usize {
        self.nr
    }

    /// Inserts a new realization of X. Every Y must have received its
    /// realization for the previous X.
    pub fn insert_x(&mut self, x: f64) -> Result<()> {
        if self.pending != 0 {
            return Err(PccError::MissingRealizations(self.pending));
        }
        self.filled.iter_mut().for_each(|f| *f = false);
        self.pending = self.ny();
        self.rx = x;
        self.x += x;
        self.x2 += x * x;
        self.nr += 1;
        Ok(())
    }

    /// Inserts the realization of Y number `index` (0-based) for the current X.
    pub fn insert_y(&mut self, index: usize, y: f64) -> Result<()> {
        let ny = self.ny();
        if index >= ny {
            return Err(PccError::InvalidIndex { index, ny });
        }
        if self.nr == 0 {
            return Err(PccError::MissingX);
        }
        if self.filled[index] {
            return Err(PccError::DuplicateRealization(index));
        }
        self.y[index] += y;
        self.y2[index] += y * y;
        self.xy[index] += self.rx * y;
        self.filled[index] = true;
        self.pending -= 1;
        Ok(())
    }

    /// Computes the coefficient of every Y from the realizations inserted so far.
    ///
    /// A Y (or X) with zero variance yields `NaN`.
    pub fn consolidate(&self) -> Result<Vec<f64>> {
        if self.pending != 0 {
            return Err(PccError::MissingRealizations(self.pending));
        }
        if self.nr < 2 {
            return Err(PccError::NotEnoughRealizations(self.nr));
        }
        let n = self.nr as f64;
        let sx = (n * self.x2 - self.x * self.x).sqrt();
        Ok(self
            .y
            .iter()
            .zip(&self.y2)
            .zip(&self.xy)
            .map(|((&y, &y2), &xy)| (n * xy - self.x * y) / sx / (n * y2 - y * y).sqrt())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    fn fill(ctx: &mut PccContext, xs: &[f64], ys: impl Fn(usize, f64) -> f64) {
        for &x in xs {
            ctx.insert_x(x).unwrap();
            for i in 0..ctx.ny() {
                ctx.insert_y(i, ys(i, x)).unwrap();
            }
        }
    }

    #[test]
    fn linear_relations_are_fully_correlated() {
        let mut ctx = PccContext::new(3).unwrap();
        let xs = [1.0, 2.0, 4.0, 7.0, 11.0];
        fill(&mut ctx, &xs, |i, x| match i {
            0 => 3.0 * x + 1.0,
            1 => -0.5 * x,
            _ => x * x,
        });
        let pcc = ctx.consolidate().unwrap();
        assert!((pcc[0] - 1.0).abs() < 1e-12);
        assert!((pcc[1] + 1.0).abs() < 1e-12);
        assert!(pcc[2] > 0.9 && pcc[2] < 1.0);
        assert_eq!(ctx.realizations(), 5);
    }

    #[test]
    fn independent_noise_is_weakly_correlated() {
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let mut ctx = PccContext::new(2).unwrap();
        for _ in 0..20_000 {
            let x: f64 = rng.gen();
            ctx.insert_x(x).unwrap();
            ctx.insert_y(0, x + rng.gen::<f64>()).unwrap();
            ctx.insert_y(1, rng.gen()).unwrap();
        }
        let pcc = ctx.consolidate().unwrap();
        assert!((pcc[0] - 0.5f64.sqrt()).abs() < 0.03);
        assert!(pcc[1].abs() < 0.03);
    }

    #[test]
    fn insertion_protocol_is_enforced() {
        assert_eq!(PccContext::new(0).unwrap_err(), PccError::NoVariables);

        let mut ctx = PccContext::new(2).unwrap();
        assert_eq!(ctx.insert_y(0, 1.0), Err(PccError::MissingX));
        assert_eq!(ctx.insert_y(2, 1.0), Err(PccError::InvalidIndex { index: 2, ny: 2 }));
        ctx.insert_x(1.0).unwrap();
        ctx.insert_y(1, 1.0).unwrap();
        assert_eq!(ctx.insert_y(1, 2.0), Err(PccError::DuplicateRealization(1)));
        assert_eq!(ctx.insert_x(2.0), Err(PccError::MissingRealizations(1)));
        assert_eq!(ctx.consolidate(), Err(PccError::MissingRealizations(1)));
        ctx.insert_y(0, 1.0).unwrap();
        assert_eq!(ctx.consolidate(), Err(PccError::NotEnoughRealizations(1)));
        ctx.insert_x(2.0).unwrap();
        ctx.insert_y(0, 3.0).unwrap();
        ctx.insert_y(1, 0.0).unwrap();
        let pcc = ctx.consolidate().unwrap();
        assert!((pcc[0] - 1.0).abs() < 1e-12);
        assert!((pcc[1] + 1.0).abs() < 1e-12);
    }
}
