//! Randomness as an injected capability.
//!
//! Every stochastic draw in the synthesizer goes through [`RandomSource`], so
//! the headend can use an entropy-seeded RNG while tests replay a fixed
//! sequence and assert exact values.

use rand::{Rng, SeedableRng, rngs::StdRng};

pub trait RandomSource {
    /// Uniform draw in `[lo, hi]`. Returns `lo` when the range is empty.
    fn uniform(&mut self, lo: f64, hi: f64) -> f64;

    /// Draw in `[0, 1)`, used for probability rolls.
    fn unit(&mut self) -> f64 {
        self.uniform(0.0, 1.0).min(1.0 - f64::EPSILON)
    }

    /// Uniform integer in `[lo, hi]` (both inclusive).
    fn integer(&mut self, lo: i64, hi: i64) -> i64 {
        if hi <= lo {
            return lo;
        }
        let span = (hi - lo + 1) as f64;
        let offset = (self.unit() * span).floor() as i64;
        (lo + offset).min(hi)
    }
}

/// `rand`-backed source for live requests.
#[derive(Debug, Clone)]
pub struct RngSource {
    rng: StdRng,
}

impl RngSource {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible stream; the same seed yields the same telemetry.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for RngSource {
    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        if hi <= lo {
            return lo;
        }
        self.rng.gen_range(lo..=hi)
    }

    fn unit(&mut self) -> f64 {
        self.rng.gen_range(0.0..1.0)
    }

    fn integer(&mut self, lo: i64, hi: i64) -> i64 {
        if hi <= lo {
            return lo;
        }
        self.rng.gen_range(lo..=hi)
    }
}

/// Replays a fixed cycle of fractions in `[0, 1]`.
///
/// `uniform(lo, hi)` maps the next fraction `f` onto `lo + f * (hi - lo)`, so
/// a fraction of 0.5 always lands on the midpoint of whatever range the
/// caller asks for.
#[derive(Debug, Clone)]
pub struct SequenceRandom {
    fractions: Vec<f64>,
    cursor: usize,
}

impl SequenceRandom {
    pub fn new(fractions: impl Into<Vec<f64>>) -> Self {
        let fractions: Vec<f64> = fractions
            .into()
            .into_iter()
            .map(|f| f.clamp(0.0, 1.0))
            .collect();
        Self {
            fractions,
            cursor: 0,
        }
    }

    /// Every draw returns the same fraction.
    pub fn constant(fraction: f64) -> Self {
        Self::new(vec![fraction])
    }

    /// Number of draws taken so far.
    pub fn draws(&self) -> usize {
        self.cursor
    }

    fn next_fraction(&mut self) -> f64 {
        if self.fractions.is_empty() {
            self.cursor += 1;
            return 0.0;
        }
        let f = self.fractions[self.cursor % self.fractions.len()];
        self.cursor += 1;
        f
    }
}

impl RandomSource for SequenceRandom {
    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        let f = self.next_fraction();
        if hi <= lo {
            return lo;
        }
        lo + f * (hi - lo)
    }
}
