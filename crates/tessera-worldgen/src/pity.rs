//! Pseudo-random distribution with a pity ramp.
//!
//! Each attempt succeeds with probability `C * (failures + 1)`, capped at 1,
//! so long droughts become impossible. `C` is calibrated once so that the
//! long-run success rate still equals the requested chance.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

const CALIBRATION_STEPS: usize = 80;
/// Survival probability below which the expectation tail is dropped.
const TAIL_EPSILON: f64 = 1e-15;
/// Ramp constants below this use the asymptotic expansion instead of the
/// series, whose length grows like `1 / sqrt(constant)`.
const ASYMPTOTIC_BELOW: f64 = 1e-5;

/// Errors from constructing a [`PityRng`].
#[derive(Debug, Error, PartialEq)]
pub enum PityRngError {
    #[error("chance {0} is outside [0, 1]")]
    InvalidChance(f64),
}

/// A Bernoulli source whose per-attempt chance ramps up with each failure.
#[derive(Clone, Debug)]
pub struct PityRng {
    rng: ChaCha8Rng,
    target: f64,
    constant: f64,
    failures: u32,
}

impl PityRng {
    /// Create a generator for `chance`, seeded from the thread RNG.
    pub fn new(chance: f64) -> Result<Self, PityRngError> {
        Self::build(chance, ChaCha8Rng::from_rng(&mut rand::rng()))
    }

    /// Create a generator for `chance` with a fixed seed.
    pub fn with_seed(chance: f64, seed: i64) -> Result<Self, PityRngError> {
        Self::build(chance, ChaCha8Rng::seed_from_u64(seed as u64))
    }

    fn build(chance: f64, rng: ChaCha8Rng) -> Result<Self, PityRngError> {
        if !(0.0..=1.0).contains(&chance) {
            return Err(PityRngError::InvalidChance(chance));
        }
        let constant = calibrate(chance);
        tracing::trace!(chance, constant, "calibrated pity ramp");
        Ok(Self {
            rng,
            target: chance,
            constant,
            failures: 0,
        })
    }

    /// Roll once. A success resets the failure count.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> bool {
        let chance = self.chance_now();
        let hit = chance >= 1.0 || (chance > 0.0 && self.rng.random::<f64>() < chance);
        if hit {
            self.failures = 0;
        } else {
            self.failures = self.failures.saturating_add(1);
        }
        hit
    }

    /// Probability that the next roll succeeds.
    pub fn chance_now(&self) -> f64 {
        ramp(self.constant, u64::from(self.failures) + 1)
    }

    /// Consecutive failures since the last success.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Clear the failure count without touching the random stream.
    pub fn reset(&mut self) {
        self.failures = 0;
    }

    /// Restart the random stream from `seed` and clear the failure count.
    pub fn reseed(&mut self, seed: i64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed as u64);
        self.reset();
    }

    /// The calibrated ramp constant `C`.
    pub fn constant(&self) -> f64 {
        self.constant
    }

    /// The requested long-run success rate.
    pub fn target(&self) -> f64 {
        self.target
    }
}

fn ramp(constant: f64, attempt: u64) -> f64 {
    (constant * attempt as f64).clamp(0.0, 1.0)
}

/// Expected attempts per success for ramp constant `constant > 0`.
fn expected_attempts(constant: f64) -> f64 {
    if constant < ASYMPTOTIC_BELOW {
        asymptotic_attempts(constant)
    } else {
        series_attempts(constant)
    }
}

fn series_attempts(constant: f64) -> f64 {
    let mut expected = 0.0;
    let mut survival = 1.0;
    let mut attempt = 1u64;
    loop {
        let p = ramp(constant, attempt);
        expected += attempt as f64 * survival * p;
        survival *= 1.0 - p;
        if p >= 1.0 || survival < TAIL_EPSILON {
            return expected;
        }
        attempt += 1;
    }
}

/// Ramanujan's Q-function expansion with `n = 1 / constant`:
/// `sqrt(pi n / 2) - 1/3 + sqrt(pi / 2n) / 12 - 4 / 135n`.
///
/// Below [`ASYMPTOTIC_BELOW`] the dropped terms are under `1e-12` relative.
fn asymptotic_attempts(constant: f64) -> f64 {
    let n = constant.recip();
    let half_pi = std::f64::consts::FRAC_PI_2;
    (half_pi * n).sqrt() - 1.0 / 3.0 + (half_pi / n).sqrt() / 12.0 - 4.0 / (135.0 * n)
}

/// Bisect for the constant whose success rate `1 / E[attempts]` is `chance`.
fn calibrate(chance: f64) -> f64 {
    if chance <= 0.0 {
        return 0.0;
    }
    if chance >= 1.0 {
        return 1.0;
    }
    let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
    for _ in 0..CALIBRATION_STEPS {
        let mid = 0.5 * (lo + hi);
        if mid <= 0.0 {
            break;
        }
        // The rate grows with the constant.
        if 1.0 / expected_attempts(mid) < chance {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}
