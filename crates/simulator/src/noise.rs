//! Injectable random sources for the thermal model.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A source of uniformly distributed draws.
///
/// The thermal model scales each tick's temperature drift by a draw from
/// `U(low, high)`. Injecting the source keeps the model deterministic under
/// test.
pub trait NoiseSource: Send {
    /// Draw a value in `[low, high]`.
    fn uniform(&mut self, low: f64, high: f64) -> f64;
}

/// Noise backed by a real random number generator.
pub struct RandomNoise<R> {
    rng: R,
}

impl<R: Rng + Send> RandomNoise<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomNoise<StdRng> {
    /// Seed from the operating system's entropy source.
    pub fn from_os() -> Self {
        Self::new(StdRng::from_os_rng())
    }

    /// Reproducible noise for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng + Send> NoiseSource for RandomNoise<R> {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        self.rng.random_range(low..=high)
    }
}

/// Always returns the same factor, clamped into the requested range.
#[derive(Debug, Clone, Copy)]
pub struct FixedNoise(pub f64);

impl NoiseSource for FixedNoise {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        self.0.clamp(low, high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_noise_stays_in_range() {
        let mut noise = RandomNoise::seeded(7);
        for _ in 0..1000 {
            let v = noise.uniform(0.1, 0.3);
            assert!((0.1..=0.3).contains(&v), "draw {v} out of range");
        }
    }

    #[test]
    fn seeded_noise_is_reproducible() {
        let mut a = RandomNoise::seeded(42);
        let mut b = RandomNoise::seeded(42);
        for _ in 0..10 {
            assert_eq!(a.uniform(0.1, 0.3), b.uniform(0.1, 0.3));
        }
    }

    #[test]
    fn degenerate_range_returns_low() {
        let mut noise = RandomNoise::seeded(1);
        assert_eq!(noise.uniform(0.2, 0.2), 0.2);
    }

    #[test]
    fn fixed_noise_is_clamped() {
        let mut noise = FixedNoise(0.5);
        assert_eq!(noise.uniform(0.1, 0.3), 0.3);
        let mut noise = FixedNoise(0.2);
        assert_eq!(noise.uniform(0.1, 0.3), 0.2);
    }
}
