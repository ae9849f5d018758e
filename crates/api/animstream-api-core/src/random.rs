//! Random source injected into the timeline engine.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// Uniform draws used for keyframe variability and audio selection.
pub trait RandomSource {
    /// Uniform integer in the inclusive range `[min, max]`. Swapped bounds are tolerated.
    fn int_in_range(&mut self, min: i32, max: i32) -> i32;
    /// Uniform float in `[0, 1)`.
    fn unit(&mut self) -> f64;
}

/// PCG-backed generator; one instance per engine.
#[derive(Clone, Debug)]
pub struct PcgRandom {
    rng: Pcg64Mcg,
}

impl PcgRandom {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: Pcg64Mcg::from_entropy(),
        }
    }

    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }
}

impl RandomSource for PcgRandom {
    fn int_in_range(&mut self, min: i32, max: i32) -> i32 {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        self.rng.gen_range(lo..=hi)
    }

    fn unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}
