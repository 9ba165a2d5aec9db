use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform draws in `[0, 1)`. The resolver never reads a global
/// generator; callers hand it one of these.
pub trait RandomSource {
    fn unit_draw(&mut self) -> f64;
}

/// Default generator backed by `StdRng`.
///
/// Seed it for deterministic replays, or pull from OS entropy.
pub struct WheelRng {
    inner: StdRng,
}

impl WheelRng {
    pub fn from_entropy() -> Self {
        Self {
            inner: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for WheelRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl RandomSource for WheelRng {
    fn unit_draw(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }
}
