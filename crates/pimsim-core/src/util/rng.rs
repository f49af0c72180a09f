use rand::{RngCore, SeedableRng, rngs::StdRng};
use serde::Serialize;

/// Seedable random number generator.
///
/// Wraps StdRng so record generators are reproducible from a seed. Cloning
/// restarts the stream from the original seed.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Rng {
    seed: u64,
    #[serde(skip_serializing)]
    rng: StdRng,
}

impl Rng {
    /// Creates a new RNG from a seed value.
    ///
    /// # Arguments
    ///
    /// * `seed` - Seed value for deterministic random generation
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// The seed this generator was created from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Draws `width` uniformly random bytes, most significant byte first.
    pub fn random_bytes(&mut self, width: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; width];
        self.rng.fill_bytes(&mut bytes);
        bytes
    }
}

impl RngCore for Rng {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest);
    }
}

impl Clone for Rng {
    fn clone(&self) -> Self {
        Self::from_seed(self.seed)
    }
}
