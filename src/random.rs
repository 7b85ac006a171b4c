use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const DEFAULT_SEED: u64 = 3819201;

/// Source of randomness for rollouts, random evaluation and tie-breaking.
///
/// Every engine owns its generator, so runs are reproducible from the seed and
/// concurrent games never share state.
pub trait RandomGenerator: Send {
    /// Uniform integer in `from..to`.
    fn next_range(&mut self, from: usize, to: usize) -> usize;

    /// Shuffles `items` in place.
    fn shuffle<K>(&mut self, items: &mut [K]);

    /// A uniformly chosen element, `None` for an empty slice.
    fn get_random_from_slice<'a, K>(&mut self, items: &'a [K]) -> Option<&'a K> {
        if items.is_empty() {
            None
        } else {
            items.get(self.next_range(0, items.len()))
        }
    }
}

impl<R: RandomGenerator> RandomGenerator for &mut R {
    fn next_range(&mut self, from: usize, to: usize) -> usize {
        (**self).next_range(from, to)
    }

    fn shuffle<K>(&mut self, items: &mut [K]) {
        (**self).shuffle(items)
    }
}

/// Generator seeded from the operating system. Not reproducible.
pub struct StandardRandomGenerator {
    rng: StdRng,
}

impl Default for StandardRandomGenerator {
    fn default() -> Self {
        StandardRandomGenerator {
            rng: StdRng::from_os_rng(),
        }
    }
}

impl RandomGenerator for StandardRandomGenerator {
    fn next_range(&mut self, from: usize, to: usize) -> usize {
        self.rng.random_range(from..to)
    }

    fn shuffle<K>(&mut self, items: &mut [K]) {
        items.shuffle(&mut self.rng);
    }
}

/// Deterministic generator; the same seed always yields the same sequence.
pub struct SeededRandomGenerator {
    rng: ChaCha8Rng,
}

impl Default for SeededRandomGenerator {
    fn default() -> Self {
        SeededRandomGenerator::new(DEFAULT_SEED)
    }
}

impl SeededRandomGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl RandomGenerator for SeededRandomGenerator {
    fn next_range(&mut self, from: usize, to: usize) -> usize {
        self.rng.random_range(from..to)
    }

    fn shuffle<K>(&mut self, items: &mut [K]) {
        items.shuffle(&mut self.rng);
    }
}
