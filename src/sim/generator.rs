use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Source of choices and die rolls.
///
/// Object-safe so the context can hold a `Box<dyn Generator>`.
pub trait Generator {
    /// Pick an index in `0..max_exclusive`.
    fn choose(&mut self, max_exclusive: usize) -> usize;

    /// Roll a six-sided die.
    fn roll(&mut self) -> u8;
}

/// Uniform pseudo-random generator.
pub struct RandomGenerator {
    rng: SmallRng,
}

impl RandomGenerator {
    /// Same seed, same run.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn from_os_rng() -> Self {
        Self {
            rng: SmallRng::from_os_rng(),
        }
    }
}

impl Generator for RandomGenerator {
    /// # Panics
    /// Panics if `max_exclusive` is zero.
    fn choose(&mut self, max_exclusive: usize) -> usize {
        assert!(max_exclusive > 0, "choose: empty range");
        self.rng.random_range(0..max_exclusive)
    }

    fn roll(&mut self) -> u8 {
        self.rng.random_range(1..=6)
    }
}

/// Replays a fixed sequence cyclically, shared between `choose` and `roll`.
///
/// `choose` reduces the value modulo its range so a replayed value is always a
/// valid index; `roll` returns the value as is.
#[derive(Debug, Clone)]
pub struct SequenceGenerator {
    values: Vec<u8>,
    cursor: usize,
}

impl SequenceGenerator {
    /// # Panics
    /// Panics if `values` is empty.
    pub fn new(values: Vec<u8>) -> Self {
        assert!(!values.is_empty(), "SequenceGenerator: empty sequence");
        Self { values, cursor: 0 }
    }

    fn next(&mut self) -> u8 {
        let v = self.values[self.cursor];
        self.cursor = (self.cursor + 1) % self.values.len();
        v
    }
}

impl Generator for SequenceGenerator {
    fn choose(&mut self, max_exclusive: usize) -> usize {
        assert!(max_exclusive > 0, "choose: empty range");
        usize::from(self.next()) % max_exclusive
    }

    fn roll(&mut self) -> u8 {
        self.next()
    }
}
