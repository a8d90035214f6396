// Random Sources
// Injectable uniform sources so every draw can be reproduced

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Source of uniform values in `[0, 1)`
pub trait RandomSource: Send {
    /// Next uniform value in `[0, 1)`
    fn next_unit(&mut self) -> f64;

    /// Uniform index in `[0, len)`, computed as `floor(u * len)`
    fn pick_index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        let index = (self.next_unit() * len as f64).floor() as usize;
        index.min(len - 1)
    }
}

/// ChaCha8-backed source. Same seed, same sequence.
pub struct SeededSource {
    rng: ChaCha8Rng,
}

impl SeededSource {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }
}

impl RandomSource for SeededSource {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Source that returns the same value forever
#[derive(Debug, Clone, Copy)]
pub struct ConstantSource(f64);

impl ConstantSource {
    pub fn new(value: f64) -> Self {
        let value = if value.is_finite() {
            value.clamp(0.0, 1.0 - f64::EPSILON)
        } else {
            0.0
        };
        Self(value)
    }

    /// Always selects the first element of any pool
    pub fn first() -> Self {
        Self::new(0.0)
    }

    /// Always selects the last element of any pool
    pub fn last() -> Self {
        Self::new(1.0)
    }
}

impl RandomSource for ConstantSource {
    fn next_unit(&mut self) -> f64 {
        self.0
    }
}

/// Replays a fixed script of values, cycling when exhausted
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    values: Vec<f64>,
    cursor: usize,
}

impl ScriptedSource {
    pub fn new(values: Vec<f64>) -> Self {
        let values = values
            .into_iter()
            .map(|v| ConstantSource::new(v).0)
            .collect();
        Self { values, cursor: 0 }
    }
}

impl RandomSource for ScriptedSource {
    fn next_unit(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value
    }
}
