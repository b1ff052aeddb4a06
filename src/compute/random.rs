//! Random source for spark placement.
//!
//! All draws of a run go through one [`Randomizer`], so a fixed seed reproduces
//! the run exactly.

use rand::prelude::*;
use rand::seq::index;

/// Random number generator wrapper for the fireworks engine.
#[derive(Debug, Clone)]
pub struct Randomizer {
    rng: StdRng,
}

impl Randomizer {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create with random seed.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Uniform value in `[low, high)`. Returns `low` for an empty range.
    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if !(low < high) {
            return low;
        }
        self.rng.gen_range(low..high)
    }

    /// Uniform integer in `[low, high)`. Returns `low` for an empty range.
    pub fn uniform_int(&mut self, low: i32, high: i32) -> i32 {
        if low >= high {
            return low;
        }
        self.rng.gen_range(low..high)
    }

    /// Normally distributed value.
    pub fn gaussian(&mut self, mean: f64, stddev: f64) -> f64 {
        let noise: f64 = self.rng.sample(rand_distr::StandardNormal);
        mean + noise * stddev
    }

    /// Draw `count` distinct integers from `[low, high)`, in draw order.
    pub fn unique_ints(
        &mut self,
        count: usize,
        low: i32,
        high: i32,
    ) -> Result<Vec<i32>, RangeTooSmall> {
        let available = if high > low {
            (i64::from(high) - i64::from(low)) as usize
        } else {
            0
        };
        if count > available {
            return Err(RangeTooSmall {
                count,
                low,
                high,
            });
        }

        Ok(index::sample(&mut self.rng, available, count)
            .into_iter()
            .map(|offset| low + offset as i32)
            .collect())
    }

    /// Draw `count` distinct indices from `0..len`.
    pub(crate) fn unique_indices(
        &mut self,
        count: usize,
        len: usize,
    ) -> Result<Vec<usize>, RangeTooSmall> {
        let high = i32::try_from(len).unwrap_or(i32::MAX);
        Ok(self
            .unique_ints(count, 0, high)?
            .into_iter()
            .map(|i| i as usize)
            .collect())
    }
}

impl Default for Randomizer {
    fn default() -> Self {
        Self::from_entropy()
    }
}

/// Unique sampling asked for more values than the range holds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Cannot draw {count} unique values from [{low}, {high})")]
pub struct RangeTooSmall {
    pub count: usize,
    pub low: i32,
    pub high: i32,
}
