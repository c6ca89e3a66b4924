//! Random member selection for firehose shard groups.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;

/// Source of uniform random draws.
pub trait RandomSource: Send + Sync {
    /// Draw a value uniformly from `0..bound`. `bound` is never zero.
    fn draw(&self, bound: usize) -> usize;
}

/// Process-seeded generator backed by the thread-local RNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn draw(&self, bound: usize) -> usize {
        rand::thread_rng().gen_range(0..bound)
    }
}

/// Deterministic generator for reproducible selection.
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl fmt::Debug for SeededRandom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeededRandom").finish_non_exhaustive()
    }
}

impl RandomSource for SeededRandom {
    fn draw(&self, bound: usize) -> usize {
        self.rng.lock().gen_range(0..bound)
    }
}

/// Pick one member of a shard group from a single draw.
///
/// `draw` is reduced modulo the group size, so any draw is valid. Returns
/// `None` for an empty group.
pub fn select_member<T>(members: &[T], draw: usize) -> Option<&T> {
    if members.is_empty() {
        return None;
    }
    members.get(draw % members.len())
}

/// Pick the position of one member in a group of `len` using `random`.
pub fn select_index(len: usize, random: &dyn RandomSource) -> Option<usize> {
    match len {
        0 => None,
        1 => Some(0),
        n => Some(random.draw(n) % n),
    }
}

/// Pick one member of a shard group using `random`.
pub fn select_random<'a, T>(members: &'a [T], random: &dyn RandomSource) -> Option<&'a T> {
    select_index(members.len(), random).and_then(|i| members.get(i))
}
