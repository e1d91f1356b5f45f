//! Archive of displaced-but-competitive individuals.
//!
//! Parents replaced by better trials are appended after every generation;
//! once the archive grows past its capacity it is trimmed back. The
//! archive only feeds the difference term of mutation, never the ranked
//! population.

use ndarray::Array1;

use crate::draws::DrawEngine;

/// How the archive discards entries once it grows past its capacity.
/// The original formulation removes entries at random; oldest-first is
/// kept as an alternative for experimentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchivePolicy {
    /// Remove excess entries uniformly at random.
    UniformRandom,
    /// Remove excess entries in insertion order.
    OldestFirst,
}

#[derive(Debug, Clone)]
pub(crate) struct Archive {
    entries: Vec<Array1<f64>>,
    capacity: usize,
    policy: ArchivePolicy,
}

impl Archive {
    pub fn new(capacity: usize, policy: ArchivePolicy) -> Self {
        Self {
            entries: Vec::with_capacity(capacity + 1),
            capacity,
            policy,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn push(&mut self, x: Array1<f64>) {
        self.entries.push(x);
    }

    pub fn get(&self, index: usize) -> &Array1<f64> {
        &self.entries[index]
    }

    /// Trim back to capacity after a generation's inserts.
    pub fn clean_up(&mut self, draws: &mut dyn DrawEngine) {
        while self.entries.len() > self.capacity {
            match self.policy {
                ArchivePolicy::UniformRandom => {
                    let idx = draws.rand_index(0, self.entries.len());
                    self.entries.swap_remove(idx);
                }
                ArchivePolicy::OldestFirst => {
                    self.entries.remove(0);
                }
            }
        }
    }
}
