//! Population the mutation operator samples from.
//!
//! At distribution level 0 the pool is the shard-local population. At
//! level >= 1 it is rebuilt every generation from the gathered payloads of
//! all shards, approximating one large population computed in parallel.

use std::cmp::Ordering;

use ndarray::{Array2, ArrayView1};

use crate::Target;
use crate::error::{JadeError, Result};

#[derive(Debug, Clone)]
pub(crate) struct SamplePool {
    vectors: Array2<f64>,
    fitness: Vec<f64>,
    /// Pool index of the shard's individual 0.
    local_offset: usize,
}

impl SamplePool {
    /// Pool over the local population only.
    pub fn local(pop: &Array2<f64>, fitness: Vec<f64>) -> Self {
        Self {
            vectors: pop.clone(),
            fitness,
            local_offset: 0,
        }
    }

    /// Pool assembled from rank-ordered gather payloads. `sizes` holds the
    /// per-shard subpopulation lengths, `fitness` the concatenated fitness
    /// values and `flat` the concatenated row-major population vectors.
    pub fn from_gathered(
        sizes: &[i64],
        fitness: Vec<f64>,
        flat: &[f64],
        dimension: usize,
        rank: usize,
    ) -> Result<Self> {
        let total: usize = sizes.iter().map(|&s| s.max(0) as usize).sum();
        if fitness.len() != total {
            return Err(JadeError::CollectiveShapeMismatch {
                expected: total,
                received: fitness.len(),
            });
        }
        if flat.len() != total * dimension {
            return Err(JadeError::CollectiveShapeMismatch {
                expected: total * dimension,
                received: flat.len(),
            });
        }
        let vectors = Array2::from_shape_vec((total, dimension), flat.to_vec()).map_err(|_| {
            JadeError::CollectiveShapeMismatch {
                expected: total * dimension,
                received: flat.len(),
            }
        })?;
        let local_offset = sizes[..rank].iter().map(|&s| s.max(0) as usize).sum();
        Ok(Self {
            vectors,
            fitness,
            local_offset,
        })
    }

    pub fn len(&self) -> usize {
        self.vectors.nrows()
    }

    pub fn local_offset(&self) -> usize {
        self.local_offset
    }

    pub fn row(&self, index: usize) -> ArrayView1<'_, f64> {
        self.vectors.row(index)
    }

    pub fn fitness(&self, index: usize) -> f64 {
        self.fitness[index]
    }

    /// Pool indices sorted best-first for the given target.
    pub fn sorted_indices(&self, target: Target) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.len()).collect();
        indices.sort_by(|&a, &b| {
            let ord = self.fitness[a]
                .partial_cmp(&self.fitness[b])
                .unwrap_or(Ordering::Equal);
            match target {
                Target::Minimum => ord,
                Target::Maximum => ord.reverse(),
            }
        });
        indices
    }
}
