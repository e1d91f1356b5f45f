use ndarray::Array1;

use crate::archive::Archive;
use crate::draws::DrawEngine;
use crate::sample_pool::SamplePool;

/// JADE current-to-pbest/1 mutation.
///
/// xpbest is drawn uniformly from the top `best_share_p` fraction of the
/// pool (best-first order supplied by `sorted`); xr1 from the pool
/// excluding the current individual; xr2 from the union of pool and
/// archive excluding the current individual and r1.
/// Mutant = x_i + F (xpbest - x_i) + F (xr1 - xr2).
pub(crate) fn mutant_current_to_pbest1(
    xi: &Array1<f64>,
    i_pool: usize,
    pool: &SamplePool,
    sorted: &[usize],
    best_share_p: f64,
    archive: &Archive,
    f: f64,
    draws: &mut dyn DrawEngine,
) -> Array1<f64> {
    let pool_len = pool.len();
    let p_size = ((best_share_p * pool_len as f64).ceil() as usize).clamp(1, pool_len);
    let pbest = sorted[draws.rand_index(0, p_size)];

    let r1 = loop {
        let idx = draws.rand_index(0, pool_len);
        if idx != i_pool {
            break idx;
        }
    };
    // Indices >= pool_len address the archive, so r2 never collides with
    // i or r1 there.
    let extended = pool_len + archive.len();
    let r2 = loop {
        let idx = draws.rand_index(0, extended);
        if idx != i_pool && idx != r1 {
            break idx;
        }
    };
    let xr2 = if r2 < pool_len {
        pool.row(r2).to_owned()
    } else {
        archive.get(r2 - pool_len).clone()
    };

    xi + &((&pool.row(pbest).to_owned() - xi) * f)
        + &((&pool.row(r1).to_owned() - &xr2) * f)
}
