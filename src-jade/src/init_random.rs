use ndarray::{Array1, Array2};

use crate::draws::DrawEngine;

pub(crate) fn init_random(
    n: usize,
    npop: usize,
    lower: &Array1<f64>,
    upper: &Array1<f64>,
    draws: &mut dyn DrawEngine,
) -> Array2<f64> {
    let mut pop = Array2::<f64>::zeros((npop, n));
    for i in 0..npop {
        for j in 0..n {
            pop[(i, j)] = draws.rand_uniform(lower[j], upper[j]);
        }
    }
    pop
}
