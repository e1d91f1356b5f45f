use ndarray::Array1;

use crate::draws::DrawEngine;

/// Binomial crossover. One dimension (jrand) is always taken from the
/// mutant so the trial differs from its parent even at cr = 0.
pub(crate) fn binomial_crossover(
    target: &Array1<f64>,
    mutant: &Array1<f64>,
    cr: f64,
    draws: &mut dyn DrawEngine,
) -> Array1<f64> {
    let n = target.len();
    let jrand = draws.rand_index(0, n);
    let mut trial = target.clone();
    for j in 0..n {
        if j == jrand || draws.rand_uniform(0.0, 1.0) < cr {
            trial[j] = mutant[j];
        }
    }
    trial
}
