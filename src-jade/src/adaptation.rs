//! Adaptive control of the mutation factor and crossover rate.
//!
//! Per individual, F is drawn from Cauchy(mu_F, 0.1) and CR from
//! Normal(mu_CR, 0.1). Once per generation the location parameters are
//! pulled toward the mean of the (F, CR) values that produced accepted
//! trials: a Lehmer mean for F (weighted toward large factors), an
//! arithmetic mean for CR, or a power mean when PMCRADE is active.

use crate::draws::DrawEngine;

/// Exponent of the PMCRADE power-mean estimator.
const POWER_MEAN_EXPONENT: f64 = 1.5;

/// Scale of the per-individual F and CR draws.
const DRAW_SCALE: f64 = 0.1;

#[derive(Debug, Clone)]
pub(crate) struct AdaptationState {
    /// Location parameter for the mutation factor draws.
    pub mu_f: f64,
    /// Location parameter for the crossover rate draws.
    pub mu_cr: f64,
    /// F values of the accepted trials of the current generation.
    successful_f: Vec<f64>,
    /// CR values of the accepted trials of the current generation.
    successful_cr: Vec<f64>,
}

impl AdaptationState {
    pub fn new() -> Self {
        Self {
            mu_f: 0.5,
            mu_cr: 0.5,
            successful_f: Vec::new(),
            successful_cr: Vec::new(),
        }
    }

    /// Mutation factor for one individual: Cauchy(mu_F, 0.1), resampled
    /// while non-positive, clipped to 1.
    pub fn draw_f(&self, draws: &mut dyn DrawEngine) -> f64 {
        loop {
            let f = draws.rand_cauchy(self.mu_f, DRAW_SCALE);
            if f > 0.0 {
                return f.min(1.0);
            }
        }
    }

    /// Crossover rate for one individual: Normal(mu_CR, 0.1) clipped to
    /// [0, 1]; with PMCRADE, the power mean of two independent draws.
    pub fn draw_cr(&self, draws: &mut dyn DrawEngine, pmcrade: bool) -> f64 {
        let first = draws.rand_normal(self.mu_cr, DRAW_SCALE).clamp(0.0, 1.0);
        if !pmcrade {
            return first;
        }
        let second = draws.rand_normal(self.mu_cr, DRAW_SCALE).clamp(0.0, 1.0);
        let k = POWER_MEAN_EXPONENT;
        ((first.powf(k) + second.powf(k)) / 2.0).powf(1.0 / k)
    }

    /// Record the control parameters of an accepted trial.
    pub fn record_success(&mut self, f: f64, cr: f64) {
        self.successful_f.push(f);
        self.successful_cr.push(cr);
    }

    /// Per-generation update of mu_F and mu_CR with smoothing rate c.
    /// An empty success set leaves the corresponding location unchanged.
    pub fn adaption(&mut self, c: f64, pmcrade: bool) {
        if !self.successful_f.is_empty() {
            let mean_f = lehmer_mean(&self.successful_f);
            self.mu_f = (1.0 - c) * self.mu_f + c * mean_f;
        }
        if !self.successful_cr.is_empty() {
            let mean_cr = if pmcrade {
                power_mean(&self.successful_cr)
            } else {
                arithmetic_mean(&self.successful_cr)
            };
            self.mu_cr = (1.0 - c) * self.mu_cr + c * mean_cr;
        }
        // A success set made entirely of zero CR values can pull mu_CR to
        // zero when c == 1; keep both locations inside (0, 1].
        self.mu_f = self.mu_f.clamp(f64::EPSILON, 1.0);
        self.mu_cr = self.mu_cr.clamp(f64::EPSILON, 1.0);
        self.successful_f.clear();
        self.successful_cr.clear();
    }
}

/// Lehmer mean sum(x^2)/sum(x); weighs large factors more than the
/// arithmetic mean, propagating successful large mutation steps.
fn lehmer_mean(values: &[f64]) -> f64 {
    let sum: f64 = values.iter().sum();
    if sum <= 0.0 {
        return 0.0;
    }
    let sum_sq: f64 = values.iter().map(|&x| x * x).sum();
    sum_sq / sum
}

fn arithmetic_mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// PMCRADE power mean sum(x^k)/sum(x^-k) with k = 1.5.
fn power_mean(values: &[f64]) -> f64 {
    let sum_powers: f64 = values.iter().map(|&x| x.powf(POWER_MEAN_EXPONENT)).sum();
    let sum_inv_powers: f64 = values
        .iter()
        .map(|&x| x.powf(-POWER_MEAN_EXPONENT))
        .sum();
    if sum_inv_powers > 0.0 {
        sum_powers / sum_inv_powers
    } else {
        arithmetic_mean(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draws::StdDrawEngine;

    #[test]
    fn test_draw_f_positive_and_clipped() {
        let mut draws = StdDrawEngine::new(Some(11));
        let state = AdaptationState::new();
        for _ in 0..2000 {
            let f = state.draw_f(&mut draws);
            assert!(f > 0.0 && f <= 1.0);
        }
    }

    #[test]
    fn test_draw_cr_in_unit_interval() {
        let mut draws = StdDrawEngine::new(Some(12));
        let state = AdaptationState::new();
        for _ in 0..2000 {
            let plain = state.draw_cr(&mut draws, false);
            assert!((0.0..=1.0).contains(&plain));
            let pm = state.draw_cr(&mut draws, true);
            assert!((0.0..=1.0).contains(&pm));
        }
    }

    #[test]
    fn test_adaption_moves_toward_success_mean() {
        let mut state = AdaptationState::new();
        state.record_success(0.9, 0.9);
        state.record_success(0.8, 0.8);
        state.adaption(0.5, false);
        assert!(state.mu_f > 0.5);
        assert!(state.mu_cr > 0.5);
        assert!(state.mu_f <= 1.0);
        assert!(state.mu_cr <= 1.0);
    }

    #[test]
    fn test_adaption_with_empty_sets_is_noop() {
        let mut state = AdaptationState::new();
        state.adaption(0.1, true);
        assert_eq!(state.mu_f, 0.5);
        assert_eq!(state.mu_cr, 0.5);
    }

    #[test]
    fn test_mu_stays_in_unit_interval_for_degenerate_sets() {
        let mut state = AdaptationState::new();
        state.record_success(1.0, 0.0);
        state.adaption(1.0, false);
        assert!(state.mu_f > 0.0 && state.mu_f <= 1.0);
        assert!(state.mu_cr > 0.0 && state.mu_cr <= 1.0);

        let mut pm = AdaptationState::new();
        pm.record_success(1.0, 0.0);
        pm.adaption(1.0, true);
        assert!(pm.mu_cr > 0.0 && pm.mu_cr <= 1.0);
    }

    #[test]
    fn test_lehmer_mean_weighs_large_values() {
        let values = [0.2, 0.8];
        let lehmer = lehmer_mean(&values);
        let arithmetic = arithmetic_mean(&values);
        assert!(lehmer > arithmetic);
        assert!(lehmer <= 0.8);
    }

    #[test]
    fn test_power_mean_within_range() {
        let values = [0.3, 0.5, 0.9];
        let pm = power_mean(&values);
        assert!(pm > 0.0 && pm <= 0.9);
    }
}
