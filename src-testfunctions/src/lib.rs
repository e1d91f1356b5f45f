//! Optimization test functions for benchmarking the JADE optimizer
//!
//! A small collection of classic objective functions, each taking an
//! `ndarray::Array1<f64>` and returning one real value.
//!
//! # Example
//!
//! ```rust
//! use ndarray::Array1;
//! use jade_testfunctions::sphere;
//!
//! let x = Array1::from_vec(vec![0.0, 0.0]);
//! assert_eq!(sphere(&x), 0.0);
//! ```

use ndarray::Array1;

/// Sphere function - unimodal, separable
/// Global minimum: f(x) = 0 at x = (0, ..., 0)
/// Bounds: x_i in [-5, 5]
pub fn sphere(x: &Array1<f64>) -> f64 {
    x.iter().map(|&xi| xi * xi).sum()
}

/// Sum of squares function - unimodal, axis-weighted sphere
/// Global minimum: f(x) = 0 at x = (0, ..., 0)
/// Bounds: x_i in [-10, 10]
pub fn sum_squares(x: &Array1<f64>) -> f64 {
    x.iter()
        .enumerate()
        .map(|(i, &xi)| (i + 1) as f64 * xi * xi)
        .sum()
}

/// Rosenbrock function - unimodal with a narrow curved valley
/// Global minimum: f(x) = 0 at x = (1, ..., 1)
/// Bounds: x_i in [-5, 10]
pub fn rosenbrock(x: &Array1<f64>) -> f64 {
    let mut sum = 0.0;
    for i in 0..x.len() - 1 {
        sum += 100.0 * (x[i + 1] - x[i] * x[i]).powi(2) + (1.0 - x[i]).powi(2);
    }
    sum
}

/// Rastrigin function - highly multimodal
/// Global minimum: f(x) = 0 at x = (0, ..., 0)
/// Bounds: x_i in [-5.12, 5.12]
pub fn rastrigin(x: &Array1<f64>) -> f64 {
    let n = x.len() as f64;
    let sum: f64 = x
        .iter()
        .map(|&xi| xi.powi(2) - 10.0 * (2.0 * std::f64::consts::PI * xi).cos())
        .sum();
    10.0 * n + sum
}

/// Create bounds as (lower, upper) pairs, one per dimension
pub fn create_bounds_vec(n: usize, lower: f64, upper: f64) -> Vec<(f64, f64)> {
    vec![(lower, upper); n]
}
