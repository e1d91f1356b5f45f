use std::sync::Arc;

use ndarray::{Array1, arr1};

use crate::crossover_binomial::binomial_crossover;
use crate::draws::DrawEngine;
use crate::*;

/// Draw engine replaying scripted values, for deterministic operator tests.
struct ScriptedDraws {
    uniforms: Vec<f64>,
    indices: Vec<usize>,
    next_uniform: usize,
    next_index: usize,
}

impl ScriptedDraws {
    fn new(uniforms: Vec<f64>, indices: Vec<usize>) -> Self {
        Self {
            uniforms,
            indices,
            next_uniform: 0,
            next_index: 0,
        }
    }
}

impl DrawEngine for ScriptedDraws {
    fn rand_uniform(&mut self, lbound: f64, ubound: f64) -> f64 {
        let u = self.uniforms[self.next_uniform % self.uniforms.len()];
        self.next_uniform += 1;
        lbound + u * (ubound - lbound)
    }

    fn rand_normal(&mut self, mean: f64, _stddev: f64) -> f64 {
        mean
    }

    fn rand_cauchy(&mut self, location: f64, _scale: f64) -> f64 {
        location
    }

    fn rand_index(&mut self, lbound: usize, ubound: usize) -> usize {
        let i = self.indices[self.next_index % self.indices.len()];
        self.next_index += 1;
        i.clamp(lbound, ubound.saturating_sub(1))
    }
}

fn sphere_config() -> JadeConfig {
    JadeConfigBuilder::new()
        .total_population(20)
        .dimension(3)
        .total_generations_max(30)
        .all_bounds(-5.0, 5.0)
        .seed(7)
        .build()
}

fn sphere(x: &Array1<f64>) -> f64 {
    x.iter().map(|v| v * v).sum()
}

#[test]
fn test_crossover_cr_zero_changes_only_forced_dimension() {
    let target = arr1(&[0.0, 0.0, 0.0, 0.0]);
    let mutant = arr1(&[1.0, 1.0, 1.0, 1.0]);
    // jrand = 2; all uniforms above cr = 0.
    let mut draws = ScriptedDraws::new(vec![0.9], vec![2]);
    let trial = binomial_crossover(&target, &mutant, 0.0, &mut draws);
    assert_eq!(trial, arr1(&[0.0, 0.0, 1.0, 0.0]));
}

#[test]
fn test_crossover_cr_one_takes_full_mutant() {
    let target = arr1(&[0.0, 0.0, 0.0]);
    let mutant = arr1(&[1.0, 2.0, 3.0]);
    let mut draws = ScriptedDraws::new(vec![0.5], vec![0]);
    let trial = binomial_crossover(&target, &mutant, 1.0, &mut draws);
    assert_eq!(trial, mutant);
}

#[test]
fn test_selection_accepts_ties_in_both_directions() {
    assert!(Target::Minimum.accepts(1.0, 1.0));
    assert!(Target::Minimum.accepts(0.9, 1.0));
    assert!(!Target::Minimum.accepts(1.1, 1.0));
    assert!(Target::Maximum.accepts(1.0, 1.0));
    assert!(Target::Maximum.accepts(1.1, 1.0));
    assert!(!Target::Maximum.accepts(0.9, 1.0));
}

#[test]
fn test_config_validation_errors() {
    let cases: Vec<(JadeConfig, fn(&JadeError) -> bool)> = vec![
        (
            JadeConfigBuilder::new()
                .total_population(10)
                .dimension(0)
                .all_bounds(-1.0, 1.0)
                .build(),
            |e| matches!(e, JadeError::InvalidDimension { dimension: 0 }),
        ),
        (
            JadeConfigBuilder::new()
                .total_population(3)
                .dimension(2)
                .all_bounds(-1.0, 1.0)
                .build(),
            |e| matches!(e, JadeError::PopulationTooSmall { .. }),
        ),
        (
            JadeConfigBuilder::new()
                .total_population(10)
                .dimension(2)
                .build(),
            |e| matches!(e, JadeError::BoundsUnset),
        ),
        (
            JadeConfigBuilder::new()
                .total_population(10)
                .dimension(2)
                .all_bounds(1.0, -1.0)
                .build(),
            |e| matches!(e, JadeError::InvalidBounds { .. }),
        ),
        (
            JadeConfigBuilder::new()
                .total_population(10)
                .dimension(2)
                .all_bounds_vectors(vec![-1.0], vec![1.0, 1.0])
                .build(),
            |e| matches!(e, JadeError::BoundsMismatch { .. }),
        ),
        (
            JadeConfigBuilder::new()
                .total_population(10)
                .dimension(2)
                .all_bounds(-1.0, 1.0)
                .best_share_p(0.0)
                .build(),
            |e| matches!(e, JadeError::InvalidBestShare { .. }),
        ),
        (
            JadeConfigBuilder::new()
                .total_population(10)
                .dimension(2)
                .all_bounds(-1.0, 1.0)
                .adaptation_frequency_c(1.5)
                .build(),
            |e| matches!(e, JadeError::InvalidAdaptationFrequency { .. }),
        ),
    ];

    for (config, check) in cases {
        let err = SubPopulation::new(config, Box::new(SoloCollective)).unwrap_err();
        assert!(check(&err), "unexpected error: {err}");
        assert!(err.is_configuration_error());
        assert_eq!(err.status_code(), 1);
    }
}

/// Stub collective pretending to be one rank of a larger group; only used
/// for partition validation, its gathers are never called.
struct FixedSizeCollective {
    rank: usize,
    size: usize,
}

impl Collective for FixedSizeCollective {
    fn rank(&self) -> usize {
        self.rank
    }
    fn size(&self) -> usize {
        self.size
    }
    fn all_gather_doubles(&mut self, payload: &[f64]) -> Result<Vec<f64>> {
        Ok(payload.to_vec())
    }
    fn all_gather_longs(&mut self, payload: &[i64]) -> Result<Vec<i64>> {
        Ok(payload.to_vec())
    }
}

#[test]
fn test_island_too_small_at_level_zero() {
    // 8 individuals over 4 shards leaves 2 per island.
    let config = JadeConfigBuilder::new()
        .total_population(8)
        .dimension(2)
        .all_bounds(-1.0, 1.0)
        .distribution_level(0)
        .build();
    let err = SubPopulation::new(config, Box::new(FixedSizeCollective { rank: 0, size: 4 }))
        .unwrap_err();
    assert!(matches!(err, JadeError::IslandTooSmall { .. }));
}

#[test]
fn test_small_shares_are_fine_when_pooled() {
    // Same split is valid at level 1 where shards sample from the union.
    let config = JadeConfigBuilder::new()
        .total_population(8)
        .dimension(2)
        .all_bounds(-1.0, 1.0)
        .distribution_level(1)
        .build();
    let shard = SubPopulation::new(config, Box::new(FixedSizeCollective { rank: 1, size: 4 }))
        .unwrap();
    assert_eq!(shard.subpopulation(), 2);
}

#[test]
fn test_remainder_goes_to_low_ranks() {
    // 10 individuals over 3 shards: 4, 3, 3.
    let expected = [4usize, 3, 3];
    for rank in 0..3 {
        let config = JadeConfigBuilder::new()
            .total_population(10)
            .dimension(2)
            .all_bounds(-1.0, 1.0)
            .distribution_level(1)
            .build();
        let shard =
            SubPopulation::new(config, Box::new(FixedSizeCollective { rank, size: 3 })).unwrap();
        assert_eq!(shard.subpopulation(), expected[rank]);
    }
}

#[test]
fn test_feed_vectors_replace_first_rows() {
    let fed = vec![vec![0.25, -0.5, 1.0], vec![2.0, 2.0, 2.0]];
    let config = JadeConfigBuilder::new()
        .total_population(20)
        .dimension(3)
        .total_generations_max(0)
        .all_bounds(-5.0, 5.0)
        .feed(fed.clone())
        .seed(13)
        .build();
    let mut shard = SubPopulation::new(config, Box::new(SoloCollective)).unwrap();
    shard.set_fitness_function(Arc::new(sphere));
    let report = shard.run_optimization().unwrap();
    assert_eq!(report.population.row(0).to_vec(), fed[0]);
    assert_eq!(report.population.row(1).to_vec(), fed[1]);
    assert_eq!(report.population_fitness[1], 12.0);
}

#[test]
fn test_feed_vectors_are_clipped_to_bounds() {
    let config = JadeConfigBuilder::new()
        .total_population(10)
        .dimension(3)
        .total_generations_max(0)
        .all_bounds(-1.0, 1.0)
        .feed(vec![vec![10.0, -10.0, 0.5]])
        .seed(14)
        .build();
    let mut shard = SubPopulation::new(config, Box::new(SoloCollective)).unwrap();
    shard.set_fitness_function(Arc::new(sphere));
    let report = shard.run_optimization().unwrap();
    assert_eq!(report.population.row(0).to_vec(), vec![1.0, -1.0, 0.5]);
}

#[test]
fn test_feed_validation_errors() {
    let base = || {
        JadeConfigBuilder::new()
            .total_population(4)
            .dimension(3)
            .all_bounds(-1.0, 1.0)
    };

    let err = SubPopulation::new(
        base().feed(vec![vec![0.0, 0.0]]).build(),
        Box::new(SoloCollective),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        JadeError::FeedMismatch {
            index: 0,
            len: 2,
            dimension: 3
        }
    ));

    let err = SubPopulation::new(
        base().feed(vec![vec![0.0, f64::NAN, 0.0]]).build(),
        Box::new(SoloCollective),
    )
    .unwrap_err();
    assert!(matches!(err, JadeError::FeedNotFinite { index: 0 }));

    let err = SubPopulation::new(
        base().feed(vec![vec![0.0; 3]; 5]).build(),
        Box::new(SoloCollective),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        JadeError::FeedTooLarge {
            count: 5,
            subpopulation: 4
        }
    ));
}

#[test]
fn test_rerun_is_rejected_without_invalidating_results() {
    let mut shard = SubPopulation::new(sphere_config(), Box::new(SoloCollective)).unwrap();
    shard.set_fitness_function(Arc::new(sphere));
    let first = shard.run_optimization().unwrap();
    let err = shard.run_optimization().unwrap_err();
    assert!(matches!(err, JadeError::AlreadyRun));
    // The finished run stays intact.
    assert_eq!(shard.error_status(), 0);
    assert_eq!(shard.phase(), Phase::Done);
    let (x, fun) = shard.get_best().unwrap();
    assert_eq!(fun, first.fun);
    assert_eq!(x, first.x);
}

#[test]
fn test_run_requires_fitness_function() {
    let mut shard = SubPopulation::new(sphere_config(), Box::new(SoloCollective)).unwrap();
    let err = shard.run_optimization().unwrap_err();
    assert!(matches!(err, JadeError::FitnessUnset));
}

#[test]
fn test_accessors_before_run_fail() {
    let shard = SubPopulation::new(sphere_config(), Box::new(SoloCollective)).unwrap();
    assert!(matches!(shard.get_best(), Err(JadeError::NotRun)));
    assert!(matches!(shard.get_worst(), Err(JadeError::NotRun)));
    assert!(matches!(shard.get_final_fitness(), Err(JadeError::NotRun)));
    assert_eq!(shard.error_status(), 0);
    assert_eq!(shard.phase(), Phase::Initialized);
}

#[test]
fn test_non_finite_fitness_invalidates_results() {
    let mut shard = SubPopulation::new(sphere_config(), Box::new(SoloCollective)).unwrap();
    shard.set_fitness_function(Arc::new(|_x: &Array1<f64>| f64::NAN));
    let err = shard.run_optimization().unwrap_err();
    assert!(err.is_evaluation_error());
    assert_eq!(shard.error_status(), 2);
    assert_eq!(shard.phase(), Phase::Error);
    assert!(matches!(
        shard.get_best(),
        Err(JadeError::ResultsInvalidated { status: 2 })
    ));
}

#[test]
fn test_seeded_runs_are_identical() {
    let run = || {
        let mut shard = SubPopulation::new(sphere_config(), Box::new(SoloCollective)).unwrap();
        shard.set_fitness_function(Arc::new(sphere));
        shard.run_optimization().unwrap()
    };
    let a = run();
    let b = run();
    assert_eq!(a.fun, b.fun);
    assert_eq!(a.x, b.x);
    assert_eq!(a.population_fitness, b.population_fitness);
    assert_eq!(a.nfev, b.nfev);
}

#[test]
fn test_report_shape_and_phase() {
    let mut shard = SubPopulation::new(sphere_config(), Box::new(SoloCollective)).unwrap();
    shard.set_fitness_function(Arc::new(sphere));
    let report = shard.run_optimization().unwrap();
    assert!(report.success);
    assert_eq!(report.generations, 30);
    assert_eq!(report.rank, 0);
    assert_eq!(report.x.len(), 3);
    assert_eq!(report.population.nrows(), 20);
    assert_eq!(report.population_fitness.len(), 20);
    // Initial evaluation plus one trial per individual per generation.
    assert_eq!(report.nfev, 20 + 20 * 30);
    assert!(Target::Minimum.accepts(report.fun, report.fun_worst));
    assert_eq!(shard.phase(), Phase::Done);
    assert_eq!(shard.current_generation(), 30);
}

#[test]
fn test_per_slot_fitness_never_regresses() {
    // With a fixed seed the draw sequence is independent of the generation
    // budget, so runs with budgets g and g+1 share their first g
    // generations and the extra generation must be equal-or-better per slot.
    let run = |generations: usize| {
        let config = JadeConfigBuilder::new()
            .total_population(20)
            .dimension(3)
            .total_generations_max(generations)
            .all_bounds(-5.0, 5.0)
            .seed(9)
            .build();
        let mut shard = SubPopulation::new(config, Box::new(SoloCollective)).unwrap();
        shard.set_fitness_function(Arc::new(sphere));
        shard.run_optimization().unwrap().population_fitness
    };
    let mut previous = run(1);
    for generations in 2..=5 {
        let current = run(generations);
        for (slot, (cur, prev)) in current.iter().zip(&previous).enumerate() {
            assert!(cur <= prev, "slot {slot} regressed: {prev} -> {cur}");
        }
        previous = current;
    }
}

#[test]
fn test_observer_sees_every_generation() {
    let recorder = OptimizationRecorder::new("observer_test".to_string());
    let mut shard = SubPopulation::new(sphere_config(), Box::new(SoloCollective)).unwrap();
    shard.set_fitness_function(Arc::new(sphere));
    shard.set_generation_observer(recorder.create_observer());
    shard.run_optimization().unwrap();
    assert_eq!(recorder.num_generations(), 30);
    let trace = recorder.best_fitness_trace();
    // Elitism: the best fitness never regresses.
    for pair in trace.windows(2) {
        assert!(pair[1] <= pair[0]);
    }
}

#[test]
fn test_jade_optimize_uses_bounds_for_dimension() {
    let bounds = [(-2.0, 2.0), (-3.0, 3.0)];
    let config = JadeConfigBuilder::new()
        .total_population(16)
        .total_generations_max(50)
        .seed(3)
        .build();
    let report = jade_optimize(sphere, &bounds, config).unwrap();
    assert_eq!(report.x.len(), 2);
    assert!(report.fun < 1.0);
}
