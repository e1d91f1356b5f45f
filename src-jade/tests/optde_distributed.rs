use jade_de::{JadeConfigBuilder, run_sharded};
use jade_testfunctions::{rastrigin, sphere};

#[test]
fn test_four_shards_pooled_sphere() {
    let config = JadeConfigBuilder::new()
        .seed(80)
        .total_population(40)
        .dimension(5)
        .total_generations_max(300)
        .all_bounds(-5.0, 5.0)
        .distribution_level(1)
        .build();
    let reports = run_sharded(sphere, config, 4).unwrap();
    assert_eq!(reports.len(), 4);
    for (rank, report) in reports.iter().enumerate() {
        assert!(report.success);
        assert_eq!(report.rank, rank);
        assert_eq!(report.generations, 300);
        // 40 over 4 shards: 10 local individuals each.
        assert_eq!(report.population.nrows(), 10);
    }
    // With pooled sampling every shard sees the union, so all of them
    // should home in on the optimum.
    let best = reports
        .iter()
        .map(|r| r.fun)
        .fold(f64::INFINITY, f64::min);
    assert!(best < 1e-6, "best fitness across shards {}", best);
}

#[test]
fn test_uneven_split_keeps_all_individuals() {
    // 10 individuals over 3 shards: 4 + 3 + 3.
    let config = JadeConfigBuilder::new()
        .seed(81)
        .total_population(10)
        .dimension(3)
        .total_generations_max(100)
        .all_bounds(-5.0, 5.0)
        .distribution_level(1)
        .build();
    let reports = run_sharded(sphere, config, 3).unwrap();
    let sizes: Vec<usize> = reports.iter().map(|r| r.population.nrows()).collect();
    assert_eq!(sizes, vec![4, 3, 3]);
    let total_nfev: usize = reports.iter().map(|r| r.nfev).sum();
    // Initial evaluation plus one trial per individual per generation.
    assert_eq!(total_nfev, 10 + 10 * 100);
}

#[test]
fn test_independent_islands_at_level_zero() {
    let config = JadeConfigBuilder::new()
        .seed(82)
        .total_population(32)
        .dimension(3)
        .total_generations_max(250)
        .all_bounds(-5.12, 5.12)
        .distribution_level(0)
        .build();
    let reports = run_sharded(rastrigin, config, 4).unwrap();
    assert_eq!(reports.len(), 4);
    for report in &reports {
        assert!(report.success);
        assert_eq!(report.population.nrows(), 8);
    }
    // Islands evolve independently from different seeds; at least one
    // should find a good basin.
    let best = reports
        .iter()
        .map(|r| r.fun)
        .fold(f64::INFINITY, f64::min);
    assert!(best < 1.0, "best fitness across islands {}", best);
}

#[test]
fn test_island_too_small_is_rejected() {
    // 8 individuals over 4 shards leaves 2 per island, below the minimum
    // for level 0.
    let config = JadeConfigBuilder::new()
        .seed(83)
        .total_population(8)
        .dimension(2)
        .total_generations_max(10)
        .all_bounds(-1.0, 1.0)
        .distribution_level(0)
        .build();
    let err = run_sharded(sphere, config, 4).unwrap_err();
    assert!(err.is_configuration_error());
}
