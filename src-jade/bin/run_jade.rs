use clap::{Parser, ValueEnum};
use jade_de::{
    ArchivePolicy, JadeConfig, JadeConfigBuilder, JadeReport, OptimizationRecorder,
    SoloCollective, SubPopulation, run_sharded,
};
use jade_testfunctions::{create_bounds_vec, rastrigin, rosenbrock, sphere, sum_squares};
use ndarray::Array1;
use std::fmt::Write as FmtWrite;
use std::process;
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(
    name = "run_jade",
    about = "Run the JADE adaptive differential evolution optimizer on a benchmark function"
)]
struct Cli {
    /// Benchmark function to optimize
    #[arg(long, value_enum, default_value_t = FunctionChoice::Sphere)]
    function: FunctionChoice,

    /// Dimensionality of the problem
    #[arg(long, default_value_t = 10)]
    dim: usize,

    /// Total population across all shards
    #[arg(long, default_value_t = 60)]
    population: usize,

    /// Number of generations to run
    #[arg(long, default_value_t = 500)]
    generations: usize,

    /// Share of the population counted as "best" for the pbest term
    #[arg(long, default_value_t = 0.05)]
    best_share_p: f64,

    /// Smoothing rate of the parameter adaption
    #[arg(long, default_value_t = 0.1)]
    adaptation_c: f64,

    /// Maximize the function instead of minimizing it
    #[arg(long)]
    maximize: bool,

    /// Disable the PMCRADE power-mean crossover rate adaption
    #[arg(long)]
    no_pmcrade: bool,

    /// Discard the oldest archive entries instead of random ones
    #[arg(long)]
    oldest_first_archive: bool,

    /// Optional random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Number of cooperating shards (1 = single shard)
    #[arg(long, default_value_t = 1)]
    shards: usize,

    /// Distribution level: 0 = independent islands, >= 1 = pooled sampling
    #[arg(long, default_value_t = 1)]
    distribution_level: usize,

    /// Override the function's lower bound for every dimension
    #[arg(long)]
    lower: Option<f64>,

    /// Override the function's upper bound for every dimension
    #[arg(long)]
    upper: Option<f64>,

    /// Print the final report as JSON
    #[arg(long)]
    json: bool,

    /// Save the per-generation trace as CSV into this directory
    #[arg(long)]
    trace_dir: Option<String>,

    /// Print per-generation progress to stderr
    #[arg(long)]
    disp: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FunctionChoice {
    Sphere,
    SumSquares,
    Rosenbrock,
    Rastrigin,
}

impl FunctionChoice {
    fn function(self) -> fn(&Array1<f64>) -> f64 {
        match self {
            FunctionChoice::Sphere => sphere,
            FunctionChoice::SumSquares => sum_squares,
            FunctionChoice::Rosenbrock => rosenbrock,
            FunctionChoice::Rastrigin => rastrigin,
        }
    }

    fn default_bounds(self) -> (f64, f64) {
        match self {
            FunctionChoice::Sphere => (-5.0, 5.0),
            FunctionChoice::SumSquares => (-10.0, 10.0),
            FunctionChoice::Rosenbrock => (-5.0, 10.0),
            FunctionChoice::Rastrigin => (-5.12, 5.12),
        }
    }

    fn name(self) -> &'static str {
        match self {
            FunctionChoice::Sphere => "sphere",
            FunctionChoice::SumSquares => "sum_squares",
            FunctionChoice::Rosenbrock => "rosenbrock",
            FunctionChoice::Rastrigin => "rastrigin",
        }
    }
}

fn build_config(args: &Cli, bounds: &[(f64, f64)]) -> JadeConfig {
    let mut builder = JadeConfigBuilder::new()
        .total_population(args.population)
        .dimension(args.dim)
        .total_generations_max(args.generations)
        .best_share_p(args.best_share_p)
        .adaptation_frequency_c(args.adaptation_c)
        .distribution_level(args.distribution_level)
        .pmcrade(!args.no_pmcrade)
        .all_bounds_vectors(
            bounds.iter().map(|(lo, _)| *lo).collect(),
            bounds.iter().map(|(_, hi)| *hi).collect(),
        )
        .disp(args.disp);
    if args.maximize {
        builder = builder.maximize();
    }
    if args.oldest_first_archive {
        builder = builder.archive_policy(ArchivePolicy::OldestFirst);
    }
    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }
    builder.build()
}

fn print_report(report: &JadeReport) {
    println!(
        "rank {} | generations: {} | evaluations: {} | success: {}",
        report.rank, report.generations, report.nfev, report.success
    );
    println!("  best objective: {:.6e}", report.fun);
    let mut best_vector = String::new();
    for (idx, value) in report.x.iter().enumerate() {
        if idx > 0 {
            best_vector.push_str(", ");
        }
        let _ = write!(&mut best_vector, "{value:.6}");
    }
    println!("  best parameters: [{}]", best_vector);
    println!("  worst objective: {:.6e}", report.fun_worst);
}

fn main() {
    let args = Cli::parse();

    if args.shards == 0 {
        eprintln!("Error: --shards must be at least 1.");
        process::exit(1);
    }

    if args.trace_dir.is_some() && args.shards > 1 {
        eprintln!("Error: --trace-dir only supports single-shard runs (--shards 1).");
        process::exit(1);
    }

    let (default_lower, default_upper) = args.function.default_bounds();
    let bounds = create_bounds_vec(
        args.dim,
        args.lower.unwrap_or(default_lower),
        args.upper.unwrap_or(default_upper),
    );
    let config = build_config(&args, &bounds);
    let func = args.function.function();

    println!(
        "Running JADE on '{}' ({}D), {} individuals, {} generations, {} shard(s)...",
        args.function.name(),
        args.dim,
        args.population,
        args.generations,
        args.shards
    );

    let start = Instant::now();
    let reports = if args.shards > 1 {
        match run_sharded(func, config, args.shards) {
            Ok(reports) => reports,
            Err(e) => {
                eprintln!("Error: optimization failed: {}", e);
                process::exit(e.status_code());
            }
        }
    } else {
        let recorder = args
            .trace_dir
            .as_ref()
            .map(|_| OptimizationRecorder::new(args.function.name().to_string()));
        let result = (|| {
            let mut shard = SubPopulation::new(config, Box::new(SoloCollective))?;
            shard.set_fitness_function(Arc::new(func));
            if let Some(rec) = &recorder {
                shard.set_generation_observer(rec.create_observer());
            }
            shard.run_optimization()
        })();
        let report = match result {
            Ok(report) => report,
            Err(e) => {
                eprintln!("Error: optimization failed: {}", e);
                process::exit(e.status_code());
            }
        };
        if let (Some(rec), Some(dir)) = (&recorder, &args.trace_dir) {
            match rec.save_to_csv(dir) {
                Ok(path) => println!("Trace saved to {}", path),
                Err(e) => eprintln!("Warning: could not save trace: {}", e),
            }
        }
        vec![report]
    };
    let elapsed = start.elapsed();

    println!("Optimization completed in {:.2?}", elapsed);

    if args.json {
        match serde_json::to_string_pretty(&reports) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: could not serialize reports: {}", e);
                process::exit(1);
            }
        }
    } else {
        for report in &reports {
            print_report(report);
        }
    }

    if reports.iter().any(|r| !r.success) {
        process::exit(1);
    }
}
