//! Adaptive differential evolution (JADE) global optimizer in pure Rust
//! using ndarray
//!
//! Implements the adaptive DE variant from Jingqiao Zhang and Arthur C.
//! Sanderson, 'Adaptive Differential Evolution. A Robust Approach to
//! Multimodal Problem Optimization', Springer, 2009, with the crossover
//! rate adaption patched according to the PMCRADE power-mean approach of
//! Jie Li, Wujie Zhu, Mengjun Zhou and Hua Wang (AICI 2011).
//!
//! Supported features:
//! - Box constraints (lower/upper bounds), enforced by clipping
//! - current-to-pbest/1 mutation with an external archive of displaced
//!   parents
//! - Binomial crossover with a forced mutant dimension
//! - Per-individual Cauchy/normal sampling of F and CR with once-per-
//!   generation adaption of their location parameters
//! - Minimization or maximization of the objective
//! - Feeding known starting vectors into the initial population
//! - Optional sharding: cooperating shards exchange fitness values and
//!   populations through gather collectives and sample from the union,
//!   approximating one large population computed in parallel
//!
//! Not covered by design: no thread pool inside a shard, no
//! checkpoint/restart, no convergence-based early stop - runs are
//! generation-count driven.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use ndarray::{Array1, Array2};
use serde::Serialize;

mod adaptation;
mod archive;
mod clip_inplace;
pub mod collective;
mod crossover_binomial;
pub mod draws;
pub mod error;
mod init_random;
mod mutant_current_to_pbest1;
pub mod recorder;
mod sample_pool;

#[cfg(test)]
mod tests;

pub use archive::ArchivePolicy;
pub use collective::{
    ChannelCollective, Collective, SoloCollective, channel_group, run_sharded,
};
pub use draws::{DrawEngine, StdDrawEngine};
pub use error::{JadeError, Result};
pub use recorder::{GenerationRecord, OptimizationRecorder};

use adaptation::AdaptationState;
use archive::Archive;
use clip_inplace::clip_inplace;
use crossover_binomial::binomial_crossover;
use init_random::init_random;
use mutant_current_to_pbest1::mutant_current_to_pbest1;
use sample_pool::SamplePool;

/// Externally supplied fitness function mapping a fixed-length vector to
/// one real value. Must be deterministic for identical inputs.
pub type FitnessFn = Arc<dyn Fn(&Array1<f64>) -> f64 + Send + Sync>;

/// Optimization direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Target {
    /// Find the global minimum of the fitness function.
    Minimum,
    /// Find the global maximum of the fitness function.
    Maximum,
}

impl Target {
    /// Selection rule: the trial is accepted when its fitness is equal or
    /// better than the incumbent's. Ties accept in both directions.
    pub(crate) fn accepts(&self, trial: f64, incumbent: f64) -> bool {
        match self {
            Target::Minimum => trial <= incumbent,
            Target::Maximum => trial >= incumbent,
        }
    }

    /// Strict improvement, used for reporting.
    pub fn improves(&self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Target::Minimum => candidate < incumbent,
            Target::Maximum => candidate > incumbent,
        }
    }

    fn ordering(&self, a: f64, b: f64) -> Ordering {
        let ord = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
        match self {
            Target::Minimum => ord,
            Target::Maximum => ord.reverse(),
        }
    }
}

/// Search bounds: one global pair for all dimensions or one pair per
/// dimension.
#[derive(Debug, Clone)]
pub enum BoundsSpec {
    /// Same bounds for every component.
    All {
        /// Lower bound
        lower: f64,
        /// Upper bound
        upper: f64,
    },
    /// Per-dimension bounds; both vectors must have length D.
    Vectors {
        /// Lower bounds
        lower: Vec<f64>,
        /// Upper bounds
        upper: Vec<f64>,
    },
}

/// Run phases of a shard. One generation cycles through Sorting,
/// Generating, Adapting, Archiving and (at distribution level >= 1)
/// Synchronizing; Done is only reached at the top of the loop, never
/// mid-generation. Error is reachable from any phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Uninitialized,
    Initialized,
    Evaluated,
    Sorting,
    Generating,
    Adapting,
    Archiving,
    Synchronizing,
    Done,
    Error,
}

/// Configuration for the JADE optimizer. All values must be set before
/// the run; they are validated eagerly when the shard is constructed.
#[derive(Debug, Clone)]
pub struct JadeConfig {
    /// Total number of individuals across all shards (>= 4).
    pub total_population: usize,
    /// Dimension of the optimization task (>= 1).
    pub dimension: usize,
    /// Number of generations to run.
    pub total_generations_max: usize,
    /// Minimize or maximize the fitness function.
    pub target: Target,
    /// Share of the population counted as "best" for the pbest term,
    /// recommended range 0.05-0.2.
    pub best_share_p: f64,
    /// Smoothing rate of the parameter adaption; 1/c generations are
    /// accounted for, recommended range 1/20-1/5.
    pub adaptation_frequency_c: f64,
    /// 0 - no distribution, each shard acts independently; >= 1 - shards
    /// sample from the union of all populations.
    pub distribution_level: usize,
    /// Power-mean crossover rate adaption (PMCRADE) on/off.
    pub pmcrade: bool,
    /// How the archive discards excess entries.
    pub archive_policy: ArchivePolicy,
    /// Search bounds; required before the run.
    pub bounds: Option<BoundsSpec>,
    /// Known starting vectors injected into the initial population,
    /// replacing the first freshly drawn rows on rank 0 (clipped to
    /// bounds).
    pub feed: Vec<Vec<f64>>,
    /// Random seed for reproducibility (None = nondeterministic).
    pub seed: Option<u64>,
    /// Print per-generation progress to stderr.
    pub disp: bool,
}

impl Default for JadeConfig {
    fn default() -> Self {
        Self {
            total_population: 40,
            dimension: 0,
            total_generations_max: 100,
            target: Target::Minimum,
            best_share_p: 0.05,
            adaptation_frequency_c: 0.1,
            distribution_level: 0,
            pmcrade: true,
            archive_policy: ArchivePolicy::UniformRandom,
            bounds: None,
            feed: Vec::new(),
            seed: None,
            disp: false,
        }
    }
}

/// Fluent builder for `JadeConfig`.
pub struct JadeConfigBuilder {
    cfg: JadeConfig,
}

impl JadeConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: JadeConfig::default(),
        }
    }
    pub fn total_population(mut self, v: usize) -> Self {
        self.cfg.total_population = v;
        self
    }
    pub fn dimension(mut self, v: usize) -> Self {
        self.cfg.dimension = v;
        self
    }
    pub fn total_generations_max(mut self, v: usize) -> Self {
        self.cfg.total_generations_max = v;
        self
    }
    pub fn minimize(mut self) -> Self {
        self.cfg.target = Target::Minimum;
        self
    }
    pub fn maximize(mut self) -> Self {
        self.cfg.target = Target::Maximum;
        self
    }
    pub fn best_share_p(mut self, v: f64) -> Self {
        self.cfg.best_share_p = v;
        self
    }
    pub fn adaptation_frequency_c(mut self, v: f64) -> Self {
        self.cfg.adaptation_frequency_c = v;
        self
    }
    pub fn distribution_level(mut self, v: usize) -> Self {
        self.cfg.distribution_level = v;
        self
    }
    pub fn pmcrade(mut self, v: bool) -> Self {
        self.cfg.pmcrade = v;
        self
    }
    pub fn archive_policy(mut self, v: ArchivePolicy) -> Self {
        self.cfg.archive_policy = v;
        self
    }
    /// Same search bounds for all components.
    pub fn all_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.cfg.bounds = Some(BoundsSpec::All { lower, upper });
        self
    }
    /// Per-dimension search bounds.
    pub fn all_bounds_vectors(mut self, lower: Vec<f64>, upper: Vec<f64>) -> Self {
        self.cfg.bounds = Some(BoundsSpec::Vectors { lower, upper });
        self
    }
    /// Inject known starting vectors into the initial population.
    pub fn feed(mut self, vectors: Vec<Vec<f64>>) -> Self {
        self.cfg.feed = vectors;
        self
    }
    pub fn seed(mut self, v: u64) -> Self {
        self.cfg.seed = Some(v);
        self
    }
    pub fn disp(mut self, v: bool) -> Self {
        self.cfg.disp = v;
        self
    }
    pub fn build(self) -> JadeConfig {
        self.cfg
    }
}

impl Default for JadeConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a finished run on one shard.
#[derive(Clone, Serialize)]
pub struct JadeReport {
    /// Best vector of the shard's final population
    pub x: Array1<f64>,
    /// Fitness of the best vector
    pub fun: f64,
    /// Worst vector of the shard's final population
    pub worst_x: Array1<f64>,
    /// Fitness of the worst vector
    pub fun_worst: f64,
    /// True when the generation budget completed cleanly
    pub success: bool,
    /// Human-readable completion message
    pub message: String,
    /// Number of generations executed
    pub generations: usize,
    /// Number of fitness evaluations performed by this shard
    pub nfev: usize,
    /// Rank of the shard that produced this report
    pub rank: usize,
    /// Final shard-local population
    pub population: Array2<f64>,
    /// Final fitness of every local individual
    pub population_fitness: Vec<f64>,
}

impl fmt::Debug for JadeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JadeReport")
            .field("x", &format!("len={}", self.x.len()))
            .field("fun", &self.fun)
            .field("fun_worst", &self.fun_worst)
            .field("success", &self.success)
            .field("message", &self.message)
            .field("generations", &self.generations)
            .field("nfev", &self.nfev)
            .field("rank", &self.rank)
            .field(
                "population",
                &format!("{}x{}", self.population.nrows(), self.population.ncols()),
            )
            .finish()
    }
}

/// Information passed to the generation observer after each generation.
pub struct GenerationSnapshot {
    /// Generation counter after the step completed
    pub generation: usize,
    /// Best local vector
    pub x: Array1<f64>,
    /// Best local fitness
    pub fun: f64,
    /// Location parameter of the F draws
    pub mu_f: f64,
    /// Location parameter of the CR draws
    pub mu_cr: f64,
    /// Accepted trials in this generation
    pub accepted: usize,
    /// Optimization direction of the run
    pub target: Target,
}

/// Index and value of the best entry under the given target; `None` when
/// nothing is evaluated yet.
pub(crate) fn arg_best(values: &[Option<f64>], target: Target) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, v) in values.iter().enumerate() {
        let Some(v) = *v else { continue };
        match best {
            Some((_, b)) if !target.improves(v, b) => {}
            _ => best = Some((i, v)),
        }
    }
    best
}

/// Population controlled by a single shard.
///
/// Owns the current and next-generation buffers, the archive, the
/// adaption state and the draw engine; talks to the other shards only
/// through the collective boundary.
pub struct SubPopulation {
    config: JadeConfig,
    fitness_function: Option<FitnessFn>,
    collective: Box<dyn Collective>,
    draws: Box<dyn DrawEngine>,
    observer: Option<Box<dyn FnMut(&GenerationSnapshot)>>,
    /// Number of individuals owned by this shard.
    subpopulation: usize,
    lower: Array1<f64>,
    upper: Array1<f64>,
    x_current: Array2<f64>,
    x_next: Array2<f64>,
    fitness_current: Vec<Option<f64>>,
    fitness_next: Vec<Option<f64>>,
    to_be_archived: Vec<Array1<f64>>,
    archive: Archive,
    adaptation: AdaptationState,
    current_generation: usize,
    phase: Phase,
    error_status: i32,
    nfev: usize,
}

impl fmt::Debug for SubPopulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubPopulation")
            .field("config", &self.config)
            .field("subpopulation", &self.subpopulation)
            .field("current_generation", &self.current_generation)
            .field("phase", &self.phase)
            .field("error_status", &self.error_status)
            .field("nfev", &self.nfev)
            .finish_non_exhaustive()
    }
}

impl SubPopulation {
    /// Create a shard over the given collective with the default draw
    /// engine, seeded from the configuration. Fails eagerly on any
    /// configuration error.
    pub fn new(config: JadeConfig, collective: Box<dyn Collective>) -> Result<Self> {
        let draws = Box::new(StdDrawEngine::new(config.seed));
        Self::with_draws(config, collective, draws)
    }

    /// Same as [`SubPopulation::new`] with an injected draw engine.
    pub fn with_draws(
        config: JadeConfig,
        collective: Box<dyn Collective>,
        draws: Box<dyn DrawEngine>,
    ) -> Result<Self> {
        let (lower, upper) = Self::validate(&config, collective.as_ref())?;
        let subpopulation =
            Self::partition(config.total_population, collective.size(), collective.rank());
        let dimension = config.dimension;
        let archive = Archive::new(subpopulation, config.archive_policy);
        Ok(Self {
            config,
            fitness_function: None,
            collective,
            draws,
            observer: None,
            subpopulation,
            lower,
            upper,
            x_current: Array2::zeros((subpopulation, dimension)),
            x_next: Array2::zeros((subpopulation, dimension)),
            fitness_current: vec![None; subpopulation],
            fitness_next: vec![None; subpopulation],
            to_be_archived: Vec::new(),
            archive,
            adaptation: AdaptationState::new(),
            current_generation: 0,
            phase: Phase::Initialized,
            error_status: 0,
            nfev: 0,
        })
    }

    /// Even split of the total population with the remainder going to the
    /// low ranks.
    fn partition(total: usize, shards: usize, rank: usize) -> usize {
        let base = total / shards;
        let remainder = total % shards;
        base + usize::from(rank < remainder)
    }

    fn validate(config: &JadeConfig, collective: &dyn Collective) -> Result<(Array1<f64>, Array1<f64>)> {
        if config.dimension < 1 {
            return Err(JadeError::InvalidDimension {
                dimension: config.dimension,
            });
        }
        if config.total_population < 4 {
            return Err(JadeError::PopulationTooSmall {
                total_population: config.total_population,
            });
        }
        if !(config.best_share_p > 0.0 && config.best_share_p <= 1.0) {
            return Err(JadeError::InvalidBestShare {
                p: config.best_share_p,
            });
        }
        if !(config.adaptation_frequency_c > 0.0 && config.adaptation_frequency_c <= 1.0) {
            return Err(JadeError::InvalidAdaptationFrequency {
                c: config.adaptation_frequency_c,
            });
        }
        let shards = collective.size();
        let rank = collective.rank();
        let local = Self::partition(config.total_population, shards, rank);
        // At level 0 every shard is an island and must be able to run the
        // mutation's exclusion sampling on its own.
        if shards > 1 && config.distribution_level == 0 && local < 4 {
            return Err(JadeError::IslandTooSmall {
                subpopulation: local,
                rank,
            });
        }
        if local < 1 {
            return Err(JadeError::IslandTooSmall {
                subpopulation: local,
                rank,
            });
        }

        let d = config.dimension;
        let (lower, upper) = match &config.bounds {
            None => return Err(JadeError::BoundsUnset),
            Some(BoundsSpec::All { lower, upper }) => {
                (vec![*lower; d], vec![*upper; d])
            }
            Some(BoundsSpec::Vectors { lower, upper }) => {
                if lower.len() != d || upper.len() != d {
                    return Err(JadeError::BoundsMismatch {
                        lower_len: lower.len(),
                        upper_len: upper.len(),
                        dimension: d,
                    });
                }
                (lower.clone(), upper.clone())
            }
        };
        for i in 0..d {
            if !lower[i].is_finite() || !upper[i].is_finite() || lower[i] > upper[i] {
                return Err(JadeError::InvalidBounds {
                    index: i,
                    lower: lower[i],
                    upper: upper[i],
                });
            }
        }

        for (index, vector) in config.feed.iter().enumerate() {
            if vector.len() != d {
                return Err(JadeError::FeedMismatch {
                    index,
                    len: vector.len(),
                    dimension: d,
                });
            }
            if vector.iter().any(|v| v.is_nan()) {
                return Err(JadeError::FeedNotFinite { index });
            }
        }
        // Feed vectors land on rank 0.
        if rank == 0 && config.feed.len() > local {
            return Err(JadeError::FeedTooLarge {
                count: config.feed.len(),
                subpopulation: local,
            });
        }
        Ok((Array1::from(lower), Array1::from(upper)))
    }

    /// Register the fitness function. Must happen before the run.
    pub fn set_fitness_function(&mut self, f: FitnessFn) {
        self.fitness_function = Some(f);
    }

    /// Observer invoked after every completed generation.
    pub fn set_generation_observer(&mut self, observer: Box<dyn FnMut(&GenerationSnapshot)>) {
        self.observer = Some(observer);
    }

    /// Rank of this shard.
    pub fn rank(&self) -> usize {
        self.collective.rank()
    }

    /// Number of individuals owned by this shard.
    pub fn subpopulation(&self) -> usize {
        self.subpopulation
    }

    /// Current run phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Completed generations.
    pub fn current_generation(&self) -> usize {
        self.current_generation
    }

    /// 0 while the shard is healthy; nonzero after an aborted run, in
    /// which case all result accessors are invalidated.
    pub fn error_status(&self) -> i32 {
        self.error_status
    }

    /// Find the optimum of the registered fitness function. Runs once per
    /// instance; a second call fails without touching the results.
    pub fn run_optimization(&mut self) -> Result<JadeReport> {
        if self.phase != Phase::Initialized {
            return Err(JadeError::AlreadyRun);
        }
        match self.run_inner() {
            Ok(report) => Ok(report),
            Err(err) => {
                self.error_status = err.status_code();
                self.phase = Phase::Error;
                Err(err)
            }
        }
    }

    fn run_inner(&mut self) -> Result<JadeReport> {
        if self.config.disp {
            eprintln!(
                "JADE init: rank {}/{} owns {} of {} individuals, {} dimensions, {} generations",
                self.rank(),
                self.collective.size(),
                self.subpopulation,
                self.config.total_population,
                self.config.dimension,
                self.config.total_generations_max
            );
        }

        self.create_initial_population();
        self.evaluate_current_vectors()?;
        self.phase = Phase::Evaluated;
        let mut pool = self.refresh_pool()?;

        for _ in 0..self.config.total_generations_max {
            self.phase = Phase::Sorting;
            let order = self.sort_evaluated_current();

            self.phase = Phase::Generating;
            let accepted = self.generate_trials(&order, &pool)?;

            self.phase = Phase::Adapting;
            self.adaptation
                .adaption(self.config.adaptation_frequency_c, self.config.pmcrade);

            self.phase = Phase::Archiving;
            self.archive_clean_up();

            std::mem::swap(&mut self.x_current, &mut self.x_next);
            std::mem::swap(&mut self.fitness_current, &mut self.fitness_next);
            self.current_generation += 1;

            if self.is_distributed() {
                self.phase = Phase::Synchronizing;
            }
            pool = self.refresh_pool()?;

            if let Some(snapshot) = self.snapshot(accepted) {
                if self.config.disp {
                    eprintln!(
                        "JADE gen {:4}  best_f={:.6e}  mu_F={:.3}  mu_CR={:.3}  accepted={}/{}",
                        snapshot.generation,
                        snapshot.fun,
                        snapshot.mu_f,
                        snapshot.mu_cr,
                        snapshot.accepted,
                        self.subpopulation
                    );
                }
                if let Some(cb) = self.observer.as_mut() {
                    cb(&snapshot);
                }
            }
        }

        self.phase = Phase::Done;
        if self.config.disp {
            eprintln!(
                "JADE finished: generation budget reached ({})",
                self.config.total_generations_max
            );
        }
        self.report()
    }

    /// One generation's trial loop over the individuals in rank order.
    /// Returns the number of accepted trials.
    fn generate_trials(&mut self, order: &[usize], pool: &SamplePool) -> Result<usize> {
        let pool_sorted = pool.sorted_indices(self.config.target);
        let func = self
            .fitness_function
            .clone()
            .ok_or(JadeError::FitnessUnset)?;

        let mut accepted = 0usize;
        for &i in order {
            let f_i = self.adaptation.draw_f(self.draws.as_mut());
            let cr_i = self
                .adaptation
                .draw_cr(self.draws.as_mut(), self.config.pmcrade);

            let xi = self.x_current.row(i).to_owned();
            let i_pool = pool.local_offset() + i;
            let mut mutant = mutant_current_to_pbest1(
                &xi,
                i_pool,
                pool,
                &pool_sorted,
                self.config.best_share_p,
                &self.archive,
                f_i,
                self.draws.as_mut(),
            );
            clip_inplace(&mut mutant, &self.lower, &self.upper);

            let trial = binomial_crossover(&xi, &mutant, cr_i, self.draws.as_mut());

            let trial_f = func(&trial);
            self.nfev += 1;
            if !trial_f.is_finite() {
                return Err(JadeError::NonFiniteFitness {
                    value: trial_f,
                    generation: self.current_generation,
                });
            }

            // The pool was rebuilt from the current population, so the
            // local slice carries this individual's fitness.
            let current_f = pool.fitness(i_pool);
            if self.config.target.accepts(trial_f, current_f) {
                self.x_next.row_mut(i).assign(&trial);
                self.fitness_next[i] = Some(trial_f);
                self.adaptation.record_success(f_i, cr_i);
                self.to_be_archived.push(xi);
                accepted += 1;
            } else {
                self.x_next.row_mut(i).assign(&xi);
                self.fitness_next[i] = Some(current_f);
            }
        }
        Ok(accepted)
    }

    fn create_initial_population(&mut self) {
        self.x_current = init_random(
            self.config.dimension,
            self.subpopulation,
            &self.lower,
            &self.upper,
            self.draws.as_mut(),
        );
        if self.collective.rank() == 0 {
            for (i, vector) in self.config.feed.iter().enumerate() {
                let mut row = Array1::from(vector.clone());
                clip_inplace(&mut row, &self.lower, &self.upper);
                self.x_current.row_mut(i).assign(&row);
            }
        }
        self.fitness_current = vec![None; self.subpopulation];
    }

    /// Apply the fitness function to every unevaluated vector.
    fn evaluate_current_vectors(&mut self) -> Result<()> {
        let func = self
            .fitness_function
            .clone()
            .ok_or(JadeError::FitnessUnset)?;
        for i in 0..self.subpopulation {
            if self.fitness_current[i].is_some() {
                continue;
            }
            let x = self.x_current.row(i).to_owned();
            let value = func(&x);
            self.nfev += 1;
            if !value.is_finite() {
                return Err(JadeError::NonFiniteFitness {
                    value,
                    generation: self.current_generation,
                });
            }
            self.fitness_current[i] = Some(value);
        }
        Ok(())
    }

    /// Local indices sorted best-first under the configured target.
    fn sort_evaluated_current(&self) -> Vec<usize> {
        let fitness = self.dense_fitness();
        let mut order: Vec<usize> = (0..self.subpopulation).collect();
        order.sort_by(|&a, &b| self.config.target.ordering(fitness[a], fitness[b]));
        order
    }

    fn dense_fitness(&self) -> Vec<f64> {
        self.fitness_current
            .iter()
            .map(|f| f.unwrap_or(f64::NAN))
            .collect()
    }

    fn is_distributed(&self) -> bool {
        self.config.distribution_level > 0 && self.collective.size() > 1
    }

    /// Build the sample pool for the coming generation: local-only at
    /// distribution level 0, gathered from all shards otherwise.
    fn refresh_pool(&mut self) -> Result<SamplePool> {
        if !self.is_distributed() {
            return Ok(SamplePool::local(&self.x_current, self.dense_fitness()));
        }
        // Three collectives per generation, always in this order: sizes,
        // fitness, population. Every shard must match this sequence.
        let sizes = self
            .collective
            .all_gather_longs(&[self.subpopulation as i64])?;
        let fitness = self.collective.all_gather_doubles(&self.dense_fitness())?;
        let flat: Vec<f64> = self.x_current.iter().copied().collect();
        let gathered = self.collective.all_gather_doubles(&flat)?;
        SamplePool::from_gathered(
            &sizes,
            fitness,
            &gathered,
            self.config.dimension,
            self.collective.rank(),
        )
    }

    /// Append the generation's displaced parents and trim the archive.
    fn archive_clean_up(&mut self) {
        for x in self.to_be_archived.drain(..) {
            self.archive.push(x);
        }
        self.archive.clean_up(self.draws.as_mut());
    }

    fn snapshot(&self, accepted: usize) -> Option<GenerationSnapshot> {
        let (idx, fun) = arg_best(&self.fitness_current, self.config.target)?;
        Some(GenerationSnapshot {
            generation: self.current_generation,
            x: self.x_current.row(idx).to_owned(),
            fun,
            mu_f: self.adaptation.mu_f,
            mu_cr: self.adaptation.mu_cr,
            accepted,
            target: self.config.target,
        })
    }

    fn check_results_valid(&self) -> Result<()> {
        if self.error_status != 0 {
            return Err(JadeError::ResultsInvalidated {
                status: self.error_status,
            });
        }
        if self.fitness_current.iter().all(|f| f.is_none()) {
            return Err(JadeError::NotRun);
        }
        Ok(())
    }

    /// Best local individual and its fitness.
    pub fn get_best(&self) -> Result<(Array1<f64>, f64)> {
        self.check_results_valid()?;
        let (idx, fun) =
            arg_best(&self.fitness_current, self.config.target).ok_or(JadeError::NotRun)?;
        Ok((self.x_current.row(idx).to_owned(), fun))
    }

    /// Worst local individual and its fitness.
    pub fn get_worst(&self) -> Result<(Array1<f64>, f64)> {
        self.check_results_valid()?;
        let inverted = match self.config.target {
            Target::Minimum => Target::Maximum,
            Target::Maximum => Target::Minimum,
        };
        let (idx, fun) = arg_best(&self.fitness_current, inverted).ok_or(JadeError::NotRun)?;
        Ok((self.x_current.row(idx).to_owned(), fun))
    }

    /// Fitness of every local individual in slot order.
    pub fn get_final_fitness(&self) -> Result<Vec<f64>> {
        self.check_results_valid()?;
        Ok(self.dense_fitness())
    }

    /// Build the report for the finished run.
    pub fn report(&self) -> Result<JadeReport> {
        let (x, fun) = self.get_best()?;
        let (worst_x, fun_worst) = self.get_worst()?;
        Ok(JadeReport {
            x,
            fun,
            worst_x,
            fun_worst,
            success: self.phase == Phase::Done,
            message: format!(
                "Generation budget reached: {}",
                self.config.total_generations_max
            ),
            generations: self.current_generation,
            nfev: self.nfev,
            rank: self.collective.rank(),
            population: self.x_current.clone(),
            population_fitness: self.dense_fitness(),
        })
    }
}

/// Convenience function for single-shard runs:
/// - `func`: fitness function mapping x -> f(x)
/// - `bounds`: vector of (lower, upper) pairs; its length sets the
///   dimension
/// - `config`: JADE configuration (bounds and dimension are overridden)
pub fn jade_optimize<F>(func: F, bounds: &[(f64, f64)], config: JadeConfig) -> Result<JadeReport>
where
    F: Fn(&Array1<f64>) -> f64 + Send + Sync + 'static,
{
    let mut cfg = config;
    cfg.dimension = bounds.len();
    cfg.bounds = Some(BoundsSpec::Vectors {
        lower: bounds.iter().map(|(lo, _)| *lo).collect(),
        upper: bounds.iter().map(|(_, hi)| *hi).collect(),
    });
    let mut shard = SubPopulation::new(cfg, Box::new(SoloCollective))?;
    shard.set_fitness_function(Arc::new(func));
    shard.run_optimization()
}
