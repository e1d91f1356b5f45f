//! Error types for the JADE optimizer.
//!
//! Structured error handling with `thiserror`, split along the three
//! failure classes the engine distinguishes: configuration, evaluation
//! and distributed. Helper methods map errors to the integer status code
//! reported by `SubPopulation::error_status`.

use thiserror::Error;

/// Errors that can occur while configuring or running the optimizer.
#[derive(Debug, Error)]
pub enum JadeError {
    /// Total population is too small (must be >= 4).
    #[error("total population ({total_population}) must be >= 4")]
    PopulationTooSmall {
        /// The invalid population size
        total_population: usize,
    },

    /// A shard-local island is too small to run independently.
    #[error("island population ({subpopulation}) on rank {rank} must be >= 4 at distribution level 0")]
    IslandTooSmall {
        /// The local subpopulation size
        subpopulation: usize,
        /// Rank of the shard
        rank: usize,
    },

    /// Problem dimension must be at least 1.
    #[error("dimension ({dimension}) must be >= 1")]
    InvalidDimension {
        /// The invalid dimension
        dimension: usize,
    },

    /// Bound vectors do not match the configured dimension.
    #[error("bounds mismatch: lower has {lower_len} elements, upper has {upper_len}, dimension is {dimension}")]
    BoundsMismatch {
        /// Length of the lower bounds vector
        lower_len: usize,
        /// Length of the upper bounds vector
        upper_len: usize,
        /// Configured problem dimension
        dimension: usize,
    },

    /// A bound pair is inverted or non-finite.
    #[error("invalid bounds at index {index}: lower ({lower}), upper ({upper})")]
    InvalidBounds {
        /// Index of the invalid bound pair
        index: usize,
        /// The lower bound value
        lower: f64,
        /// The upper bound value
        upper: f64,
    },

    /// No bounds were configured before the run.
    #[error("search bounds are not set")]
    BoundsUnset,

    /// Best-share fraction p is out of (0, 1].
    #[error("best share p ({p}) must be in (0, 1]")]
    InvalidBestShare {
        /// The invalid fraction
        p: f64,
    },

    /// Adaptation frequency c is out of (0, 1].
    #[error("adaptation frequency c ({c}) must be in (0, 1]")]
    InvalidAdaptationFrequency {
        /// The invalid frequency
        c: f64,
    },

    /// A feed vector does not match the configured dimension.
    #[error("feed vector {index} has {len} components, dimension is {dimension}")]
    FeedMismatch {
        /// Index of the feed vector
        index: usize,
        /// Its number of components
        len: usize,
        /// Configured problem dimension
        dimension: usize,
    },

    /// A feed vector contains NaN.
    #[error("feed vector {index} contains a non-finite component")]
    FeedNotFinite {
        /// Index of the feed vector
        index: usize,
    },

    /// More feed vectors than the receiving shard can hold.
    #[error("{count} feed vectors exceed the receiving subpopulation ({subpopulation})")]
    FeedTooLarge {
        /// Number of feed vectors
        count: usize,
        /// Size of the receiving subpopulation
        subpopulation: usize,
    },

    /// No fitness function was registered before evaluation.
    #[error("fitness function is not registered")]
    FitnessUnset,

    /// Results were requested before a successful run.
    #[error("no results available: the optimizer has not completed a run")]
    NotRun,

    /// The optimizer was asked to run a second time.
    #[error("optimization already ran; create a new instance for another run")]
    AlreadyRun,

    /// Results were requested after the run aborted.
    #[error("results unavailable: run aborted with status {status}")]
    ResultsInvalidated {
        /// The nonzero status code of the aborted run
        status: i32,
    },

    /// The fitness function returned NaN or infinity.
    #[error("fitness function returned a non-finite value ({value}) at generation {generation}")]
    NonFiniteFitness {
        /// The offending value
        value: f64,
        /// Generation at which it was produced
        generation: usize,
    },

    /// A collective peer hung up mid-gather.
    #[error("collective channel disconnected at rank {rank}")]
    CollectiveDisconnected {
        /// Rank of the shard that observed the disconnect
        rank: usize,
    },

    /// A peer issued a differently-typed collective call for the same slot.
    #[error("collective payload mismatch: expected {expected}, received {received}")]
    CollectiveTypeMismatch {
        /// Payload type this shard gathered
        expected: &'static str,
        /// Payload type the peer sent
        received: &'static str,
    },

    /// Gathered payload sizes do not add up.
    #[error("collective payload shape mismatch: expected {expected} values, received {received}")]
    CollectiveShapeMismatch {
        /// Expected total payload length
        expected: usize,
        /// Received total payload length
        received: usize,
    },

    /// A shard worker thread could not be spawned.
    #[error("failed to spawn shard thread for rank {rank}")]
    ShardSpawn {
        /// Rank of the shard
        rank: usize,
    },

    /// A shard worker thread panicked before reporting.
    #[error("shard thread {rank} panicked")]
    ShardPanicked {
        /// Rank of the shard
        rank: usize,
    },
}

/// A specialized `Result` type for JADE operations.
pub type Result<T> = std::result::Result<T, JadeError>;

impl JadeError {
    /// Returns `true` for errors caused by an invalid configuration.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            JadeError::PopulationTooSmall { .. }
                | JadeError::IslandTooSmall { .. }
                | JadeError::InvalidDimension { .. }
                | JadeError::BoundsMismatch { .. }
                | JadeError::InvalidBounds { .. }
                | JadeError::BoundsUnset
                | JadeError::InvalidBestShare { .. }
                | JadeError::InvalidAdaptationFrequency { .. }
                | JadeError::FeedMismatch { .. }
                | JadeError::FeedNotFinite { .. }
                | JadeError::FeedTooLarge { .. }
                | JadeError::FitnessUnset
                | JadeError::NotRun
                | JadeError::AlreadyRun
                | JadeError::ResultsInvalidated { .. }
        )
    }

    /// Returns `true` for errors raised while evaluating the fitness function.
    pub fn is_evaluation_error(&self) -> bool {
        matches!(self, JadeError::NonFiniteFitness { .. })
    }

    /// Returns `true` for errors raised by the collective layer.
    pub fn is_distributed_error(&self) -> bool {
        matches!(
            self,
            JadeError::CollectiveDisconnected { .. }
                | JadeError::CollectiveTypeMismatch { .. }
                | JadeError::CollectiveShapeMismatch { .. }
                | JadeError::ShardSpawn { .. }
                | JadeError::ShardPanicked { .. }
        )
    }

    /// Nonzero status code reported by `SubPopulation::error_status`.
    pub fn status_code(&self) -> i32 {
        if self.is_evaluation_error() {
            2
        } else if self.is_distributed_error() {
            3
        } else {
            1
        }
    }
}
