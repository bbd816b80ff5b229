//! Error types for kernel generation, execution and timing.

use thiserror::Error;

/// Errors that can occur while building inputs, running a kernel or timing it.
///
/// Every error is fatal to a single benchmark invocation only; a driver can
/// skip the failed size and move on.
#[derive(Debug, Error)]
pub enum BenchError {
    /// An operand does not have the length or shape the kernel requires.
    #[error("dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Which operand was wrong
        what: &'static str,
        /// Length/dimension the kernel expected
        expected: usize,
        /// Length/dimension it received
        actual: usize,
    },

    /// Repetition count must be at least 1.
    #[error("invalid repetition count: {runs} (must be > 0)")]
    InvalidRuns {
        /// The rejected count
        runs: usize,
    },

    /// Sparsity must lie in [0, 1].
    #[error("invalid sparsity: {sparsity} (must be within [0, 1])")]
    InvalidSparsity {
        /// The rejected sparsity
        sparsity: f64,
    },

    /// A parallel strategy needs at least one worker.
    #[error("invalid worker count: {workers} (must be > 0)")]
    InvalidWorkers {
        /// The rejected worker count
        workers: usize,
    },

    /// Raw CSR components that break the row-offset/column invariants.
    #[error("malformed CSR matrix: {0}")]
    MalformedCsr(String),

    /// The harness was asked to time nothing.
    #[error("no kernel variants to benchmark")]
    NoVariants,

    /// Driver configuration that cannot describe a benchmark.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The worker pool could not be started.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// A specialized `Result` type for benchmark operations.
pub type Result<T> = std::result::Result<T, BenchError>;

impl BenchError {
    /// Returns `true` if an operand had the wrong length or shape.
    pub fn is_dimension_error(&self) -> bool {
        matches!(self, BenchError::DimensionMismatch { .. })
    }

    /// Returns `true` if a caller-supplied parameter was out of range.
    pub fn is_parameter_error(&self) -> bool {
        matches!(
            self,
            BenchError::InvalidRuns { .. }
                | BenchError::InvalidSparsity { .. }
                | BenchError::InvalidWorkers { .. }
                | BenchError::InvalidConfig(_)
        )
    }
}
