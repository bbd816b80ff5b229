pub mod config;
pub mod dense;
pub mod error;
pub mod generate;
pub mod harness;
pub mod report;
pub mod sparse;
pub mod suite;

pub use config::{BenchConfig, Family};
pub use dense::{DenseMatrix, MatMulKernel, MatMulMode};
pub use error::{BenchError, Result};
pub use generate::MatrixGenerator;
pub use harness::{BenchKernel, Clock, Harness, MonotonicClock, Variant, VariantResult};
pub use report::BenchmarkReport;
pub use sparse::{CsrMatrix, ExecutionMode, SpmvKernel};
