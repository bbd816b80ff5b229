use crate::error::{BenchError, Result};
use crate::sparse::available_workers;

/// Which kernel families a driver run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Family {
    Spmv,
    Matmul,
    All,
}

impl Family {
    pub fn includes_spmv(&self) -> bool {
        matches!(self, Family::Spmv | Family::All)
    }

    pub fn includes_matmul(&self) -> bool {
        matches!(self, Family::Matmul | Family::All)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BenchConfig {
    pub sizes: Vec<usize>,
    pub runs: usize,
    pub warmup: usize,
    /// Probability that a sparse position stays empty.
    pub sparsity: f64,
    /// `None` seeds from OS entropy.
    pub seed: Option<u64>,
    pub workers: usize,
    pub family: Family,
}

impl Default for BenchConfig {
    fn default() -> Self {
        BenchConfig {
            sizes: vec![512, 1024, 1536],
            runs: 5,
            warmup: 1,
            sparsity: 0.95,
            seed: None,
            workers: available_workers(),
            family: Family::All,
        }
    }
}

impl BenchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sizes.is_empty() {
            return Err(BenchError::InvalidConfig("no problem sizes given".to_string()));
        }
        if self.runs == 0 {
            return Err(BenchError::InvalidRuns { runs: self.runs });
        }
        if !(0.0..=1.0).contains(&self.sparsity) {
            return Err(BenchError::InvalidSparsity {
                sparsity: self.sparsity,
            });
        }
        if self.workers == 0 {
            return Err(BenchError::InvalidWorkers {
                workers: self.workers,
            });
        }
        Ok(())
    }
}
