use log::debug;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::dense::DenseMatrix;
use crate::error::{BenchError, Result};
use crate::sparse::spmv::row_blocks;

/// How the naive IJK product is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatMulMode {
    Sequential,
    /// Output rows split into `workers` contiguous blocks on a pool of
    /// `workers` threads.
    Parallel { workers: usize },
}

impl MatMulMode {
    pub fn workers(&self) -> usize {
        match *self {
            MatMulMode::Sequential => 1,
            MatMulMode::Parallel { workers } => workers,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MatMulMode::Sequential => "Sequential",
            MatMulMode::Parallel { .. } => "Parallel",
        }
    }
}

/// Dense product kernel bound to one execution strategy. The parallel pool is
/// built here, so timed calls never pay for thread start-up.
pub struct MatMulKernel {
    mode: MatMulMode,
    pool: Option<ThreadPool>,
}

impl MatMulKernel {
    pub fn new(mode: MatMulMode) -> Result<Self> {
        let pool = match mode {
            MatMulMode::Sequential => None,
            MatMulMode::Parallel { workers } => {
                if workers == 0 {
                    return Err(BenchError::InvalidWorkers { workers });
                }
                let pool = ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .thread_name(|i| format!("matmul-worker-{}", i))
                    .build()?;
                debug!("started matmul pool with {} workers", workers);
                Some(pool)
            }
        };
        Ok(MatMulKernel { mode, pool })
    }

    pub fn mode(&self) -> MatMulMode {
        self.mode
    }

    pub fn workers(&self) -> usize {
        self.mode.workers()
    }

    /// `out = a · b` with the i-j-k loop order. Every entry of `out` is a
    /// fresh accumulation over k, so `out` need not be cleared first.
    pub fn apply(&self, a: &DenseMatrix, b: &DenseMatrix, out: &mut DenseMatrix) -> Result<()> {
        check_shapes(a, b, out)?;
        let (c1, c2) = (a.cols, b.cols);

        match (self.mode, &self.pool) {
            (MatMulMode::Parallel { workers }, Some(pool)) => {
                let blocks = row_blocks(&mut out.data, c2, workers);
                pool.install(|| {
                    blocks.into_par_iter().for_each(|(first_row, chunk)| {
                        mul_rows(&a.data, &b.data, c1, c2, first_row, chunk)
                    });
                });
            }
            _ => mul_rows(&a.data, &b.data, c1, c2, 0, &mut out.data),
        }
        Ok(())
    }

    pub fn multiply(&self, a: &DenseMatrix, b: &DenseMatrix) -> Result<DenseMatrix> {
        let mut out = DenseMatrix::zeros(a.rows, b.cols);
        self.apply(a, b, &mut out)?;
        Ok(out)
    }
}

impl DenseMatrix {
    /// One-off `out = self · rhs`. Builds a throwaway kernel, so repeated or
    /// timed calls should hold a [`MatMulKernel`] instead.
    pub fn mul_into(
        &self,
        rhs: &DenseMatrix,
        out: &mut DenseMatrix,
        mode: MatMulMode,
    ) -> Result<()> {
        MatMulKernel::new(mode)?.apply(self, rhs, out)
    }

    pub fn mul(&self, rhs: &DenseMatrix, mode: MatMulMode) -> Result<DenseMatrix> {
        MatMulKernel::new(mode)?.multiply(self, rhs)
    }

    pub fn mul_seq(&self, rhs: &DenseMatrix) -> Result<DenseMatrix> {
        self.mul(rhs, MatMulMode::Sequential)
    }
}

fn check_shapes(a: &DenseMatrix, b: &DenseMatrix, out: &DenseMatrix) -> Result<()> {
    if a.cols != b.rows {
        return Err(BenchError::DimensionMismatch {
            what: "right operand rows",
            expected: a.cols,
            actual: b.rows,
        });
    }
    if out.rows != a.rows {
        return Err(BenchError::DimensionMismatch {
            what: "output rows",
            expected: a.rows,
            actual: out.rows,
        });
    }
    if out.cols != b.cols {
        return Err(BenchError::DimensionMismatch {
            what: "output columns",
            expected: b.cols,
            actual: out.cols,
        });
    }
    Ok(())
}

/// IJK over the rows whose output lives in `chunk`, starting at `first_row`.
#[inline]
fn mul_rows(a: &[f64], b: &[f64], c1: usize, c2: usize, first_row: usize, chunk: &mut [f64]) {
    if c2 == 0 {
        return;
    }
    for (local_i, out_row) in chunk.chunks_mut(c2).enumerate() {
        let i = first_row + local_i;
        for (j, out) in out_row.iter_mut().enumerate() {
            let mut sum = 0.0;
            for k in 0..c1 {
                sum += a[i * c1 + k] * b[k * c2 + j];
            }
            *out = sum;
        }
    }
}
