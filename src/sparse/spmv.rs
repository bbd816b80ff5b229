use std::ops::Range;

use log::debug;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{BenchError, Result};
use crate::sparse::CsrMatrix;

/// Accumulator lanes used by [`ExecutionMode::ParallelSimd`].
pub const LANES: usize = 4;

/// How a sparse matrix–vector product is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Rows in order on the calling thread.
    Sequential,
    /// Rows split into `workers` contiguous blocks, scheduled on a pool of
    /// `workers` threads. Block boundaries are fixed; which thread runs a block
    /// is up to the pool.
    Parallel { workers: usize },
    /// Same blocks as `Parallel`, but each row is summed in `LANES` independent
    /// accumulators the compiler may keep in vector registers. No explicit
    /// SIMD. Results match the other modes only within rounding.
    ParallelSimd { workers: usize },
}

impl ExecutionMode {
    /// `Parallel` sized to the host's hardware concurrency.
    pub fn parallel() -> Self {
        ExecutionMode::Parallel {
            workers: available_workers(),
        }
    }

    /// `ParallelSimd` sized to the host's hardware concurrency.
    pub fn parallel_simd() -> Self {
        ExecutionMode::ParallelSimd {
            workers: available_workers(),
        }
    }

    pub fn workers(&self) -> usize {
        match *self {
            ExecutionMode::Sequential => 1,
            ExecutionMode::Parallel { workers } | ExecutionMode::ParallelSimd { workers } => {
                workers
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExecutionMode::Sequential => "Sequential",
            ExecutionMode::Parallel { .. } => "Parallel",
            ExecutionMode::ParallelSimd { .. } => "Vectorized",
        }
    }
}

/// Hardware concurrency reported by the OS, 1 if it cannot be queried.
pub fn available_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Rows per block when `rows` are split over `workers`; never 0.
pub fn block_len(rows: usize, workers: usize) -> usize {
    rows.div_ceil(workers.max(1)).max(1)
}

/// The contiguous row block owned by each worker. Depends only on `rows` and
/// `workers`; trailing workers get nothing when `workers > rows`.
pub fn partition(rows: usize, workers: usize) -> Vec<Range<usize>> {
    if rows == 0 {
        return Vec::new();
    }
    let block = block_len(rows, workers);
    (0..rows)
        .step_by(block)
        .map(|start| start..(start + block).min(rows))
        .collect()
}

/// Splits a row-major buffer of `row_len`-wide rows along [`partition`].
/// Each entry is the block's first row and its disjoint slice of `out`.
pub fn row_blocks<T>(out: &mut [T], row_len: usize, workers: usize) -> Vec<(usize, &mut [T])> {
    if row_len == 0 {
        return Vec::new();
    }
    let rows = out.len() / row_len;
    let mut rest = out;
    partition(rows, workers)
        .into_iter()
        .map(|range| {
            let (head, tail) = std::mem::take(&mut rest).split_at_mut(range.len() * row_len);
            rest = tail;
            (range.start, head)
        })
        .collect()
}

/// SpMV kernel bound to one execution strategy.
///
/// Parallel strategies own their worker pool, so building the kernel (and
/// spawning threads) happens once, outside any timed region.
pub struct SpmvKernel {
    mode: ExecutionMode,
    pool: Option<ThreadPool>,
}

impl SpmvKernel {
    pub fn new(mode: ExecutionMode) -> Result<Self> {
        let pool = match mode {
            ExecutionMode::Sequential => None,
            ExecutionMode::Parallel { workers } | ExecutionMode::ParallelSimd { workers } => {
                if workers == 0 {
                    return Err(BenchError::InvalidWorkers { workers });
                }
                let pool = ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .thread_name(|i| format!("spmv-worker-{}", i))
                    .build()?;
                debug!("started SpMV pool with {} workers", workers);
                Some(pool)
            }
        };
        Ok(SpmvKernel { mode, pool })
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn workers(&self) -> usize {
        self.mode.workers()
    }

    /// `y = a · x`. Every element of `y` is overwritten.
    pub fn apply(&self, a: &CsrMatrix, x: &[f64], y: &mut [f64]) -> Result<()> {
        check_dims(a, x, y)?;

        match (self.mode, &self.pool) {
            (ExecutionMode::Parallel { workers }, Some(pool)) => {
                spmv_blocked(pool, a, x, y, workers, row_dot)
            }
            (ExecutionMode::ParallelSimd { workers }, Some(pool)) => {
                spmv_blocked(pool, a, x, y, workers, row_dot_lanes)
            }
            _ => spmv_rows(a, x, 0, y, row_dot),
        }
        Ok(())
    }

    /// Allocating form of [`SpmvKernel::apply`].
    pub fn multiply(&self, a: &CsrMatrix, x: &[f64]) -> Result<Vec<f64>> {
        let mut y = vec![0.0; a.size()];
        self.apply(a, x, &mut y)?;
        Ok(y)
    }
}

/// Sequential `y = a · x` without a kernel object.
pub fn spmv_seq(a: &CsrMatrix, x: &[f64], y: &mut [f64]) -> Result<()> {
    check_dims(a, x, y)?;
    spmv_rows(a, x, 0, y, row_dot);
    Ok(())
}

fn check_dims(a: &CsrMatrix, x: &[f64], y: &[f64]) -> Result<()> {
    if x.len() != a.size() {
        return Err(BenchError::DimensionMismatch {
            what: "input vector",
            expected: a.size(),
            actual: x.len(),
        });
    }
    if y.len() != a.size() {
        return Err(BenchError::DimensionMismatch {
            what: "output vector",
            expected: a.size(),
            actual: y.len(),
        });
    }
    Ok(())
}

fn spmv_blocked(
    pool: &ThreadPool,
    a: &CsrMatrix,
    x: &[f64],
    y: &mut [f64],
    workers: usize,
    dot: fn(&CsrMatrix, &[f64], usize) -> f64,
) {
    let blocks = row_blocks(y, 1, workers);
    pool.install(|| {
        blocks
            .into_par_iter()
            .for_each(|(first_row, chunk)| spmv_rows(a, x, first_row, chunk, dot));
    });
}

#[inline]
fn spmv_rows(
    a: &CsrMatrix,
    x: &[f64],
    first_row: usize,
    out: &mut [f64],
    dot: fn(&CsrMatrix, &[f64], usize) -> f64,
) {
    for (local, yi) in out.iter_mut().enumerate() {
        *yi = dot(a, x, first_row + local);
    }
}

#[inline]
fn row_dot(a: &CsrMatrix, x: &[f64], i: usize) -> f64 {
    let values = a.values();
    let cols = a.col_indices();
    let mut sum = 0.0;
    for k in a.row_range(i) {
        sum += values[k] * x[cols[k]];
    }
    sum
}

#[inline]
fn row_dot_lanes(a: &CsrMatrix, x: &[f64], i: usize) -> f64 {
    let range = a.row_range(i);
    let values = &a.values()[range.clone()];
    let cols = &a.col_indices()[range];

    let mut acc = [0.0f64; LANES];
    let mut v_chunks = values.chunks_exact(LANES);
    let mut c_chunks = cols.chunks_exact(LANES);
    for (v, c) in (&mut v_chunks).zip(&mut c_chunks) {
        for ((lane, &v), &c) in acc.iter_mut().zip(v).zip(c) {
            *lane += v * x[c];
        }
    }

    let mut sum = (acc[0] + acc[1]) + (acc[2] + acc[3]);
    for (v, &c) in v_chunks.remainder().iter().zip(c_chunks.remainder()) {
        sum += v * x[c];
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tridiagonal(n: usize) -> CsrMatrix {
        let mut row_ptrs = vec![0];
        let mut cols = Vec::new();
        let mut vals = Vec::new();
        for i in 0..n {
            for j in i.saturating_sub(1)..(i + 2).min(n) {
                cols.push(j);
                vals.push(if i == j { 2.0 } else { -1.0 });
            }
            row_ptrs.push(cols.len());
        }
        CsrMatrix::from_raw_parts(n, row_ptrs, cols, vals).unwrap()
    }

    #[test]
    fn test_partition_covers_rows_contiguously() {
        let blocks = partition(10, 3);
        assert_eq!(blocks, vec![0..4, 4..8, 8..10]);
    }

    #[test]
    fn test_partition_more_workers_than_rows() {
        let blocks = partition(3, 8);
        assert_eq!(blocks, vec![0..1, 1..2, 2..3]);
    }

    #[test]
    fn test_partition_empty() {
        assert!(partition(0, 4).is_empty());
        assert_eq!(block_len(0, 4), 1);
    }

    #[test]
    fn test_row_blocks_follow_partition() {
        let mut out = vec![0.0; 10 * 2];
        let blocks = row_blocks(&mut out, 2, 3);
        let shape: Vec<(usize, usize)> = blocks.iter().map(|(r, c)| (*r, c.len())).collect();
        assert_eq!(shape, vec![(0, 8), (4, 8), (8, 4)]);

        let mut empty: Vec<f64> = Vec::new();
        assert!(row_blocks(&mut empty, 4, 2).is_empty());
        assert!(row_blocks(&mut out, 0, 2).is_empty());
    }

    #[test]
    fn test_blocks_write_their_own_rows() {
        // each row's value equals its index, so a misplaced block shows up
        let n = 11;
        let a = CsrMatrix::from_raw_parts(n, (0..=n).collect(), (0..n).collect(), vec![1.0; n])
            .unwrap();
        let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
        for workers in [1, 3, 4, 11, 20] {
            let y = SpmvKernel::new(ExecutionMode::Parallel { workers })
                .unwrap()
                .multiply(&a, &x)
                .unwrap();
            assert_eq!(y, x, "workers = {}", workers);
        }
    }

    #[test]
    fn test_sequential_tridiagonal() {
        let a = tridiagonal(4);
        let x = vec![1.0, 1.0, 1.0, 1.0];
        let y = SpmvKernel::new(ExecutionMode::Sequential)
            .unwrap()
            .multiply(&a, &x)
            .unwrap();
        assert_eq!(y, vec![1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_parallel_matches_sequential_bitwise() {
        let a = tridiagonal(37);
        let x: Vec<f64> = (0..37).map(|i| 0.1 * i as f64).collect();
        let seq = SpmvKernel::new(ExecutionMode::Sequential)
            .unwrap()
            .multiply(&a, &x)
            .unwrap();
        for workers in [1, 2, 5, 64] {
            let par = SpmvKernel::new(ExecutionMode::Parallel { workers })
                .unwrap()
                .multiply(&a, &x)
                .unwrap();
            let seq_bits: Vec<u64> = seq.iter().map(|v| v.to_bits()).collect();
            let par_bits: Vec<u64> = par.iter().map(|v| v.to_bits()).collect();
            assert_eq!(seq_bits, par_bits, "workers = {}", workers);
        }
    }

    #[test]
    fn test_lane_accumulation_handles_remainder() {
        // one dense row of 7 entries: 4 go through the lanes, 3 through the tail
        let a = CsrMatrix::from_raw_parts(
            7,
            vec![0, 7, 7, 7, 7, 7, 7, 7],
            (0..7).collect(),
            vec![1.0; 7],
        )
        .unwrap();
        let x: Vec<f64> = (1..=7).map(|v| v as f64).collect();
        let y = SpmvKernel::new(ExecutionMode::ParallelSimd { workers: 2 })
            .unwrap()
            .multiply(&a, &x)
            .unwrap();
        assert_eq!(y[0], 28.0);
        assert!(y[1..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let err = SpmvKernel::new(ExecutionMode::Parallel { workers: 0 })
            .err()
            .unwrap();
        assert!(matches!(err, BenchError::InvalidWorkers { workers: 0 }));
    }

    #[test]
    fn test_input_length_mismatch() {
        let a = tridiagonal(4);
        let kernel = SpmvKernel::new(ExecutionMode::Parallel { workers: 2 }).unwrap();
        let err = kernel.multiply(&a, &[1.0, 2.0]).unwrap_err();
        assert!(err.is_dimension_error());
    }

    #[test]
    fn test_output_length_mismatch() {
        let a = tridiagonal(4);
        let mut y = vec![0.0; 3];
        let err = spmv_seq(&a, &[1.0; 4], &mut y).unwrap_err();
        assert!(err.to_string().contains("output vector"));
    }

    #[test]
    fn test_mode_names_and_workers() {
        assert_eq!(ExecutionMode::Sequential.workers(), 1);
        assert_eq!(ExecutionMode::Parallel { workers: 6 }.workers(), 6);
        assert_eq!(ExecutionMode::ParallelSimd { workers: 3 }.name(), "Vectorized");
        assert!(ExecutionMode::parallel().workers() >= 1);
    }
}
