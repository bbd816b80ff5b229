//! Benchmark families driven by [`BenchConfig`].

use std::mem::size_of;

use log::info;

use crate::config::BenchConfig;
use crate::dense::{DenseMatrix, MatMulKernel, MatMulMode};
use crate::error::Result;
use crate::generate::MatrixGenerator;
use crate::harness::{BenchKernel, Harness, Variant};
use crate::report::BenchmarkReport;
use crate::sparse::{CsrMatrix, ExecutionMode, SpmvKernel};

/// One SpMV variant over a shared matrix and input vector.
pub struct SpmvCase<'a> {
    kernel: &'a SpmvKernel,
    matrix: &'a CsrMatrix,
    x: &'a [f64],
    y: Vec<f64>,
}

impl<'a> SpmvCase<'a> {
    pub fn new(kernel: &'a SpmvKernel, matrix: &'a CsrMatrix, x: &'a [f64]) -> Self {
        SpmvCase {
            kernel,
            matrix,
            x,
            y: vec![0.0; matrix.size()],
        }
    }
}

impl BenchKernel for SpmvCase<'_> {
    fn reset(&mut self) {
        self.y.fill(0.0);
    }

    fn run(&mut self) -> Result<()> {
        self.kernel.apply(self.matrix, self.x, &mut self.y)
    }
}

/// One dense product variant over shared operands.
pub struct MatMulCase<'a> {
    kernel: &'a MatMulKernel,
    a: &'a DenseMatrix,
    b: &'a DenseMatrix,
    c: DenseMatrix,
}

impl<'a> MatMulCase<'a> {
    pub fn new(
        kernel: &'a MatMulKernel,
        a: &'a DenseMatrix,
        b: &'a DenseMatrix,
        c: DenseMatrix,
    ) -> Self {
        MatMulCase { kernel, a, b, c }
    }
}

impl BenchKernel for MatMulCase<'_> {
    fn reset(&mut self) {
        self.c.clear();
    }

    fn run(&mut self) -> Result<()> {
        self.kernel.apply(self.a, self.b, &mut self.c)
    }
}

/// Sequential, parallel and vectorized SpMV over one random matrix of `size`.
pub fn run_spmv(
    config: &BenchConfig,
    size: usize,
    gen: &mut MatrixGenerator,
) -> Result<BenchmarkReport> {
    let harness = Harness::new(config.runs)?.warmup(config.warmup);

    let matrix = gen.sparse(size, config.sparsity)?;
    let x = gen.vector(size);

    let modes = [
        ExecutionMode::Sequential,
        ExecutionMode::Parallel {
            workers: config.workers,
        },
        ExecutionMode::ParallelSimd {
            workers: config.workers,
        },
    ];
    let kernels = modes
        .iter()
        .map(|&mode| SpmvKernel::new(mode))
        .collect::<Result<Vec<_>>>()?;

    let mut variants: Vec<Variant<'_>> = kernels
        .iter()
        .map(|kernel| {
            let case = SpmvCase::new(kernel, &matrix, &x);
            match kernel.mode() {
                ExecutionMode::Sequential => Variant::baseline(kernel.mode().name(), case),
                mode => Variant::new(mode.name(), kernel.workers(), case),
            }
        })
        .collect();

    info!(
        "SpMV N={} nnz={} runs={} workers={}",
        size,
        matrix.nnz(),
        config.runs,
        config.workers
    );
    let results = harness.run(&mut variants)?;

    // x plus one output vector per variant
    let vector_bytes = (1 + variants.len()) * size * size_of::<f64>();
    let memory_mb = matrix.memory_usage_mb() + vector_bytes as f64 / 1024.0 / 1024.0;

    Ok(BenchmarkReport {
        title: "Sparse SpMV (CSR)".to_string(),
        size,
        runs: config.runs,
        nnz: Some(matrix.nnz()),
        memory_mb: Some(memory_mb),
        variants: results,
    })
}

/// Naive IJK product of two random `size`×`size` matrices, sequential and parallel.
pub fn run_matmul(
    config: &BenchConfig,
    size: usize,
    gen: &mut MatrixGenerator,
) -> Result<BenchmarkReport> {
    let harness = Harness::new(config.runs)?.warmup(config.warmup);

    let inputs = gen.dense_inputs(size);
    let seq = MatMulKernel::new(MatMulMode::Sequential)?;
    let par = MatMulKernel::new(MatMulMode::Parallel {
        workers: config.workers,
    })?;

    let mut variants = vec![
        Variant::baseline(
            seq.mode().name(),
            MatMulCase::new(&seq, &inputs.a, &inputs.b, inputs.c.clone()),
        ),
        Variant::new(
            par.mode().name(),
            par.workers(),
            MatMulCase::new(&par, &inputs.a, &inputs.b, inputs.c.clone()),
        ),
    ];

    info!(
        "MatMul N={} runs={} workers={}",
        size, config.runs, config.workers
    );
    let results = harness.run(&mut variants)?;

    let matrix_bytes = (2 + variants.len()) * size * size * size_of::<f64>();

    Ok(BenchmarkReport {
        title: "Dense MatMul (IJK)".to_string(),
        size,
        runs: config.runs,
        nnz: None,
        memory_mb: Some(matrix_bytes as f64 / 1024.0 / 1024.0),
        variants: results,
    })
}
