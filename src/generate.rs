//! Random benchmark inputs.
//!
//! All draws come from one `Pcg64` owned by the generator, so a seeded
//! generator always produces the same matrices and vectors.

use log::debug;
use rand::distributions::{Distribution, Uniform};
use rand::SeedableRng;
use rand_pcg::Pcg64;

use crate::dense::DenseMatrix;
use crate::error::{BenchError, Result};
use crate::sparse::CsrMatrix;

/// Inputs and zeroed accumulator for one dense product benchmark.
#[derive(Debug, Clone)]
pub struct DenseInputs {
    pub a: DenseMatrix,
    pub b: DenseMatrix,
    pub c: DenseMatrix,
}

pub struct MatrixGenerator {
    rng: Pcg64,
    uniform: Uniform<f64>,
}

impl MatrixGenerator {
    pub fn from_seed(seed: u64) -> Self {
        MatrixGenerator {
            rng: Pcg64::seed_from_u64(seed),
            uniform: Uniform::new(0.0, 1.0),
        }
    }

    pub fn from_entropy() -> Self {
        MatrixGenerator {
            rng: Pcg64::from_entropy(),
            uniform: Uniform::new(0.0, 1.0),
        }
    }

    /// Seeded when `seed` is given, entropy-seeded otherwise.
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::from_seed(seed),
            None => Self::from_entropy(),
        }
    }

    #[inline]
    fn draw(&mut self) -> f64 {
        self.uniform.sample(&mut self.rng)
    }

    /// N×N CSR matrix where each position is kept independently when a uniform
    /// draw exceeds `sparsity`; kept entries get a fresh value in [0, 1).
    pub fn sparse(&mut self, size: usize, sparsity: f64) -> Result<CsrMatrix> {
        if !(0.0..=1.0).contains(&sparsity) {
            return Err(BenchError::InvalidSparsity { sparsity });
        }

        let expected_nnz = (size as f64 * size as f64 * (1.0 - sparsity)) as usize;
        let mut values = Vec::with_capacity(expected_nnz);
        let mut col_indices = Vec::with_capacity(expected_nnz);
        let mut row_ptrs = Vec::with_capacity(size + 1);
        row_ptrs.push(0);

        for _ in 0..size {
            for j in 0..size {
                if self.draw() > sparsity {
                    values.push(self.draw());
                    col_indices.push(j);
                }
            }
            row_ptrs.push(values.len());
        }

        let matrix = CsrMatrix::from_generated(size, row_ptrs, col_indices, values);
        debug!(
            "generated {}x{} CSR matrix: nnz={} density={:.4} (target {:.4})",
            size,
            size,
            matrix.nnz(),
            matrix.density(),
            1.0 - sparsity
        );
        Ok(matrix)
    }

    /// Length-N vector of uniform [0, 1) values.
    pub fn vector(&mut self, size: usize) -> Vec<f64> {
        (0..size).map(|_| self.draw()).collect()
    }

    pub fn dense(&mut self, rows: usize, cols: usize) -> DenseMatrix {
        let data = (0..rows * cols).map(|_| self.draw()).collect();
        DenseMatrix { data, rows, cols }
    }

    /// Two random N×N operands plus a zero N×N output.
    pub fn dense_inputs(&mut self, size: usize) -> DenseInputs {
        let a = self.dense(size, size);
        let b = self.dense(size, size);
        DenseInputs {
            a,
            b,
            c: DenseMatrix::zeros(size, size),
        }
    }
}
