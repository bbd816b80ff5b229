use crate::error::{BenchError, Result};

/// Row-major rectangular matrix of `f64`.
#[derive(Debug, Clone)]
pub struct DenseMatrix {
    pub data: Vec<f64>,
    pub rows: usize,
    pub cols: usize,
}

impl DenseMatrix {
    pub fn from_vec(data: Vec<f64>, rows: usize, cols: usize) -> Result<DenseMatrix> {
        if data.len() != rows * cols {
            return Err(BenchError::DimensionMismatch {
                what: "dense matrix data",
                expected: rows * cols,
                actual: data.len(),
            });
        }
        Ok(DenseMatrix { data, rows, cols })
    }

    pub fn zeros(rows: usize, cols: usize) -> DenseMatrix {
        DenseMatrix {
            data: vec![0.0; rows * cols],
            rows,
            cols,
        }
    }

    pub fn identity(size: usize) -> DenseMatrix {
        let mut m = DenseMatrix::zeros(size, size);
        for i in 0..size {
            m.data[i * size + i] = 1.0;
        }
        m
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, val: f64) {
        self.data[row * self.cols + col] = val;
    }

    /// Reset every entry to zero, keeping the allocation.
    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    /// Dense matrix–vector product, row by row in ascending column order.
    pub fn mul_vec(&self, x: &[f64]) -> Result<Vec<f64>> {
        if x.len() != self.cols {
            return Err(BenchError::DimensionMismatch {
                what: "input vector",
                expected: self.cols,
                actual: x.len(),
            });
        }
        let mut y = vec![0.0; self.rows];
        for (i, yi) in y.iter_mut().enumerate() {
            let row = &self.data[i * self.cols..(i + 1) * self.cols];
            let mut sum = 0.0;
            for (a, b) in row.iter().zip(x) {
                sum += a * b;
            }
            *yi = sum;
        }
        Ok(y)
    }
}

// Exact comparison; kernels that reorder sums are compared with a tolerance instead.
impl PartialEq for DenseMatrix {
    fn eq(&self, other: &Self) -> bool {
        self.dims() == other.dims() && self.data == other.data
    }
}
