//! Compressed sparse row storage for square matrices.
//!
//! - `values`: non-zero entries in row-major order
//! - `col_indices`: column of each value
//! - `row_ptrs`: `row_ptrs[i]..row_ptrs[i + 1]` is the slice of row `i`

use std::mem::size_of;
use std::ops::Range;

use crate::dense::DenseMatrix;
use crate::error::{BenchError, Result};

/// Square N×N matrix in CSR form.
///
/// Built once (by [`crate::generate::MatrixGenerator::sparse`] or one of the
/// constructors below) and read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    size: usize,
    values: Vec<f64>,
    col_indices: Vec<usize>,
    row_ptrs: Vec<usize>,
}

impl CsrMatrix {
    /// An N×N matrix with no stored entries.
    pub fn empty(size: usize) -> Self {
        CsrMatrix {
            size,
            values: Vec::new(),
            col_indices: Vec::new(),
            row_ptrs: vec![0; size + 1],
        }
    }

    /// Build from raw components, checking every structural invariant.
    pub fn from_raw_parts(
        size: usize,
        row_ptrs: Vec<usize>,
        col_indices: Vec<usize>,
        values: Vec<f64>,
    ) -> Result<Self> {
        if row_ptrs.len() != size + 1 {
            return Err(BenchError::MalformedCsr(format!(
                "row_ptrs has {} entries, expected {}",
                row_ptrs.len(),
                size + 1
            )));
        }
        if col_indices.len() != values.len() {
            return Err(BenchError::MalformedCsr(format!(
                "{} column indices for {} values",
                col_indices.len(),
                values.len()
            )));
        }
        if row_ptrs[0] != 0 {
            return Err(BenchError::MalformedCsr(format!(
                "row_ptrs[0] is {}, expected 0",
                row_ptrs[0]
            )));
        }
        if let Some(i) = row_ptrs.windows(2).position(|w| w[0] > w[1]) {
            return Err(BenchError::MalformedCsr(format!(
                "row_ptrs decreases at row {}",
                i
            )));
        }
        if row_ptrs[size] != values.len() {
            return Err(BenchError::MalformedCsr(format!(
                "row_ptrs[{}] is {}, expected nnz {}",
                size,
                row_ptrs[size],
                values.len()
            )));
        }
        if let Some(&col) = col_indices.iter().find(|&&c| c >= size) {
            return Err(BenchError::MalformedCsr(format!(
                "column index {} out of range for size {}",
                col, size
            )));
        }

        Ok(CsrMatrix {
            size,
            values,
            col_indices,
            row_ptrs,
        })
    }

    /// Keep every non-zero entry of a square dense matrix.
    pub fn from_dense(dense: &DenseMatrix) -> Result<Self> {
        let (rows, cols) = dense.dims();
        if rows != cols {
            return Err(BenchError::DimensionMismatch {
                what: "dense matrix columns",
                expected: rows,
                actual: cols,
            });
        }

        let mut values = Vec::new();
        let mut col_indices = Vec::new();
        let mut row_ptrs = Vec::with_capacity(rows + 1);
        row_ptrs.push(0);

        for i in 0..rows {
            for j in 0..cols {
                let val = dense.get(i, j);
                if val != 0.0 {
                    values.push(val);
                    col_indices.push(j);
                }
            }
            row_ptrs.push(values.len());
        }

        Ok(CsrMatrix {
            size: rows,
            values,
            col_indices,
            row_ptrs,
        })
    }

    /// Assemble from parts the generator already produced in row order.
    pub(crate) fn from_generated(
        size: usize,
        row_ptrs: Vec<usize>,
        col_indices: Vec<usize>,
        values: Vec<f64>,
    ) -> Self {
        debug_assert_eq!(row_ptrs.len(), size + 1);
        debug_assert_eq!(row_ptrs[size], values.len());
        CsrMatrix {
            size,
            values,
            col_indices,
            row_ptrs,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Fraction of the N² positions that are stored; 0 for an empty matrix.
    pub fn density(&self) -> f64 {
        if self.size == 0 {
            return 0.0;
        }
        self.nnz() as f64 / (self.size as f64 * self.size as f64)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn col_indices(&self) -> &[usize] {
        &self.col_indices
    }

    pub fn row_ptrs(&self) -> &[usize] {
        &self.row_ptrs
    }

    /// Index range of row `i` inside `values`/`col_indices`.
    #[inline]
    pub fn row_range(&self, i: usize) -> Range<usize> {
        self.row_ptrs[i]..self.row_ptrs[i + 1]
    }

    /// Approximate heap footprint of the three CSR arrays in MiB.
    pub fn memory_usage_mb(&self) -> f64 {
        let total_bytes = self.values.len() * size_of::<f64>()
            + self.col_indices.len() * size_of::<usize>()
            + self.row_ptrs.len() * size_of::<usize>();
        total_bytes as f64 / 1024.0 / 1024.0
    }

    /// Expand back to a dense matrix.
    pub fn to_dense(&self) -> DenseMatrix {
        let mut dense = DenseMatrix::zeros(self.size, self.size);
        for i in 0..self.size {
            for k in self.row_range(i) {
                dense.set(i, self.col_indices[k], self.values[k]);
            }
        }
        dense
    }
}
