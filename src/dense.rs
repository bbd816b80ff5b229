pub mod matmul;
pub mod matrix;

pub use matmul::{MatMulKernel, MatMulMode};
pub use matrix::DenseMatrix;
