pub mod csr;
pub mod spmv;

pub use csr::CsrMatrix;
pub use spmv::{available_workers, spmv_seq, ExecutionMode, SpmvKernel};
