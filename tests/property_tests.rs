//! Property tests for CSR generation, SpMV strategies and harness metrics.

use std::time::Duration;

use kernel_bench::harness::{average_secs, efficiency, speedup};
use kernel_bench::{ExecutionMode, MatrixGenerator, SpmvKernel};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_generated_csr_is_well_formed(
        size in 0usize..48,
        sparsity in 0.0f64..=1.0,
        seed in any::<u64>()
    ) {
        let m = MatrixGenerator::from_seed(seed).sparse(size, sparsity).unwrap();
        let row_ptrs = m.row_ptrs();

        prop_assert_eq!(row_ptrs.len(), size + 1);
        prop_assert_eq!(row_ptrs[0], 0);
        prop_assert!(row_ptrs.windows(2).all(|w| w[0] <= w[1]));
        prop_assert_eq!(row_ptrs[size], m.values().len());
        prop_assert_eq!(m.values().len(), m.col_indices().len());
        prop_assert!(m.col_indices().iter().all(|&c| c < size));
        prop_assert!(m.values().iter().all(|&v| (0.0..1.0).contains(&v)));
    }

    #[test]
    fn prop_columns_strictly_increase_within_row(size in 1usize..32, seed in any::<u64>()) {
        let m = MatrixGenerator::from_seed(seed).sparse(size, 0.5).unwrap();
        for i in 0..size {
            let cols = &m.col_indices()[m.row_range(i)];
            prop_assert!(cols.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn prop_parallel_equals_sequential_bitwise(
        size in 0usize..64,
        sparsity in 0.0f64..=1.0,
        workers in 1usize..80,
        seed in any::<u64>()
    ) {
        let mut gen = MatrixGenerator::from_seed(seed);
        let a = gen.sparse(size, sparsity).unwrap();
        let x = gen.vector(size);

        let seq = SpmvKernel::new(ExecutionMode::Sequential).unwrap().multiply(&a, &x).unwrap();
        let par = SpmvKernel::new(ExecutionMode::Parallel { workers }).unwrap().multiply(&a, &x).unwrap();

        let seq_bits: Vec<u64> = seq.iter().map(|v| v.to_bits()).collect();
        let par_bits: Vec<u64> = par.iter().map(|v| v.to_bits()).collect();
        prop_assert_eq!(seq_bits, par_bits);
    }

    #[test]
    fn prop_rejects_sparsity_above_one(sparsity in 1.0001f64..100.0) {
        let result = MatrixGenerator::from_seed(0).sparse(4, sparsity);
        prop_assert!(result.is_err());
    }

    #[test]
    fn prop_average_of_constant_duration(micros in 1u64..1_000_000, runs in 1usize..100) {
        let d = Duration::from_micros(micros);
        let total = d * runs as u32;
        let avg = average_secs(total, runs).unwrap();
        prop_assert!((avg - d.as_secs_f64()).abs() <= 1e-12);
    }

    #[test]
    fn prop_efficiency_is_speedup_over_workers(
        base in 1e-6f64..10.0,
        variant in 1e-6f64..10.0,
        workers in 1usize..256
    ) {
        let s = speedup(base, variant);
        prop_assert!((s - base / variant).abs() <= f64::EPSILON * s.abs());
        prop_assert!((efficiency(s, workers) - s / workers as f64).abs() <= f64::EPSILON * s);
    }
}
