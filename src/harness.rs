//! Repeated, timed execution of kernel variants over a shared input.
//!
//! Each repetition resets every variant's output, then times exactly one
//! kernel call per variant. Generation, reset and bookkeeping stay outside
//! the timed region.

use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::error::{BenchError, Result};

/// Monotonic time source, measured from an arbitrary fixed origin.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// `Instant`-backed clock used for real measurements.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        MonotonicClock {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// A kernel invocation the harness can time.
pub trait BenchKernel {
    /// Put the output back into its zero state. Never timed.
    fn reset(&mut self);

    /// The call being measured. Must not return before all work it started
    /// (including any workers) has finished.
    fn run(&mut self) -> Result<()>;
}

/// One named kernel variant in a benchmark.
pub struct Variant<'a> {
    pub name: String,
    pub workers: usize,
    pub baseline: bool,
    kernel: Box<dyn BenchKernel + 'a>,
}

impl<'a> Variant<'a> {
    pub fn new(name: impl Into<String>, workers: usize, kernel: impl BenchKernel + 'a) -> Self {
        Variant {
            name: name.into(),
            workers,
            baseline: false,
            kernel: Box::new(kernel),
        }
    }

    /// The single-worker reference that speedups are measured against.
    pub fn baseline(name: impl Into<String>, kernel: impl BenchKernel + 'a) -> Self {
        Variant {
            baseline: true,
            ..Variant::new(name, 1, kernel)
        }
    }
}

/// Aggregated timing of one variant.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantResult {
    pub name: String,
    pub workers: usize,
    pub runs: usize,
    pub total: Duration,
    /// Seconds per run.
    pub average: f64,
    /// Baseline average / this average; `None` for the baseline itself or
    /// when no baseline was given.
    pub speedup: Option<f64>,
    /// Speedup / workers.
    pub efficiency: Option<f64>,
}

/// Mean seconds per run. `runs == 0` is rejected.
pub fn average_secs(total: Duration, runs: usize) -> Result<f64> {
    if runs == 0 {
        return Err(BenchError::InvalidRuns { runs });
    }
    Ok(total.as_secs_f64() / runs as f64)
}

pub fn speedup(baseline_avg: f64, variant_avg: f64) -> f64 {
    baseline_avg / variant_avg
}

pub fn efficiency(speedup: f64, workers: usize) -> f64 {
    speedup / workers as f64
}

pub struct Harness<C: Clock = MonotonicClock> {
    runs: usize,
    warmup: usize,
    clock: C,
}

impl Harness<MonotonicClock> {
    pub fn new(runs: usize) -> Result<Self> {
        Self::with_clock(runs, MonotonicClock::new())
    }
}

impl<C: Clock> Harness<C> {
    pub fn with_clock(runs: usize, clock: C) -> Result<Self> {
        if runs == 0 {
            return Err(BenchError::InvalidRuns { runs });
        }
        Ok(Harness {
            runs,
            warmup: 1,
            clock,
        })
    }

    /// Untimed calls per variant before measuring. Defaults to 1.
    pub fn warmup(mut self, warmup: usize) -> Self {
        self.warmup = warmup;
        self
    }

    pub fn runs(&self) -> usize {
        self.runs
    }

    pub fn run(&self, variants: &mut [Variant<'_>]) -> Result<Vec<VariantResult>> {
        if variants.is_empty() {
            return Err(BenchError::NoVariants);
        }
        // efficiency divides by the worker count
        if let Some(v) = variants.iter().find(|v| v.workers == 0) {
            return Err(BenchError::InvalidWorkers { workers: v.workers });
        }

        for variant in variants.iter_mut() {
            for _ in 0..self.warmup {
                variant.kernel.reset();
                variant.kernel.run()?;
            }
        }

        let mut totals = vec![Duration::ZERO; variants.len()];
        for rep in 0..self.runs {
            for (variant, total) in variants.iter_mut().zip(totals.iter_mut()) {
                variant.kernel.reset();

                let start = self.clock.now();
                variant.kernel.run()?;
                let elapsed = self.clock.now().saturating_sub(start);

                *total += elapsed;
                debug!("{} run {}: {:?}", variant.name, rep + 1, elapsed);
            }
        }

        let mut results = Vec::with_capacity(variants.len());
        for (variant, total) in variants.iter().zip(totals) {
            let average = average_secs(total, self.runs)?;
            if average == 0.0 {
                warn!(
                    "{} averaged 0s over {} runs; timer resolution too coarse",
                    variant.name, self.runs
                );
            }
            results.push(VariantResult {
                name: variant.name.clone(),
                workers: variant.workers,
                runs: self.runs,
                total,
                average,
                speedup: None,
                efficiency: None,
            });
        }

        if let Some(base) = variants.iter().position(|v| v.baseline) {
            let base_avg = results[base].average;
            for (i, result) in results.iter_mut().enumerate() {
                if i == base {
                    continue;
                }
                let s = speedup(base_avg, result.average);
                result.speedup = Some(s);
                result.efficiency = Some(efficiency(s, result.workers));
            }
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct ManualClock(Rc<Cell<Duration>>);

    impl ManualClock {
        fn advance(&self, d: Duration) {
            self.0.set(self.0.get() + d);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Duration {
            self.0.get()
        }
    }

    struct Sleepy {
        clock: ManualClock,
        cost: Duration,
    }

    impl BenchKernel for Sleepy {
        fn reset(&mut self) {}

        fn run(&mut self) -> Result<()> {
            self.clock.advance(self.cost);
            Ok(())
        }
    }

    fn sleepy(clock: &ManualClock, micros: u64) -> Sleepy {
        Sleepy {
            clock: clock.clone(),
            cost: Duration::from_micros(micros),
        }
    }

    #[test]
    fn test_constant_duration_average() {
        let clock = ManualClock::default();
        let harness = Harness::with_clock(5, clock.clone()).unwrap();
        let mut variants = vec![Variant::baseline("Sequential", sleepy(&clock, 2000))];

        let results = harness.run(&mut variants).unwrap();
        assert_eq!(results[0].total, Duration::from_millis(10));
        assert!((results[0].average - 0.002).abs() < 1e-12);
        assert_eq!(results[0].speedup, None);
    }

    #[test]
    fn test_warmup_is_not_timed() {
        let clock = ManualClock::default();
        let harness = Harness::with_clock(3, clock.clone()).unwrap().warmup(2);
        let mut variants = vec![Variant::new("k", 1, sleepy(&clock, 100))];

        let results = harness.run(&mut variants).unwrap();
        assert_eq!(results[0].total, Duration::from_micros(300));
    }

    #[test]
    fn test_speedup_and_efficiency() {
        let clock = ManualClock::default();
        let harness = Harness::with_clock(4, clock.clone()).unwrap();
        let mut variants = vec![
            Variant::baseline("Sequential", sleepy(&clock, 800)),
            Variant::new("Parallel", 4, sleepy(&clock, 200)),
        ];

        let results = harness.run(&mut variants).unwrap();
        let par = &results[1];
        assert!((par.speedup.unwrap() - 4.0).abs() < 1e-9);
        assert!((par.efficiency.unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_baseline_no_speedup() {
        let clock = ManualClock::default();
        let harness = Harness::with_clock(2, clock.clone()).unwrap();
        let mut variants = vec![
            Variant::new("a", 2, sleepy(&clock, 10)),
            Variant::new("b", 2, sleepy(&clock, 20)),
        ];
        let results = harness.run(&mut variants).unwrap();
        assert!(results.iter().all(|r| r.speedup.is_none() && r.efficiency.is_none()));
    }

    #[test]
    fn test_zero_runs_rejected() {
        let err = Harness::new(0).err().unwrap();
        assert!(matches!(err, BenchError::InvalidRuns { runs: 0 }));
        assert!(average_secs(Duration::from_secs(1), 0).is_err());
    }

    #[test]
    fn test_empty_variants_rejected() {
        let harness = Harness::new(1).unwrap();
        let err = harness.run(&mut []).unwrap_err();
        assert!(matches!(err, BenchError::NoVariants));
    }

    #[test]
    fn test_kernel_error_propagates() {
        struct Failing;
        impl BenchKernel for Failing {
            fn reset(&mut self) {}
            fn run(&mut self) -> Result<()> {
                Err(BenchError::DimensionMismatch {
                    what: "input vector",
                    expected: 2,
                    actual: 1,
                })
            }
        }

        let harness = Harness::new(3).unwrap();
        let mut variants = vec![Variant::new("broken", 1, Failing)];
        assert!(harness.run(&mut variants).unwrap_err().is_dimension_error());
    }

    #[test]
    fn test_pure_metric_helpers() {
        assert_eq!(speedup(3.0, 1.5), 2.0);
        assert_eq!(efficiency(2.0, 8), 0.25);
        assert!((average_secs(Duration::from_millis(30), 3).unwrap() - 0.01).abs() < 1e-15);
    }
}
