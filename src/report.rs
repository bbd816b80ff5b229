use std::fmt;

use crate::harness::VariantResult;

/// Everything printed for one benchmark invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkReport {
    pub title: String,
    pub size: usize,
    pub runs: usize,
    /// Stored entries, for sparse benchmarks.
    pub nnz: Option<usize>,
    pub memory_mb: Option<f64>,
    pub variants: Vec<VariantResult>,
}

impl BenchmarkReport {
    pub fn variant(&self, name: &str) -> Option<&VariantResult> {
        self.variants.iter().find(|v| v.name == name)
    }
}

impl fmt::Display for BenchmarkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} N={} ({} runs)", self.title, self.size, self.runs)?;
        if let Some(nnz) = self.nnz {
            writeln!(f, "Non-zeros: {}", nnz)?;
        }
        for v in &self.variants {
            let label = format!("{}:", v.name);
            write!(f, "{:<12}{:.6} s", label, v.average)?;
            if let (Some(speedup), Some(efficiency)) = (v.speedup, v.efficiency) {
                write!(
                    f,
                    " | Speedup: {:.2}x | Efficiency: {:.2} ({} workers)",
                    speedup, efficiency, v.workers
                )?;
            }
            writeln!(f)?;
        }
        if let Some(mb) = self.memory_mb {
            writeln!(f, "Memory usage: {:.2} MB", mb)?;
        }
        write!(f, "---------------------------------------------------------")
    }
}
