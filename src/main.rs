use clap::Parser;
use log::{error, info};

use kernel_bench::config::{BenchConfig, Family};
use kernel_bench::generate::MatrixGenerator;
use kernel_bench::sparse::available_workers;
use kernel_bench::suite::{run_matmul, run_spmv};

#[derive(Parser, Debug)]
#[command(name = "kernel-bench")]
#[command(about = "Sequential vs parallel SpMV (CSR) and dense matmul timings")]
struct Cli {
    /// Problem sizes N (N×N matrices)
    #[arg(long, value_delimiter = ',', default_values_t = [512, 1024, 1536])]
    sizes: Vec<usize>,

    /// Timed repetitions per size
    #[arg(long, default_value = "5")]
    runs: usize,

    /// Untimed warm-up calls per variant
    #[arg(long, default_value = "1")]
    warmup: usize,

    /// Probability that a sparse position stays empty
    #[arg(long, default_value = "0.95")]
    sparsity: f64,

    /// RNG seed; random inputs differ between runs when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Worker threads for parallel variants [default: hardware concurrency]
    #[arg(long)]
    workers: Option<usize>,

    /// Kernel families to run
    #[arg(long, value_enum, default_value = "all")]
    family: Family,
}

impl From<Cli> for BenchConfig {
    fn from(cli: Cli) -> Self {
        BenchConfig {
            sizes: cli.sizes,
            runs: cli.runs,
            warmup: cli.warmup,
            sparsity: cli.sparsity,
            seed: cli.seed,
            workers: cli.workers.unwrap_or_else(available_workers),
            family: cli.family,
        }
    }
}

fn main() {
    env_logger::init();

    let config = BenchConfig::from(Cli::parse());
    if let Err(e) = config.validate() {
        error!("{}", e);
        std::process::exit(2);
    }
    info!("{:?}", config);

    let mut gen = MatrixGenerator::new(config.seed);

    if config.family.includes_matmul() {
        println!("--- Matrix Multiplication Benchmark (Standard IJK) ---");
        for &n in &config.sizes {
            match run_matmul(&config, n, &mut gen) {
                Ok(report) => println!("{}", report),
                Err(e) => error!("matmul N={} failed: {}", n, e),
            }
        }
    }

    if config.family.includes_spmv() {
        println!("--- Sparse Matrix-Vector Benchmark (SpMV CSR) ---");
        for &n in &config.sizes {
            match run_spmv(&config, n, &mut gen) {
                Ok(report) => println!("{}", report),
                Err(e) => error!("SpMV N={} failed: {}", n, e),
            }
        }
    }
}
