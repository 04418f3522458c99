use std::path::PathBuf;

use clap::Parser;
use env_logger::Env;

use migcons::params::{DEFAULT_HALF_SEED_LEN, DEFAULT_MAX_MISMATCH_COUNT, DEFAULT_OFFSET_RANGE};
use migcons::{ConsensusParams, RunOptions};

/// MIG consensus caller
#[derive(Parser)]
#[command(name = "migcons")]
#[command(version)]
#[command(about = "Collapse barcode-tagged read clusters into consensus FASTQ records", long_about = None)]
struct Cli {
    /// Input reads (FASTA/FASTQ/.gz/SAM/BAM, or - for stdin), ordered by cluster
    input: PathBuf,
    /// Half-width of the seed window
    #[arg(short = 'H', long, default_value_t = DEFAULT_HALF_SEED_LEN)]
    half_seed_length: usize,
    /// Mismatches tolerated against the reference seed
    #[arg(short = 'M', long, default_value_t = DEFAULT_MAX_MISMATCH_COUNT)]
    max_mismatch_count: usize,
    /// Offsets tried on each side of the read midpoint
    #[arg(short = 'O', long, default_value_t = DEFAULT_OFFSET_RANGE)]
    offset_range: usize,
    /// FASTQ output (stdout if absent; .gz suffix compresses)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Consensus worker threads (0 = all cores)
    #[arg(long, default_value_t = 0)]
    threads: usize,
    /// Skip clusters declaring more reads than this
    #[arg(long)]
    max_cluster_size: Option<usize>,
    /// Write per-cluster statistics (TSV)
    #[arg(long)]
    stats: Option<PathBuf>,
    /// Write the run summary (JSON)
    #[arg(long)]
    json: Option<PathBuf>,
    /// Dump per-cluster diagnostics to stderr
    #[arg(long)]
    debug: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    let params = ConsensusParams::new(cli.half_seed_length, cli.max_mismatch_count, cli.offset_range)?;
    let opts = RunOptions {
        input: cli.input,
        output: cli.output,
        params,
        threads: cli.threads,
        max_cluster_size: cli.max_cluster_size,
        stats: cli.stats,
        json: cli.json,
    };
    migcons::run(&opts)?;
    Ok(())
}
