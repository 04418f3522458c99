//! End-to-end consensus run.
//!
//! Records are read in order and grouped by the [`ClusterDriver`]. Completed
//! clusters are collected into batches of 2000, scored in parallel on a
//! local rayon pool and written back in input order, so the output does not
//! depend on the thread count.

use std::path::PathBuf;
use std::time::Instant;

use log::{debug, info};
use rayon::prelude::*;

use crate::consensus;
use crate::driver::{ClusterDriver, ClusterEvent, ClusterKind};
use crate::params::ConsensusParams;
use crate::pfm::MIN_QUALITY;
use crate::seqio::{self, FastqRecord, FastqSink};
use crate::stats::{ClusterStatsWriter, RunSummary};

/// Completed clusters are scored in batches of this many.
const CHUNK: usize = 2000;

/// Everything a run needs.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Reads to process; `-` reads FASTA/FASTQ from stdin.
    pub input: PathBuf,
    /// FASTQ destination; stdout when `None`.
    pub output: Option<PathBuf>,
    /// Engine parameters.
    pub params: ConsensusParams,
    /// Worker threads; 0 uses every logical core.
    pub threads: usize,
    /// Clusters declaring more reads are skipped without buffering.
    pub max_cluster_size: Option<usize>,
    /// Per-cluster TSV.
    pub stats: Option<PathBuf>,
    /// Run summary JSON.
    pub json: Option<PathBuf>,
}

impl RunOptions {
    /// Default parameters, stdout output, all cores, no reports.
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: None,
            params: ConsensusParams::default(),
            threads: 0,
            max_cluster_size: None,
            stats: None,
            json: None,
        }
    }
}

/// How a cluster ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Size-1 cluster passed through.
    Singlet,
    /// Consensus record written.
    Consensus,
    /// Fewer than two reads survived; nothing written.
    NoConsensus,
    /// Over `max_cluster_size`; nothing written.
    Oversized,
}

impl Outcome {
    /// Label used in the per-cluster TSV.
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Singlet => "singlet",
            Outcome::Consensus => "consensus",
            Outcome::NoConsensus => "no_consensus",
            Outcome::Oversized => "oversized",
        }
    }
}

/// Result of scoring one cluster event.
#[derive(Debug, Clone)]
pub struct ClusterOutcome {
    /// Position among emitted clusters.
    pub ordinal: u64,
    /// Cluster identifier.
    pub id: String,
    /// Declared cluster size.
    pub size: usize,
    /// How the cluster ended.
    pub outcome: Outcome,
    /// Reads that reached the engine.
    pub reads: usize,
    /// Reads too short to seed.
    pub too_short: usize,
    /// Reads over the mismatch budget.
    pub rejected: usize,
    /// Reads kept in the matrix (1 for a singlet).
    pub retained: usize,
    /// Record to write, if any.
    pub record: Option<FastqRecord>,
}

/// Turn one cluster event into its output record.
///
/// Singlets pass through with floor quality; clusters go through the engine
/// and produce a record only when at least two reads survive.
pub fn process_event(ev: ClusterEvent, params: &ConsensusParams) -> crate::Result<ClusterOutcome> {
    let mut out = ClusterOutcome {
        ordinal: ev.ordinal,
        id: ev.id,
        size: ev.size,
        outcome: Outcome::Oversized,
        reads: 0,
        too_short: 0,
        rejected: 0,
        retained: 0,
        record: None,
    };
    match ev.kind {
        ClusterKind::Singlet(seq) => {
            out.outcome = Outcome::Singlet;
            out.reads = 1;
            out.retained = 1;
            out.record = Some(FastqRecord {
                name: format!("{};retained=1", out.id),
                qual: vec![MIN_QUALITY; seq.len()],
                seq,
            });
        }
        ClusterKind::Complete(reads) => {
            let report = consensus::generate(&reads, params)?;
            debug!("cluster '{}' ({} reads)\n{report}", out.id, reads.len());
            out.reads = reads.len();
            out.too_short = report.too_short.len();
            out.rejected = report.rejected.len();
            match report.consensus {
                Some(c) => {
                    out.outcome = Outcome::Consensus;
                    out.retained = c.retained_count;
                    out.record = Some(FastqRecord {
                        name: format!("{};retained={}", out.id, c.retained_count),
                        seq: c.sequence,
                        qual: c.quality,
                    });
                }
                None => {
                    out.outcome = Outcome::NoConsensus;
                    out.retained = report.aligned.len();
                }
            }
        }
        ClusterKind::Oversized => {}
    }
    Ok(out)
}

struct Emitter<'a> {
    pool: &'a rayon::ThreadPool,
    params: ConsensusParams,
    sink: FastqSink,
    stats: Option<ClusterStatsWriter>,
    summary: RunSummary,
    pending: Vec<ClusterEvent>,
}

impl Emitter<'_> {
    fn push(&mut self, ev: ClusterEvent) -> anyhow::Result<()> {
        self.pending.push(ev);
        if self.pending.len() >= CHUNK {
            self.flush()?;
        }
        Ok(())
    }

    /// Score the pending batch in parallel and write it in input order.
    fn flush(&mut self) -> anyhow::Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let batch = std::mem::take(&mut self.pending);
        let params = self.params;
        let processed: Vec<ClusterOutcome> = self.pool.install(|| {
            batch
                .into_par_iter()
                .map(|ev| process_event(ev, &params))
                .collect::<crate::Result<Vec<_>>>()
        })?;
        for o in &processed {
            if let Some(rec) = &o.record {
                self.sink.write_record(rec)?;
            }
            if let Some(w) = self.stats.as_mut() {
                w.write(o)?;
            }
            self.summary.record(o);
        }
        Ok(())
    }
}

/// Read `opts.input`, assemble clusters and write one FASTQ record per emitted cluster.
pub fn run(opts: &RunOptions) -> anyhow::Result<RunSummary> {
    opts.params.validate()?;
    let threads_eff = if opts.threads == 0 { std::cmp::max(1, num_cpus::get()) } else { opts.threads };
    let pool = rayon::ThreadPoolBuilder::new().num_threads(threads_eff).build()?;
    let p = &opts.params;

    info!(
        "consensus: input={} | half_seed_length={} max_mismatch_count={} offset_range={} | threads={}",
        opts.input.display(),
        p.half_seed_len,
        p.max_mismatch_count,
        p.offset_range,
        threads_eff
    );
    let started = Instant::now();

    let mut emitter = Emitter {
        pool: &pool,
        params: opts.params,
        sink: FastqSink::create(opts.output.as_deref())?,
        stats: opts.stats.as_deref().map(ClusterStatsWriter::create).transpose()?,
        summary: RunSummary::default(),
        pending: Vec::with_capacity(CHUNK),
    };
    let mut driver = ClusterDriver::new(opts.max_cluster_size);

    let (fmt, n) = seqio::for_each_record(&opts.input, |read| {
        if let Some(ev) = driver.push(&read.id, &read.seq)? {
            emitter.push(ev)?;
        }
        Ok(())
    })?;
    emitter.flush()?;
    debug!("read {n} records ({fmt:?})");

    let Emitter { sink, stats, mut summary, .. } = emitter;
    sink.finish()?;
    if let Some(w) = stats {
        w.finish()?;
    }
    summary.absorb(driver.finish());
    summary.log(started.elapsed());
    if let Some(path) = &opts.json {
        summary.write_json(path, &opts.params)?;
    }
    Ok(summary)
}
