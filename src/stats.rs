//! Run counters, the per-cluster TSV and the JSON summary.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use log::info;

use crate::driver::DriverCounts;
use crate::params::ConsensusParams;
use crate::run::{ClusterOutcome, Outcome};

/// Totals over one run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub records: u64,
    pub unknown_barcode: u64,
    pub untagged: u64,
    pub orphans: u64,
    pub singlets: u64,
    pub consensus: u64,
    pub no_consensus: u64,
    pub oversized: u64,
    pub truncated: u64,
    pub reads_in_clusters: u64,
    pub reads_too_short: u64,
    pub reads_rejected: u64,
    pub reads_retained: u64,
}

/// `value` as a percentage with `decimals` places.
///
/// ```
/// use migcons::stats::format_percent;
/// assert_eq!(format_percent(0.5, 1), "50.0%");
/// assert_eq!(format_percent(1.0, 0), "100%");
/// ```
pub fn format_percent(value: f64, decimals: usize) -> String {
    format!("{:.decimals$}%", value * 100.0, decimals = decimals)
}

fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

impl RunSummary {
    /// Count one scored cluster.
    pub fn record(&mut self, o: &ClusterOutcome) {
        match o.outcome {
            Outcome::Singlet => self.singlets += 1,
            Outcome::Consensus => self.consensus += 1,
            Outcome::NoConsensus => self.no_consensus += 1,
            Outcome::Oversized => self.oversized += 1,
        }
        self.reads_in_clusters += o.size as u64;
        self.reads_too_short += o.too_short as u64;
        self.reads_rejected += o.rejected as u64;
        if o.record.is_some() {
            self.reads_retained += o.retained as u64;
        }
    }

    /// Take over the driver's counters.
    pub fn absorb(&mut self, c: DriverCounts) {
        self.records = c.records;
        self.unknown_barcode = c.unknown_barcode;
        self.untagged = c.untagged;
        self.orphans = c.orphans;
        self.truncated = c.truncated;
    }

    /// Records written to the FASTQ output.
    pub fn written(&self) -> u64 { self.singlets + self.consensus }

    pub fn log(&self, elapsed: Duration) {
        info!("Consensus Summary");
        info!("  Records read:            {}", self.records);
        info!("  Unknown barcode:         {}", self.unknown_barcode);
        info!("  Untagged:                {}", self.untagged);
        info!("  Orphans:                 {}", self.orphans);
        info!("  Truncated clusters:      {}", self.truncated);
        info!("  Singlets:                {}", self.singlets);
        info!("  Consensus clusters:      {}", self.consensus);
        info!("  No consensus:            {}", self.no_consensus);
        info!("  Oversized:               {}", self.oversized);
        info!(
            "  Reads retained:          {} ({})",
            self.reads_retained,
            format_percent(ratio(self.reads_retained, self.reads_in_clusters), 2)
        );
        info!("  Records written:         {}", self.written());
        info!("  Elapsed:                 {:.2}s", elapsed.as_secs_f64());
    }

    pub fn to_json(&self, params: &ConsensusParams) -> serde_json::Value {
        serde_json::json!({
            "params": {
                "half_seed_length": params.half_seed_len,
                "max_mismatch_count": params.max_mismatch_count,
                "offset_range": params.offset_range,
            },
            "records": self.records,
            "unknown_barcode": self.unknown_barcode,
            "untagged": self.untagged,
            "orphans": self.orphans,
            "truncated": self.truncated,
            "singlets": self.singlets,
            "consensus": self.consensus,
            "no_consensus": self.no_consensus,
            "oversized": self.oversized,
            "reads_in_clusters": self.reads_in_clusters,
            "reads_too_short": self.reads_too_short,
            "reads_rejected": self.reads_rejected,
            "reads_retained": self.reads_retained,
        })
    }

    pub fn write_json(&self, path: &Path, params: &ConsensusParams) -> Result<()> {
        let f = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(f), &self.to_json(params))?;
        Ok(())
    }
}

/// Tab-separated per-cluster statistics.
pub struct ClusterStatsWriter {
    inner: csv::Writer<File>,
}

impl ClusterStatsWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let mut inner = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_path(path)
            .with_context(|| format!("cannot create {}", path.display()))?;
        inner.write_record(["cluster_id", "size", "seedable", "too_short", "rejected", "retained", "outcome"])?;
        Ok(Self { inner })
    }

    pub fn write(&mut self, o: &ClusterOutcome) -> Result<()> {
        let seedable = o.reads - o.too_short;
        self.inner.write_record([
            o.id.clone(),
            o.size.to_string(),
            seedable.to_string(),
            o.too_short.to_string(),
            o.rejected.to_string(),
            o.retained.to_string(),
            o.outcome.as_str().to_string(),
        ])?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }
}
