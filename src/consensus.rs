//! The consensus engine: seed voting → offset resolution → PFM → CQS.
//!
//! All state is local to one call of [`generate`]; clusters can be processed
//! on any thread in any order.
//!
//! # Examples
//! ```
//! use migcons::{consensus, ConsensusParams};
//! let params = ConsensusParams::new(2, 1, 1).unwrap();
//! let reads = ["ACGTACGTAC", "ACGTACGTAC", "ACGTACGTAG"];
//! let report = consensus::generate(&reads, &params).unwrap();
//! let c = report.consensus.unwrap();
//! assert_eq!(c.retained_count, 3);
//! assert_eq!(c.sequence, b"ACGTACGTAC");
//! ```

use std::fmt;

use crate::align::{place_read, AlignedRead, Placement, RejectedRead};
use crate::error::Result;
use crate::params::ConsensusParams;
use crate::pfm::PositionFrequencyMatrix;
use crate::seed::{is_seedable, ReferenceSeed, SeedVotes};

/// Consensus of one cluster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsensusResult {
    /// Reads that contributed to the matrix (always >= 2).
    pub retained_count: usize,
    /// Called bases over `{A,T,C,G,N}`.
    pub sequence: Vec<u8>,
    /// Phred+33 quality characters, one per base.
    pub quality: Vec<u8>,
}

/// What the engine learned about one cluster.
///
/// `Display` renders the full diagnostic dump used at `debug` level. The padded
/// alignment rows are captured by [`generate_detailed`], and by [`generate`]
/// only while `debug` logging is enabled; otherwise the dump notes that they
/// were omitted.
#[derive(Clone, Debug)]
pub struct ClusterReport {
    /// Reads given to the engine.
    pub cluster_len: usize,
    /// Winning seed, if any read was seedable.
    pub reference: Option<ReferenceSeed>,
    /// Distinct seeds in the vote.
    pub distinct_seeds: usize,
    /// Element numbers of reads too short to seed.
    pub too_short: Vec<usize>,
    /// Reads over the mismatch budget.
    pub rejected: Vec<RejectedRead>,
    /// Reads kept in the matrix.
    pub aligned: Vec<AlignedRead>,
    /// The matrix, when at least two reads survived.
    pub matrix: Option<PositionFrequencyMatrix>,
    /// Consensus, when at least two reads survived.
    pub consensus: Option<ConsensusResult>,
    padded: Vec<(usize, Vec<u8>)>,
}

impl ClusterReport {
    /// Number of reads that took part in seed voting.
    pub fn seedable(&self) -> usize { self.cluster_len - self.too_short.len() }
}

/// Element number of the read at `index`; elements count down from the cluster size.
#[inline]
fn element_of(cluster_len: usize, index: usize) -> usize { cluster_len - index }

/// Run the engine on one cluster.
///
/// Returns a report whose `consensus` is `None` when fewer than two reads
/// survive. Errors only on a data contract violation (see [`crate::MigError`]).
pub fn generate<R: AsRef<[u8]>>(reads: &[R], params: &ConsensusParams) -> Result<ClusterReport> {
    run_engine(reads, params, log::log_enabled!(log::Level::Debug))
}

/// [`generate`], always capturing the padded alignment rows for the report.
pub fn generate_detailed<R: AsRef<[u8]>>(reads: &[R], params: &ConsensusParams) -> Result<ClusterReport> {
    run_engine(reads, params, true)
}

fn run_engine<R: AsRef<[u8]>>(reads: &[R], params: &ConsensusParams, capture_rows: bool) -> Result<ClusterReport> {
    params.validate()?;
    let n = reads.len();

    let mut votes = SeedVotes::new();
    let mut seedable = Vec::with_capacity(n);
    let mut too_short = Vec::new();
    for (i, r) in reads.iter().enumerate() {
        let seq = r.as_ref();
        if is_seedable(seq, params) {
            votes.add_read(seq, params);
            seedable.push(i);
        } else {
            too_short.push(element_of(n, i));
        }
    }
    let distinct_seeds = votes.distinct();
    let reference = votes.reference();
    drop(votes);

    let mut aligned = Vec::with_capacity(seedable.len());
    let mut rejected = Vec::new();
    if let Some(refseed) = &reference {
        for &i in &seedable {
            match place_read(reads[i].as_ref(), element_of(n, i), i, refseed, params) {
                Placement::Aligned(a) => aligned.push(a),
                Placement::Rejected(r) => rejected.push(r),
            }
        }
    }

    let matrix = PositionFrequencyMatrix::build(reads, &aligned)?;
    let consensus = matrix.as_ref().map(PositionFrequencyMatrix::resolve);
    let padded = match (&matrix, capture_rows) {
        (Some(m), true) => aligned.iter().map(|a| (a.element, m.padded(reads[a.index].as_ref(), a))).collect(),
        _ => Vec::new(),
    };

    Ok(ClusterReport {
        cluster_len: n,
        reference,
        distinct_seeds,
        too_short,
        rejected,
        aligned,
        matrix,
        consensus,
        padded,
    })
}

impl fmt::Display for ClusterReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reference {
            Some(r) => writeln!(
                f,
                "reference seed {} (count={}, offset_sum={}, distinct={})",
                String::from_utf8_lossy(&r.seed),
                r.vote.count,
                r.vote.offset_sum,
                self.distinct_seeds
            )?,
            None => writeln!(f, "no seedable reads")?,
        }
        for r in &self.rejected {
            writeln!(
                f,
                "tossing element {} with {} mismatches for {} with respect to {}:",
                r.element,
                r.mismatches,
                String::from_utf8_lossy(&r.seed),
                self.reference.as_ref().map(|s| String::from_utf8_lossy(&s.seed)).unwrap_or_default()
            )?;
            writeln!(f, "{}", String::from_utf8_lossy(&r.sequence))?;
            for (offset, seed, mm) in &r.table {
                writeln!(f, "  {offset:>3} : {} -- {mm}", String::from_utf8_lossy(seed))?;
            }
        }
        writeln!(f, "retained {} of {} reads", self.aligned.len(), self.cluster_len)?;
        if !self.too_short.is_empty() {
            writeln!(f, "removed elements (too short): {:?}", self.too_short)?;
        }
        if let Some(m) = &self.matrix {
            if self.padded.is_empty() {
                writeln!(f, "(alignment rows not captured)")?;
            }
            for (a, (element, row)) in self.aligned.iter().zip(&self.padded) {
                writeln!(f, ">element{element} left_arm={} right_arm={}", a.left_arm, a.right_arm)?;
                writeln!(f, "{}", String::from_utf8_lossy(row))?;
            }
            write!(f, "{m}")?;
        }
        if let Some(c) = &self.consensus {
            writeln!(f, "consensus {}", String::from_utf8_lossy(&c.sequence))?;
            writeln!(f, "quality   {}", String::from_utf8_lossy(&c.quality))?;
        }
        Ok(())
    }
}
