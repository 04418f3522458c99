#![forbid(unsafe_code)]
//! # migcons
//!
//! Consensus calling for **molecular identifier groups** (MIGs): clusters of reads
//! sharing one barcode and therefore one source molecule. Each cluster is collapsed
//! into a single FASTQ record whose per-base quality reflects how strongly the
//! reads agree at that position.
//!
//! ## Pipeline
//! - 🌱 **Seed voting**: every read contributes fixed-length windows around its
//!   midpoint; the most frequent window becomes the reference seed.
//! - 🧭 **Offset resolution**: each read is anchored at the offset whose window
//!   best matches the reference (exact first, else fewest mismatches).
//! - 🧮 **PFM**: anchored reads are padded with `N` to a common frame and counted
//!   per column over `{N,A,T,C,G}`.
//! - 🎯 **CQS**: plurality base per column, with a Phred+33 quality in `'#'..='I'`.
//!
//! Input is an ordered FASTA/FASTQ/SAM/BAM stream whose headers carry
//! `size=<n>;element=<k>` counters ([`header`]); [`driver`] groups reads into
//! clusters and [`run`] scores them in parallel while keeping output order.
//!
//! ## Examples
//! ```rust
//! use migcons::{consensus_for_reads, ConsensusParams};
//! let params = ConsensusParams::new(2, 1, 1).unwrap();
//! let c = consensus_for_reads(&["ACGTACGTAC", "ACGTACGTAC", "ACGTACGTAG"], &params)
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(c.sequence, b"ACGTACGTAC");
//! assert_eq!(c.retained_count, 3);
//! ```

pub mod align;
pub mod consensus;
pub mod driver;
pub mod error;
pub mod header;
pub mod params;
pub mod pfm;
pub mod run;
pub mod seed;
pub mod seqio;
pub mod stats;

pub use consensus::{ClusterReport, ConsensusResult};
pub use driver::{ClusterDriver, ClusterEvent, ClusterKind};
pub use error::{MigError, Result};
pub use params::ConsensusParams;
pub use run::{run, RunOptions};
pub use stats::RunSummary;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Consensus of one cluster, or `None` when fewer than two reads survive.
///
/// Shorthand for [`consensus::generate`] when the diagnostic report is not needed.
pub fn consensus_for_reads<R: AsRef<[u8]>>(reads: &[R], params: &ConsensusParams) -> Result<Option<ConsensusResult>> {
    Ok(consensus::generate(reads, params)?.consensus)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn empty_cluster_has_no_consensus() {
        let reads: [&str; 0] = [];
        assert_eq!(consensus_for_reads(&reads, &ConsensusParams::default()).unwrap(), None);
    }

    #[test]
    fn single_seedable_read_has_no_consensus() {
        let read = "ACGTTGCAACGGTACCATGAACGGATCCTTAAGG";
        assert_eq!(consensus_for_reads(&[read], &ConsensusParams::default()).unwrap(), None);
    }
}
