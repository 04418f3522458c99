//! Cluster assembly from an ordered stream of tagged reads.
//!
//! ```text
//!             element == size                    counter == 0
//! AWAITING ─────────────────────▶ ACCUMULATING ─────────────────▶ complete → AWAITING
//!    ▲  │ size == 1                    │ element == size (new start)
//!    │  └──────▶ singlet ──────────────┘ incomplete cluster dropped
//! ```
//!
//! The driver only groups reads; consensus is computed by the caller on the
//! emitted [`ClusterEvent`]s, which carry their ordinal in the input so results
//! can be written in input order.

use log::warn;

use crate::error::{MigError, Result};
use crate::header::{cluster_id, parse_header, HeaderTag};

/// A unit of work released by the driver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterEvent {
    /// Position of the cluster among emitted events (0-based).
    pub ordinal: u64,
    /// Cluster identifier (header without the element tag).
    pub id: String,
    /// Declared cluster size.
    pub size: usize,
    pub kind: ClusterKind,
}

/// Payload of a [`ClusterEvent`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClusterKind {
    /// Size-1 cluster; passed through without consensus.
    Singlet(Vec<u8>),
    /// All reads of a cluster of size >= 2, in input order.
    Complete(Vec<Vec<u8>>),
    /// Cluster larger than the configured bound; reads were not kept.
    Oversized,
}

/// Reads the driver dropped before any cluster formed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DriverCounts {
    /// Records seen.
    pub records: u64,
    /// Records marked `barcode=unknown`.
    pub unknown_barcode: u64,
    /// Records without `size`/`element` tags.
    pub untagged: u64,
    /// Continuation reads with no open cluster.
    pub orphans: u64,
    /// Clusters dropped before all their reads arrived.
    pub truncated: u64,
}

#[derive(Debug)]
struct OpenCluster {
    id: String,
    size: usize,
    remaining: usize,
    reads: Option<Vec<Vec<u8>>>,
}

#[derive(Debug)]
enum State {
    AwaitingStart,
    Accumulating(OpenCluster),
}

/// Streaming cluster assembler.
#[derive(Debug)]
pub struct ClusterDriver {
    state: State,
    max_cluster_size: Option<usize>,
    next_ordinal: u64,
    counts: DriverCounts,
}

impl Default for ClusterDriver {
    fn default() -> Self { Self::new(None) }
}

impl ClusterDriver {
    /// New driver. Clusters declaring more than `max_cluster_size` reads are
    /// counted down without buffering and reported as [`ClusterKind::Oversized`].
    pub fn new(max_cluster_size: Option<usize>) -> Self {
        Self { state: State::AwaitingStart, max_cluster_size, next_ordinal: 0, counts: DriverCounts::default() }
    }

    /// Counters so far.
    pub fn counts(&self) -> DriverCounts { self.counts }

    fn emit(&mut self, id: String, size: usize, kind: ClusterKind) -> ClusterEvent {
        let ordinal = self.next_ordinal;
        self.next_ordinal += 1;
        ClusterEvent { ordinal, id, size, kind }
    }

    fn drop_incomplete(&mut self, reason: &str) {
        if let State::Accumulating(open) = std::mem::replace(&mut self.state, State::AwaitingStart) {
            warn!(
                "dropping cluster '{}': {} of {} reads missing ({reason})",
                open.id, open.remaining, open.size
            );
            self.counts.truncated += 1;
        }
    }

    /// Feed one record. Returns a cluster event when the record completes a cluster.
    pub fn push(&mut self, header: &str, seq: &[u8]) -> Result<Option<ClusterEvent>> {
        self.counts.records += 1;
        let (size, element) = match parse_header(header)? {
            HeaderTag::UnknownBarcode => {
                self.counts.unknown_barcode += 1;
                return Ok(None);
            }
            HeaderTag::Untagged => {
                self.counts.untagged += 1;
                return Ok(None);
            }
            HeaderTag::Member { size, element } => (size, element),
        };
        if seq.is_empty() {
            return Err(MigError::MissingSequence { header: header.to_string() });
        }

        if element == size {
            self.drop_incomplete("a new cluster started");
            let id = cluster_id(header);
            if size == 1 {
                return Ok(Some(self.emit(id, size, ClusterKind::Singlet(seq.to_vec()))));
            }
            let buffer = match self.max_cluster_size {
                Some(max) if size > max => None,
                _ => Some(Vec::with_capacity(size)),
            };
            self.state = State::Accumulating(OpenCluster { id, size, remaining: size, reads: buffer });
        }

        let open = match &mut self.state {
            State::Accumulating(open) => open,
            State::AwaitingStart => {
                warn!("skipping orphan read '{header}': no open cluster");
                self.counts.orphans += 1;
                return Ok(None);
            }
        };
        if open.size != size {
            return Err(MigError::ClusterSizeMismatch {
                header: header.to_string(),
                cluster: open.id.clone(),
                expected: open.size,
                found: size,
            });
        }
        if let Some(reads) = open.reads.as_mut() {
            reads.push(seq.to_vec());
        }
        open.remaining -= 1;
        if open.remaining > 0 {
            return Ok(None);
        }

        let State::Accumulating(done) = std::mem::replace(&mut self.state, State::AwaitingStart) else {
            return Ok(None);
        };
        let kind = match done.reads {
            Some(reads) => ClusterKind::Complete(reads),
            None => {
                warn!("cluster '{}' declares {} reads; over the limit, skipped", done.id, done.size);
                ClusterKind::Oversized
            }
        };
        Ok(Some(self.emit(done.id, done.size, kind)))
    }

    /// Close the stream, dropping a cluster left incomplete.
    pub fn finish(&mut self) -> DriverCounts {
        self.drop_incomplete("end of input");
        self.counts
    }
}
