//! Position frequency matrix (PFM) and cumulative quality scores (CQS).
//!
//! Retained reads are padded with `N` to a common frame and counted column by
//! column. Each column is then called by plurality after spreading its `N`
//! votes evenly over `A`, `T`, `C` and `G`; the winning fraction becomes a
//! Phred+33 character.
//!
//! | fraction agreeing | code point | char |
//! |-------------------|-----------:|:----:|
//! | 1.0               | 73         | `I`  |
//! | 2/3               | 55         | `7`  |
//! | ≤ 0.3             | 35 (floor) | `#`  |

use std::fmt;

use crate::align::AlignedRead;
use crate::consensus::ConsensusResult;
use crate::error::{MigError, Result};

/// Lowest emitted quality character (`'#'`, code point 35).
pub const MIN_QUALITY: u8 = b'#';
/// Highest emitted quality character (`'I'`, code point 73).
pub const MAX_QUALITY: u8 = b'I';

/// Column layout of the matrix.
pub const SYMBOLS: [u8; 5] = [b'N', b'A', b'T', b'C', b'G'];

/// Call order for definite bases; ties keep the earlier base.
const CALL_ORDER: [(usize, u8); 4] = [(1, b'A'), (2, b'T'), (3, b'C'), (4, b'G')];

#[inline]
fn symbol_index(b: u8) -> Option<usize> {
    match b {
        b'N' => Some(0),
        b'A' => Some(1),
        b'T' => Some(2),
        b'C' => Some(3),
        b'G' => Some(4),
        _ => None,
    }
}

/// Per-column counts of `N, A, T, C, G` across the aligned reads of one cluster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PositionFrequencyMatrix {
    columns: Vec<[u32; 5]>,
    max_left_arm: usize,
    max_right_arm: usize,
    depth: usize,
}

impl PositionFrequencyMatrix {
    /// Build the matrix from the aligned reads of a cluster.
    ///
    /// `reads` is the cluster as given to the engine; `aligned[i].index` points into it.
    /// Returns `Ok(None)` when fewer than two reads survived, and
    /// [`MigError::InvalidSymbol`] for anything outside `{N,A,T,C,G}`.
    pub fn build<R: AsRef<[u8]>>(reads: &[R], aligned: &[AlignedRead]) -> Result<Option<Self>> {
        if aligned.len() < 2 {
            return Ok(None);
        }
        let max_left_arm = aligned.iter().map(|a| a.left_arm).max().unwrap_or(0);
        let max_right_arm = aligned.iter().map(|a| a.right_arm).max().unwrap_or(0);
        let width = max_left_arm + max_right_arm;
        let mut columns = vec![[0u32; 5]; width];

        for a in aligned {
            let seq = reads[a.index].as_ref();
            let pad_left = max_left_arm - a.left_arm;
            let pad_right = max_right_arm - a.right_arm;
            debug_assert_eq!(pad_left + seq.len() + pad_right, width);

            for col in &mut columns[..pad_left] {
                col[0] += 1;
            }
            for (i, &b) in seq.iter().enumerate() {
                let k = symbol_index(b).ok_or(MigError::InvalidSymbol {
                    symbol: char::from(b),
                    position: i,
                    element: a.element,
                })?;
                columns[pad_left + i][k] += 1;
            }
            for col in &mut columns[pad_left + seq.len()..] {
                col[0] += 1;
            }
        }

        Ok(Some(Self { columns, max_left_arm, max_right_arm, depth: aligned.len() }))
    }

    /// Number of columns.
    pub fn width(&self) -> usize { self.columns.len() }

    /// Number of reads counted in every column.
    pub fn depth(&self) -> usize { self.depth }

    pub fn max_left_arm(&self) -> usize { self.max_left_arm }

    pub fn max_right_arm(&self) -> usize { self.max_right_arm }

    /// Counts for one column, in [`SYMBOLS`] order.
    pub fn column(&self, pos: usize) -> Option<&[u32; 5]> { self.columns.get(pos) }

    /// `seq` as it sits in the matrix frame, padded with `N`.
    pub fn padded(&self, seq: &[u8], read: &AlignedRead) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.width());
        out.resize(self.max_left_arm - read.left_arm, b'N');
        out.extend_from_slice(seq);
        out.resize(self.width(), b'N');
        out
    }

    /// Call every column and return the consensus.
    pub fn resolve(&self) -> ConsensusResult {
        let (sequence, quality) = self.columns.iter().map(|c| call_column(c, self.depth)).unzip();
        ConsensusResult { retained_count: self.depth, sequence, quality }
    }
}

impl fmt::Display for PositionFrequencyMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "N\tA\tT\tC\tG")?;
        for c in &self.columns {
            writeln!(f, "{}\t{}\t{}\t{}\t{}", c[0], c[1], c[2], c[3], c[4])?;
        }
        Ok(())
    }
}

/// Call one column: `(base, quality)`.
///
/// `N` counts are added as `N/4` to every definite base before comparison. A
/// column where no base rises above zero is called `N` at [`MIN_QUALITY`].
pub fn call_column(counts: &[u32; 5], depth: usize) -> (u8, u8) {
    let n_share = f64::from(counts[0]) / 4.0;
    let mut best: Option<u8> = None;
    let mut max_count = 0.0f64;
    for (k, base) in CALL_ORDER {
        let adjusted = f64::from(counts[k]) + n_share;
        if adjusted > max_count {
            max_count = adjusted;
            best = Some(base);
        }
    }
    match best {
        Some(base) => (base, cumulative_quality(max_count, depth)),
        None => (b'N', MIN_QUALITY),
    }
}

/// Cumulative quality score for a base supported by `max_count` of `depth` reads.
///
/// `floor(((max_count/depth) - 0.25) / 0.75 * 40 + 33)`, floored at [`MIN_QUALITY`].
pub fn cumulative_quality(max_count: f64, depth: usize) -> u8 {
    if depth == 0 {
        return MIN_QUALITY;
    }
    let q = ((max_count / depth as f64 - 0.25) / 0.75 * 40.0 + 33.0).floor();
    q.clamp(f64::from(MIN_QUALITY), f64::from(MAX_QUALITY)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aligned(index: usize, left: usize, right: usize) -> AlignedRead {
        AlignedRead { element: index + 1, index, left_arm: left, right_arm: right, offset: 0, mismatches: 0 }
    }

    #[test]
    fn quarter_consensus_is_clamped_to_the_floor() {
        // raw value is exactly 33
        assert_eq!(cumulative_quality(1.0, 4), 35);
        assert_eq!(cumulative_quality(4.0, 4), 73);
        assert_eq!(cumulative_quality(2.0, 3), b'7');
        assert_eq!(cumulative_quality(0.0, 0), MIN_QUALITY);
    }

    #[test]
    fn n_votes_are_spread_before_the_call() {
        // A=1, T=2, N=2 -> A=1.5, T=2.5 -> T with 2.5/5
        let (b, q) = call_column(&[2, 1, 2, 0, 0], 5);
        assert_eq!(b, b'T');
        assert_eq!(q, cumulative_quality(2.5, 5));
    }

    #[test]
    fn ties_keep_call_order() {
        assert_eq!(call_column(&[0, 0, 0, 2, 2], 4).0, b'C');
        assert_eq!(call_column(&[0, 1, 1, 1, 1], 4).0, b'A');
    }

    #[test]
    fn empty_column_is_n_at_floor_quality() {
        assert_eq!(call_column(&[0, 0, 0, 0, 0], 0), (b'N', MIN_QUALITY));
    }

    #[test]
    fn all_n_column_calls_a_at_floor() {
        // every base gets depth/4 -> A wins the tie with fraction 0.25
        assert_eq!(call_column(&[4, 0, 0, 0, 0], 4), (b'A', MIN_QUALITY));
    }

    #[test]
    fn reads_are_padded_into_a_common_frame() {
        let reads: Vec<&[u8]> = vec![b"ACGT", b"CGTA"];
        // second read sits one position to the right
        let al = vec![aligned(0, 2, 2), aligned(1, 1, 3)];
        let m = PositionFrequencyMatrix::build(&reads, &al).unwrap().unwrap();
        assert_eq!(m.width(), 5);
        assert_eq!(m.depth(), 2);
        assert_eq!(m.padded(reads[0], &al[0]), b"ACGTN");
        assert_eq!(m.padded(reads[1], &al[1]), b"NCGTA");
        assert_eq!(m.column(0), Some(&[1, 1, 0, 0, 0]));
        assert_eq!(m.column(4), Some(&[1, 1, 0, 0, 0]));
        for pos in 0..m.width() {
            assert_eq!(m.column(pos).unwrap().iter().sum::<u32>(), 2);
        }
        let c = m.resolve();
        assert_eq!(c.sequence, b"ACGTA");
        assert_eq!(c.quality.len(), 5);
        assert_eq!(&c.quality[1..4], b"III");
    }

    #[test]
    fn single_survivor_builds_nothing() {
        let reads: Vec<&[u8]> = vec![b"ACGT"];
        assert!(PositionFrequencyMatrix::build(&reads, &[aligned(0, 2, 2)]).unwrap().is_none());
    }

    #[test]
    fn foreign_symbols_fail_loudly() {
        let reads: Vec<&[u8]> = vec![b"ACGT", b"ACxT"];
        let err = PositionFrequencyMatrix::build(&reads, &[aligned(0, 2, 2), aligned(1, 2, 2)]).unwrap_err();
        assert_eq!(err, MigError::InvalidSymbol { symbol: 'x', position: 2, element: 2 });
    }
}
