//! Offset resolution against the reference seed.
//!
//! Each read is positioned by the offset whose seed best matches the reference
//! seed: an exact match ends the scan, otherwise the first offset with the
//! strictly smallest Hamming distance wins. There are no gaps; this is a
//! quasi-alignment that only shifts reads relative to their midpoints.

use bio::alignment::distance::hamming;

use crate::params::ConsensusParams;
use crate::seed::{seed_window, ReferenceSeed};

/// A retained read and its position relative to the common frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlignedRead {
    /// Element number of the read within its cluster.
    pub element: usize,
    /// Index into the cluster's read slice.
    pub index: usize,
    /// Symbols left of the midpoint after applying the offset.
    pub left_arm: usize,
    /// Symbols right of the midpoint after applying the offset.
    pub right_arm: usize,
    /// The offset that positioned the read.
    pub offset: isize,
    /// Mismatches of the chosen seed against the reference.
    pub mismatches: usize,
}

/// A read dropped for exceeding the mismatch budget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectedRead {
    /// Element number of the read within its cluster.
    pub element: usize,
    /// Best offset found.
    pub offset: isize,
    /// Mismatches at that offset.
    pub mismatches: usize,
    /// Seed at the best offset.
    pub seed: Vec<u8>,
    /// The full read.
    pub sequence: Vec<u8>,
    /// Mismatch count at every offset, in scan order.
    pub table: Vec<(isize, Vec<u8>, usize)>,
}

/// Outcome of positioning one read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Placement {
    Aligned(AlignedRead),
    Rejected(RejectedRead),
}

/// Best offset and its mismatch count. `None` if no window fits the read.
pub fn best_offset(seq: &[u8], reference: &[u8], params: &ConsensusParams) -> Option<(isize, usize)> {
    let mut best: Option<(isize, usize)> = None;
    for offset in params.offsets() {
        let Some(seed) = seed_window(seq, params.half_seed_len, offset) else { continue };
        if seed == reference {
            return Some((offset, 0));
        }
        let d = hamming(seed, reference) as usize;
        if best.map_or(true, |(_, bd)| d < bd) {
            best = Some((offset, d));
        }
    }
    best
}

/// Position one seedable read, or reject it.
///
/// `element` and `index` only label the result.
pub fn place_read(
    seq: &[u8],
    element: usize,
    index: usize,
    reference: &ReferenceSeed,
    params: &ConsensusParams,
) -> Placement {
    let (offset, mismatches) = match best_offset(seq, &reference.seed, params) {
        Some(b) => b,
        None => (0, params.seed_len() + 1),
    };

    if mismatches > params.max_mismatch_count {
        let table = params
            .offsets()
            .filter_map(|o| {
                seed_window(seq, params.half_seed_len, o)
                    .map(|s| (o, s.to_vec(), hamming(s, &reference.seed) as usize))
            })
            .collect();
        let seed = seed_window(seq, params.half_seed_len, offset).map(<[u8]>::to_vec).unwrap_or_default();
        return Placement::Rejected(RejectedRead { element, offset, mismatches, seed, sequence: seq.to_vec(), table });
    }

    // `offset` is bounded by the seedable length, so the arm stays within the read.
    let left = ((seq.len() / 2) as isize + offset).clamp(0, seq.len() as isize) as usize;
    Placement::Aligned(AlignedRead {
        element,
        index,
        left_arm: left,
        right_arm: seq.len() - left,
        offset,
        mismatches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::SeedVote;

    fn reference(seed: &[u8]) -> ReferenceSeed {
        ReferenceSeed { seed: seed.to_vec(), vote: SeedVote { count: 1, offset_sum: 0 } }
    }

    #[test]
    fn exact_match_short_circuits() {
        let p = ConsensusParams::new(2, 1, 1).unwrap();
        // windows: -1 CGTA, 0 GTAC, 1 TACG
        assert_eq!(best_offset(b"ACGTACGTAC", b"GTAC", &p), Some((0, 0)));
        assert_eq!(best_offset(b"ACGTACGTAC", b"TACG", &p), Some((1, 0)));
    }

    #[test]
    fn first_minimum_wins_on_ties() {
        let p = ConsensusParams::new(2, 4, 1).unwrap();
        // every window is 3 away from GGGG; the earliest offset is kept
        assert_eq!(best_offset(b"ACGTACGTAC", b"GGGG", &p), Some((-1, 3)));
        assert_eq!(best_offset(b"ACGTACGTAC", b"GTAA", &p), Some((0, 1)));
    }

    #[test]
    fn arms_follow_the_offset() {
        let p = ConsensusParams::new(2, 1, 1).unwrap();
        match place_read(b"ACGTACGTAC", 3, 0, &reference(b"CGTA"), &p) {
            Placement::Aligned(a) => {
                assert_eq!((a.left_arm, a.right_arm, a.offset, a.mismatches), (4, 6, -1, 0));
                assert_eq!(a.element, 3);
            }
            other => panic!("expected aligned read, got {other:?}"),
        }
    }

    #[test]
    fn over_budget_read_is_rejected_with_table() {
        let p = ConsensusParams::new(2, 1, 1).unwrap();
        match place_read(b"ACGTACGTAC", 2, 1, &reference(b"GGGG"), &p) {
            Placement::Rejected(r) => {
                assert_eq!(r.element, 2);
                assert_eq!(r.mismatches, 3);
                assert_eq!(r.offset, -1);
                assert_eq!(r.seed, b"CGTA");
                assert_eq!(r.sequence, b"ACGTACGTAC");
                assert_eq!(r.table.len(), 3);
                assert_eq!(r.table[1], (0, b"GTAC".to_vec(), 3));
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }
}
