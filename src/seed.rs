//! Seed extraction and seed voting.
//!
//! A seed is a `2 * half_seed_len` window near the middle of a read. Every read
//! votes with the seeds found at every offset in `-r..=r`; the most frequent
//! seed becomes the reference that all reads are positioned against. No pair
//! of reads is ever aligned directly.
//!
//! # Examples
//! ```
//! use migcons::seed::seed_window;
//! // floor(10/2) - 2 + 0 - 1 = 2
//! assert_eq!(seed_window(b"ACGTACGTAC", 2, 0), Some(&b"GTAC"[..]));
//! assert_eq!(seed_window(b"ACGT", 2, -1), None);
//! ```

use std::collections::HashMap;

use crate::params::ConsensusParams;

/// Return the seed of `seq` for `offset`, or `None` if the window leaves the read.
///
/// The window starts at `floor(len/2) - half_seed_len + offset - 1`, one base
/// left of centre.
#[inline]
pub fn seed_window(seq: &[u8], half_seed_len: usize, offset: isize) -> Option<&[u8]> {
    let start = isize::try_from(seq.len() / 2)
        .ok()?
        .checked_sub(isize::try_from(half_seed_len).ok()?)?
        .checked_add(offset)?
        .checked_sub(1)?;
    let start = usize::try_from(start).ok()?;
    seq.get(start..start.checked_add(half_seed_len.checked_mul(2)?)?)
}

/// Whether every seed window of `seq` lies inside the read.
#[inline]
pub fn is_seedable(seq: &[u8], params: &ConsensusParams) -> bool {
    seq.len() >= params.min_seedable_len()
}

/// Occurrence statistics of one distinct seed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SeedVote {
    /// Number of (read, offset) pairs that produced the seed.
    pub count: usize,
    /// Sum of the offsets at which it was produced.
    pub offset_sum: i64,
}

/// The winning seed of a cluster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferenceSeed {
    /// Seed bytes.
    pub seed: Vec<u8>,
    /// Its vote.
    pub vote: SeedVote,
}

/// Per-cluster seed table. Borrows the reads; dropped once the reference is chosen.
#[derive(Debug, Default)]
pub struct SeedVotes<'a> {
    votes: HashMap<&'a [u8], SeedVote>,
}

impl<'a> SeedVotes<'a> {
    /// Empty table.
    pub fn new() -> Self { Self { votes: HashMap::new() } }

    /// Add the seeds of one seedable read at every offset.
    pub fn add_read(&mut self, seq: &'a [u8], params: &ConsensusParams) {
        for offset in params.offsets() {
            if let Some(seed) = seed_window(seq, params.half_seed_len, offset) {
                let v = self.votes.entry(seed).or_default();
                v.count += 1;
                v.offset_sum += offset as i64;
            }
        }
    }

    /// Number of distinct seeds seen.
    pub fn distinct(&self) -> usize { self.votes.len() }

    /// Vote for a given seed, if it was seen.
    pub fn get(&self, seed: &[u8]) -> Option<SeedVote> { self.votes.get(seed).copied() }

    /// Pick the reference seed: highest count, then smallest offset sum, then the
    /// lexicographically smallest seed. `None` if no read voted.
    pub fn reference(&self) -> Option<ReferenceSeed> {
        self.votes
            .iter()
            .min_by(|(sa, va), (sb, vb)| {
                vb.count
                    .cmp(&va.count)
                    .then(va.offset_sum.cmp(&vb.offset_sum))
                    .then(sa.cmp(sb))
            })
            .map(|(seed, vote)| ReferenceSeed { seed: seed.to_vec(), vote: *vote })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(h: usize, mm: usize, r: usize) -> ConsensusParams { ConsensusParams::new(h, mm, r).unwrap() }

    #[test]
    fn window_keeps_the_left_skew() {
        // len 10, h 2: start = 5 - 2 + off - 1
        let s = b"ACGTACGTAC";
        assert_eq!(seed_window(s, 2, -1).unwrap(), b"CGTA");
        assert_eq!(seed_window(s, 2, 0).unwrap(), b"GTAC");
        assert_eq!(seed_window(s, 2, 1).unwrap(), b"TACG");
    }

    #[test]
    fn window_outside_the_read_is_none() {
        assert!(seed_window(b"ACGTAC", 2, -2).is_none());
        assert!(seed_window(b"ACGTAC", 2, 3).is_none());
        assert!(seed_window(b"", 1, 0).is_none());
    }

    #[test]
    fn huge_windows_are_none() {
        assert!(seed_window(b"ACGTACGTAC", usize::MAX, 0).is_none());
        assert!(seed_window(b"ACGTACGTAC", isize::MAX as usize, 0).is_none());
        assert!(seed_window(b"ACGTACGTAC", 1, isize::MAX).is_none());
        assert!(seed_window(b"ACGTACGTAC", 1, isize::MIN).is_none());
    }

    #[test]
    fn seed_length_is_invariant_for_seedable_reads() {
        let p = params(3, 1, 2);
        let read = b"ACGTTGCAACGGTACCATGA";
        assert!(is_seedable(read, &p));
        for off in p.offsets() {
            assert_eq!(seed_window(read, p.half_seed_len, off).unwrap().len(), p.seed_len());
        }
    }

    #[test]
    fn reference_prefers_count_then_offset_sum() {
        let p = params(2, 1, 1);
        let reads: Vec<&[u8]> = vec![b"ACGTACGTAC", b"ACGTACGTAC", b"ACGTACGTAG"];
        let mut votes = SeedVotes::new();
        for r in &reads {
            votes.add_read(r, &p);
        }
        assert_eq!(votes.distinct(), 3);
        assert_eq!(votes.get(b"CGTA"), Some(SeedVote { count: 3, offset_sum: -3 }));
        let best = votes.reference().unwrap();
        // CGTA, GTAC, TACG all have count 3; CGTA has the smallest offset sum.
        assert_eq!(best.seed, b"CGTA");
        assert_eq!(best.vote.count, 3);
    }

    #[test]
    fn full_tie_is_broken_lexicographically() {
        let p = params(1, 0, 0);
        // h=1, r=0: single window at floor(len/2) - 2, length 2.
        let reads: Vec<&[u8]> = vec![b"TTGGTT", b"TTCCTT"];
        let mut votes = SeedVotes::new();
        for r in &reads {
            votes.add_read(r, &p);
        }
        let best = votes.reference().unwrap();
        assert_eq!(best.seed, b"TC");
        assert_eq!(best.vote, SeedVote { count: 1, offset_sum: 0 });
    }

    #[test]
    fn empty_table_has_no_reference() {
        assert!(SeedVotes::new().reference().is_none());
    }
}
