//! Engine configuration.
//!
//! Defaults: a 20-base seed (`half_seed_len = 10`),
//! five offsets tried on each side of the midpoint and three tolerated
//! mismatches against the reference seed.

use crate::error::{MigError, Result};

/// Default half-width of the seed window.
pub const DEFAULT_HALF_SEED_LEN: usize = 10;
/// Default mismatch tolerance against the reference seed.
pub const DEFAULT_MAX_MISMATCH_COUNT: usize = 3;
/// Default number of offsets tried on each side of the midpoint.
pub const DEFAULT_OFFSET_RANGE: usize = 5;

/// Parameters of one consensus computation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConsensusParams {
    /// Half-width of the seed window; seeds are `2 * half_seed_len` long.
    pub half_seed_len: usize,
    /// Reads whose best seed differs from the reference in more positions are dropped.
    pub max_mismatch_count: usize,
    /// Offsets `-offset_range..=offset_range` are tried for every read.
    pub offset_range: usize,
}

impl Default for ConsensusParams {
    fn default() -> Self {
        Self {
            half_seed_len: DEFAULT_HALF_SEED_LEN,
            max_mismatch_count: DEFAULT_MAX_MISMATCH_COUNT,
            offset_range: DEFAULT_OFFSET_RANGE,
        }
    }
}

impl ConsensusParams {
    /// Construct and validate.
    pub fn new(half_seed_len: usize, max_mismatch_count: usize, offset_range: usize) -> Result<Self> {
        let p = Self { half_seed_len, max_mismatch_count, offset_range };
        p.validate()?;
        Ok(p)
    }

    /// Reject configurations the engine cannot run with.
    ///
    /// Every seed window position must be computable as a signed offset, so the
    /// minimum seedable length has to fit in `isize`.
    pub fn validate(&self) -> Result<()> {
        if self.half_seed_len == 0 {
            return Err(MigError::InvalidParameter {
                parameter: "half_seed_len",
                reason: "must be >= 1".to_string(),
            });
        }
        if self.half_seed_len > isize::MAX as usize / 2 {
            return Err(MigError::InvalidParameter {
                parameter: "half_seed_len",
                reason: format!("{} is too large for a seed window", self.half_seed_len),
            });
        }
        match self.checked_min_seedable_len() {
            Some(len) if len <= isize::MAX as usize => Ok(()),
            _ => Err(MigError::InvalidParameter {
                parameter: "offset_range",
                reason: format!(
                    "{} with half_seed_len {} overflows the seed frame",
                    self.offset_range, self.half_seed_len
                ),
            }),
        }
    }

    /// Seed length in bases.
    pub fn seed_len(&self) -> usize { self.half_seed_len.saturating_mul(2) }

    fn checked_min_seedable_len(&self) -> Option<usize> {
        let h = self.half_seed_len;
        let r = self.offset_range;
        let nominal = h.checked_mul(2)?.checked_add(r)?.checked_add(1)?;
        let framed = h.checked_add(r)?.checked_add(1)?.checked_mul(2)?;
        Some(nominal.max(framed))
    }

    /// Shortest read that can be seeded at every offset.
    ///
    /// This is `max(2h + r + 1, 2(h + r + 1))`: the nominal lower bound, raised so
    /// that the leftmost window (`floor(len/2) - h - r - 1`) never starts before
    /// the read. Saturates on parameters that [`validate`](Self::validate) rejects.
    pub fn min_seedable_len(&self) -> usize {
        self.checked_min_seedable_len().unwrap_or(usize::MAX)
    }

    /// Offsets in scan order (ascending).
    pub fn offsets(&self) -> std::ops::RangeInclusive<isize> {
        let r = isize::try_from(self.offset_range).unwrap_or(isize::MAX);
        -r..=r
    }
}
