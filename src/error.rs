//! Error types for the consensus engine and the cluster driver.
//!
//! Degenerate clusters and per-read rejections are **not** errors; they are
//! reported through [`crate::consensus::ClusterReport`]. Everything here is
//! fatal for a run.

use thiserror::Error;

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, MigError>;

/// Fatal conditions raised by the library.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MigError {
    /// A configuration value is out of range.
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// The parameter name.
        parameter: &'static str,
        /// Why the value is rejected.
        reason: String,
    },

    /// The header carries a `size=`/`element=` pair that cannot describe a cluster.
    #[error("Malformed cluster tag in header '{header}': {reason}")]
    MalformedClusterTag {
        /// Offending header line.
        header: String,
        /// What is wrong with the tag.
        reason: String,
    },

    /// A cluster member has no sequence.
    #[error("Missing sequence for header '{header}'")]
    MissingSequence {
        /// Header of the record without a sequence.
        header: String,
    },

    /// A read claims a different size than the cluster currently being assembled.
    #[error("Read '{header}' declares size={found} inside cluster '{cluster}' of size={expected}")]
    ClusterSizeMismatch {
        /// Header of the offending read.
        header: String,
        /// Identifier of the open cluster.
        cluster: String,
        /// Size of the open cluster.
        expected: usize,
        /// Size declared by the read.
        found: usize,
    },

    /// A read contains a symbol outside `{N,A,T,C,G}`.
    #[error("Invalid nucleotide '{symbol}' at position {position} of element {element}")]
    InvalidSymbol {
        /// The offending symbol (printed lossily).
        symbol: char,
        /// Zero-based position in the read.
        position: usize,
        /// Element number of the read within its cluster.
        element: usize,
    },

    /// The input path does not name a supported format.
    #[error("Unsupported input '{path}': {reason}")]
    UnsupportedInput {
        /// Path as given.
        path: String,
        /// Explanation.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_parameter_names_the_option() {
        let e = MigError::InvalidParameter { parameter: "half_seed_len", reason: "must be >= 1".to_string() };
        let msg = e.to_string();
        assert!(msg.contains("'half_seed_len'"));
        assert!(msg.contains("must be >= 1"));
    }

    #[test]
    fn size_mismatch_reports_both_sizes() {
        let e = MigError::ClusterSizeMismatch {
            header: "MIG2;size=4;element=3".to_string(),
            cluster: "MIG1;size=3".to_string(),
            expected: 3,
            found: 4,
        };
        let msg = e.to_string();
        assert!(msg.contains("size=4"));
        assert!(msg.contains("size=3"));
    }

    #[test]
    fn invalid_symbol_points_at_the_read() {
        let e = MigError::InvalidSymbol { symbol: 'X', position: 7, element: 2 };
        assert_eq!(e.to_string(), "Invalid nucleotide 'X' at position 7 of element 2");
    }
}
