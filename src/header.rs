//! MIG header tags.
//!
//! Upstream grouping annotates every read header with its cluster size and a
//! countdown element number, e.g.
//!
//! ```text
//! >MIG17;barcode=ACGTTGCA;size=3;element=3
//! >MIG17;barcode=ACGTTGCA;size=3;element=2
//! >MIG17;barcode=ACGTTGCA;size=3;element=1
//! ```
//!
//! Reads whose barcode could not be assigned carry `barcode=unknown` and are
//! ignored, as are headers without a `size=…;element=…` pair. `:` is accepted
//! in place of `;` between the two tags.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{MigError, Result};

/// Marker for reads without an assigned barcode.
pub const UNKNOWN_BARCODE: &str = "barcode=unknown";

fn counter_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"size=(\d+)[:;]element=(\d+)").expect("static regex"))
}

fn element_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[:;]element=\d+").expect("static regex"))
}

/// Classification of one read header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeaderTag {
    /// `barcode=unknown`; the read is dropped.
    UnknownBarcode,
    /// No `size`/`element` pair; the read is not part of any cluster.
    Untagged,
    /// Cluster member.
    Member {
        /// Declared cluster size.
        size: usize,
        /// Countdown element number (`size` for the first read, 1 for the last).
        element: usize,
    },
}

impl HeaderTag {
    /// Whether this read opens a new cluster.
    pub fn is_cluster_start(&self) -> bool {
        matches!(self, HeaderTag::Member { size, element } if size == element)
    }
}

/// Parse the cluster tags of a header (with or without its leading `>`/`@`).
///
/// A `size=`/`element=` pair that cannot describe a cluster (zero, element
/// above size, numbers overflowing `usize`) is an error.
///
/// # Examples
/// ```
/// use migcons::header::{parse_header, HeaderTag};
/// assert_eq!(parse_header("MIG1;size=3;element=2").unwrap(), HeaderTag::Member { size: 3, element: 2 });
/// assert_eq!(parse_header("MIG1;barcode=unknown;size=3;element=2").unwrap(), HeaderTag::UnknownBarcode);
/// assert_eq!(parse_header("read_1 no tags").unwrap(), HeaderTag::Untagged);
/// ```
pub fn parse_header(header: &str) -> Result<HeaderTag> {
    if header.contains(UNKNOWN_BARCODE) {
        return Ok(HeaderTag::UnknownBarcode);
    }
    let Some(caps) = counter_re().captures(header) else {
        return Ok(HeaderTag::Untagged);
    };
    let number = |i: usize, what: &str| -> Result<usize> {
        caps[i].parse::<usize>().map_err(|e| MigError::MalformedClusterTag {
            header: header.to_string(),
            reason: format!("{what}: {e}"),
        })
    };
    let size = number(1, "size")?;
    let element = number(2, "element")?;
    if size == 0 || element == 0 || element > size {
        return Err(MigError::MalformedClusterTag {
            header: header.to_string(),
            reason: format!("element={element} is not within 1..=size ({size})"),
        });
    }
    Ok(HeaderTag::Member { size, element })
}

/// Cluster identifier: the header without its leading `>`/`@` and without the element tag.
///
/// # Examples
/// ```
/// use migcons::header::cluster_id;
/// assert_eq!(cluster_id(">MIG7;barcode=ACGT;size=3;element=3"), "MIG7;barcode=ACGT;size=3");
/// assert_eq!(cluster_id("MIG7;size=3:element=3;x=1"), "MIG7;size=3;x=1");
/// ```
pub fn cluster_id(header: &str) -> String {
    let h = header.strip_prefix(['>', '@']).unwrap_or(header);
    element_re().replace_all(h, "").into_owned()
}
