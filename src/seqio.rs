//! Record IO for **FASTA / FASTQ (.gz) / SAM / BAM** input and **FASTQ (.gz)** output.
//!
//! ### Design
//! - **FASTA/FASTQ** (plain or gzipped) parsed with `needletail`; `-` reads stdin
//! - **SAM/BAM** parsed with `rust-htslib`; the read name stands in for the header and
//!   reverse-strand records are reverse-complemented back to read orientation
//! - Records are streamed **in file order**: cluster assembly depends on it
//!
//! ### Callback contract
//! `on_record` is `FnMut(NARead) -> anyhow::Result<()>`; an error stops the
//! scan and is returned to the caller.
//!
//! ### Example
//! ```no_run
//! use migcons::seqio;
//! let (_fmt, n) = seqio::for_each_record("migs.fasta", |r| {
//!     println!("{} {}", r.id, r.seq.len());
//!     Ok(())
//! }).unwrap();
//! println!("processed {n} records");
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use bio::alphabets::dna::revcomp;
use flate2::write::GzEncoder;
use needletail::{parse_fastx_file, parse_fastx_stdin, FastxReader};
use rust_htslib::bam;
use rust_htslib::bam::Read;

use crate::error::MigError;

/// Input format detected from path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat { Fastx, Bam, Sam }

/// Detect the format from the file name. Unknown names are treated as FASTA/FASTQ.
pub fn detect_format(p: &Path) -> InputFormat {
    let name = p.file_name().and_then(|s| s.to_str()).unwrap_or("").to_ascii_lowercase();
    let name = name.strip_suffix(".gz").unwrap_or(&name);
    match name.rsplit_once('.').map(|(_, ext)| ext) {
        Some("bam") => InputFormat::Bam,
        Some("sam") => InputFormat::Sam,
        _ => InputFormat::Fastx,
    }
}

/// A normalized read passed to callbacks.
#[derive(Debug, Clone)]
pub struct NARead {
    /// Full header line without `>`/`@` (FASTA/FASTQ) or the read name (SAM/BAM).
    pub id: String,
    pub seq: Vec<u8>,
}

/// Stream every record of `path` to `on_record`, in order.
///
/// Returns the detected format and the number of records read. An empty
/// FASTA/FASTQ file yields zero records.
pub fn for_each_record<P, F>(path: P, mut on_record: F) -> Result<(InputFormat, usize)>
where
    P: AsRef<Path>,
    F: FnMut(NARead) -> Result<()>,
{
    let p = path.as_ref();
    let stdin = p.as_os_str() == "-";
    let fmt = if stdin { InputFormat::Fastx } else { detect_format(p) };
    let mut n = 0usize;

    let meta = if stdin { None } else { Some(std::fs::metadata(p).with_context(|| format!("cannot open {}", p.display()))?) };
    if meta.as_ref().is_some_and(|m| m.is_dir()) {
        return Err(MigError::UnsupportedInput { path: p.display().to_string(), reason: "is a directory".into() }.into());
    }

    match fmt {
        InputFormat::Fastx => {
            if meta.as_ref().is_some_and(|m| m.len() == 0) {
                return Ok((fmt, 0));
            }
            let mut reader: Box<dyn FastxReader> = if stdin {
                parse_fastx_stdin()?
            } else {
                parse_fastx_file(p).with_context(|| format!("cannot parse {}", p.display()))?
            };
            while let Some(record) = reader.next() {
                let rec = record.with_context(|| format!("malformed record after {n} records"))?;
                let id = String::from_utf8_lossy(rec.id()).to_string();
                let seq = rec.seq().to_vec();
                on_record(NARead { id, seq })?;
                n += 1;
            }
        }
        InputFormat::Bam | InputFormat::Sam => {
            let mut reader = bam::Reader::from_path(p).with_context(|| format!("cannot open {}", p.display()))?;
            for result in reader.records() {
                let rec = result?;
                let id = String::from_utf8_lossy(rec.qname()).to_string();
                let mut seq = rec.seq().as_bytes();
                if rec.is_reverse() {
                    seq = revcomp(&seq);
                }
                on_record(NARead { id, seq })?;
                n += 1;
            }
        }
    }

    Ok((fmt, n))
}

/// One FASTQ record to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastqRecord {
    pub name: String,
    pub seq: Vec<u8>,
    pub qual: Vec<u8>,
}

/// Write a 4-line FASTQ record.
pub fn write_fastq_record<W: Write + ?Sized>(w: &mut W, rec: &FastqRecord) -> std::io::Result<()> {
    w.write_all(b"@")?;
    w.write_all(rec.name.as_bytes())?;
    w.write_all(b"\n")?;
    w.write_all(&rec.seq)?;
    w.write_all(b"\n+\n")?;
    w.write_all(&rec.qual)?;
    w.write_all(b"\n")?;
    Ok(())
}

/// FASTQ destination: stdout, a plain file, or a gzip file (`.gz` suffix).
pub enum FastqSink {
    Plain(BufWriter<Box<dyn Write>>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl FastqSink {
    /// Open `path`, or stdout when `None`.
    pub fn create(path: Option<&Path>) -> Result<Self> {
        let Some(p) = path else {
            return Ok(Self::Plain(BufWriter::new(Box::new(std::io::stdout().lock()))));
        };
        let fh = File::create(p).with_context(|| format!("cannot create {}", p.display()))?;
        if p.to_string_lossy().to_ascii_lowercase().ends_with(".gz") {
            Ok(Self::Gzip(GzEncoder::new(BufWriter::new(fh), flate2::Compression::default())))
        } else {
            Ok(Self::Plain(BufWriter::new(Box::new(fh))))
        }
    }

    pub fn write_record(&mut self, rec: &FastqRecord) -> std::io::Result<()> {
        match self {
            Self::Plain(w) => write_fastq_record(w, rec),
            Self::Gzip(w) => write_fastq_record(w, rec),
        }
    }

    /// Flush buffers and write the gzip trailer.
    pub fn finish(self) -> Result<()> {
        match self {
            Self::Plain(mut w) => w.flush()?,
            Self::Gzip(gz) => {
                gz.finish()?.flush()?;
            }
        }
        Ok(())
    }
}
