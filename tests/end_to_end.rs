use std::fmt::Write as _;
use std::io::Read as _;
use std::path::Path;

use migcons::{run, ConsensusParams, RunOptions};

fn options(input: &Path, output: &Path) -> RunOptions {
    let mut opts = RunOptions::new(input);
    opts.output = Some(output.to_path_buf());
    opts.params = ConsensusParams::new(2, 1, 1).unwrap();
    opts.threads = 1;
    opts
}

const SMALL: &str = "\
>MIG1;barcode=AAA;size=3;element=3
ACGTACGTAC
>MIG1;barcode=AAA;size=3;element=2
ACGTACGTAC
>MIG1;barcode=AAA;size=3;element=1
ACGTACGTAG
>MIG2;barcode=CCC;size=1;element=1
GGGTTT
>MIG3;barcode=unknown;size=1;element=1
AAAA
>MIG4;barcode=GGG;size=2;element=1
ACGT
";

#[test]
fn clusters_become_fastq_records_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("migs.fasta");
    let output = dir.path().join("out.fastq");
    std::fs::write(&input, SMALL).unwrap();

    let summary = run(&options(&input, &output)).unwrap();

    let text = std::fs::read_to_string(&output).unwrap();
    assert_eq!(
        text,
        "@MIG1;barcode=AAA;size=3;retained=3\nACGTACGTAC\n+\nIIIIIIIII7\n\
         @MIG2;barcode=CCC;size=1;retained=1\nGGGTTT\n+\n######\n"
    );
    assert_eq!(summary.records, 6);
    assert_eq!(summary.unknown_barcode, 1);
    assert_eq!(summary.orphans, 1);
    assert_eq!((summary.consensus, summary.singlets), (1, 1));
    assert_eq!(summary.written(), 2);
}

#[test]
fn gzip_output_and_reports() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("migs.fa");
    let output = dir.path().join("out.fastq.gz");
    std::fs::write(&input, SMALL).unwrap();
    let mut opts = options(&input, &output);
    opts.stats = Some(dir.path().join("clusters.tsv"));
    opts.json = Some(dir.path().join("summary.json"));

    run(&opts).unwrap();

    let mut text = String::new();
    flate2::read::GzDecoder::new(std::fs::File::open(&output).unwrap()).read_to_string(&mut text).unwrap();
    assert!(text.starts_with("@MIG1;barcode=AAA;size=3;retained=3\n"));

    let tsv = std::fs::read_to_string(dir.path().join("clusters.tsv")).unwrap();
    let lines: Vec<&str> = tsv.lines().collect();
    assert_eq!(lines[0], "cluster_id\tsize\tseedable\ttoo_short\trejected\tretained\toutcome");
    assert_eq!(lines[1], "MIG1;barcode=AAA;size=3\t3\t3\t0\t0\t3\tconsensus");
    assert_eq!(lines[2], "MIG2;barcode=CCC;size=1\t1\t1\t0\t0\t1\tsinglet");
    assert_eq!(lines.len(), 3);

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("summary.json")).unwrap()).unwrap();
    assert_eq!(json["records"], 6);
    assert_eq!(json["params"]["offset_range"], 1);
}

#[test]
fn empty_input_writes_empty_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("empty.fasta");
    let output = dir.path().join("out.fastq");
    std::fs::write(&input, "").unwrap();
    let summary = run(&options(&input, &output)).unwrap();
    assert_eq!(summary.records, 0);
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "");
}

#[test]
fn size_mismatch_aborts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bad.fasta");
    let output = dir.path().join("out.fastq");
    std::fs::write(&input, ">MIG1;size=2;element=2\nACGT\n>MIG1;size=3;element=1\nACGT\n").unwrap();
    let err = run(&options(&input, &output)).unwrap_err();
    assert!(err.to_string().contains("size"), "{err}");
}

/// Deterministic pseudo-random reads; no seeding crate needed for a fixture.
fn synthetic_input(clusters: usize) -> String {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut next = move || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (state >> 33) as usize
    };
    let mut out = String::new();
    for c in 0..clusters {
        let len = 30 + next() % 20;
        let base: Vec<u8> = (0..len).map(|_| b"ACGT"[next() % 4]).collect();
        let size = 1 + next() % 4;
        for element in (1..=size).rev() {
            let mut read = base.clone();
            if next() % 3 == 0 {
                let pos = next() % len;
                read[pos] = b"ACGT"[next() % 4];
            }
            if next() % 5 == 0 {
                read.remove(0);
            }
            writeln!(out, ">MIG{c};barcode=X{c};size={size};element={element}").unwrap();
            writeln!(out, "{}", String::from_utf8(read).unwrap()).unwrap();
        }
    }
    out
}

#[test]
fn thread_count_does_not_change_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("many.fasta");
    std::fs::write(&input, synthetic_input(4500)).unwrap();

    let one = dir.path().join("one.fastq");
    let mut opts = options(&input, &one);
    opts.params = ConsensusParams::default();
    let a = run(&opts).unwrap();

    let four = dir.path().join("four.fastq");
    opts.output = Some(four.clone());
    opts.threads = 4;
    let b = run(&opts).unwrap();

    assert_eq!(a, b);
    assert_eq!(a.singlets + a.consensus + a.no_consensus + a.oversized, 4500);
    assert_eq!(std::fs::read(&one).unwrap(), std::fs::read(&four).unwrap());
    let text = std::fs::read_to_string(&one).unwrap();
    assert!(text.starts_with("@MIG0;barcode=X0;size="));
}
