//! Runs the `svprep scan` binary end to end.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use fgoxide::io::DelimFile;
use svprep_lib::discordant::DiscordantStats;
use svprep_lib::hotspot::HotspotRecord;
use svprep_lib::metrics::JunctionRecord;
use svprep_lib::sam::record::AlignmentRecord;
use svprep_lib::stats::ScanSummaryMetric;
use tempfile::TempDir;

use crate::helpers::{
    JUNCTION_POSITION, clipped_pair, discordant_scenario, junction_scenario, write_indexed_bam,
};

fn write_input(dir: &Path, records: Vec<AlignmentRecord>) -> PathBuf {
    let bam = dir.join("input.bam");
    write_indexed_bam(&bam, records);
    bam
}

fn run_scan(input: &Path, output: &Path, extra: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_svprep"))
        .args(["scan", "-i", input.to_str().unwrap(), "-o", output.to_str().unwrap()])
        .args(["--partition-size", "10000", "--skip-fragment-lengths"])
        .args(extra)
        .output()
        .expect("Failed to run svprep scan")
}

fn assert_success(output: &Output) {
    assert!(output.status.success(), "scan failed: {}", String::from_utf8_lossy(&output.stderr));
}

fn read_junctions(path: &Path) -> Vec<JunctionRecord> {
    DelimFile::default().read_tsv(path).expect("Failed to read junctions")
}

#[test]
fn test_scan_writes_junction_and_stats_tables() {
    let tmp = TempDir::new().unwrap();
    let mut records = junction_scenario();
    records.extend(discordant_scenario());
    let input = write_input(tmp.path(), records);
    let output = tmp.path().join("junctions.tsv");
    let discordant = tmp.path().join("discordant.tsv");
    let summary = tmp.path().join("summary.tsv");

    let result = run_scan(
        &input,
        &output,
        &["-t", "1", "-d", discordant.to_str().unwrap(), "-s", summary.to_str().unwrap()],
    );
    assert_success(&result);

    let junctions = read_junctions(&output);
    assert_eq!(junctions.len(), 2);
    assert_eq!(junctions[0].chromosome, "chr1");
    assert_eq!(junctions[0].position, JUNCTION_POSITION);
    assert_eq!(junctions[0].orientation, 1);
    assert_eq!(junctions[0].junction_frags, 4);
    assert_eq!(junctions[0].top_read, "junction0");
    assert!(junctions[1].discordant_group);
    assert_eq!(junctions[1].remote_junctions, "chr5:50100:-1:3");

    let stats: Vec<DiscordantStats> = DelimFile::default().read_tsv(&discordant).unwrap();
    assert_eq!(stats, vec![DiscordantStats { total_reads: 3, short_inversions: 0, translocations: 3, other: 0 }]);

    let rows: Vec<ScanSummaryMetric> = DelimFile::default().read_tsv(&summary).unwrap();
    let value = |key: &str| rows.iter().find(|r| r.key == key).map(|r| r.value);
    assert_eq!(value("reads"), Some(14));
    assert_eq!(value("junctions"), Some(2));
    assert_eq!(value("partitions"), Some(15));
}

#[test]
fn test_thread_count_does_not_change_output() {
    let tmp = TempDir::new().unwrap();
    let input = write_input(tmp.path(), junction_scenario());
    let single = tmp.path().join("single.tsv");
    let multi = tmp.path().join("multi.tsv");

    assert_success(&run_scan(&input, &single, &["-t", "1"]));
    assert_success(&run_scan(&input, &multi, &["-t", "4"]));
    assert_eq!(read_junctions(&single), read_junctions(&multi));
}

#[test]
fn test_region_restricts_scan() {
    let tmp = TempDir::new().unwrap();
    let mut records = junction_scenario();
    records.extend(discordant_scenario());
    let input = write_input(tmp.path(), records);
    let output = tmp.path().join("junctions.tsv");

    assert_success(&run_scan(&input, &output, &["-r", "chr1:1-10000"]));
    let junctions = read_junctions(&output);
    assert_eq!(junctions.len(), 1);
    assert_eq!(junctions[0].position, JUNCTION_POSITION);
}

#[test]
fn test_hotspot_file_keeps_single_fragment_junction() {
    let tmp = TempDir::new().unwrap();
    let input = write_input(tmp.path(), clipped_pair("solo", 5_000, 5_300));
    let hotspots = tmp.path().join("hotspots.tsv");
    DelimFile::default()
        .write_tsv(&hotspots, vec![HotspotRecord { chromosome: "chr1".to_string(), position: 5_069, orientation: 1 }])
        .unwrap();

    let without = tmp.path().join("without.tsv");
    assert_success(&run_scan(&input, &without, &[]));
    assert!(read_junctions(&without).is_empty());

    let with = tmp.path().join("with.tsv");
    assert_success(&run_scan(&input, &with, &["-H", hotspots.to_str().unwrap()]));
    let junctions = read_junctions(&with);
    assert_eq!(junctions.len(), 1);
    assert!(junctions[0].hotspot);
    assert_eq!(junctions[0].top_read, "solo");
}

#[test]
fn test_missing_index_is_built() {
    let tmp = TempDir::new().unwrap();
    let input = write_input(tmp.path(), junction_scenario());
    let index = tmp.path().join("input.bam.bai");
    std::fs::remove_file(&index).unwrap();

    let output = tmp.path().join("junctions.tsv");
    assert_success(&run_scan(&input, &output, &[]));
    assert!(index.exists());
    assert_eq!(read_junctions(&output).len(), 1);
}

#[test]
fn test_fragment_length_sampling_keeps_bounds_with_few_pairs() {
    let tmp = TempDir::new().unwrap();
    let input = write_input(tmp.path(), junction_scenario());
    let skipped = tmp.path().join("skipped.tsv");
    assert_success(&run_scan(&input, &skipped, &[]));

    let sampled = tmp.path().join("sampled.tsv");
    let lengths = tmp.path().join("lengths.tsv");
    let result = Command::new(env!("CARGO_BIN_EXE_svprep"))
        .args(["scan", "-i", input.to_str().unwrap(), "-o", sampled.to_str().unwrap()])
        .args(["--partition-size", "10000", "--fragment-lengths", lengths.to_str().unwrap()])
        .output()
        .unwrap();
    assert_success(&result);
    assert_eq!(read_junctions(&skipped), read_junctions(&sampled));
}

#[test]
fn test_missing_input_fails() {
    let tmp = TempDir::new().unwrap();
    let result = run_scan(&tmp.path().join("absent.bam"), &tmp.path().join("out.tsv"), &[]);
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("absent.bam"));
}

#[test]
fn test_zero_threads_rejected() {
    let tmp = TempDir::new().unwrap();
    let input = write_input(tmp.path(), junction_scenario());
    let result = run_scan(&input, &tmp.path().join("out.tsv"), &["-t", "0"]);
    assert!(!result.status.success());
    assert!(!tmp.path().join("out.tsv").exists());
}
