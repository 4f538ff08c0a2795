//! End-to-end scans through the partition scheduler.

use svprep_lib::bam_io::{InMemorySource, IndexedBamSourceFactory, read_bam_header, reference_sequences};
use svprep_lib::fragment::{Fragment, FragmentStatus};
use svprep_lib::hotspot::{HotspotCache, HotspotRecord};
use svprep_lib::metrics::JunctionRecord;
use svprep_lib::partition::{GenomeRegion, split_genome};
use svprep_lib::read::Orientation;
use svprep_lib::scheduler::{PartitionScheduler, ScanResults};
use svprep_lib::spanning_cache::SpanningCache;
use tempfile::TempDir;

use crate::helpers::{
    JUNCTION_POSITION, PARTITION_SIZE, chromosomes, clipped_pair, discordant_scenario,
    junction_scenario, scan_config, tasks, write_indexed_bam,
};

fn all_records() -> Vec<svprep_lib::sam::record::AlignmentRecord> {
    let mut records = junction_scenario();
    records.extend(discordant_scenario());
    records
}

fn run_in_memory(threads: usize) -> ScanResults {
    run_records(all_records(), threads)
}

fn run_records(records: Vec<svprep_lib::sam::record::AlignmentRecord>, threads: usize) -> ScanResults {
    let source = InMemorySource::new(records);
    let cache = SpanningCache::new(PARTITION_SIZE);
    PartitionScheduler::new(scan_config(threads))
        .run(tasks(), &source, &HotspotCache::default(), &cache)
        .expect("scan succeeds")
}

fn junction_rows(results: &ScanResults) -> Vec<JunctionRecord> {
    results.junctions().map(JunctionRecord::from).collect()
}

fn sorted_fragment_ids(results: &ScanResults) -> Vec<String> {
    let mut ids: Vec<String> = results.fragments().map(|f| f.id().to_string()).collect();
    ids.sort_unstable();
    ids
}

#[test]
fn test_scan_reports_clipped_and_discordant_junctions() {
    let results = run_in_memory(1);

    let rows = junction_rows(&results);
    assert_eq!(rows.len(), 2, "rows: {rows:?}");

    let clipped = &rows[0];
    assert_eq!(clipped.chromosome, "chr1");
    assert_eq!(clipped.position, JUNCTION_POSITION);
    assert_eq!(clipped.orientation, 1);
    assert_eq!(clipped.junction_frags, 4);
    assert!(!clipped.discordant_group);
    assert_eq!(clipped.top_read, "junction0");

    assert!(rows[1].discordant_group);
    assert_eq!(results.stats.reads.reads, 14);
    assert_eq!(results.stats.discordant.translocations, 3);
}

#[test]
fn test_every_interesting_fragment_is_emitted_once() {
    let results = run_in_memory(4);
    let ids = sorted_fragment_ids(&results);
    let mut deduped = ids.clone();
    deduped.dedup();
    assert_eq!(ids, deduped, "a fragment was emitted twice");
    assert_eq!(ids.len(), 7);
    assert!(results.fragments().all(|f| f.reads().iter().all(|r| r.written)));
    assert!(results.fragments().all(|f| f.reads().len() == 2));
}

#[test]
fn test_thread_count_does_not_change_junctions() {
    let single = run_records(junction_scenario(), 1);
    for threads in [2, 3, 8] {
        let multi = run_records(junction_scenario(), threads);
        assert_eq!(single.stats.reads.reads, multi.stats.reads.reads);
        assert_eq!(single.stats.reads.read_type_counts, multi.stats.reads.read_type_counts);
        assert_eq!(junction_rows(&single), junction_rows(&multi));
        assert_eq!(sorted_fragment_ids(&single), sorted_fragment_ids(&multi));
    }
}

#[test]
fn test_indexed_bam_matches_in_memory_source() {
    let tmp = TempDir::new().unwrap();
    let bam = tmp.path().join("input.bam");
    let index = write_indexed_bam(&bam, all_records());
    assert!(index.exists());

    let header = read_bam_header(&bam).unwrap();
    assert_eq!(reference_sequences(&header), chromosomes());

    let cache = SpanningCache::new(PARTITION_SIZE);
    let from_bam = PartitionScheduler::new(scan_config(1))
        .run(tasks(), &IndexedBamSourceFactory::new(&bam), &HotspotCache::default(), &cache)
        .unwrap();
    let in_memory = run_in_memory(1);

    assert_eq!(junction_rows(&from_bam), junction_rows(&in_memory));
    assert_eq!(from_bam.stats.reads.reads, in_memory.stats.reads.reads);
    assert_eq!(from_bam.stats.reads.filter_counts, in_memory.stats.reads.filter_counts);
    assert_eq!(from_bam.stats.reads.read_type_counts, in_memory.stats.reads.read_type_counts);
    assert_eq!(from_bam.stats.discordant, in_memory.stats.discordant);
    assert_eq!(sorted_fragment_ids(&from_bam), sorted_fragment_ids(&in_memory));
}

#[test]
fn test_specific_region_leaves_spanning_fragments_incomplete() {
    let region: GenomeRegion = "chr1:1-10000".parse().unwrap();
    let tasks = split_genome(&chromosomes(), PARTITION_SIZE, &[region]).unwrap();
    assert_eq!(tasks.len(), 1);

    let source = InMemorySource::new(all_records());
    let cache = SpanningCache::new(PARTITION_SIZE);
    let results = PartitionScheduler::new(scan_config(2))
        .run(tasks, &source, &HotspotCache::default(), &cache)
        .unwrap();

    let junctions: Vec<_> = results.junctions().collect();
    assert_eq!(junctions.len(), 1);
    assert_eq!(junctions[0].breakend(), (JUNCTION_POSITION, Orientation::Forward));
    assert_eq!(junctions[0].junction_fragment_count(), 4);

    let leftover: Vec<&str> = results.leftover_fragments.iter().map(Fragment::id).collect();
    assert_eq!(leftover, vec!["junction1", "junction2"]);
    assert!(results.leftover_fragments.iter().all(|f| f.status() == FragmentStatus::Incomplete));
    assert!(cache.is_empty());
}

#[test]
fn test_hotspot_keeps_single_fragment_junction() {
    let records = clipped_pair("solo", 5_000, 5_300);
    let source = InMemorySource::new(records);

    let cache = SpanningCache::new(PARTITION_SIZE);
    let without = PartitionScheduler::new(scan_config(1))
        .run(tasks(), &source, &HotspotCache::default(), &cache)
        .unwrap();
    assert_eq!(without.junctions().count(), 0);

    let hotspots = HotspotCache::from_records(vec![HotspotRecord {
        chromosome: "chr1".to_string(),
        position: 5_071,
        orientation: 1,
    }])
    .unwrap();
    let cache = SpanningCache::new(PARTITION_SIZE);
    let with = PartitionScheduler::new(scan_config(1)).run(tasks(), &source, &hotspots, &cache).unwrap();
    let junctions: Vec<_> = with.junctions().collect();
    assert_eq!(junctions.len(), 1);
    assert!(junctions[0].hotspot);
    assert_eq!(junctions[0].breakend(), (5_069, Orientation::Forward));
}
