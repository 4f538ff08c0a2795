//! Fragments spanning partitions are reconciled the same way whatever order the
//! partitions are scanned in.

use std::sync::atomic::AtomicBool;

use svprep_lib::bam_io::InMemorySource;
use svprep_lib::config::ReadFilterConfig;
use svprep_lib::fragment::{Fragment, FragmentStatus};
use svprep_lib::hotspot::HotspotCache;
use svprep_lib::partition::{PartitionTask, split_genome};
use svprep_lib::read::{Orientation, ReadType};
use svprep_lib::sam::builder::RecordBuilder;
use svprep_lib::sam::record::AlignmentRecord;
use svprep_lib::scanner::PartitionScanner;
use svprep_lib::spanning_cache::SpanningCache;

use crate::helpers::{JUNCTION_POSITION, PARTITION_SIZE, clipped_pair, junction_scenario};

/// Every ordering of `0..n`.
fn permutations(n: usize) -> Vec<Vec<usize>> {
    if n == 0 {
        return vec![Vec::new()];
    }
    let mut all = Vec::new();
    for rest in permutations(n - 1) {
        for slot in 0..=rest.len() {
            let mut order = rest.clone();
            order.insert(slot, n - 1);
            all.push(order);
        }
    }
    all
}

fn chr1_tasks() -> Vec<PartitionTask> {
    split_genome(&[("chr1".to_string(), 50_000)], PARTITION_SIZE, &[]).unwrap()
}

struct OrderedRun {
    emitted: Vec<Fragment>,
    leftover: Vec<Fragment>,
    junctions: Vec<((u32, Orientation), usize)>,
}

fn scan_in_order(source: &InMemorySource, order: &[usize]) -> OrderedRun {
    let tasks = chr1_tasks();
    let cache = SpanningCache::new(PARTITION_SIZE);
    let hotspots = HotspotCache::default();
    let scanner = PartitionScanner::new(ReadFilterConfig::default(), &cache, &hotspots);
    let cancelled = AtomicBool::new(false);

    let mut emitted = Vec::new();
    let mut junctions = Vec::new();
    for &i in order {
        let mut worker = source.clone();
        let result = scanner.scan(&tasks[i], &mut worker, &cancelled).unwrap();
        junctions.extend(result.junctions.iter().map(|j| (j.breakend(), j.junction_fragment_count())));
        emitted.extend(result.fragments);
    }
    junctions.sort_unstable();
    OrderedRun { emitted, leftover: cache.finalize(), junctions }
}

#[test]
fn test_permutations_helper() {
    let orders = permutations(3);
    assert_eq!(orders.len(), 6);
    assert!(orders.contains(&vec![2, 0, 1]));
}

#[test]
fn test_every_partition_order_completes_each_fragment_once() {
    let mut records = junction_scenario();
    records.extend(clipped_pair("late", 15_000, 35_000));
    let source = InMemorySource::new(records);
    assert_eq!(chr1_tasks().len(), 5);

    for order in permutations(5) {
        let run = scan_in_order(&source, &order);

        let mut ids: Vec<&str> = run.emitted.iter().map(Fragment::id).collect();
        ids.sort_unstable();
        assert_eq!(
            ids,
            vec!["junction0", "junction1", "junction2", "junction3", "late"],
            "order {order:?}"
        );
        assert!(run.emitted.iter().all(|f| f.is_complete() && f.reads().len() == 2), "order {order:?}");
        assert!(run.leftover.is_empty(), "order {order:?}");
        assert_eq!(run.junctions, vec![((JUNCTION_POSITION, Orientation::Forward), 4)], "order {order:?}");
    }
}

/// Fragments that only remote reads could confirm: a candidate pair within the first
/// partition, a long-insert candidate pair spanning the first and third, and a split read
/// whose supplementary alignment lies in the first partition and primary in the fourth.
fn conditional_scenario() -> Vec<AlignmentRecord> {
    let candidate = |name: &str, first: bool, start: u32, mate_start: u32, cigar: &str| {
        let builder = RecordBuilder::new().name(name).start(start).cigar(cigar);
        let builder = if first { builder.first_of_pair() } else { builder.second_of_pair().reverse() };
        let insert = (mate_start.max(start) + 100 - mate_start.min(start)) as i32;
        builder.mate("chr1", mate_start, first).insert_size(if first { insert } else { -insert }).build()
    };
    vec![
        candidate("local_cand", true, 2_000, 2_200, "90M10S"),
        candidate("local_cand", false, 2_200, 2_000, "90M10S"),
        candidate("span_cand", true, 5_000, 25_000, "100M"),
        candidate("span_cand", false, 25_000, 5_000, "100M"),
        RecordBuilder::new()
            .name("split")
            .supplementary()
            .start(8_000)
            .cigar("70M30S")
            .supplementary_tag("chr1,35000,+,30S70M,60,0;")
            .build(),
        RecordBuilder::new()
            .name("split")
            .start(35_000)
            .cigar("30S70M")
            .supplementary_tag("chr1,8000,+,70M30S,60,0;")
            .build(),
    ]
}

#[test]
fn test_conditional_fragments_resolve_once_in_every_order() {
    let source = InMemorySource::new(conditional_scenario());

    for order in permutations(5) {
        let run = scan_in_order(&source, &order);

        let mut emitted: Vec<(&str, FragmentStatus, usize)> =
            run.emitted.iter().map(|f| (f.id(), f.status(), f.reads().len())).collect();
        emitted.sort_unstable_by_key(|e| e.0);
        assert_eq!(
            emitted,
            vec![
                ("local_cand", FragmentStatus::Paired, 2),
                ("span_cand", FragmentStatus::Paired, 2),
                ("split", FragmentStatus::Complete, 2),
            ],
            "order {order:?}"
        );
        let span = run.emitted.iter().find(|f| f.id() == "span_cand").unwrap();
        assert!(span.reads().iter().all(|r| r.read_type == ReadType::CandidateSupport), "order {order:?}");
        assert!(run.leftover.is_empty(), "order {order:?}");
    }
}

#[test]
fn test_unstarted_partition_leaves_fragment_cached() {
    let source = InMemorySource::new(clipped_pair("span", 1_000, 25_000));
    let run = scan_in_order(&source, &[0, 1, 3, 4]);
    assert!(run.emitted.is_empty());
    assert_eq!(run.leftover.len(), 1);
    assert_eq!(run.leftover[0].id(), "span");
    assert_eq!(run.leftover[0].reads().len(), 1);
}
