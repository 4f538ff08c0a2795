//! Discordant pairs clustered into groups that back junctions of their own.

use svprep_lib::bam_io::InMemorySource;
use svprep_lib::fragment::FragmentStatus;
use svprep_lib::hotspot::HotspotCache;
use svprep_lib::junction::RemoteJunction;
use svprep_lib::read::{Orientation, ReadType};
use svprep_lib::scheduler::{PartitionScheduler, ScanResults};
use svprep_lib::spanning_cache::SpanningCache;

use crate::helpers::{
    DISCORDANT_POSITION, DISCORDANT_REMOTE_START, PARTITION_SIZE, discordant_scenario,
    scan_config, tasks, translocation_pair,
};

fn run(records: Vec<svprep_lib::sam::record::AlignmentRecord>) -> ScanResults {
    let source = InMemorySource::new(records);
    let cache = SpanningCache::new(PARTITION_SIZE);
    PartitionScheduler::new(scan_config(1))
        .run(tasks(), &source, &HotspotCache::default(), &cache)
        .unwrap()
}

#[test]
fn test_group_backs_junction_with_remote_breakend() {
    let results = run(discordant_scenario());

    let junctions: Vec<_> = results.junctions().collect();
    assert_eq!(junctions.len(), 1);
    let junction = junctions[0];
    assert_eq!(junction.chromosome, "chr1");
    assert_eq!(junction.breakend(), (DISCORDANT_POSITION, Orientation::Forward));
    assert!(junction.discordant_group);
    assert_eq!(junction.junction_fragment_count(), 0);
    assert_eq!(junction.candidate_support_fragments.len(), 3);
    assert!(junction.top_read().is_none());

    let mut expected = RemoteJunction::new("chr5", DISCORDANT_REMOTE_START, Orientation::Reverse);
    expected.fragment_count = 3;
    assert_eq!(junction.remote_junctions, vec![expected]);

    let groups: Vec<_> = results.discordant_groups().collect();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].fragment_ids.len(), 3);

    assert_eq!(results.stats.discordant.total_reads, 3);
    assert_eq!(results.stats.discordant.translocations, 3);
}

#[test]
fn test_group_members_resolve_as_pairs_in_mate_partition() {
    let results = run(discordant_scenario());

    // Pairs of candidate reads never complete; the chr5 partition resolves them once both
    // reads are present
    let chr5_start = tasks().iter().position(|t| t.key.chromosome == "chr5").unwrap();
    assert!(results.partitions[..chr5_start].iter().all(|p| p.fragments.is_empty()));
    let emitted: Vec<_> = results.partitions.iter().flat_map(|p| p.fragments.iter()).collect();
    assert_eq!(emitted.len(), 3);
    for fragment in emitted {
        assert_eq!(fragment.status(), FragmentStatus::Paired);
        assert_eq!(fragment.reads().len(), 2);
        assert!(fragment.reads().iter().all(|r| r.written));
        assert_eq!(fragment.junction_positions, vec![(DISCORDANT_POSITION, Orientation::Forward)]);
        let chr1_read = fragment.reads().iter().find(|r| r.chromosome == "chr1").unwrap();
        assert_eq!(chr1_read.read_type, ReadType::Support);
    }
    assert!(results.leftover_fragments.is_empty());
    assert_eq!(results.stats.reads.locally_resolved_fragments, 3);
}

#[test]
fn test_single_discordant_pair_forms_no_junction() {
    let results = run(translocation_pair("lonely", 20_100, 50_100));
    assert_eq!(results.junctions().count(), 0);
    assert_eq!(results.discordant_groups().count(), 2);
    assert_eq!(results.stats.discordant.translocations, 2);
}

#[test]
fn test_opposite_orientations_form_separate_groups() {
    let mut records = discordant_scenario();
    for i in 0..2u32 {
        let mut pair = translocation_pair(&format!("reverse{i}"), 20_150 + i * 10, 60_000);
        pair[0].flags |= noodles::sam::alignment::record::Flags::REVERSE_COMPLEMENTED;
        pair[1].flags |= noodles::sam::alignment::record::Flags::MATE_REVERSE_COMPLEMENTED;
        records.extend(pair);
    }
    let results = run(records);

    let chr1_groups: Vec<_> = results.discordant_groups().filter(|g| g.chromosome == "chr1").collect();
    assert_eq!(chr1_groups.len(), 2);
    assert!(chr1_groups.iter().any(|g| g.orientation == Orientation::Forward && g.fragment_ids.len() == 3));
    assert!(chr1_groups.iter().any(|g| g.orientation == Orientation::Reverse && g.fragment_ids.len() == 2));
}
