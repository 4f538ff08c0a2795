//! Read layouts shared by the integration tests.

#![allow(dead_code)]

use svprep_lib::config::ScanConfig;
use svprep_lib::partition::{PartitionTask, split_genome};
use svprep_lib::sam::builder::RecordBuilder;
use svprep_lib::sam::record::AlignmentRecord;

/// Partition size used throughout the integration tests.
pub const PARTITION_SIZE: u32 = 10_000;

/// Reference sequences of the test genome, in header order.
pub const CHROMOSOMES: [(&str, u32); 2] = [("chr1", 50_000), ("chr5", 100_000)];

/// Breakend of the soft-clipped junction in [`junction_scenario`].
pub const JUNCTION_POSITION: u32 = 1_069;

/// Breakend on chr1 implied by the reads of [`discordant_scenario`].
pub const DISCORDANT_POSITION: u32 = 20_239;

/// Start of the chr5 region holding the partners in [`discordant_scenario`].
pub const DISCORDANT_REMOTE_START: u32 = 50_100;

/// `(name, length)` pairs as read from a BAM header.
#[must_use]
pub fn chromosomes() -> Vec<(String, u32)> {
    CHROMOSOMES.iter().map(|(name, length)| ((*name).to_string(), *length)).collect()
}

/// Partition tasks over the whole test genome.
#[must_use]
pub fn tasks() -> Vec<PartitionTask> {
    split_genome(&chromosomes(), PARTITION_SIZE, &[]).expect("valid partitioning")
}

/// Scan settings with fragment-length sampling turned off.
#[must_use]
pub fn scan_config(threads: usize) -> ScanConfig {
    ScanConfig {
        partition_size: PARTITION_SIZE,
        threads,
        estimate_fragment_lengths: false,
        ..Default::default()
    }
}

/// A chr1 pair whose first read is soft clipped at `start + 69` and whose reverse-strand
/// mate starts at `mate_start`.
#[must_use]
pub fn clipped_pair(name: &str, start: u32, mate_start: u32) -> Vec<AlignmentRecord> {
    let insert = (mate_start + 100 - start) as i32;
    vec![
        RecordBuilder::new()
            .name(name)
            .first_of_pair()
            .start(start)
            .cigar("70M30S")
            .mate("chr1", mate_start, true)
            .insert_size(insert)
            .build(),
        RecordBuilder::new()
            .name(name)
            .second_of_pair()
            .reverse()
            .start(mate_start)
            .mate("chr1", start, false)
            .insert_size(-insert)
            .build(),
    ]
}

/// A pair with a forward read on chr1 and its reverse-strand mate on chr5.
#[must_use]
pub fn translocation_pair(name: &str, start: u32, mate_start: u32) -> Vec<AlignmentRecord> {
    vec![
        RecordBuilder::new()
            .name(name)
            .first_of_pair()
            .start(start)
            .mate("chr5", mate_start, true)
            .build(),
        RecordBuilder::new()
            .name(name)
            .second_of_pair()
            .reverse()
            .chromosome("chr5")
            .start(mate_start)
            .mate("chr1", start, false)
            .build(),
    ]
}

/// Four fragments sharing one junction read at chr1:1000. Their mates land in the first,
/// third and fifth chr1 partitions, so three of them span partitions.
#[must_use]
pub fn junction_scenario() -> Vec<AlignmentRecord> {
    [1_300, 25_000, 41_000, 1_400]
        .into_iter()
        .enumerate()
        .flat_map(|(i, mate)| clipped_pair(&format!("junction{i}"), 1_000, mate))
        .collect()
}

/// Three overlapping chr1:20100-20239 reads whose mates cluster at chr5:50100-50239.
#[must_use]
pub fn discordant_scenario() -> Vec<AlignmentRecord> {
    (0..3u32)
        .flat_map(|i| translocation_pair(&format!("discordant{i}"), 20_100 + i * 20, 50_100 + i * 20))
        .collect()
}
