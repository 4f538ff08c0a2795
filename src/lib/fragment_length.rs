//! Observed fragment-length bounds.
//!
//! Before scheduling, proper pairs from the first partitions are sampled into a length
//! histogram. Both percentile bounds are reported, and the upper one becomes the length
//! above which pairs are called discordant or chimeric.

use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::bam_io::AlignmentSource;
use crate::config::ReadFilterConfig;
use crate::partition::PartitionTask;
use crate::sam::record::AlignmentRecord;
use crate::sam::record_utils::CigarSummary;

/// Percentile taken as the lower bound.
pub const LOWER_PERCENTILE: f64 = 0.005;

/// Percentile taken as the upper bound.
pub const UPPER_PERCENTILE: f64 = 0.995;

/// Fewer sampled fragments than this keep the configured bounds.
pub const MIN_SAMPLED_FRAGMENTS: u64 = 100;

/// One histogram row of the fragment-length TSV.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentLengthMetric {
    pub length: u32,
    pub count: u64,
}

/// Histogram of sampled fragment lengths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentLengthDistribution {
    counts: BTreeMap<u32, u64>,
    total: u64,
}

impl FragmentLengthDistribution {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, length: u32) {
        *self.counts.entry(length).or_default() += 1;
        self.total += 1;
    }

    /// Number of sampled fragments.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// The smallest length whose cumulative fraction reaches `fraction`.
    #[must_use]
    pub fn percentile(&self, fraction: f64) -> Option<u32> {
        if self.total == 0 {
            return None;
        }
        let target = ((self.total as f64) * fraction.clamp(0.0, 1.0) - 1e-9).ceil().max(1.0) as u64;
        let mut seen = 0;
        for (&length, &count) in &self.counts {
            seen += count;
            if seen >= target {
                return Some(length);
            }
        }
        self.counts.keys().next_back().copied()
    }

    /// The observed `(min, max)` bounds, or `None` with too few samples.
    #[must_use]
    pub fn bounds(&self) -> Option<(u32, u32)> {
        if self.total < MIN_SAMPLED_FRAGMENTS {
            return None;
        }
        Some((self.percentile(LOWER_PERCENTILE)?, self.percentile(UPPER_PERCENTILE)?))
    }

    /// Histogram rows in length order.
    #[must_use]
    pub fn metrics(&self) -> Vec<FragmentLengthMetric> {
        self.counts.iter().map(|(&length, &count)| FragmentLengthMetric { length, count }).collect()
    }
}

/// Length of the fragment a record belongs to, if the record is a usable sample: a
/// filter-passing, unclipped, primary first-of-pair read of a proper pair.
fn sampled_length(record: &AlignmentRecord, config: &ReadFilterConfig) -> Option<u32> {
    let flags = record.flags;
    if record.is_skippable()
        || flags.is_supplementary()
        || !flags.is_segmented()
        || !flags.is_properly_segmented()
        || !flags.is_first_segment()
        || flags.is_mate_unmapped()
        || record.mapping_quality < config.min_map_quality
        || record.mate_chromosome.as_deref() != Some(record.chromosome.as_str())
        || record.insert_size == 0
    {
        return None;
    }
    let summary = CigarSummary::from_ops(&record.cigar, record.alignment_start);
    if summary.aligned_bases < config.min_alignment_bases
        || summary.left_soft_clip > 0
        || summary.right_soft_clip > 0
    {
        return None;
    }
    Some(record.insert_size.unsigned_abs())
}

/// Samples up to `sample_size` fragments from the tasks in order, reading only records
/// that start in each task's region.
pub fn sample_fragment_lengths<S: AlignmentSource>(
    source: &mut S,
    tasks: &[PartitionTask],
    config: &ReadFilterConfig,
    sample_size: usize,
) -> Result<FragmentLengthDistribution> {
    let mut distribution = FragmentLengthDistribution::new();
    for task in tasks {
        if distribution.total() >= sample_size as u64 {
            break;
        }
        for record in source.records(&task.region)? {
            if !task.region.contains(&record.chromosome, record.alignment_start) {
                continue;
            }
            if let Some(length) = sampled_length(&record, config) {
                distribution.add(length);
                if distribution.total() >= sample_size as u64 {
                    break;
                }
            }
        }
    }
    Ok(distribution)
}

/// Samples fragment lengths and applies the observed upper bound to `config`. Keeps the
/// configured bound when too few fragments were sampled.
pub fn apply_fragment_length_bounds<S: AlignmentSource>(
    source: &mut S,
    tasks: &[PartitionTask],
    config: &mut ReadFilterConfig,
    sample_size: usize,
) -> Result<FragmentLengthDistribution> {
    let distribution = sample_fragment_lengths(source, tasks, config, sample_size)?;
    match distribution.bounds() {
        Some((min, max)) => {
            log::info!(
                "Observed fragment lengths {min}-{max} from {} sampled fragments",
                distribution.total()
            );
            config.set_max_fragment_length(max);
        }
        None => log::warn!(
            "Only {} fragments sampled, keeping maximum fragment length {}",
            distribution.total(),
            config.observed_fragment_length_max
        ),
    }
    Ok(distribution)
}
