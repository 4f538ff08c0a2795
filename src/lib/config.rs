//! Thresholds and settings that drive read classification and partition scanning.
//!
//! [`ReadFilterConfig`] holds every threshold the read classifier and the evidence
//! accumulators consult. [`ScanConfig`] wraps it together with the partitioning
//! and scheduling settings for a whole run.

use crate::errors::Result;
use crate::validation::{validate_min_max, validate_percentage, validate_positive};

/// Default partition (genome window) size in bases.
pub const DEFAULT_PARTITION_SIZE: u32 = 1_000_000;

/// Default upper bound on observed fragment length before the distribution pass runs.
pub const DEFAULT_MAX_FRAGMENT_LENGTH: u32 = 1_000;

/// Thresholds used to classify reads and accumulate junction evidence.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadFilterConfig {
    /// Minimum number of aligned (M/=/X) bases.
    pub min_alignment_bases: u32,
    /// Minimum mapping quality.
    pub min_map_quality: u8,
    /// Minimum difference between the insert size and the aligned length.
    pub min_insert_alignment_overlap: u32,
    /// Minimum soft-clip length for a junction read.
    pub min_soft_clip_length: u32,
    /// Minimum percentage of soft-clipped bases at or above `high_base_quality`.
    pub min_soft_clip_high_qual_perc: u32,
    /// Base quality considered "high".
    pub high_base_quality: u8,
    /// Maximum distance between a supporting read and the junction it supports.
    pub min_supporting_read_distance: u32,
    /// Minimum indel length treated as junction evidence.
    pub min_indel_length: u32,
    /// Minimum fragments for a junction to be retained.
    pub min_junction_frags: u32,
    /// Minimum fragments for a junction at a known hotspot.
    pub hotspot_min_junction_frags: u32,
    /// Upper bound of observed fragment lengths; longer pairs are discordant.
    pub observed_fragment_length_max: u32,
}

impl Default for ReadFilterConfig {
    fn default() -> Self {
        Self {
            min_alignment_bases: 50,
            min_map_quality: 20,
            min_insert_alignment_overlap: 5,
            min_soft_clip_length: 30,
            min_soft_clip_high_qual_perc: 75,
            high_base_quality: 26,
            min_supporting_read_distance: 50,
            min_indel_length: 32,
            min_junction_frags: 2,
            hotspot_min_junction_frags: 1,
            observed_fragment_length_max: DEFAULT_MAX_FRAGMENT_LENGTH,
        }
    }
}

impl ReadFilterConfig {
    /// Sets the upper fragment length bound observed by the distribution pass.
    pub fn set_max_fragment_length(&mut self, max: u32) {
        self.observed_fragment_length_max = max;
    }

    /// Validates the thresholds.
    ///
    /// # Errors
    ///
    /// Returns an error if a percentage is out of range, a threshold is zero, or the
    /// hotspot fragment threshold exceeds the general one.
    pub fn validate(&self) -> Result<()> {
        validate_percentage(self.min_soft_clip_high_qual_perc, "min-soft-clip-high-qual-perc")?;
        validate_positive(self.min_junction_frags, "min-junction-frags")?;
        validate_positive(self.hotspot_min_junction_frags, "hotspot-min-junction-frags")?;
        validate_positive(self.observed_fragment_length_max, "max-frag-length")?;
        validate_min_max(
            self.hotspot_min_junction_frags,
            self.min_junction_frags,
            "hotspot-min-junction-frags",
            "min-junction-frags",
        )
    }
}

/// Settings for a complete partitioned scan.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Read classification thresholds.
    pub filters: ReadFilterConfig,
    /// Size of each genome partition in bases.
    pub partition_size: u32,
    /// Number of worker threads.
    pub threads: usize,
    /// Whether to sample fragment lengths before scanning.
    pub estimate_fragment_lengths: bool,
    /// Maximum number of fragments sampled for the length distribution.
    pub fragment_length_sample_size: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            filters: ReadFilterConfig::default(),
            partition_size: DEFAULT_PARTITION_SIZE,
            threads: 1,
            estimate_fragment_lengths: true,
            fragment_length_sample_size: 10_000,
        }
    }
}

impl ScanConfig {
    /// Validates the scan settings and the nested filter thresholds.
    ///
    /// # Errors
    ///
    /// Returns an error if the partition size or thread count is zero, or if the filter
    /// thresholds are invalid.
    pub fn validate(&self) -> Result<()> {
        validate_positive(self.partition_size, "partition-size")?;
        validate_positive(self.threads, "threads")?;
        self.filters.validate()
    }
}
