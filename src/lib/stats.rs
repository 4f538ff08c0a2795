//! Scan counters.
//!
//! Each partition scan fills its own [`PartitionStats`]; workers fold them into the shared
//! [`StatsAggregator`] once per partition.

use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::discordant::DiscordantStats;
use crate::read::{FILTER_NAMES, Read, ReadType};

/// Counters for one partition (or, after merging, for a whole run).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionStats {
    /// Records returned by the alignment source for the partition.
    pub total_records: u64,
    /// Secondary, duplicate, QC-fail or unmapped records.
    pub skipped_records: u64,
    /// Records starting in an earlier partition.
    pub outside_partition_records: u64,
    /// Records classified.
    pub reads: u64,
    /// Reads per filter, in [`FILTER_NAMES`] order.
    pub filter_counts: [u64; FILTER_NAMES.len()],
    /// Reads per final read type: no support, candidate, support, exact, junction.
    pub read_type_counts: [u64; 5],
    /// Fragments with at least one read in the partition.
    pub fragments: u64,
    /// Fragments completed within the partition.
    pub local_complete_fragments: u64,
    /// Fragments resolved within the partition without every read, as no read is expected
    /// from another partition.
    pub locally_resolved_fragments: u64,
    /// Fragments handed to the spanning cache.
    pub spanning_fragments: u64,
    /// Fragments completed by merging with cached reads.
    pub spanning_completed_fragments: u64,
    /// Fragments dropped because no read carried evidence.
    pub uninteresting_fragments: u64,
    /// Junctions created before filtering.
    pub candidate_junctions: u64,
    /// Junctions retained.
    pub junctions: u64,
    /// Discordant groups formed.
    pub discordant_groups: u64,
}

impl PartitionStats {
    /// Counts a classified read's filters.
    pub fn record_filters(&mut self, read: &Read) {
        self.reads += 1;
        for (count, set) in self.filter_counts.iter_mut().zip(read.filters.as_array()) {
            if set {
                *count += 1;
            }
        }
    }

    /// Counts a read's final type.
    pub fn record_read_type(&mut self, read_type: ReadType) {
        self.read_type_counts[read_type.priority() as usize] += 1;
    }

    pub fn merge(&mut self, other: &PartitionStats) {
        self.total_records += other.total_records;
        self.skipped_records += other.skipped_records;
        self.outside_partition_records += other.outside_partition_records;
        self.reads += other.reads;
        for (a, b) in self.filter_counts.iter_mut().zip(other.filter_counts) {
            *a += b;
        }
        for (a, b) in self.read_type_counts.iter_mut().zip(other.read_type_counts) {
            *a += b;
        }
        self.fragments += other.fragments;
        self.local_complete_fragments += other.local_complete_fragments;
        self.locally_resolved_fragments += other.locally_resolved_fragments;
        self.spanning_fragments += other.spanning_fragments;
        self.spanning_completed_fragments += other.spanning_completed_fragments;
        self.uninteresting_fragments += other.uninteresting_fragments;
        self.candidate_junctions += other.candidate_junctions;
        self.junctions += other.junctions;
        self.discordant_groups += other.discordant_groups;
    }

    /// Filter names with their counts, highest first.
    #[must_use]
    pub fn filter_summary(&self) -> Vec<(&'static str, u64)> {
        let mut summary: Vec<_> =
            FILTER_NAMES.iter().copied().zip(self.filter_counts).filter(|(_, n)| *n > 0).collect();
        summary.sort_by(|a, b| b.1.cmp(&a.1));
        summary
    }
}

/// Timing counters.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PerformanceCounters {
    pub partitions: u64,
    /// Reads classified across the timed partitions.
    pub reads: u64,
    pub total_time: Duration,
    pub max_partition_time: Duration,
    /// Slowest single-partition throughput, in reads per second.
    pub min_partition_reads_per_second: Option<f64>,
}

/// Reads per second, or zero when no time elapsed.
fn rate(reads: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 { reads as f64 / secs } else { 0.0 }
}

impl PerformanceCounters {
    pub fn record_partition(&mut self, elapsed: Duration, reads: u64) {
        self.partitions += 1;
        self.reads += reads;
        self.total_time += elapsed;
        self.max_partition_time = self.max_partition_time.max(elapsed);
        if !elapsed.is_zero() {
            let partition_rate = rate(reads, elapsed);
            self.min_partition_reads_per_second =
                Some(self.min_partition_reads_per_second.map_or(partition_rate, |r| r.min(partition_rate)));
        }
    }

    pub fn merge(&mut self, other: &PerformanceCounters) {
        self.partitions += other.partitions;
        self.reads += other.reads;
        self.total_time += other.total_time;
        self.max_partition_time = self.max_partition_time.max(other.max_partition_time);
        self.min_partition_reads_per_second =
            match (self.min_partition_reads_per_second, other.min_partition_reads_per_second) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };
    }

    /// Mean per-partition throughput: reads over summed partition time.
    #[must_use]
    pub fn reads_per_second(&self) -> f64 {
        rate(self.reads, self.total_time)
    }

    /// Mean time per partition.
    #[must_use]
    pub fn mean_partition_time(&self) -> Duration {
        if self.partitions == 0 {
            Duration::ZERO
        } else {
            self.total_time / self.partitions as u32
        }
    }
}

/// Run-wide counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombinedStats {
    pub reads: PartitionStats,
    pub discordant: DiscordantStats,
    pub performance: PerformanceCounters,
}

/// One row of the run summary TSV.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummaryMetric {
    pub key: String,
    pub value: u64,
}

impl CombinedStats {
    /// Flattens the counters into key/value rows.
    #[must_use]
    pub fn summary_rows(&self) -> Vec<ScanSummaryMetric> {
        let r = &self.reads;
        let mut rows: Vec<(String, u64)> = vec![
            ("partitions".to_string(), self.performance.partitions),
            ("total_records".to_string(), r.total_records),
            ("skipped_records".to_string(), r.skipped_records),
            ("reads".to_string(), r.reads),
            ("fragments".to_string(), r.fragments),
            ("local_complete_fragments".to_string(), r.local_complete_fragments),
            ("locally_resolved_fragments".to_string(), r.locally_resolved_fragments),
            ("spanning_fragments".to_string(), r.spanning_fragments),
            ("spanning_completed_fragments".to_string(), r.spanning_completed_fragments),
            ("uninteresting_fragments".to_string(), r.uninteresting_fragments),
            ("candidate_junctions".to_string(), r.candidate_junctions),
            ("junctions".to_string(), r.junctions),
            ("discordant_groups".to_string(), r.discordant_groups),
            ("discordant_reads".to_string(), self.discordant.total_reads),
        ];
        for (name, count) in FILTER_NAMES.iter().zip(r.filter_counts) {
            rows.push((format!("filter_{}", name.to_ascii_lowercase()), count));
        }
        rows.into_iter().map(|(key, value)| ScanSummaryMetric { key, value }).collect()
    }
}

/// Mutex-guarded run-wide counters, merged into once per partition.
#[derive(Debug, Default)]
pub struct StatsAggregator {
    inner: Mutex<CombinedStats>,
}

impl StatsAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one partition's counters into the totals.
    pub fn merge(&self, stats: &PartitionStats, discordant: &DiscordantStats, elapsed: Duration) {
        let mut inner = self.inner.lock();
        inner.reads.merge(stats);
        inner.discordant.merge(discordant);
        inner.performance.record_partition(elapsed, stats.reads);
    }

    /// Folds counters gathered outside a partition scan, such as at finalization.
    pub fn merge_reads(&self, stats: &PartitionStats) {
        self.inner.lock().reads.merge(stats);
    }

    #[must_use]
    pub fn into_inner(self) -> CombinedStats {
        self.inner.into_inner()
    }
}
