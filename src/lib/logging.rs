//! Formatting helpers and run summaries for log output.

use std::time::{Duration, Instant};

use crate::stats::CombinedStats;

/// Formats a count with thousands separators.
///
/// ```
/// use svprep_lib::logging::format_count;
///
/// assert_eq!(format_count(1_234_567), "1,234,567");
/// assert_eq!(format_count(12), "12");
/// ```
#[must_use]
pub fn format_count(n: u64) -> String {
    let digits: Vec<char> = n.to_string().chars().collect();
    digits
        .rchunks(3)
        .rev()
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(",")
}

/// Formats a fraction as a percentage.
///
/// ```
/// use svprep_lib::logging::format_percent;
///
/// assert_eq!(format_percent(0.9543, 2), "95.43%");
/// ```
#[must_use]
pub fn format_percent(value: f64, decimals: usize) -> String {
    format!("{:.decimals$}%", value * 100.0, decimals = decimals)
}

/// Formats a duration as `45s`, `2m 15s` or `1h 30m`.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    match secs {
        0..60 => format!("{secs}s"),
        60..3600 => match (secs / 60, secs % 60) {
            (mins, 0) => format!("{mins}m"),
            (mins, rest) => format!("{mins}m {rest}s"),
        },
        _ => match (secs / 3600, (secs % 3600) / 60) {
            (hours, 0) => format!("{hours}h"),
            (hours, mins) => format!("{hours}h {mins}m"),
        },
    }
}

/// Formats a throughput in `unit`s per second, or per minute below one per second.
#[must_use]
pub fn format_rate(count: u64, duration: Duration, unit: &str) -> String {
    let secs = duration.as_secs_f64();
    if secs < 0.001 {
        return format!("{} {unit}/s", format_count(count));
    }
    let rate = count as f64 / secs;
    if rate >= 1.0 {
        format!("{} {unit}/s", format_count(rate as u64))
    } else {
        format!("{:.1} {unit}/min", rate * 60.0)
    }
}

fn fraction(part: u64, total: u64) -> f64 {
    if total == 0 { 0.0 } else { part as f64 / total as f64 }
}

/// Logs the counters of a finished scan.
pub fn log_scan_summary(stats: &CombinedStats) {
    let reads = &stats.reads;
    log::info!("Scan Summary:");
    let performance = &stats.performance;
    log::info!("  Partitions: {}", format_count(performance.partitions));
    if !performance.total_time.is_zero() {
        log::info!(
            "  Partition throughput: {} mean, {} reads/s slowest",
            format_rate(performance.reads, performance.total_time, "reads"),
            format_count(performance.min_partition_reads_per_second.unwrap_or(0.0) as u64)
        );
    }
    log::info!(
        "  Records: {} ({} skipped)",
        format_count(reads.total_records),
        format_count(reads.skipped_records)
    );
    log::info!("  Reads classified: {}", format_count(reads.reads));

    let filtered = reads.read_type_counts[0];
    if reads.reads > 0 {
        log::info!(
            "  Reads without support: {} ({})",
            format_count(filtered),
            format_percent(fraction(filtered, reads.reads), 2)
        );
    }

    let summary = reads.filter_summary();
    if !summary.is_empty() {
        log::info!("  Top filters:");
        for (name, count) in summary.iter().take(5) {
            log::info!("    {name}: {}", format_count(*count));
        }
    }

    log::info!(
        "  Fragments: {} local complete, {} resolved locally, {} spanning, {} completed across partitions",
        format_count(reads.local_complete_fragments),
        format_count(reads.locally_resolved_fragments),
        format_count(reads.spanning_fragments),
        format_count(reads.spanning_completed_fragments)
    );
    log::info!(
        "  Junctions: {} retained of {} candidates, {} discordant groups",
        format_count(reads.junctions),
        format_count(reads.candidate_junctions),
        format_count(reads.discordant_groups)
    );

    let discordant = &stats.discordant;
    if discordant.total_reads > 0 {
        log::info!(
            "  Discordant reads: {} ({} translocations, {} short inversions, {} other)",
            format_count(discordant.total_reads),
            format_count(discordant.translocations),
            format_count(discordant.short_inversions),
            format_count(discordant.other)
        );
    }

    let perf = &stats.performance;
    if perf.partitions > 0 {
        log::info!(
            "  Partition time: mean {:.2?}, max {:.2?}",
            perf.mean_partition_time(),
            perf.max_partition_time
        );
    }
}

/// Times an operation and logs its start and completion.
///
/// ```no_run
/// use svprep_lib::logging::OperationTimer;
///
/// let timer = OperationTimer::new("Scanning partitions");
/// timer.log_completion(10_000, "reads");
/// ```
pub struct OperationTimer {
    operation: String,
    start_time: Instant,
}

impl OperationTimer {
    #[must_use]
    pub fn new(operation: &str) -> Self {
        log::info!("{operation} ...");
        Self { operation: operation.to_string(), start_time: Instant::now() }
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Logs the completion with a count and rate.
    pub fn log_completion(&self, count: u64, unit: &str) {
        let duration = self.elapsed();
        log::info!(
            "{} completed: {} {unit} in {} ({})",
            self.operation,
            format_count(count),
            format_duration(duration),
            format_rate(count, duration, unit)
        );
    }
}
