//! The `scan` command: partitioned junction and discordant-pair evidence from a BAM.

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use svprep_lib::bam_io::{
    IndexedBamSource, IndexedBamSourceFactory, bai_path, index_bam, read_bam_header,
    reference_sequences,
};
use svprep_lib::config::ScanConfig;
use svprep_lib::fragment_length::apply_fragment_length_bounds;
use svprep_lib::hotspot::HotspotCache;
use svprep_lib::logging::{OperationTimer, log_scan_summary};
use svprep_lib::metrics::{JunctionRecord, Metric, write_metrics_auto};
use svprep_lib::partition::split_genome;
use svprep_lib::scheduler::{PartitionScheduler, ScanResults};
use svprep_lib::spanning_cache::SpanningCache;

use crate::commands::command::Command;
use crate::commands::common::{ReadFilterOptions, ScanIoOptions, ThreadingOptions};

/// Scans a BAM file for structural-variant evidence.
#[derive(Debug, Parser)]
#[command(
    name = "scan",
    about = "\x1b[38;5;173m[SCAN]\x1b[0m          \x1b[36mCollect junction and discordant-pair evidence\x1b[0m",
    long_about = r#"
Scans a coordinate-sorted BAM file in genome partitions and reports candidate
structural-variant junctions.

Soft-clipped, split and long-indel reads define junctions. Nearby reads are
attributed to them as exact or candidate support, and discordant read pairs
are clustered into groups that can back a junction of their own. Pairs whose
reads fall in different partitions are reconciled so each fragment is counted
once.

# Outputs

- Junction TSV (--output): one row per retained junction
- Discordant stats (--discordant-stats): discordant read counts by class
- Summary (--summary): run counters
- Fragment lengths (--fragment-lengths): the sampled length histogram
"#
)]
pub struct Scan {
    #[command(flatten)]
    pub io: ScanIoOptions,

    #[command(flatten)]
    pub filters: ReadFilterOptions,

    #[command(flatten)]
    pub threading: ThreadingOptions,

    /// Skip sampling fragment lengths and use --max-frag-length as the upper bound
    #[arg(long = "skip-fragment-lengths", default_value_t = false)]
    pub skip_fragment_lengths: bool,

    /// Maximum fragments sampled for the fragment-length distribution
    #[arg(long = "fragment-length-sample-size", default_value_t = 10_000)]
    pub fragment_length_sample_size: usize,
}

impl Scan {
    fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            filters: (&self.filters).into(),
            partition_size: self.threading.partition_size,
            threads: self.threading.threads,
            estimate_fragment_lengths: !self.skip_fragment_lengths,
            fragment_length_sample_size: self.fragment_length_sample_size,
        }
    }

    /// Writes optional outputs. Failures are logged and do not fail the run.
    fn write_optional<T: Metric>(path: Option<&std::path::Path>, rows: &[T]) {
        if let Some(path) = path {
            if let Err(e) = write_metrics_auto(path, rows) {
                warn!("{e:#}");
            }
        }
    }

    fn write_outputs(&self, results: &ScanResults) -> Result<()> {
        let junctions: Vec<JunctionRecord> = results.junctions().map(JunctionRecord::from).collect();
        write_metrics_auto(&self.io.output, &junctions)?;
        info!("Wrote {} junctions to {}", junctions.len(), self.io.output.display());

        Self::write_optional(self.io.discordant_stats.as_deref(), &[results.stats.discordant]);
        Self::write_optional(self.io.summary.as_deref(), &results.stats.summary_rows());
        Ok(())
    }
}

impl Command for Scan {
    fn execute(&self, _command_line: &str) -> Result<()> {
        self.io.validate()?;
        self.threading.validate()?;
        let mut config = self.scan_config();
        config.validate()?;

        let timer = OperationTimer::new("Scanning for structural-variant evidence");
        info!("Input: {}", self.io.input.display());
        info!("Output: {}", self.io.output.display());
        info!("{}", self.threading.log_message());

        if !bai_path(&self.io.input).exists() {
            info!("No index found, indexing {}", self.io.input.display());
            index_bam(&self.io.input)?;
        }

        let header = read_bam_header(&self.io.input)?;
        let tasks = split_genome(&reference_sequences(&header), config.partition_size, &self.io.regions)?;

        let hotspots = match &self.io.hotspots {
            Some(path) => HotspotCache::from_path(path)?,
            None => HotspotCache::default(),
        };

        if config.estimate_fragment_lengths {
            let mut source = IndexedBamSource::open(&self.io.input)?;
            let distribution = apply_fragment_length_bounds(
                &mut source,
                &tasks,
                &mut config.filters,
                config.fragment_length_sample_size,
            )
            .context("Failed to sample fragment lengths")?;
            Self::write_optional(self.io.fragment_lengths.as_deref(), &distribution.metrics());
        }

        let cache = SpanningCache::new(config.partition_size);
        let factory = IndexedBamSourceFactory::new(&self.io.input);
        let results = PartitionScheduler::new(config).run(tasks, &factory, &hotspots, &cache)?;

        self.write_outputs(&results)?;
        log_scan_summary(&results.stats);
        timer.log_completion(results.stats.reads.reads, "reads");
        Ok(())
    }
}
