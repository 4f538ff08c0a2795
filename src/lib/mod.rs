#![deny(unsafe_code)]
// Clippy lint configuration for CI
// - cast_*: genomic coordinates move between u32, usize and i32 throughout
// - missing_*_doc: documentation improvements tracked separately
// - struct_excessive_bools: filter and junction flags are plain bools
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::needless_pass_by_value,
    clippy::items_after_statements,
    clippy::unused_self,
    clippy::match_same_arms,
    clippy::too_many_lines,
    clippy::redundant_closure_for_method_calls,
    clippy::struct_excessive_bools,
    clippy::map_unwrap_or,
    clippy::uninlined_format_args
)]

//! # svprep - structural-variant evidence scanning
//!
//! Scans a coordinate-sorted, indexed BAM file in parallel genome partitions and collects
//! the evidence a structural-variant caller needs: soft-clipped and split reads that
//! define candidate junctions, the reads supporting them, and clusters of discordant
//! read pairs. Fragments whose reads fall in different partitions are reconciled through
//! a shared cache so each is reported exactly once.
//!
//! ## Modules
//!
//! ### Scanning
//!
//! - **[`classifier`]** - Read filters and initial read types
//! - **[`fragment`]** - Reads grouped by name and their completeness
//! - **[`junction`]** - Junction evidence per partition
//! - **[`discordant`]** - Discordant read-pair clustering
//! - **[`spanning_cache`]** - Cross-partition fragment reconciliation
//! - **[`scanner`]** - The scan of one partition
//! - **[`scheduler`]** - The worker pool running all partitions
//!
//! ### Inputs and configuration
//!
//! - **[`bam_io`]** - Alignment sources (indexed BAM, in-memory)
//! - **[`sam`]** - Record conversion and CIGAR helpers
//! - **[`partition`]** - Genome regions and partition tasks
//! - **[`config`]** - Thresholds and run settings
//! - **[`hotspot`]** - Known breakends
//! - **[`fragment_length`]** - Observed fragment-length bounds
//!
//! ### Reporting
//!
//! - **[`stats`]** - Per-partition and run-wide counters
//! - **[`metrics`]** - Output rows and TSV writing
//! - **[`logging`]** / **[`progress`]** - Log formatting and progress messages
//!
//! ## Quick Start
//!
//! ```no_run
//! use svprep_lib::bam_io::{IndexedBamSourceFactory, read_bam_header, reference_sequences};
//! use svprep_lib::config::ScanConfig;
//! use svprep_lib::hotspot::HotspotCache;
//! use svprep_lib::partition::split_genome;
//! use svprep_lib::scheduler::PartitionScheduler;
//! use svprep_lib::spanning_cache::SpanningCache;
//!
//! # fn main() -> anyhow::Result<()> {
//! let header = read_bam_header("sample.bam")?;
//! let config = ScanConfig { threads: 8, ..Default::default() };
//! let tasks = split_genome(&reference_sequences(&header), config.partition_size, &[])?;
//!
//! let cache = SpanningCache::new(config.partition_size);
//! let factory = IndexedBamSourceFactory::new("sample.bam");
//! let results =
//!     PartitionScheduler::new(config).run(tasks, &factory, &HotspotCache::default(), &cache)?;
//! println!("{} junctions", results.junctions().count());
//! # Ok(())
//! # }
//! ```

pub mod bam_io;
pub mod classifier;
pub mod config;
pub mod discordant;
pub mod errors;
pub mod fragment;
pub mod fragment_length;
pub mod hotspot;
pub mod junction;
pub mod logging;
pub mod metrics;
pub mod partition;
pub mod progress;
pub mod read;
pub mod remote;
pub mod sam;
pub mod scanner;
pub mod scheduler;
pub mod spanning_cache;
pub mod stats;
pub mod validation;
