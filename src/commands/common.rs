//! CLI option groups shared by commands.
//!
//! Each group is composed into a command struct with `#[command(flatten)]` and converts
//! into the library configuration it drives.

use std::path::PathBuf;

use clap::Args;

use svprep_lib::config::{DEFAULT_MAX_FRAGMENT_LENGTH, DEFAULT_PARTITION_SIZE, ReadFilterConfig};
use svprep_lib::partition::GenomeRegion;
use svprep_lib::validation::{validate_file_exists, validate_output_dir, validate_positive};

/// Input BAM and output TSV paths for a scan.
#[derive(Debug, Clone, Args)]
pub struct ScanIoOptions {
    /// Coordinate-sorted input BAM file. A missing `.bai` index is built.
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,

    /// Output TSV of retained junctions
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,

    /// Optional output TSV of discordant read counts
    #[arg(short = 'd', long = "discordant-stats")]
    pub discordant_stats: Option<PathBuf>,

    /// Optional output TSV of run counters
    #[arg(short = 's', long = "summary")]
    pub summary: Option<PathBuf>,

    /// Optional output TSV of the sampled fragment-length histogram
    #[arg(long = "fragment-lengths")]
    pub fragment_lengths: Option<PathBuf>,

    /// Optional TSV of known breakends (chromosome, position, orientation)
    #[arg(short = 'H', long = "hotspots")]
    pub hotspots: Option<PathBuf>,

    /// Restrict the scan to these regions (`chr` or `chr:start-end`)
    #[arg(short = 'r', long = "region")]
    pub regions: Vec<GenomeRegion>,
}

impl ScanIoOptions {
    /// Validates that inputs exist and output directories are present.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first missing input or output directory.
    pub fn validate(&self) -> anyhow::Result<()> {
        validate_file_exists(&self.input, "Input BAM")?;
        if let Some(hotspots) = &self.hotspots {
            validate_file_exists(hotspots, "Hotspots")?;
        }
        validate_output_dir(&self.output, "Junctions")?;
        for (path, description) in [
            (&self.discordant_stats, "Discordant stats"),
            (&self.summary, "Summary"),
            (&self.fragment_lengths, "Fragment lengths"),
        ] {
            if let Some(path) = path {
                validate_output_dir(path, description)?;
            }
        }
        Ok(())
    }
}

/// Read classification thresholds.
#[derive(Debug, Clone, Args)]
pub struct ReadFilterOptions {
    /// Minimum aligned (M/=/X) bases
    #[arg(long = "min-align-bases", default_value_t = 50)]
    pub min_alignment_bases: u32,

    /// Minimum mapping quality
    #[arg(short = 'q', long = "min-map-qual", default_value_t = 20)]
    pub min_map_quality: u8,

    /// Minimum difference between insert size and aligned bases
    #[arg(long = "min-insert-overlap", default_value_t = 5)]
    pub min_insert_alignment_overlap: u32,

    /// Minimum soft clip length for a junction read
    #[arg(long = "min-soft-clip-length", default_value_t = 30)]
    pub min_soft_clip_length: u32,

    /// Minimum percentage of high-quality bases in the soft clip
    #[arg(long = "min-soft-clip-high-qual-perc", default_value_t = 75)]
    pub min_soft_clip_high_qual_perc: u32,

    /// Base quality counted as high
    #[arg(long = "high-base-qual", default_value_t = 26)]
    pub high_base_quality: u8,

    /// Maximum distance from a junction for a supporting read
    #[arg(long = "min-supporting-read-distance", default_value_t = 50)]
    pub min_supporting_read_distance: u32,

    /// Minimum indel length that defines internal junctions
    #[arg(long = "min-indel-length", default_value_t = 32)]
    pub min_indel_length: u32,

    /// Minimum junction fragments to keep a junction
    #[arg(long = "min-junction-frags", default_value_t = 2)]
    pub min_junction_frags: u32,

    /// Minimum junction fragments to keep a junction near a hotspot
    #[arg(long = "hotspot-min-junction-frags", default_value_t = 1)]
    pub hotspot_min_junction_frags: u32,

    /// Upper fragment length bound used when the distribution is not sampled
    #[arg(long = "max-frag-length", default_value_t = DEFAULT_MAX_FRAGMENT_LENGTH)]
    pub max_fragment_length: u32,
}

impl From<&ReadFilterOptions> for ReadFilterConfig {
    fn from(options: &ReadFilterOptions) -> Self {
        Self {
            min_alignment_bases: options.min_alignment_bases,
            min_map_quality: options.min_map_quality,
            min_insert_alignment_overlap: options.min_insert_alignment_overlap,
            min_soft_clip_length: options.min_soft_clip_length,
            min_soft_clip_high_qual_perc: options.min_soft_clip_high_qual_perc,
            high_base_quality: options.high_base_quality,
            min_supporting_read_distance: options.min_supporting_read_distance,
            min_indel_length: options.min_indel_length,
            min_junction_frags: options.min_junction_frags,
            hotspot_min_junction_frags: options.hotspot_min_junction_frags,
            observed_fragment_length_max: options.max_fragment_length,
        }
    }
}

/// Partitioning and worker settings.
#[derive(Debug, Clone, Args)]
pub struct ThreadingOptions {
    /// Number of worker threads scanning partitions
    #[arg(short = 't', long = "threads", default_value_t = 1)]
    pub threads: usize,

    /// Partition size in bases
    #[arg(long = "partition-size", default_value_t = DEFAULT_PARTITION_SIZE)]
    pub partition_size: u32,
}

impl ThreadingOptions {
    /// Validates that both settings are positive.
    ///
    /// # Errors
    ///
    /// Returns an error if either value is zero.
    pub fn validate(&self) -> anyhow::Result<()> {
        validate_positive(self.threads, "threads")?;
        validate_positive(self.partition_size, "partition-size")?;
        Ok(())
    }

    #[must_use]
    pub fn log_message(&self) -> String {
        format!("Using {} threads, partition size {}", self.threads, self.partition_size)
    }
}
