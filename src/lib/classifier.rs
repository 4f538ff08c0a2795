//! Read classification.
//!
//! [`ReadClassifier`] evaluates every filter predicate for a read, applies the soft-clip
//! exceptions in a fixed order and assigns the read's initial [`ReadType`]. Every
//! predicate is computed up front so the outcome never depends on evaluation order.

use crate::config::ReadFilterConfig;
use crate::read::{Read, ReadFilters, ReadType};

/// Run of G or C bases in a soft clip that marks it as a sequencing artefact.
pub const POLY_G_LENGTH: usize = 16;

/// Aligned bases next to the clip point checked for a tandem repeat.
pub const REPEAT_BREAK_CHECK_LENGTH: usize = 16;

/// Longest tandem repeat period treated as a repeat break.
pub const REPEAT_BREAK_MAX_PERIOD: usize = 3;

/// Reads at or above this mapping quality with long clips skip the repeat check.
pub const REPEAT_BREAK_MIN_MAP_QUAL: u8 = 50;

/// Reads with clips at least this long skip the repeat check when well mapped.
pub const REPEAT_BREAK_MIN_SOFT_CLIP: u32 = 50;

/// Clipped bases nearest the clip point checked for a poly-A/T mobile element tail.
pub const LINE_POLY_AT_TEST_LENGTH: usize = 16;

/// Non-A (or non-T) bases tolerated in a poly-A/T tail.
pub const LINE_POLY_AT_MAX_MISMATCHES: usize = 1;

/// Minimum soft clip for the mobile-element exception.
pub const MIN_LINE_SOFT_CLIP_LENGTH: u32 = 20;

/// Raw predicate results before exceptions are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Predicates {
    filters: ReadFilters,
    repeat_break: bool,
    line_motif: bool,
}

/// Classifies reads against a fixed set of thresholds.
#[derive(Debug, Clone)]
pub struct ReadClassifier {
    config: ReadFilterConfig,
}

impl ReadClassifier {
    #[must_use]
    pub fn new(config: ReadFilterConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ReadFilterConfig {
        &self.config
    }

    /// Sets the read's filters and initial read type.
    pub fn classify(&self, read: &mut Read) {
        read.filters = self.compute_filters(read);
        read.read_type = self.initial_read_type(read, &read.filters);
    }

    /// Computes the filter flags for a read. Pure: the read is not modified.
    #[must_use]
    pub fn compute_filters(&self, read: &Read) -> ReadFilters {
        let Predicates { mut filters, repeat_break, line_motif } = self.evaluate_predicates(read);

        // Exception 1: poly-G/C clips are a hard reject; nothing below may clear it.

        // Exception 2: clip length passed, so a poorly anchored clip inside a repeat is flagged.
        if !filters.soft_clip_length
            && (read.mapping_quality < REPEAT_BREAK_MIN_MAP_QUAL
                || read.max_soft_clip() < REPEAT_BREAK_MIN_SOFT_CLIP)
            && repeat_break
        {
            filters.break_in_repeat = true;
        }

        // Exception 3: a shorter clip is still accepted when it looks like a mobile element tail.
        if filters.soft_clip_length
            && read.max_soft_clip() >= MIN_LINE_SOFT_CLIP_LENGTH
            && line_motif
            && !repeat_break
        {
            filters.soft_clip_length = false;
        }

        filters
    }

    /// Evaluates every raw predicate without short-circuiting.
    fn evaluate_predicates(&self, read: &Read) -> Predicates {
        let config = &self.config;
        let mut filters = ReadFilters {
            min_align_match: read.aligned_bases < config.min_alignment_bases,
            min_map_qual: read.mapping_quality < config.min_map_quality,
            ..Default::default()
        };

        if read.is_paired() && !read.is_mate_unmapped() && !read.is_translocation() {
            let overlap = read.insert_size.unsigned_abs().abs_diff(read.aligned_bases);
            filters.insert_map_overlap = overlap < config.min_insert_alignment_overlap;
        }

        filters.soft_clip_length = read.max_soft_clip() < config.min_soft_clip_length
            && read.max_indel < config.min_indel_length;

        let clip = clip_side(read);
        if let Some(side) = clip {
            let high_quality = read.soft_clip_high_quality_bases(side.left, config.high_base_quality);
            filters.soft_clip_base_quality =
                high_quality * 100 < config.min_soft_clip_high_qual_perc * side.length as u32;
        }

        let clipped = clip.map(|side| clipped_bases(read, side)).unwrap_or_default();
        let inner = clip.map(|side| anchored_bases(read, side)).unwrap_or_default();

        filters.poly_g_soft_clip = has_poly_g_or_c(clipped);

        Predicates {
            filters,
            repeat_break: is_tandem_repeat(inner),
            line_motif: clip.is_some_and(|side| is_line_motif(clipped, side.left)),
        }
    }

    /// Initial read type from the filters.
    #[must_use]
    pub fn initial_read_type(&self, read: &Read, filters: &ReadFilters) -> ReadType {
        if filters.poly_g_soft_clip {
            ReadType::NoSupport
        } else if filters.is_clear() {
            ReadType::Junction
        } else if self.is_candidate_support(read, filters) {
            ReadType::CandidateSupport
        } else {
            ReadType::NoSupport
        }
    }

    /// True if the read may support a junction found elsewhere in its partition.
    #[must_use]
    pub fn is_candidate_support(&self, read: &Read, filters: &ReadFilters) -> bool {
        if filters.poly_g_soft_clip {
            return false;
        }
        self.is_chimeric(read) || read.has_clipping() || read.max_indel >= self.config.min_indel_length
    }

    /// True if the pair is discordant, has an unmapped mate, or the read is split.
    #[must_use]
    pub fn is_chimeric(&self, read: &Read) -> bool {
        if !read.is_paired() {
            return false;
        }
        read.is_mate_unmapped()
            || read.is_translocation()
            || read.insert_size.unsigned_abs() > self.config.observed_fragment_length_max
            || read.is_same_strand_pair()
            || !read.supplementaries.is_empty()
    }

    /// True if the pair's ends are further apart than expected, on different
    /// chromosomes, or on the same strand.
    #[must_use]
    pub fn is_discordant(&self, read: &Read) -> bool {
        read.is_paired()
            && !read.is_mate_unmapped()
            && (read.is_translocation()
                || read.insert_size.unsigned_abs() > self.config.observed_fragment_length_max
                || read.is_same_strand_pair())
    }
}

#[derive(Debug, Clone, Copy)]
struct ClipSide {
    left: bool,
    length: usize,
}

/// The longer soft clip; the right side wins ties.
fn clip_side(read: &Read) -> Option<ClipSide> {
    if read.max_soft_clip() == 0 {
        None
    } else if read.is_left_clipped() {
        Some(ClipSide { left: true, length: read.left_soft_clip as usize })
    } else {
        Some(ClipSide { left: false, length: read.right_soft_clip as usize })
    }
}

fn clipped_bases(read: &Read, side: ClipSide) -> &[u8] {
    let seq = &read.sequence;
    let range = if side.left { 0..side.length } else { seq.len().saturating_sub(side.length)..seq.len() };
    seq.get(range).unwrap_or_default()
}

/// Aligned bases immediately inside the clip point.
fn anchored_bases(read: &Read, side: ClipSide) -> &[u8] {
    let seq = &read.sequence;
    let range = if side.left {
        side.length..side.length + REPEAT_BREAK_CHECK_LENGTH
    } else {
        let clip_start = seq.len().saturating_sub(side.length);
        clip_start.saturating_sub(REPEAT_BREAK_CHECK_LENGTH)..clip_start
    };
    seq.get(range).unwrap_or_default()
}

fn has_poly_g_or_c(bases: &[u8]) -> bool {
    [b'G', b'C'].iter().any(|&target| {
        let mut run = 0;
        bases.iter().any(|&b| {
            run = if b.eq_ignore_ascii_case(&target) { run + 1 } else { 0 };
            run >= POLY_G_LENGTH
        })
    })
}

/// True if the bases are a full-length tandem repeat of period 1 to 3.
fn is_tandem_repeat(bases: &[u8]) -> bool {
    if bases.len() < REPEAT_BREAK_CHECK_LENGTH {
        return false;
    }
    (1..=REPEAT_BREAK_MAX_PERIOD)
        .any(|period| (period..bases.len()).all(|i| bases[i].eq_ignore_ascii_case(&bases[i - period])))
}

/// True if the clipped bases nearest the clip point form a poly-A or poly-T tail.
fn is_line_motif(clipped: &[u8], left: bool) -> bool {
    if clipped.len() < LINE_POLY_AT_TEST_LENGTH {
        return false;
    }
    let window = if left {
        &clipped[clipped.len() - LINE_POLY_AT_TEST_LENGTH..]
    } else {
        &clipped[..LINE_POLY_AT_TEST_LENGTH]
    };
    [b'A', b'T'].iter().any(|&target| {
        window.iter().filter(|b| !b.eq_ignore_ascii_case(&target)).count()
            <= LINE_POLY_AT_MAX_MISMATCHES
    })
}
