//! Record-level utilities for alignment records.
//!
//! This module provides utilities for working with CIGAR operations and SAM tags:
//! - CIGAR string parsing (SA and MC tags carry CIGARs as strings)
//! - Reference-consumed length and clipping on either side
//! - Geometry summaries used by the read classifier

use noodles::sam::alignment::record::cigar::op::Kind;

/// A CIGAR operation as a `(kind, length)` pair.
pub type CigarOp = (Kind, usize);

/// Parses a CIGAR string and returns it as a vector of (Kind, length) operations.
///
/// Unknown operation characters and zero-length operations are skipped, so a
/// malformed CIGAR never panics.
#[must_use]
pub fn parse_cigar_string(cigar_str: &str) -> Vec<CigarOp> {
    let mut ops = Vec::new();
    let mut num_str = String::new();

    for ch in cigar_str.chars() {
        if ch.is_ascii_digit() {
            num_str.push(ch);
        } else {
            let len: usize = num_str.parse().unwrap_or(0);
            num_str.clear();

            let kind = match ch {
                'M' => Kind::Match,
                'I' => Kind::Insertion,
                'D' => Kind::Deletion,
                'N' => Kind::Skip,
                'S' => Kind::SoftClip,
                'H' => Kind::HardClip,
                'P' => Kind::Pad,
                '=' => Kind::SequenceMatch,
                'X' => Kind::SequenceMismatch,
                _ => continue,
            };

            if len > 0 {
                ops.push((kind, len));
            }
        }
    }

    ops
}

/// Calculates the reference length consumed by CIGAR operations.
#[must_use]
pub fn cigar_reference_length(ops: &[CigarOp]) -> usize {
    ops.iter()
        .filter_map(|(kind, len)| match kind {
            Kind::Match
            | Kind::Deletion
            | Kind::Skip
            | Kind::SequenceMatch
            | Kind::SequenceMismatch => Some(*len),
            _ => None,
        })
        .sum()
}

/// Calculates leading soft clipping from CIGAR operations (hard clips are skipped over).
#[must_use]
pub fn leading_soft_clipping(ops: &[CigarOp]) -> usize {
    ops.iter()
        .skip_while(|(kind, _)| *kind == Kind::HardClip)
        .take_while(|(kind, _)| *kind == Kind::SoftClip)
        .map(|(_, len)| *len)
        .sum()
}

/// Calculates trailing soft clipping from CIGAR operations (hard clips are skipped over).
#[must_use]
pub fn trailing_soft_clipping(ops: &[CigarOp]) -> usize {
    ops.iter()
        .rev()
        .skip_while(|(kind, _)| *kind == Kind::HardClip)
        .take_while(|(kind, _)| *kind == Kind::SoftClip)
        .map(|(_, len)| *len)
        .sum()
}

/// Geometry derived from a CIGAR and an alignment start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CigarSummary {
    /// Bases aligned with M, = or X operations.
    pub aligned_bases: u32,
    /// Leading soft clip length.
    pub left_soft_clip: u32,
    /// Trailing soft clip length.
    pub right_soft_clip: u32,
    /// Whether any hard clip is present.
    pub has_hard_clip: bool,
    /// Length of the longest insertion or deletion.
    pub max_indel: u32,
    /// Reference bases flanking the longest indel: the last aligned base before it and
    /// the first aligned base after it. `None` when there is no indel.
    pub max_indel_flanks: Option<(u32, u32)>,
    /// Last reference base covered by the alignment (1-based, inclusive).
    pub alignment_end: u32,
}

impl CigarSummary {
    /// Walks the CIGAR once, computing aligned length, clipping, the longest indel and the
    /// alignment end for an alignment starting at the 1-based `alignment_start`.
    #[must_use]
    pub fn from_ops(ops: &[CigarOp], alignment_start: u32) -> Self {
        let mut summary = CigarSummary {
            left_soft_clip: leading_soft_clipping(ops) as u32,
            right_soft_clip: trailing_soft_clipping(ops) as u32,
            ..Default::default()
        };

        let mut ref_pos = alignment_start;
        for &(kind, len) in ops {
            let len = len as u32;
            match kind {
                Kind::Match | Kind::SequenceMatch | Kind::SequenceMismatch => {
                    summary.aligned_bases += len;
                    ref_pos += len;
                }
                Kind::Deletion => {
                    if len > summary.max_indel {
                        summary.max_indel = len;
                        summary.max_indel_flanks = Some((ref_pos.saturating_sub(1), ref_pos + len));
                    }
                    ref_pos += len;
                }
                Kind::Insertion => {
                    if len > summary.max_indel {
                        summary.max_indel = len;
                        summary.max_indel_flanks = Some((ref_pos.saturating_sub(1), ref_pos));
                    }
                }
                Kind::Skip => ref_pos += len,
                Kind::HardClip => summary.has_hard_clip = true,
                Kind::SoftClip | Kind::Pad => {}
            }
        }

        summary.alignment_end = ref_pos.saturating_sub(1).max(alignment_start);
        summary
    }
}
