//! Classified reads.
//!
//! A [`Read`] is built once per alignment record and carries the geometry the
//! classifier and the evidence accumulators need. Only its filters, read type and
//! written flag change after construction.

use std::fmt;

use noodles::sam::alignment::record::Flags;

use crate::sam::record::AlignmentRecord;
use crate::sam::record_utils::{CigarOp, CigarSummary, parse_cigar_string};

/// Strand of a read or orientation of a breakend.
///
/// For a breakend, `Forward` means the retained sequence lies to the left of the
/// position (a right soft clip), `Reverse` that it lies to the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Orientation {
    Forward,
    Reverse,
}

impl Orientation {
    /// Returns `1` or `-1`.
    #[must_use]
    pub fn as_i8(self) -> i8 {
        match self {
            Orientation::Forward => 1,
            Orientation::Reverse => -1,
        }
    }

    /// Parses `1`, `+1`, `+`, `-1` or `-`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "1" | "+1" | "+" => Some(Orientation::Forward),
            "-1" | "-" => Some(Orientation::Reverse),
            _ => None,
        }
    }

    #[must_use]
    pub fn from_reverse_flag(reverse: bool) -> Self {
        if reverse { Orientation::Reverse } else { Orientation::Forward }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i8())
    }
}

/// Named filter flags set by the read classifier.
///
/// A read with no flag set is a junction candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct ReadFilters {
    pub min_align_match: bool,
    pub min_map_qual: bool,
    pub insert_map_overlap: bool,
    pub soft_clip_length: bool,
    pub soft_clip_base_quality: bool,
    pub break_in_repeat: bool,
    pub poly_g_soft_clip: bool,
}

/// Filter names in reporting order.
pub const FILTER_NAMES: [&str; 7] = [
    "MIN_ALIGN_MATCH",
    "MIN_MAP_QUAL",
    "INSERT_MAP_OVERLAP",
    "SOFT_CLIP_LENGTH",
    "SOFT_CLIP_BASE_QUALITY",
    "BREAK_IN_REPEAT",
    "POLY_G_SC",
];

impl ReadFilters {
    /// Returns true if no filter is set.
    #[must_use]
    pub fn is_clear(&self) -> bool {
        self.as_array().iter().all(|set| !set)
    }

    /// Flag values in [`FILTER_NAMES`] order.
    #[must_use]
    pub fn as_array(&self) -> [bool; 7] {
        [
            self.min_align_match,
            self.min_map_qual,
            self.insert_map_overlap,
            self.soft_clip_length,
            self.soft_clip_base_quality,
            self.break_in_repeat,
            self.poly_g_soft_clip,
        ]
    }

    /// Names of the flags that are set.
    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        FILTER_NAMES.into_iter().zip(self.as_array()).filter(|(_, set)| *set).map(|(name, _)| name)
    }
}

impl fmt::Display for ReadFilters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.names().collect();
        if names.is_empty() { write!(f, "PASS") } else { write!(f, "{}", names.join(",")) }
    }
}

/// How a read contributes to junction evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadType {
    NoSupport,
    CandidateSupport,
    Support,
    ExactSupport,
    Junction,
}

impl ReadType {
    /// Rank used when deciding whether a new type may replace an existing one.
    #[must_use]
    pub fn priority(self) -> u8 {
        match self {
            ReadType::NoSupport => 0,
            ReadType::CandidateSupport => 1,
            ReadType::Support => 2,
            ReadType::ExactSupport => 3,
            ReadType::Junction => 4,
        }
    }
}

/// One entry of an SA tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplementaryAlignment {
    pub chromosome: String,
    pub position: u32,
    pub orientation: Orientation,
    pub cigar: Vec<CigarOp>,
    pub mapping_quality: u8,
}

impl SupplementaryAlignment {
    /// Parses an SA tag (`rname,pos,strand,CIGAR,mapQ,NM;` repeated). Malformed entries
    /// are skipped.
    #[must_use]
    pub fn parse_tag(tag: &str) -> Vec<Self> {
        tag.split(';').filter(|entry| !entry.is_empty()).filter_map(Self::parse_entry).collect()
    }

    fn parse_entry(entry: &str) -> Option<Self> {
        let mut fields = entry.split(',');
        let chromosome = fields.next()?.to_string();
        let position: u32 = fields.next()?.parse().ok()?;
        let orientation = match fields.next()? {
            "+" => Orientation::Forward,
            "-" => Orientation::Reverse,
            _ => return None,
        };
        let cigar = parse_cigar_string(fields.next()?);
        let mapping_quality = fields.next()?.parse().ok()?;
        if chromosome.is_empty() || position == 0 || cigar.is_empty() {
            return None;
        }
        Some(Self { chromosome, position, orientation, cigar, mapping_quality })
    }

    /// The breakend this alignment implies: its longer soft-clipped side.
    #[must_use]
    pub fn breakend(&self) -> (u32, Orientation) {
        let summary = CigarSummary::from_ops(&self.cigar, self.position);
        if summary.left_soft_clip > summary.right_soft_clip {
            (self.position, Orientation::Reverse)
        } else {
            (summary.alignment_end, Orientation::Forward)
        }
    }
}

/// A classified alignment.
#[derive(Debug, Clone)]
pub struct Read {
    pub id: String,
    pub flags: Flags,
    pub chromosome: String,
    pub start: u32,
    pub end: u32,
    pub unclipped_start: u32,
    pub unclipped_end: u32,
    pub cigar: Vec<CigarOp>,
    pub left_soft_clip: u32,
    pub right_soft_clip: u32,
    pub has_hard_clip: bool,
    pub aligned_bases: u32,
    pub max_indel: u32,
    pub max_indel_flanks: Option<(u32, u32)>,
    pub mapping_quality: u8,
    pub sequence: Vec<u8>,
    pub qualities: Vec<u8>,
    pub mate_chromosome: Option<String>,
    pub mate_start: u32,
    pub insert_size: i32,
    /// The mate's CIGAR from the MC tag, giving the mate's reference extent.
    pub mate_cigar: Option<String>,
    pub supplementaries: Vec<SupplementaryAlignment>,
    pub filters: ReadFilters,
    pub read_type: ReadType,
    pub written: bool,
}

impl Read {
    /// Builds an unclassified read. Filters are clear and the type is `NoSupport`
    /// until the classifier runs.
    #[must_use]
    pub fn from_record(record: AlignmentRecord) -> Self {
        let summary = CigarSummary::from_ops(&record.cigar, record.alignment_start);
        let supplementaries = record
            .supplementary_tag
            .as_deref()
            .map(SupplementaryAlignment::parse_tag)
            .unwrap_or_default();

        // A mapped mate needs a location; without one the mate is treated as unmapped.
        let mate_chromosome = record.mate_chromosome.filter(|c| !c.is_empty() && c != "*");
        let mut flags = record.flags;
        if flags.is_segmented() && (mate_chromosome.is_none() || record.mate_alignment_start == 0) {
            flags |= Flags::MATE_UNMAPPED;
        }

        Self {
            id: record.name,
            flags,
            start: record.alignment_start,
            end: summary.alignment_end,
            unclipped_start: record.alignment_start.saturating_sub(summary.left_soft_clip),
            unclipped_end: summary.alignment_end + summary.right_soft_clip,
            chromosome: record.chromosome,
            cigar: record.cigar,
            left_soft_clip: summary.left_soft_clip,
            right_soft_clip: summary.right_soft_clip,
            has_hard_clip: summary.has_hard_clip,
            aligned_bases: summary.aligned_bases,
            max_indel: summary.max_indel,
            max_indel_flanks: summary.max_indel_flanks,
            mapping_quality: record.mapping_quality,
            sequence: record.sequence,
            qualities: record.qualities,
            mate_chromosome,
            mate_start: record.mate_alignment_start,
            insert_size: record.insert_size,
            mate_cigar: record.mate_cigar,
            supplementaries,
            filters: ReadFilters::default(),
            read_type: ReadType::NoSupport,
            written: false,
        }
    }

    #[must_use]
    pub fn orientation(&self) -> Orientation {
        Orientation::from_reverse_flag(self.flags.is_reverse_complemented())
    }

    #[must_use]
    pub fn mate_orientation(&self) -> Orientation {
        Orientation::from_reverse_flag(self.flags.is_mate_reverse_complemented())
    }

    #[must_use]
    pub fn is_paired(&self) -> bool {
        self.flags.is_segmented()
    }

    #[must_use]
    pub fn is_first_of_pair(&self) -> bool {
        !self.is_paired() || self.flags.is_first_segment()
    }

    #[must_use]
    pub fn is_supplementary(&self) -> bool {
        self.flags.is_supplementary()
    }

    #[must_use]
    pub fn is_mate_unmapped(&self) -> bool {
        self.is_paired() && self.flags.is_mate_unmapped()
    }

    /// True if the mate is mapped to a different chromosome.
    #[must_use]
    pub fn is_translocation(&self) -> bool {
        !self.is_mate_unmapped()
            && self.mate_chromosome.as_deref().is_some_and(|c| c != self.chromosome)
    }

    /// True if both ends of the pair map to the same strand.
    #[must_use]
    pub fn is_same_strand_pair(&self) -> bool {
        self.is_paired() && !self.is_mate_unmapped() && self.orientation() == self.mate_orientation()
    }

    /// Longest soft clip on either side.
    #[must_use]
    pub fn max_soft_clip(&self) -> u32 {
        self.left_soft_clip.max(self.right_soft_clip)
    }

    /// True when the left soft clip is strictly longer than the right one.
    #[must_use]
    pub fn is_left_clipped(&self) -> bool {
        self.left_soft_clip > self.right_soft_clip
    }

    /// True if the read carries any soft or hard clip.
    #[must_use]
    pub fn has_clipping(&self) -> bool {
        self.left_soft_clip > 0 || self.right_soft_clip > 0 || self.has_hard_clip
    }

    /// Identity of this alignment within its fragment.
    #[must_use]
    pub fn key(&self) -> (bool, bool, &str, u32) {
        (self.is_first_of_pair(), self.is_supplementary(), self.chromosome.as_str(), self.start)
    }

    /// Counts bases at or above `min_quality` in the soft clip on the given side.
    #[must_use]
    pub fn soft_clip_high_quality_bases(&self, left: bool, min_quality: u8) -> u32 {
        let clip = if left { self.left_soft_clip } else { self.right_soft_clip } as usize;
        let quals = if left {
            self.qualities.get(..clip)
        } else {
            self.qualities.len().checked_sub(clip).and_then(|s| self.qualities.get(s..))
        };
        quals.map_or(0, |q| q.iter().filter(|&&bq| bq >= min_quality).count() as u32)
    }

    /// Raises the read type if `read_type` outranks the current one.
    pub fn raise_type(&mut self, read_type: ReadType) {
        if read_type.priority() > self.read_type.priority() {
            self.read_type = read_type;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sam::builder::RecordBuilder;

    #[test]
    fn test_geometry_from_record() {
        let record = RecordBuilder::new().start(1000).cigar("20S70M10S").build();
        let read = Read::from_record(record);
        assert_eq!(read.start, 1000);
        assert_eq!(read.end, 1069);
        assert_eq!(read.unclipped_start, 980);
        assert_eq!(read.unclipped_end, 1079);
        assert_eq!(read.max_soft_clip(), 20);
        assert!(read.is_left_clipped());
        assert_eq!(read.read_type, ReadType::NoSupport);
        assert!(read.filters.is_clear());
    }

    #[test]
    fn test_missing_mate_location_is_unmapped_mate() {
        let record = RecordBuilder::new().first_of_pair().build();
        let read = Read::from_record(record);
        assert!(read.is_mate_unmapped());
        assert!(!read.is_translocation());
    }

    #[test]
    fn test_mate_cigar_gives_mate_extent() {
        let record = RecordBuilder::new().first_of_pair().mate("chr5", 5_000, false).mate_cigar("30S70M").build();
        let read = Read::from_record(record);
        assert_eq!(read.mate_cigar.as_deref(), Some("30S70M"));

        let region = crate::discordant::RemoteRegion::from_mate(&read).unwrap();
        assert_eq!((region.start, region.end), (5_000, 5_069));
        assert!(Read::from_record(RecordBuilder::new().build()).mate_cigar.is_none());
    }

    #[test]
    fn test_parse_supplementary_tag() {
        let sas = SupplementaryAlignment::parse_tag("chr5,5000,-,50S50M,60,0;chr7,bad,+,10M,1,0;");
        assert_eq!(sas.len(), 1);
        assert_eq!(sas[0].chromosome, "chr5");
        assert_eq!(sas[0].orientation, Orientation::Reverse);
        assert_eq!(sas[0].breakend(), (5000, Orientation::Reverse));

        let right = SupplementaryAlignment::parse_tag("chr2,100,+,60M40S,30,1");
        assert_eq!(right[0].breakend(), (159, Orientation::Forward));
    }

    #[test]
    fn test_read_type_priority_only_raises() {
        let mut read = Read::from_record(RecordBuilder::new().build());
        read.raise_type(ReadType::ExactSupport);
        read.raise_type(ReadType::CandidateSupport);
        assert_eq!(read.read_type, ReadType::ExactSupport);
        read.raise_type(ReadType::Junction);
        assert_eq!(read.read_type, ReadType::Junction);
    }

    #[test]
    fn test_filters_display() {
        let filters = ReadFilters { min_map_qual: true, poly_g_soft_clip: true, ..Default::default() };
        assert_eq!(filters.to_string(), "MIN_MAP_QUAL,POLY_G_SC");
        assert_eq!(ReadFilters::default().to_string(), "PASS");
    }

    #[test]
    fn test_soft_clip_high_quality_bases() {
        let mut quals = vec![10u8; 10];
        quals.extend(vec![30u8; 80]);
        quals.extend([30, 30, 5, 5, 30, 30, 30, 30, 30, 30]);
        let record = RecordBuilder::new().cigar("10S80M10S").quals(&quals).build();
        let read = Read::from_record(record);
        assert_eq!(read.soft_clip_high_quality_bases(true, 26), 0);
        assert_eq!(read.soft_clip_high_quality_bases(false, 26), 8);
    }

    #[test]
    fn test_orientation_parse_and_display() {
        assert_eq!(Orientation::parse("-1"), Some(Orientation::Reverse));
        assert_eq!(Orientation::parse("+"), Some(Orientation::Forward));
        assert_eq!(Orientation::parse("x"), None);
        assert_eq!(Orientation::Reverse.to_string(), "-1");
    }
}
