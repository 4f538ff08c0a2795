//! Builder for creating alignment records in tests and benchmarks.
//!
//! ## Examples
//!
//! ```rust
//! use svprep_lib::sam::builder::RecordBuilder;
//!
//! // A forward-strand R1 with a 40-base right soft clip and its mate 300bp downstream
//! let record = RecordBuilder::new()
//!     .name("frag1")
//!     .chromosome("chr1")
//!     .start(10_000)
//!     .cigar("60M40S")
//!     .first_of_pair()
//!     .mate("chr1", 10_300, true)
//!     .insert_size(400)
//!     .build();
//!
//! assert_eq!(record.alignment_end(), 10_059);
//! ```

use noodles::sam::alignment::record::Flags;
use noodles::sam::alignment::record::cigar::op::Kind;

use crate::sam::record::AlignmentRecord;
use crate::sam::record_utils::{CigarOp, parse_cigar_string};

pub const DEFAULT_READ_NAME: &str = "read1";
pub const DEFAULT_CHROMOSOME: &str = "chr1";
pub const DEFAULT_START: u32 = 1_000;
pub const DEFAULT_CIGAR: &str = "100M";
pub const DEFAULT_BASE_QUALITY: u8 = 37;
pub const DEFAULT_MAPQ: u8 = 60;

/// Fluent builder for [`AlignmentRecord`]s.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    name: String,
    flags: Flags,
    chromosome: String,
    start: u32,
    cigar: String,
    mapq: u8,
    bases: Option<Vec<u8>>,
    quals: Option<Vec<u8>>,
    base_quality: u8,
    mate_chromosome: Option<String>,
    mate_start: u32,
    insert_size: i32,
    supplementary_tag: Option<String>,
    mate_cigar: Option<String>,
}

impl Default for RecordBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordBuilder {
    /// Creates a builder for an unpaired, forward-strand, fully aligned 100bp read.
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: DEFAULT_READ_NAME.to_string(),
            flags: Flags::empty(),
            chromosome: DEFAULT_CHROMOSOME.to_string(),
            start: DEFAULT_START,
            cigar: DEFAULT_CIGAR.to_string(),
            mapq: DEFAULT_MAPQ,
            bases: None,
            quals: None,
            base_quality: DEFAULT_BASE_QUALITY,
            mate_chromosome: None,
            mate_start: 0,
            insert_size: 0,
            supplementary_tag: None,
            mate_cigar: None,
        }
    }

    /// Sets the read name.
    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Replaces the SAM flags.
    #[must_use]
    pub fn flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    /// Sets the reference sequence name.
    #[must_use]
    pub fn chromosome(mut self, chromosome: &str) -> Self {
        self.chromosome = chromosome.to_string();
        self
    }

    /// Sets the 1-based alignment start.
    #[must_use]
    pub fn start(mut self, start: u32) -> Self {
        self.start = start;
        self
    }

    /// Sets the CIGAR string.
    #[must_use]
    pub fn cigar(mut self, cigar: &str) -> Self {
        self.cigar = cigar.to_string();
        self
    }

    /// Sets the mapping quality.
    #[must_use]
    pub fn mapq(mut self, mapq: u8) -> Self {
        self.mapq = mapq;
        self
    }

    /// Sets the bases.
    #[must_use]
    pub fn bases(mut self, bases: &str) -> Self {
        self.bases = Some(bases.as_bytes().to_vec());
        self
    }

    /// Sets per-base qualities.
    #[must_use]
    pub fn quals(mut self, quals: &[u8]) -> Self {
        self.quals = Some(quals.to_vec());
        self
    }

    /// Sets a uniform base quality used when no explicit qualities are given.
    #[must_use]
    pub fn base_quality(mut self, quality: u8) -> Self {
        self.base_quality = quality;
        self
    }

    /// Marks the read reverse-complemented.
    #[must_use]
    pub fn reverse(mut self) -> Self {
        self.flags |= Flags::REVERSE_COMPLEMENTED;
        self
    }

    /// Marks the read as the first segment of a pair.
    #[must_use]
    pub fn first_of_pair(mut self) -> Self {
        self.flags |= Flags::SEGMENTED | Flags::FIRST_SEGMENT;
        self
    }

    /// Marks the read as the second segment of a pair.
    #[must_use]
    pub fn second_of_pair(mut self) -> Self {
        self.flags |= Flags::SEGMENTED | Flags::LAST_SEGMENT;
        self
    }

    /// Marks the read as a supplementary alignment.
    #[must_use]
    pub fn supplementary(mut self) -> Self {
        self.flags |= Flags::SUPPLEMENTARY;
        self
    }

    /// Sets the mate location and strand.
    #[must_use]
    pub fn mate(mut self, chromosome: &str, start: u32, reversed: bool) -> Self {
        self.mate_chromosome = Some(chromosome.to_string());
        self.mate_start = start;
        if reversed {
            self.flags |= Flags::MATE_REVERSE_COMPLEMENTED;
        }
        self
    }

    /// Marks the mate unmapped.
    #[must_use]
    pub fn mate_unmapped(mut self) -> Self {
        self.flags |= Flags::MATE_UNMAPPED;
        self
    }

    /// Sets the template length.
    #[must_use]
    pub fn insert_size(mut self, insert_size: i32) -> Self {
        self.insert_size = insert_size;
        self
    }

    /// Sets the raw SA tag, e.g. `chr5,5000,+,50S50M,60,0;`.
    #[must_use]
    pub fn supplementary_tag(mut self, sa: &str) -> Self {
        self.supplementary_tag = Some(sa.to_string());
        self
    }

    /// Sets the raw MC tag.
    #[must_use]
    pub fn mate_cigar(mut self, mc: &str) -> Self {
        self.mate_cigar = Some(mc.to_string());
        self
    }

    /// Builds the record. Bases and qualities default to the CIGAR's query length.
    #[must_use]
    pub fn build(self) -> AlignmentRecord {
        let cigar = parse_cigar_string(&self.cigar);
        let read_length = query_length(&cigar);
        let sequence = self.bases.unwrap_or_else(|| filler_bases(read_length));
        let qualities = self.quals.unwrap_or_else(|| vec![self.base_quality; sequence.len()]);

        AlignmentRecord {
            name: self.name,
            flags: self.flags,
            chromosome: self.chromosome,
            alignment_start: self.start,
            mapping_quality: self.mapq,
            cigar,
            sequence,
            qualities,
            mate_chromosome: self.mate_chromosome,
            mate_alignment_start: self.mate_start,
            insert_size: self.insert_size,
            supplementary_tag: self.supplementary_tag,
            mate_cigar: self.mate_cigar,
        }
    }
}

fn query_length(cigar: &[CigarOp]) -> usize {
    cigar
        .iter()
        .filter(|(kind, _)| {
            matches!(
                kind,
                Kind::Match
                    | Kind::Insertion
                    | Kind::SoftClip
                    | Kind::SequenceMatch
                    | Kind::SequenceMismatch
            )
        })
        .map(|(_, len)| *len)
        .sum()
}

/// Deterministic pseudo-random filler bases.
fn filler_bases(len: usize) -> Vec<u8> {
    const BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];
    let mut state: u32 = 0x9E37_79B9;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            BASES[(state % 4) as usize]
        })
        .collect()
}
