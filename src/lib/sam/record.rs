//! Library-neutral alignment records.
//!
//! [`AlignmentRecord`] carries just the fields the read classifier needs. It is built from
//! a noodles [`RecordBuf`] when scanning BAM files, or directly (see
//! [`RecordBuilder`](crate::sam::builder::RecordBuilder)) in tests and benchmarks.

use anyhow::Result;
use bstr::BString;
use noodles::core::Position;
use noodles::sam::Header;
use noodles::sam::alignment::RecordBuf;
use noodles::sam::alignment::record::cigar::op::Op;
use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record::{Flags, MappingQuality};
use noodles::sam::alignment::record_buf::data::field::Value;
use noodles::sam::alignment::record_buf::{QualityScores, Sequence};

use crate::errors::SvPrepError;
use crate::sam::record_utils::{CigarOp, cigar_reference_length};

/// SA: other canonical alignments in a chimeric alignment.
pub const SUPPLEMENTARY_ALIGNMENT_TAG: [u8; 2] = *b"SA";

/// MC: CIGAR string of the mate.
pub const MATE_CIGAR_TAG: [u8; 2] = *b"MC";

/// A single alignment record from an alignment source.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentRecord {
    /// Query name, shared by all records of a fragment
    pub name: String,
    /// SAM flags
    pub flags: Flags,
    /// Reference sequence name (empty when unmapped)
    pub chromosome: String,
    /// 1-based alignment start (0 when unmapped)
    pub alignment_start: u32,
    /// Mapping quality (0 when unavailable)
    pub mapping_quality: u8,
    /// CIGAR operations
    pub cigar: Vec<CigarOp>,
    /// Read bases
    pub sequence: Vec<u8>,
    /// Phred base qualities
    pub qualities: Vec<u8>,
    /// Mate reference sequence name
    pub mate_chromosome: Option<String>,
    /// Mate 1-based alignment start (0 when unknown)
    pub mate_alignment_start: u32,
    /// Observed template length (TLEN)
    pub insert_size: i32,
    /// Raw SA tag value, if present
    pub supplementary_tag: Option<String>,
    /// Raw MC tag value, if present
    pub mate_cigar: Option<String>,
}

impl AlignmentRecord {
    /// Builds an alignment record from a noodles record and its header.
    ///
    /// # Errors
    ///
    /// Returns an error if the record references a sequence missing from the header.
    pub fn from_record_buf(record: &RecordBuf, header: &Header) -> Result<Self> {
        let name = record
            .name()
            .map(|n| {
                let bytes: &[u8] = n.as_ref();
                String::from_utf8_lossy(bytes).into_owned()
            })
            .unwrap_or_default();

        let chromosome = match record.reference_sequence_id() {
            Some(id) => reference_name(header, id)?,
            None => String::new(),
        };
        let mate_chromosome = match record.mate_reference_sequence_id() {
            Some(id) => Some(reference_name(header, id)?),
            None => None,
        };

        let cigar: Vec<CigarOp> =
            record.cigar().as_ref().iter().map(|op| (op.kind(), op.len())).collect();

        Ok(Self {
            name,
            flags: record.flags(),
            chromosome,
            alignment_start: record.alignment_start().map_or(0, |p| usize::from(p) as u32),
            mapping_quality: record.mapping_quality().map_or(0, |mq| mq.get()),
            cigar,
            sequence: record.sequence().as_ref().to_vec(),
            qualities: record.quality_scores().as_ref().to_vec(),
            mate_chromosome,
            mate_alignment_start: record.mate_alignment_start().map_or(0, |p| usize::from(p) as u32),
            insert_size: record.template_length(),
            supplementary_tag: string_tag(record, SUPPLEMENTARY_ALIGNMENT_TAG),
            mate_cigar: string_tag(record, MATE_CIGAR_TAG),
        })
    }

    /// Converts back into a noodles record for writing.
    ///
    /// # Errors
    ///
    /// Returns an error if a chromosome is missing from the header.
    pub fn to_record_buf(&self, header: &Header) -> Result<RecordBuf> {
        let mut rec = RecordBuf::default();
        *rec.name_mut() = Some(BString::from(self.name.as_bytes()));
        *rec.flags_mut() = self.flags;

        if !self.chromosome.is_empty() {
            *rec.reference_sequence_id_mut() = Some(reference_id(header, &self.chromosome)?);
            *rec.alignment_start_mut() = Some(Position::try_from(self.alignment_start as usize)?);
            *rec.mapping_quality_mut() = MappingQuality::new(self.mapping_quality);
            *rec.cigar_mut() = self.cigar.iter().map(|&(kind, len)| Op::new(kind, len)).collect();
        }
        *rec.sequence_mut() = Sequence::from(self.sequence.clone());
        *rec.quality_scores_mut() = QualityScores::from(self.qualities.clone());

        if let Some(mate_chromosome) = &self.mate_chromosome {
            *rec.mate_reference_sequence_id_mut() = Some(reference_id(header, mate_chromosome)?);
            if self.mate_alignment_start > 0 {
                *rec.mate_alignment_start_mut() =
                    Some(Position::try_from(self.mate_alignment_start as usize)?);
            }
        }
        *rec.template_length_mut() = self.insert_size;

        if let Some(sa) = &self.supplementary_tag {
            rec.data_mut()
                .insert(Tag::from(SUPPLEMENTARY_ALIGNMENT_TAG), Value::String(BString::from(sa.as_str())));
        }
        if let Some(mc) = &self.mate_cigar {
            rec.data_mut().insert(Tag::from(MATE_CIGAR_TAG), Value::String(BString::from(mc.as_str())));
        }
        Ok(rec)
    }

    /// Returns the 1-based alignment end (inclusive).
    #[must_use]
    pub fn alignment_end(&self) -> u32 {
        let ref_len = cigar_reference_length(&self.cigar) as u32;
        if ref_len == 0 { self.alignment_start } else { self.alignment_start + ref_len - 1 }
    }

    /// Returns true if the record is secondary, a duplicate, QC-failed or unmapped.
    #[must_use]
    pub fn is_skippable(&self) -> bool {
        self.flags.is_secondary()
            || self.flags.is_duplicate()
            || self.flags.is_qc_fail()
            || self.flags.is_unmapped()
    }
}

fn reference_name(header: &Header, id: usize) -> Result<String> {
    header
        .reference_sequences()
        .get_index(id)
        .map(|(name, _)| name.to_string())
        .ok_or_else(|| SvPrepError::ReferenceNotFound { ref_name: format!("#{id}") }.into())
}

fn reference_id(header: &Header, name: &str) -> Result<usize> {
    header
        .reference_sequences()
        .get_index_of(name.as_bytes())
        .ok_or_else(|| SvPrepError::ReferenceNotFound { ref_name: name.to_string() }.into())
}

fn string_tag(record: &RecordBuf, tag: [u8; 2]) -> Option<String> {
    match record.data().get(&Tag::from(tag))? {
        Value::String(s) => Some(s.to_string()),
        _ => None,
    }
}
