//! Writes indexed test BAM files.

#![allow(dead_code)]

use std::fs::File;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use bstr::BString;
use noodles::bam;
use noodles::sam::Header;
use noodles::sam::alignment::io::Write as AlignmentWrite;
use noodles::sam::header::record::value::Map;
use noodles::sam::header::record::value::map::ReferenceSequence;
use noodles::sam::header::record::value::map::header::tag as header_tag;
use svprep_lib::bam_io::index_bam;
use svprep_lib::sam::record::AlignmentRecord;

use super::scenarios::CHROMOSOMES;

/// A coordinate-sorted header holding [`CHROMOSOMES`].
#[must_use]
pub fn create_header() -> Header {
    let header_map = Map::<noodles::sam::header::record::value::map::Header>::builder()
        .insert(header_tag::SORT_ORDER, BString::from("coordinate"))
        .build()
        .expect("valid header map");

    let mut builder = Header::builder().set_header(header_map);
    for (name, length) in CHROMOSOMES {
        let reference_sequence = Map::<ReferenceSequence>::new(
            NonZeroUsize::new(length as usize).expect("reference length must be non-zero"),
        );
        builder = builder.add_reference_sequence(BString::from(name), reference_sequence);
    }
    builder.build()
}

fn sort_key(record: &AlignmentRecord) -> (usize, u32) {
    let reference = CHROMOSOMES
        .iter()
        .position(|(name, _)| *name == record.chromosome)
        .expect("record on a test chromosome");
    (reference, record.alignment_start)
}

/// Writes `records` in coordinate order to `path` and builds its `.bai` index.
pub fn write_indexed_bam(path: &Path, mut records: Vec<AlignmentRecord>) -> PathBuf {
    records.sort_by_key(sort_key);
    let header = create_header();

    let mut writer = bam::io::Writer::new(File::create(path).expect("Failed to create BAM file"));
    writer.write_header(&header).expect("Failed to write header");
    for record in &records {
        let record_buf = record.to_record_buf(&header).expect("Failed to convert record");
        writer.write_alignment_record(&header, &record_buf).expect("Failed to write record");
    }
    writer.finish(&header).expect("Failed to finish BAM");
    drop(writer);

    index_bam(path).expect("Failed to index BAM")
}
