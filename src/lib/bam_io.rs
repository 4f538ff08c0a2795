//! Alignment sources.
//!
//! Partition scans read alignments through the [`AlignmentSource`] trait. Each worker
//! opens its own source from a shared [`AlignmentSourceFactory`], so no reader handle is
//! ever shared between threads.
//!
//! - [`IndexedBamSource`] queries a coordinate-sorted, indexed BAM file
//! - [`InMemorySource`] serves records held in memory (tests and benchmarks)

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use noodles::bam;
use noodles::bam::bai;
use noodles::core::{Position, Region};
use noodles::sam::Header;
use noodles::sam::alignment::RecordBuf;

use crate::partition::GenomeRegion;
use crate::sam::record::AlignmentRecord;

/// A source of alignment records scoped to a genome region.
pub trait AlignmentSource {
    /// Returns the records overlapping `region`, ordered by alignment start.
    fn records(&mut self, region: &GenomeRegion) -> Result<Vec<AlignmentRecord>>;
}

/// Opens one [`AlignmentSource`] per worker.
pub trait AlignmentSourceFactory: Send + Sync {
    type Source: AlignmentSource;

    fn open(&self) -> Result<Self::Source>;
}

/// Reference sequence names and lengths from a header, in header order.
#[must_use]
pub fn reference_sequences(header: &Header) -> Vec<(String, u32)> {
    header
        .reference_sequences()
        .iter()
        .map(|(name, seq)| (name.to_string(), usize::from(seq.length()) as u32))
        .collect()
}

/// Reads the header of a BAM file.
pub fn read_bam_header<P: AsRef<Path>>(path: P) -> Result<Header> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("Failed to open input BAM: {}", path.display()))?;
    let mut reader = bam::io::Reader::new(file);
    reader.read_header().with_context(|| format!("Failed to read header from: {}", path.display()))
}

/// Path of the BAI index for a BAM file.
#[must_use]
pub fn bai_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".bai");
    PathBuf::from(name)
}

/// Write a BAI index to a file.
pub fn write_bai_index<P: AsRef<Path>>(path: P, index: &bai::Index) -> Result<()> {
    let path_ref = path.as_ref();
    let file = File::create(path_ref)
        .with_context(|| format!("Failed to create index file: {}", path_ref.display()))?;
    let mut writer = bai::io::Writer::new(file);
    writer
        .write_index(index)
        .with_context(|| format!("Failed to write index to: {}", path_ref.display()))?;
    Ok(())
}

/// Builds `<bam>.bai` for a coordinate-sorted BAM file and returns its path.
pub fn index_bam<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();
    let index = bam::fs::index(path).with_context(|| format!("Failed to index BAM: {}", path.display()))?;
    let index_path = bai_path(path);
    write_bai_index(&index_path, &index)?;
    Ok(index_path)
}

/// Region queries against an indexed BAM file.
pub struct IndexedBamSource {
    reader: bam::io::IndexedReader<noodles::bgzf::io::Reader<File>>,
    header: Header,
}

impl IndexedBamSource {
    /// Opens a BAM file and its index.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = bam::io::indexed_reader::Builder::default()
            .build_from_path(path)
            .with_context(|| format!("Failed to open indexed BAM: {}", path.display()))?;
        let header = reader
            .read_header()
            .with_context(|| format!("Failed to read header from: {}", path.display()))?;
        Ok(Self { reader, header })
    }

    #[must_use]
    pub fn header(&self) -> &Header {
        &self.header
    }
}

impl AlignmentSource for IndexedBamSource {
    fn records(&mut self, region: &GenomeRegion) -> Result<Vec<AlignmentRecord>> {
        let start = Position::try_from(region.start as usize)?;
        let end = Position::try_from(region.end as usize)?;
        let query_region = Region::new(region.chromosome.as_str(), start..=end);

        let query = self
            .reader
            .query(&self.header, &query_region)
            .with_context(|| format!("Failed to query region {region}"))?;

        let mut records = Vec::new();
        for result in query {
            let bam_record = result.with_context(|| format!("Failed to read record in {region}"))?;
            let record = RecordBuf::try_from_alignment_record(&self.header, &bam_record)?;
            records.push(AlignmentRecord::from_record_buf(&record, &self.header)?);
        }
        Ok(records)
    }
}

/// Opens an [`IndexedBamSource`] per worker.
#[derive(Debug, Clone)]
pub struct IndexedBamSourceFactory {
    path: PathBuf,
}

impl IndexedBamSourceFactory {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl AlignmentSourceFactory for IndexedBamSourceFactory {
    type Source = IndexedBamSource;

    fn open(&self) -> Result<IndexedBamSource> {
        IndexedBamSource::open(&self.path)
    }
}

/// Records held in memory, shared between workers.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    records: Arc<Vec<AlignmentRecord>>,
}

impl InMemorySource {
    /// Sorts the records by chromosome and start.
    #[must_use]
    pub fn new(mut records: Vec<AlignmentRecord>) -> Self {
        records.sort_by(|a, b| {
            a.chromosome.cmp(&b.chromosome).then(a.alignment_start.cmp(&b.alignment_start))
        });
        Self { records: Arc::new(records) }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl AlignmentSource for InMemorySource {
    fn records(&mut self, region: &GenomeRegion) -> Result<Vec<AlignmentRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|r| {
                !r.chromosome.is_empty()
                    && region.overlaps(&r.chromosome, r.alignment_start, r.alignment_end())
            })
            .cloned()
            .collect())
    }
}

impl AlignmentSourceFactory for InMemorySource {
    type Source = InMemorySource;

    fn open(&self) -> Result<InMemorySource> {
        Ok(self.clone())
    }
}
