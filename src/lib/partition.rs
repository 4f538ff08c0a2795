//! Genome regions, partition keys and partition tasks.
//!
//! The genome is divided into fixed-size windows. A window is identified by its
//! [`PartitionKey`] (chromosome plus bucket index), which any read can compute from its
//! own alignment start. Scanning one window is one [`PartitionTask`].

use std::fmt;
use std::str::FromStr;

use crate::errors::{Result, SvPrepError};

/// A 1-based, inclusive genome interval.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GenomeRegion {
    pub chromosome: String,
    pub start: u32,
    pub end: u32,
}

impl GenomeRegion {
    #[must_use]
    pub fn new(chromosome: impl Into<String>, start: u32, end: u32) -> Self {
        Self { chromosome: chromosome.into(), start, end }
    }

    #[must_use]
    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start) + 1
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    #[must_use]
    pub fn contains(&self, chromosome: &str, position: u32) -> bool {
        self.chromosome == chromosome && position >= self.start && position <= self.end
    }

    #[must_use]
    pub fn overlaps(&self, chromosome: &str, start: u32, end: u32) -> bool {
        self.chromosome == chromosome && start <= self.end && end >= self.start
    }
}

impl fmt::Display for GenomeRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chromosome, self.start, self.end)
    }
}

impl FromStr for GenomeRegion {
    type Err = SvPrepError;

    /// Parses `chr` (whole chromosome, end filled in later) or `chr:start-end`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| SvPrepError::InvalidRegion {
            region: s.to_string(),
            reason: reason.to_string(),
        };

        let Some((chromosome, range)) = s.rsplit_once(':') else {
            if s.is_empty() {
                return Err(invalid("empty region"));
            }
            return Ok(Self::new(s, 1, u32::MAX));
        };

        let (start, end) = range.split_once('-').ok_or_else(|| invalid("expected start-end"))?;
        let parse = |v: &str| v.replace(',', "").parse::<u32>().map_err(|_| invalid("bad coordinate"));
        let (start, end) = (parse(start)?, parse(end)?);
        if start == 0 || end < start {
            return Err(invalid("coordinates must satisfy 1 <= start <= end"));
        }
        Ok(Self::new(chromosome, start, end))
    }
}

/// Identity of a fixed-size genome window.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartitionKey {
    pub chromosome: String,
    pub bucket: u32,
}

impl PartitionKey {
    #[must_use]
    pub fn new(chromosome: impl Into<String>, bucket: u32) -> Self {
        Self { chromosome: chromosome.into(), bucket }
    }

    /// Key of the window containing a 1-based position.
    #[must_use]
    pub fn for_position(chromosome: &str, position: u32, partition_size: u32) -> Self {
        Self::new(chromosome, position.saturating_sub(1) / partition_size.max(1))
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.chromosome, self.bucket)
    }
}

/// One unit of work: a window of the genome, consumed once from the task queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionTask {
    pub id: usize,
    pub key: PartitionKey,
    pub region: GenomeRegion,
}

/// Splits the genome into partition tasks with sequential ids.
///
/// `chromosomes` are `(name, length)` pairs in reference order. When `specific_regions`
/// is non-empty only windows overlapping them are produced, each clipped to the region.
/// Regions falling into the same window are combined into one task.
///
/// # Errors
///
/// Returns an error if a specific region names an unknown chromosome.
pub fn split_genome(
    chromosomes: &[(String, u32)],
    partition_size: u32,
    specific_regions: &[GenomeRegion],
) -> Result<Vec<PartitionTask>> {
    if partition_size == 0 {
        return Err(SvPrepError::InvalidParameter {
            parameter: "partition-size".to_string(),
            reason: "must be >= 1".to_string(),
        });
    }

    let mut windows: Vec<GenomeRegion> = Vec::new();

    if specific_regions.is_empty() {
        for (name, length) in chromosomes {
            let mut start = 1;
            while start <= *length {
                let end = start.saturating_add(partition_size - 1).min(*length);
                windows.push(GenomeRegion::new(name.clone(), start, end));
                start = match end.checked_add(1) {
                    Some(next) => next,
                    None => break,
                };
            }
        }
    } else {
        for region in specific_regions {
            let length = chromosomes
                .iter()
                .find(|(name, _)| *name == region.chromosome)
                .map(|(_, length)| *length)
                .ok_or_else(|| SvPrepError::ReferenceNotFound {
                    ref_name: region.chromosome.clone(),
                })?;
            let end = region.end.min(length);
            if region.start > end {
                continue;
            }
            let first = (region.start - 1) / partition_size;
            let last = (end - 1) / partition_size;
            for bucket in first..=last {
                let window_start = bucket * partition_size + 1;
                let window_end = window_start.saturating_add(partition_size - 1);
                let clipped =
                    GenomeRegion::new(region.chromosome.clone(), window_start.max(region.start), window_end.min(end));
                merge_window(&mut windows, clipped, partition_size);
            }
        }

        // Reference order, then position
        let rank = |name: &str| chromosomes.iter().position(|(c, _)| c == name).unwrap_or(usize::MAX);
        windows.sort_by(|a, b| rank(&a.chromosome).cmp(&rank(&b.chromosome)).then(a.start.cmp(&b.start)));
    }

    Ok(windows
        .into_iter()
        .enumerate()
        .map(|(id, region)| PartitionTask {
            id,
            key: PartitionKey::for_position(&region.chromosome, region.start, partition_size),
            region,
        })
        .collect())
}

fn merge_window(windows: &mut Vec<GenomeRegion>, window: GenomeRegion, partition_size: u32) {
    let key = PartitionKey::for_position(&window.chromosome, window.start, partition_size);
    let existing = windows.iter_mut().find(|w| {
        PartitionKey::for_position(&w.chromosome, w.start, partition_size) == key
    });
    match existing {
        Some(w) => {
            w.start = w.start.min(window.start);
            w.end = w.end.max(window.end);
        }
        None => windows.push(window),
    }
}
