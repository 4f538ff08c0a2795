//! Known structural-variant breakends.
//!
//! Junctions near a known hotspot are kept with less fragment support. Hotspots are
//! read from a TSV with a header row and the columns `chromosome`, `position` and
//! `orientation` (`1` or `-1`).

use std::path::Path;

use ahash::AHashMap;
use anyhow::{Context, Result};
use fgoxide::io::DelimFile;
use serde::{Deserialize, Serialize};

use crate::errors::SvPrepError;
use crate::read::Orientation;

/// Maximum distance between a junction and a hotspot breakend.
pub const HOTSPOT_DISTANCE: u32 = 5;

/// One row of a hotspot file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotspotRecord {
    pub chromosome: String,
    pub position: u32,
    pub orientation: i8,
}

/// Hotspot breakends indexed by chromosome.
#[derive(Debug, Clone, Default)]
pub struct HotspotCache {
    breakends: AHashMap<String, Vec<(u32, Orientation)>>,
}

impl HotspotCache {
    /// Builds a cache from records.
    ///
    /// # Errors
    ///
    /// Returns an error if a record's orientation is not `1` or `-1`.
    pub fn from_records(records: Vec<HotspotRecord>) -> crate::errors::Result<Self> {
        let mut breakends: AHashMap<String, Vec<(u32, Orientation)>> = AHashMap::new();
        for record in records {
            let orientation = match record.orientation {
                1 => Orientation::Forward,
                -1 => Orientation::Reverse,
                other => {
                    return Err(SvPrepError::InvalidParameter {
                        parameter: "hotspot orientation".to_string(),
                        reason: format!("{other} at {}:{}", record.chromosome, record.position),
                    });
                }
            };
            breakends.entry(record.chromosome).or_default().push((record.position, orientation));
        }
        for positions in breakends.values_mut() {
            positions.sort_unstable();
            positions.dedup();
        }
        Ok(Self { breakends })
    }

    /// Loads hotspots from a TSV file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let records: Vec<HotspotRecord> = DelimFile::default()
            .read_tsv(path)
            .with_context(|| format!("Failed to read hotspot file: {}", path.display()))?;
        let cache = Self::from_records(records)
            .with_context(|| format!("Invalid hotspot file: {}", path.display()))?;
        log::info!("Loaded {} hotspot breakends from {}", cache.len(), path.display());
        Ok(cache)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.breakends.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.breakends.is_empty()
    }

    /// True if a hotspot with the same orientation lies within [`HOTSPOT_DISTANCE`].
    #[must_use]
    pub fn is_hotspot(&self, chromosome: &str, position: u32, orientation: Orientation) -> bool {
        let Some(positions) = self.breakends.get(chromosome) else {
            return false;
        };
        let low = position.saturating_sub(HOTSPOT_DISTANCE);
        let high = position.saturating_add(HOTSPOT_DISTANCE);
        let first = positions.partition_point(|(p, _)| *p < low);
        positions[first..]
            .iter()
            .take_while(|(p, _)| *p <= high)
            .any(|(_, o)| *o == orientation)
    }
}
