//! Discordant read-pair clustering.
//!
//! Discordant reads that overlap each other with the same orientation are clustered into
//! a [`DiscordantGroup`]. Each group tracks where the partner reads landed as a list of
//! [`RemoteRegion`]s, merged with the same rule as remote junctions.

use serde::{Deserialize, Serialize};

use crate::read::{Orientation, Read};
use crate::remote::{RemoteEvidence, merge_remote};
use crate::sam::record_utils::{cigar_reference_length, parse_cigar_string};

/// Same-chromosome, same-strand pairs closer than this are short inversions.
pub const SHORT_INVERSION_DISTANCE: u32 = 1_000;

/// The region where the partner reads of a discordant group aligned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RemoteRegion {
    pub chromosome: String,
    pub start: u32,
    pub end: u32,
    pub orientation: Orientation,
    pub read_count: u32,
}

impl RemoteRegion {
    /// The region covered by a read's mate.
    #[must_use]
    pub fn from_mate(read: &Read) -> Option<Self> {
        if read.is_mate_unmapped() {
            return None;
        }
        let chromosome = read.mate_chromosome.clone()?;
        let length = read
            .mate_cigar
            .as_deref()
            .map(|mc| cigar_reference_length(&parse_cigar_string(mc)) as u32)
            .filter(|len| *len > 0)
            .unwrap_or(read.aligned_bases.max(1));
        Some(Self {
            chromosome,
            start: read.mate_start,
            end: read.mate_start + length - 1,
            orientation: read.mate_orientation(),
            read_count: 1,
        })
    }

    /// The breakend the region implies: its end when forward, its start when reverse.
    #[must_use]
    pub fn breakend(&self) -> (u32, Orientation) {
        match self.orientation {
            Orientation::Forward => (self.end, Orientation::Forward),
            Orientation::Reverse => (self.start, Orientation::Reverse),
        }
    }
}

impl RemoteEvidence for RemoteRegion {
    fn matches(&self, other: &Self) -> bool {
        self.chromosome == other.chromosome
            && self.orientation == other.orientation
            && self.start <= other.end
            && other.start <= self.end
    }

    fn absorb(&mut self, other: Self) {
        self.start = self.start.min(other.start);
        self.end = self.end.max(other.end);
        self.read_count += other.read_count;
    }
}

/// A cluster of overlapping discordant reads with the same orientation.
#[derive(Debug, Clone)]
pub struct DiscordantGroup {
    pub chromosome: String,
    pub start: u32,
    pub end: u32,
    pub orientation: Orientation,
    pub fragment_ids: Vec<String>,
    pub remote_regions: Vec<RemoteRegion>,
}

impl DiscordantGroup {
    /// Seeds a group from its first read.
    #[must_use]
    pub fn new(fragment_id: &str, read: &Read) -> Self {
        let mut group = Self {
            chromosome: read.chromosome.clone(),
            start: read.start,
            end: read.end,
            orientation: read.orientation(),
            fragment_ids: vec![fragment_id.to_string()],
            remote_regions: Vec::new(),
        };
        if let Some(region) = RemoteRegion::from_mate(read) {
            merge_remote(&mut group.remote_regions, region);
        }
        group
    }

    /// Adds the read if it has the group's orientation and overlaps its region. The region
    /// grows only on its breakend side.
    pub fn try_add_fragment(&mut self, fragment_id: &str, read: &Read) -> bool {
        if read.orientation() != self.orientation
            || read.chromosome != self.chromosome
            || read.start > self.end
            || read.end < self.start
        {
            return false;
        }

        match self.orientation {
            Orientation::Forward => self.end = self.end.max(read.end),
            Orientation::Reverse => self.start = self.start.min(read.start),
        }
        if !self.fragment_ids.iter().any(|id| id == fragment_id) {
            self.fragment_ids.push(fragment_id.to_string());
        }
        if let Some(region) = RemoteRegion::from_mate(read) {
            merge_remote(&mut self.remote_regions, region);
        }
        true
    }

    /// Remote regions with at least `min_read_count` reads.
    pub fn valid_remote_regions(&self, min_read_count: u32) -> impl Iterator<Item = &RemoteRegion> {
        self.remote_regions.iter().filter(move |r| r.read_count >= min_read_count)
    }

    /// Local breakend implied by the group: beyond its reads on the orientation side.
    #[must_use]
    pub fn breakend(&self) -> (u32, Orientation) {
        match self.orientation {
            Orientation::Forward => (self.end, Orientation::Forward),
            Orientation::Reverse => (self.start, Orientation::Reverse),
        }
    }
}

/// Counts of discordant reads by candidate class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiscordantStats {
    pub total_reads: u64,
    pub short_inversions: u64,
    pub translocations: u64,
    pub other: u64,
}

impl DiscordantStats {
    /// Counts one discordant read.
    pub fn record(&mut self, read: &Read) {
        self.total_reads += 1;
        if read.is_translocation() {
            self.translocations += 1;
        } else if read.is_same_strand_pair()
            && read.start.abs_diff(read.mate_start) < SHORT_INVERSION_DISTANCE
        {
            self.short_inversions += 1;
        } else {
            self.other += 1;
        }
    }

    pub fn merge(&mut self, other: &DiscordantStats) {
        self.total_reads += other.total_reads;
        self.short_inversions += other.short_inversions;
        self.translocations += other.translocations;
        self.other += other.other;
    }
}

/// Discordant groups for one partition.
#[derive(Debug, Default)]
pub struct DiscordantAccumulator {
    groups: Vec<DiscordantGroup>,
    stats: DiscordantStats,
}

impl DiscordantAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a discordant read to the first group accepting it, else seeds a new group.
    pub fn add_fragment(&mut self, fragment_id: &str, read: &Read) {
        self.stats.record(read);
        if self.groups.iter_mut().any(|group| group.try_add_fragment(fragment_id, read)) {
            return;
        }
        self.groups.push(DiscordantGroup::new(fragment_id, read));
    }

    #[must_use]
    pub fn groups(&self) -> &[DiscordantGroup] {
        &self.groups
    }

    #[must_use]
    pub fn into_parts(self) -> (Vec<DiscordantGroup>, DiscordantStats) {
        (self.groups, self.stats)
    }
}
