//! Fragments: all reads sharing a read name.
//!
//! A [`Fragment`] recomputes its [`FragmentStatus`] from its current membership every
//! time a read is added or another partial fragment is merged in.

use std::collections::BTreeSet;
use std::fmt;

use crate::partition::PartitionKey;
use crate::read::{Orientation, Read, ReadType};

/// Completeness of a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentStatus {
    /// No reads yet.
    Unset,
    /// Reads are still expected from elsewhere.
    Incomplete,
    /// Both primary reads are present but a supplementary is still outstanding, or the
    /// fragment was provisionally resolved with two reads.
    Paired,
    /// Provisionally resolved without its mate.
    Supplementary,
    /// Every expected read is present.
    Complete,
}

impl FragmentStatus {
    /// Position in the forward-only progression `Unset < Incomplete < Paired|Supplementary < Complete`.
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            FragmentStatus::Unset => 0,
            FragmentStatus::Incomplete => 1,
            FragmentStatus::Paired | FragmentStatus::Supplementary => 2,
            FragmentStatus::Complete => 3,
        }
    }
}

impl fmt::Display for FragmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FragmentStatus::Unset => "UNSET",
            FragmentStatus::Incomplete => "INCOMPLETE",
            FragmentStatus::Paired => "PAIRED",
            FragmentStatus::Supplementary => "SUPPLEMENTARY",
            FragmentStatus::Complete => "COMPLETE",
        };
        f.write_str(s)
    }
}

/// The reads of one sequenced molecule.
#[derive(Debug, Clone)]
pub struct Fragment {
    id: String,
    reads: Vec<Read>,
    status: FragmentStatus,
    expected_read_count: usize,
    /// Junctions (position, orientation) within the owning partition this fragment supports.
    pub junction_positions: Vec<(u32, Orientation)>,
    pub has_remote_junction: bool,
}

impl Fragment {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            reads: Vec::new(),
            status: FragmentStatus::Unset,
            expected_read_count: 0,
            junction_positions: Vec::new(),
            has_remote_junction: false,
        }
    }

    /// Creates a fragment from its first read.
    #[must_use]
    pub fn from_read(read: Read) -> Self {
        let mut fragment = Self::new(read.id.clone());
        fragment.add_read(read);
        fragment
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn reads(&self) -> &[Read] {
        &self.reads
    }

    pub fn reads_mut(&mut self) -> impl Iterator<Item = &mut Read> {
        self.reads.iter_mut()
    }

    #[must_use]
    pub fn status(&self) -> FragmentStatus {
        self.status
    }

    #[must_use]
    pub fn expected_read_count(&self) -> usize {
        self.expected_read_count
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == FragmentStatus::Complete
    }

    /// Adds a read and recomputes the status. A read already present is ignored.
    pub fn add_read(&mut self, read: Read) {
        if !self.contains(&read) {
            self.reads.push(read);
        }
        self.update_status();
    }

    /// Merges the reads and junction attributions of another partial fragment.
    pub fn merge(&mut self, other: Fragment) {
        for read in other.reads {
            if !self.contains(&read) {
                self.reads.push(read);
            }
        }
        for position in other.junction_positions {
            self.add_junction_position(position);
        }
        self.has_remote_junction |= other.has_remote_junction;
        self.update_status();
    }

    /// Flags every read as written. A fragment is emitted once, so this is set once.
    pub fn mark_written(&mut self) {
        for read in &mut self.reads {
            read.written = true;
        }
    }

    fn contains(&self, read: &Read) -> bool {
        self.reads.iter().any(|r| r.key() == read.key())
    }

    pub fn add_junction_position(&mut self, position: (u32, Orientation)) {
        if !self.junction_positions.contains(&position) {
            self.junction_positions.push(position);
        }
    }

    /// True if any read may contribute junction evidence.
    #[must_use]
    pub fn is_interesting(&self) -> bool {
        self.reads.iter().any(|r| r.read_type != ReadType::NoSupport)
    }

    /// True if the fragment can only be confirmed by reads held elsewhere: every read is
    /// supplementary, or every read is a low-confidence candidate or has an unmapped mate.
    #[must_use]
    pub fn conditional_on_remote_reads(&self) -> bool {
        if self.reads.is_empty() {
            return false;
        }
        self.reads.iter().all(Read::is_supplementary)
            || self.reads.iter().all(|r| {
                matches!(r.read_type, ReadType::CandidateSupport | ReadType::Support)
                    || r.is_mate_unmapped()
            })
    }

    /// Recomputes the status from the current reads.
    pub fn update_status(&mut self) {
        if self.reads.is_empty() {
            self.status = FragmentStatus::Unset;
            self.expected_read_count = 0;
            return;
        }

        if self.conditional_on_remote_reads() {
            self.expected_read_count = self.reads.len();
            self.status =
                if self.reads.len() == 2 { FragmentStatus::Paired } else { FragmentStatus::Supplementary };
            return;
        }

        let has_mate = self.reads.iter().any(|r| r.is_paired() && !r.is_mate_unmapped());
        let mut expected = if has_mate { 2 } else { 1 };
        for first in [true, false] {
            let slot_has_supplementary = self
                .reads
                .iter()
                .filter(|r| r.is_first_of_pair() == first)
                .any(|r| r.is_supplementary() || !r.supplementaries.is_empty());
            if slot_has_supplementary {
                expected += 1;
            }
        }
        self.expected_read_count = expected;

        let primaries = self.reads.iter().filter(|r| !r.is_supplementary());
        let has_both_primaries = {
            let (mut first, mut second) = (false, false);
            for read in primaries {
                if read.is_first_of_pair() {
                    first = true;
                } else {
                    second = true;
                }
            }
            first && second
        };

        self.status = if self.reads.len() >= expected {
            FragmentStatus::Complete
        } else if has_both_primaries {
            FragmentStatus::Paired
        } else {
            FragmentStatus::Incomplete
        };
    }

    /// Sets a fragment left over at the end of a run to `Incomplete` unless it was
    /// provisionally resolved.
    pub fn mark_incomplete(&mut self) {
        if !matches!(self.status, FragmentStatus::Paired | FragmentStatus::Supplementary) {
            self.status = FragmentStatus::Incomplete;
        }
    }

    /// Windows holding mates or supplementary alignments that are not yet present.
    #[must_use]
    pub fn remote_partitions(&self, partition_size: u32) -> BTreeSet<PartitionKey> {
        let present: BTreeSet<PartitionKey> = self
            .reads
            .iter()
            .map(|r| PartitionKey::for_position(&r.chromosome, r.start, partition_size))
            .collect();

        let mut remote = BTreeSet::new();
        for read in &self.reads {
            if read.is_paired() && !read.is_mate_unmapped() {
                if let Some(chromosome) = read.mate_chromosome.as_deref() {
                    remote.insert(PartitionKey::for_position(chromosome, read.mate_start, partition_size));
                }
            }
            for sa in &read.supplementaries {
                remote.insert(PartitionKey::for_position(&sa.chromosome, sa.position, partition_size));
            }
        }
        remote.retain(|key| !present.contains(key));
        remote
    }
}
