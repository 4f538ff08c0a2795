//! Junction evidence.
//!
//! A [`JunctionAccumulator`] is owned by one partition scan. It maps each candidate
//! breakend (position, orientation) to its [`JunctionData`]: the fragments attributed to
//! it by kind of evidence, the reads that define it, and the remote breakends its reads
//! point to.

use std::collections::BTreeMap;

use crate::config::ReadFilterConfig;
use crate::fragment::Fragment;
use crate::hotspot::HotspotCache;
use crate::partition::GenomeRegion;
use crate::read::{Orientation, Read, ReadType};
use crate::remote::{RemoteEvidence, merge_remote};
use crate::sam::record_utils::{cigar_reference_length, parse_cigar_string};

/// A (position, orientation) breakend within one chromosome.
pub type Breakend = (u32, Orientation);

/// How a fragment supports a junction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvidenceKind {
    /// A read clipped or split at the junction.
    Junction,
    /// A read soft-clipped exactly at the junction position.
    ExactSupport,
    /// A read on the junction's side of the break, near it.
    CandidateSupport,
}

impl EvidenceKind {
    /// Read type a supporting read is raised to.
    #[must_use]
    pub fn read_type(self) -> ReadType {
        match self {
            EvidenceKind::Junction => ReadType::Junction,
            EvidenceKind::ExactSupport => ReadType::ExactSupport,
            EvidenceKind::CandidateSupport => ReadType::Support,
        }
    }
}

/// Evidence that a junction's partner lies at a remote breakend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RemoteJunction {
    pub chromosome: String,
    pub position: u32,
    pub orientation: Orientation,
    pub fragment_count: u32,
}

impl RemoteJunction {
    #[must_use]
    pub fn new(chromosome: impl Into<String>, position: u32, orientation: Orientation) -> Self {
        Self { chromosome: chromosome.into(), position, orientation, fragment_count: 1 }
    }
}

impl RemoteEvidence for RemoteJunction {
    fn matches(&self, other: &Self) -> bool {
        self.chromosome == other.chromosome
            && self.position == other.position
            && self.orientation == other.orientation
    }

    fn absorb(&mut self, other: Self) {
        self.fragment_count += other.fragment_count;
    }
}

/// Evidence accumulated for one breakend.
#[derive(Debug, Clone)]
pub struct JunctionData {
    pub chromosome: String,
    pub position: u32,
    pub orientation: Orientation,
    pub junction_fragments: Vec<String>,
    pub exact_support_fragments: Vec<String>,
    pub candidate_support_fragments: Vec<String>,
    /// One read per junction fragment, in the order fragments were added.
    pub junction_reads: Vec<Read>,
    pub remote_junctions: Vec<RemoteJunction>,
    pub hotspot: bool,
    pub internal_indel: bool,
    pub discordant_group: bool,
    top_read: Option<usize>,
}

impl JunctionData {
    #[must_use]
    pub fn new(chromosome: impl Into<String>, position: u32, orientation: Orientation) -> Self {
        Self {
            chromosome: chromosome.into(),
            position,
            orientation,
            junction_fragments: Vec::new(),
            exact_support_fragments: Vec::new(),
            candidate_support_fragments: Vec::new(),
            junction_reads: Vec::new(),
            remote_junctions: Vec::new(),
            hotspot: false,
            internal_indel: false,
            discordant_group: false,
            top_read: None,
        }
    }

    #[must_use]
    pub fn breakend(&self) -> Breakend {
        (self.position, self.orientation)
    }

    #[must_use]
    pub fn junction_fragment_count(&self) -> usize {
        self.junction_fragments.len()
    }

    /// Records that a fragment supports this junction. Returns false if the fragment was
    /// already listed for this kind of evidence.
    pub fn add_evidence(&mut self, fragment_id: &str, read: &Read, kind: EvidenceKind) -> bool {
        let list = match kind {
            EvidenceKind::Junction => &mut self.junction_fragments,
            EvidenceKind::ExactSupport => &mut self.exact_support_fragments,
            EvidenceKind::CandidateSupport => &mut self.candidate_support_fragments,
        };
        if list.iter().any(|id| id == fragment_id) {
            return false;
        }
        list.push(fragment_id.to_string());
        if kind == EvidenceKind::Junction {
            self.junction_reads.push(read.clone());
        }
        true
    }

    /// Records a fragment backing this junction through a discordant group.
    pub fn add_discordant_support(&mut self, fragment_id: &str) {
        self.discordant_group = true;
        let known = self.junction_fragments.iter().chain(&self.candidate_support_fragments).any(|id| id == fragment_id);
        if !known {
            self.candidate_support_fragments.push(fragment_id.to_string());
        }
    }

    /// Merges a remote junction observation.
    pub fn add_remote_junction(&mut self, remote: RemoteJunction) {
        merge_remote(&mut self.remote_junctions, remote);
    }

    /// Picks the junction read with the most high-quality bases in the clip on the
    /// junction side. Ties keep the earliest read.
    pub fn select_top_read(&mut self, min_base_quality: u8) {
        self.top_read = match self.junction_reads.len() {
            0 => None,
            1 => Some(0),
            _ => {
                let left = self.orientation == Orientation::Reverse;
                let mut best = 0;
                let mut best_count = self.junction_reads[0].soft_clip_high_quality_bases(left, min_base_quality);
                for (index, read) in self.junction_reads.iter().enumerate().skip(1) {
                    let count = read.soft_clip_high_quality_bases(left, min_base_quality);
                    if count > best_count {
                        best = index;
                        best_count = count;
                    }
                }
                Some(best)
            }
        };
    }

    /// The representative read chosen by [`select_top_read`](Self::select_top_read).
    #[must_use]
    pub fn top_read(&self) -> Option<&Read> {
        self.top_read.and_then(|i| self.junction_reads.get(i))
    }
}

/// Junction evidence for one partition.
#[derive(Debug)]
pub struct JunctionAccumulator {
    region: GenomeRegion,
    junctions: BTreeMap<Breakend, JunctionData>,
}

impl JunctionAccumulator {
    #[must_use]
    pub fn new(region: GenomeRegion) -> Self {
        Self { region, junctions: BTreeMap::new() }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.junctions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.junctions.is_empty()
    }

    #[must_use]
    pub fn get(&self, breakend: &Breakend) -> Option<&JunctionData> {
        self.junctions.get(breakend)
    }

    pub fn iter(&self) -> impl Iterator<Item = &JunctionData> {
        self.junctions.values()
    }

    fn entry(&mut self, breakend: Breakend) -> &mut JunctionData {
        let chromosome = &self.region.chromosome;
        self.junctions
            .entry(breakend)
            .or_insert_with(|| JunctionData::new(chromosome.clone(), breakend.0, breakend.1))
    }

    /// Adds a fragment to the junction at `breakend`, creating the junction if needed.
    pub fn add_fragment(
        &mut self,
        fragment_id: &str,
        read: &Read,
        breakend: Breakend,
        kind: EvidenceKind,
    ) -> &mut JunctionData {
        let data = self.entry(breakend);
        data.add_evidence(fragment_id, read, kind);
        data
    }

    /// Merges a remote junction into the junction at `breakend`, creating it if needed.
    pub fn add_remote_junction(&mut self, breakend: Breakend, remote: RemoteJunction) {
        self.entry(breakend).add_remote_junction(remote);
    }

    /// Returns the junction at `breakend` flagged as discordant-group backed.
    pub fn discordant_junction(&mut self, breakend: Breakend) -> &mut JunctionData {
        let data = self.entry(breakend);
        data.discordant_group = true;
        data
    }

    /// Creates junctions from the junction reads of a fragment that lie in this partition.
    pub fn add_junction_reads(&mut self, fragment: &mut Fragment, config: &ReadFilterConfig) {
        let id = fragment.id().to_string();
        let mut attributed = Vec::new();
        let mut has_remote = false;

        for read in fragment.reads() {
            if read.read_type != ReadType::Junction || !self.region.contains(&read.chromosome, read.start) {
                continue;
            }
            let remotes = remote_junctions(read, config);
            for (breakend, internal) in junction_breakends(read, config) {
                let data = self.add_fragment(&id, read, breakend, EvidenceKind::Junction);
                data.internal_indel |= internal;
                if !internal {
                    for remote in &remotes {
                        data.add_remote_junction(remote.clone());
                        has_remote = true;
                    }
                }
                attributed.push(breakend);
            }
        }

        for breakend in attributed {
            fragment.add_junction_position(breakend);
        }
        fragment.has_remote_junction |= has_remote;
    }

    /// Attributes the candidate reads of a fragment to nearby junctions as exact or
    /// candidate support, raising their read types.
    pub fn add_supporting_reads(&mut self, fragment: &mut Fragment, max_distance: u32) {
        let id = fragment.id().to_string();
        let mut attributed = Vec::new();

        for read in fragment.reads_mut() {
            let candidate = matches!(
                read.read_type,
                ReadType::CandidateSupport | ReadType::Support | ReadType::ExactSupport
            );
            if !candidate || !self.region.contains(&read.chromosome, read.start) {
                continue;
            }

            let low = read.unclipped_start.saturating_sub(max_distance);
            let high = read.unclipped_end.saturating_add(max_distance);
            for (breakend, data) in
                self.junctions.range_mut((low, Orientation::Forward)..=(high, Orientation::Reverse))
            {
                if data.junction_fragments.iter().any(|f| *f == id) {
                    continue;
                }
                let Some(kind) = support_kind(read, *breakend) else { continue };
                if data.add_evidence(&id, read, kind) {
                    read.raise_type(kind.read_type());
                    attributed.push(*breakend);
                }
            }
        }

        for breakend in attributed {
            fragment.add_junction_position(breakend);
        }
    }

    /// Flags hotspots, drops junctions without enough support and picks top reads.
    /// Returns the number of junctions dropped.
    pub fn filter_junctions(&mut self, config: &ReadFilterConfig, hotspots: &HotspotCache) -> usize {
        let before = self.junctions.len();
        for data in self.junctions.values_mut() {
            data.hotspot = hotspots.is_hotspot(&data.chromosome, data.position, data.orientation);
        }
        self.junctions.retain(|_, data| {
            let required = if data.hotspot {
                config.hotspot_min_junction_frags
            } else {
                config.min_junction_frags
            };
            data.discordant_group || data.junction_fragment_count() >= required as usize
        });
        for data in self.junctions.values_mut() {
            data.select_top_read(config.high_base_quality);
        }
        before - self.junctions.len()
    }

    /// Junctions in position order.
    #[must_use]
    pub fn into_junctions(self) -> Vec<JunctionData> {
        self.junctions.into_values().collect()
    }
}

/// Breakends a junction read defines, each flagged true when it comes from an indel.
#[must_use]
pub fn junction_breakends(read: &Read, config: &ReadFilterConfig) -> Vec<(Breakend, bool)> {
    let mut breakends = Vec::new();

    let long_indel = read.max_indel >= config.min_indel_length;
    let clip = read.max_soft_clip();
    if clip >= config.min_soft_clip_length
        || (clip >= crate::classifier::MIN_LINE_SOFT_CLIP_LENGTH && !long_indel)
    {
        let breakend = if read.is_left_clipped() {
            (read.start, Orientation::Reverse)
        } else {
            (read.end, Orientation::Forward)
        };
        breakends.push((breakend, false));
    }

    if long_indel {
        if let Some((before, after)) = read.max_indel_flanks {
            breakends.push(((before, Orientation::Forward), true));
            breakends.push(((after, Orientation::Reverse), true));
        }
    }

    breakends
}

/// Remote breakends implied by a junction read's supplementary alignments or, for
/// discordant pairs without one, by its mate.
#[must_use]
pub fn remote_junctions(read: &Read, config: &ReadFilterConfig) -> Vec<RemoteJunction> {
    if !read.supplementaries.is_empty() {
        return read
            .supplementaries
            .iter()
            .map(|sa| {
                let (position, orientation) = sa.breakend();
                RemoteJunction::new(sa.chromosome.clone(), position, orientation)
            })
            .collect();
    }

    let discordant = read.is_paired()
        && !read.is_mate_unmapped()
        && (read.is_translocation()
            || read.insert_size.unsigned_abs() > config.observed_fragment_length_max
            || read.is_same_strand_pair());
    let Some(mate_chromosome) = read.mate_chromosome.as_deref().filter(|_| discordant) else {
        return Vec::new();
    };

    let breakend = match read.mate_orientation() {
        Orientation::Reverse => (read.mate_start, Orientation::Reverse),
        Orientation::Forward => {
            let mate_length = read
                .mate_cigar
                .as_deref()
                .map(|mc| cigar_reference_length(&parse_cigar_string(mc)) as u32)
                .filter(|len| *len > 0)
                .unwrap_or(read.aligned_bases.max(1));
            (read.mate_start + mate_length - 1, Orientation::Forward)
        }
    };
    vec![RemoteJunction::new(mate_chromosome, breakend.0, breakend.1)]
}

/// How a candidate read supports the junction at `breakend`, if at all.
fn support_kind(read: &Read, breakend: Breakend) -> Option<EvidenceKind> {
    let (position, orientation) = breakend;
    match orientation {
        Orientation::Forward => {
            if read.right_soft_clip > 0 && read.end == position {
                Some(EvidenceKind::ExactSupport)
            } else if read.start <= position {
                Some(EvidenceKind::CandidateSupport)
            } else {
                None
            }
        }
        Orientation::Reverse => {
            if read.left_soft_clip > 0 && read.start == position {
                Some(EvidenceKind::ExactSupport)
            } else if read.end >= position {
                Some(EvidenceKind::CandidateSupport)
            } else {
                None
            }
        }
    }
}
