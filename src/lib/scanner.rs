//! Single-partition scan.
//!
//! [`PartitionScanner::scan`] turns the alignments of one partition into junctions,
//! discordant groups and completed fragments:
//!
//! 1. Fragments waiting in the [`SpanningCache`] for this partition are resolved.
//! 2. Records starting in the partition are classified and grouped by read name.
//! 3. Junction reads create junctions; candidate reads are attributed to nearby junctions.
//! 4. Discordant pairs with no junction are clustered; well-supported clusters become
//!    junctions of their own.
//! 5. Complete fragments, and fragments expecting no reads from elsewhere, are emitted;
//!    the rest go to the spanning cache.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use ahash::AHashMap;
use anyhow::{Context, Result};

use crate::bam_io::AlignmentSource;
use crate::classifier::ReadClassifier;
use crate::config::ReadFilterConfig;
use crate::discordant::{DiscordantAccumulator, DiscordantGroup, DiscordantStats};
use crate::errors::SvPrepError;
use crate::fragment::Fragment;
use crate::hotspot::HotspotCache;
use crate::junction::{JunctionAccumulator, JunctionData, RemoteJunction};
use crate::partition::PartitionTask;
use crate::read::{Read, ReadType};
use crate::spanning_cache::SpanningCache;
use crate::stats::PartitionStats;

/// Records processed between cancellation checks.
const CANCEL_CHECK_INTERVAL: usize = 10_000;

/// Everything one partition produced.
#[derive(Debug)]
pub struct PartitionResult {
    pub task: PartitionTask,
    /// Retained junctions in position order.
    pub junctions: Vec<JunctionData>,
    pub discordant_groups: Vec<DiscordantGroup>,
    /// Interesting fragments completed by this partition, locally or through the cache.
    pub fragments: Vec<Fragment>,
    pub stats: PartitionStats,
    pub discordant_stats: DiscordantStats,
    pub elapsed: Duration,
}

/// Scans partitions against a shared spanning cache.
#[derive(Debug)]
pub struct PartitionScanner<'a> {
    classifier: ReadClassifier,
    cache: &'a SpanningCache,
    hotspots: &'a HotspotCache,
}

/// Fragments of one partition in first-seen order.
#[derive(Default)]
struct FragmentTable {
    index: AHashMap<String, usize>,
    fragments: Vec<Fragment>,
}

impl FragmentTable {
    fn add_read(&mut self, read: Read) {
        match self.index.get(&read.id) {
            Some(&i) => self.fragments[i].add_read(read),
            None => {
                self.index.insert(read.id.clone(), self.fragments.len());
                self.fragments.push(Fragment::from_read(read));
            }
        }
    }

    fn merge(&mut self, fragment: Fragment) {
        match self.index.get(fragment.id()) {
            Some(&i) => self.fragments[i].merge(fragment),
            None => {
                self.index.insert(fragment.id().to_string(), self.fragments.len());
                self.fragments.push(fragment);
            }
        }
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Fragment> {
        let i = *self.index.get(id)?;
        self.fragments.get_mut(i)
    }
}

impl<'a> PartitionScanner<'a> {
    #[must_use]
    pub fn new(config: ReadFilterConfig, cache: &'a SpanningCache, hotspots: &'a HotspotCache) -> Self {
        Self { classifier: ReadClassifier::new(config), cache, hotspots }
    }

    #[must_use]
    pub fn config(&self) -> &ReadFilterConfig {
        self.classifier.config()
    }

    /// Scans one partition.
    ///
    /// # Errors
    ///
    /// Returns an error if the source fails, or [`SvPrepError::Cancelled`] once
    /// `cancelled` is set.
    pub fn scan<S: AlignmentSource>(
        &self,
        task: &PartitionTask,
        source: &mut S,
        cancelled: &AtomicBool,
    ) -> Result<PartitionResult> {
        let started = Instant::now();
        let region = &task.region;
        let mut stats = PartitionStats::default();

        if cancelled.load(Ordering::Relaxed) {
            return Err(SvPrepError::Cancelled.into());
        }

        let waiting = self.cache.resolve(&task.key);
        let records =
            source.records(region).with_context(|| format!("Failed to read alignments for {region}"))?;

        let mut table = FragmentTable::default();
        for (i, record) in records.into_iter().enumerate() {
            if i % CANCEL_CHECK_INTERVAL == 0 && cancelled.load(Ordering::Relaxed) {
                return Err(SvPrepError::Cancelled.into());
            }
            stats.total_records += 1;
            if record.is_skippable() {
                stats.skipped_records += 1;
                continue;
            }
            if !region.contains(&record.chromosome, record.alignment_start) {
                stats.outside_partition_records += 1;
                continue;
            }

            let mut read = Read::from_record(record);
            self.classifier.classify(&mut read);
            stats.record_filters(&read);
            table.add_read(read);
        }
        stats.fragments = table.fragments.len() as u64;

        for fragment in waiting {
            table.merge(fragment);
        }

        let config = self.classifier.config();
        let mut junctions = JunctionAccumulator::new(region.clone());
        for fragment in table.fragments.iter_mut().filter(|f| f.is_interesting()) {
            junctions.add_junction_reads(fragment, config);
        }
        for fragment in table.fragments.iter_mut().filter(|f| f.is_interesting()) {
            junctions.add_supporting_reads(fragment, config.min_supporting_read_distance);
        }

        let (discordant_groups, discordant_stats) = self.find_discordant_groups(&table, task);
        self.add_discordant_junctions(&discordant_groups, &mut junctions, &mut table);

        stats.candidate_junctions = junctions.len() as u64;
        junctions.filter_junctions(config, self.hotspots);
        stats.junctions = junctions.len() as u64;
        stats.discordant_groups = discordant_groups.len() as u64;

        let fragments = self.emit_fragments(table, task, &mut stats);

        let elapsed = started.elapsed();
        log::debug!(
            "Partition {} ({region}): {} reads, {} junctions, {} fragments emitted in {:.2?}",
            task.id,
            stats.reads,
            stats.junctions,
            fragments.len(),
            elapsed
        );

        Ok(PartitionResult {
            task: task.clone(),
            junctions: junctions.into_junctions(),
            discordant_groups,
            fragments,
            stats,
            discordant_stats,
            elapsed,
        })
    }

    /// Clusters the in-partition primary reads of interesting fragments that are not
    /// attributed to any junction and whose pair is discordant.
    fn find_discordant_groups(
        &self,
        table: &FragmentTable,
        task: &PartitionTask,
    ) -> (Vec<DiscordantGroup>, DiscordantStats) {
        let mut discordant = DiscordantAccumulator::new();
        for fragment in &table.fragments {
            if !fragment.is_interesting() || !fragment.junction_positions.is_empty() {
                continue;
            }
            let read = fragment.reads().iter().find(|r| {
                !r.is_supplementary()
                    && task.region.contains(&r.chromosome, r.start)
                    && self.classifier.is_discordant(r)
            });
            if let Some(read) = read {
                discordant.add_fragment(fragment.id(), read);
            }
        }
        discordant.into_parts()
    }

    /// Turns groups with enough fragments and a well-supported remote region into
    /// junctions backed by discordant pairs.
    fn add_discordant_junctions(
        &self,
        groups: &[DiscordantGroup],
        junctions: &mut JunctionAccumulator,
        table: &mut FragmentTable,
    ) {
        let min_fragments = self.classifier.config().min_junction_frags;
        for group in groups {
            if group.fragment_ids.len() < min_fragments as usize {
                continue;
            }
            let remotes: Vec<_> = group.valid_remote_regions(min_fragments).cloned().collect();
            if remotes.is_empty() {
                continue;
            }

            let breakend = group.breakend();
            let data = junctions.discordant_junction(breakend);
            for id in &group.fragment_ids {
                data.add_discordant_support(id);
            }
            for remote in remotes {
                let (position, orientation) = remote.breakend();
                let mut junction = RemoteJunction::new(remote.chromosome, position, orientation);
                junction.fragment_count = remote.read_count;
                data.add_remote_junction(junction);
            }

            for id in &group.fragment_ids {
                if let Some(fragment) = table.get_mut(id) {
                    fragment.add_junction_position(breakend);
                    fragment.has_remote_junction = true;
                    for read in fragment.reads_mut() {
                        if read.read_type == ReadType::CandidateSupport {
                            read.raise_type(ReadType::Support);
                        }
                    }
                }
            }
        }
    }

    /// Emits complete interesting fragments. Fragments with no reads expected from another
    /// partition are resolved here; the rest go to the spanning cache.
    fn emit_fragments(
        &self,
        table: FragmentTable,
        task: &PartitionTask,
        stats: &mut PartitionStats,
    ) -> Vec<Fragment> {
        let mut emitted = Vec::new();
        for mut fragment in table.fragments {
            for read in fragment.reads() {
                if task.region.contains(&read.chromosome, read.start) {
                    stats.record_read_type(read.read_type);
                }
            }

            let completed = if fragment.is_complete() {
                stats.local_complete_fragments += 1;
                Some(fragment)
            } else if fragment.remote_partitions(self.cache.partition_size()).is_empty() {
                stats.locally_resolved_fragments += 1;
                fragment.mark_incomplete();
                Some(fragment)
            } else {
                stats.spanning_fragments += 1;
                let merged = self.cache.register(fragment);
                if merged.is_some() {
                    stats.spanning_completed_fragments += 1;
                }
                merged
            };

            match completed {
                Some(mut fragment) if fragment.is_interesting() => {
                    fragment.mark_written();
                    emitted.push(fragment);
                }
                Some(_) => stats.uninteresting_fragments += 1,
                None => {}
            }
        }
        emitted
    }
}
