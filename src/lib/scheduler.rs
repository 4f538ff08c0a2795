//! Parallel partition scheduling.
//!
//! Tasks are pushed onto a lock-free queue and drained by a fixed pool of scoped worker
//! threads. Each worker opens its own [`AlignmentSource`], scans partitions until the
//! queue is empty, folds its counters into the shared [`StatsAggregator`] and sends the
//! partition result back to the calling thread.
//!
//! The first failure is stored and raises a flag that every worker checks between
//! partitions (and the scanner checks between records), so the remaining work is
//! abandoned promptly. The stored error is returned once all workers have joined.

use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::Sender;
use crossbeam_queue::SegQueue;
use parking_lot::Mutex;

use crate::bam_io::{AlignmentSource, AlignmentSourceFactory};
use crate::config::ScanConfig;
use crate::discordant::DiscordantGroup;
use crate::errors::{Result, SvPrepError};
use crate::fragment::Fragment;
use crate::hotspot::HotspotCache;
use crate::junction::JunctionData;
use crate::partition::PartitionTask;
use crate::progress::ProgressTracker;
use crate::scanner::{PartitionResult, PartitionScanner};
use crate::spanning_cache::{SpanningCache, SpanningCacheCounters};
use crate::stats::{CombinedStats, PartitionStats, StatsAggregator};

/// Partitions completed between progress messages.
const PROGRESS_LOG_INTERVAL: u64 = 100;

/// Shared failure state for one run.
#[derive(Debug, Default)]
pub struct ScanState {
    /// Set once any worker fails; checked by every worker.
    pub error_flag: AtomicBool,
    /// The first error recorded.
    error: Mutex<Option<SvPrepError>>,
}

impl ScanState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error and signals workers to stop. Later errors are dropped.
    pub fn set_error(&self, error: SvPrepError) {
        self.error_flag.store(true, Ordering::SeqCst);
        let mut guard = self.error.lock();
        if guard.is_none() {
            *guard = Some(error);
        }
    }

    #[must_use]
    pub fn has_error(&self) -> bool {
        self.error_flag.load(Ordering::Relaxed)
    }

    pub fn take_error(&self) -> Option<SvPrepError> {
        self.error.lock().take()
    }
}

/// Extracts a message from a thread panic payload.
#[must_use]
pub fn extract_panic_message(panic_info: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Output of a complete run.
#[derive(Debug)]
pub struct ScanResults {
    /// Per-partition results ordered by task id.
    pub partitions: Vec<PartitionResult>,
    /// Interesting fragments still cached after every partition ran, ordered by id.
    pub leftover_fragments: Vec<Fragment>,
    pub stats: CombinedStats,
    pub cache_counters: SpanningCacheCounters,
}

impl ScanResults {
    /// Retained junctions in partition order.
    pub fn junctions(&self) -> impl Iterator<Item = &JunctionData> {
        self.partitions.iter().flat_map(|p| p.junctions.iter())
    }

    pub fn discordant_groups(&self) -> impl Iterator<Item = &DiscordantGroup> {
        self.partitions.iter().flat_map(|p| p.discordant_groups.iter())
    }

    /// Every emitted fragment: completed ones in partition order, then leftovers.
    pub fn fragments(&self) -> impl Iterator<Item = &Fragment> {
        self.partitions.iter().flat_map(|p| p.fragments.iter()).chain(self.leftover_fragments.iter())
    }
}

/// Runs partition scans on a worker pool.
#[derive(Debug, Clone)]
pub struct PartitionScheduler {
    config: ScanConfig,
}

impl PartitionScheduler {
    #[must_use]
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scans every task and reconciles fragments through `cache`.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any worker. Results of partitions that completed
    /// before the failure are discarded.
    pub fn run<F: AlignmentSourceFactory>(
        &self,
        tasks: Vec<PartitionTask>,
        factory: &F,
        hotspots: &HotspotCache,
        cache: &SpanningCache,
    ) -> Result<ScanResults> {
        self.config.validate()?;

        let task_count = tasks.len();
        let queue = SegQueue::new();
        for task in tasks {
            queue.push(task);
        }

        let threads = self.config.threads.min(task_count).max(1);
        log::info!("Scanning {task_count} partitions with {threads} threads");

        let scanner = PartitionScanner::new(self.config.filters.clone(), cache, hotspots);
        let state = ScanState::new();
        let aggregator = StatsAggregator::new();
        let progress = ProgressTracker::new("Scanned partitions")
            .with_interval(PROGRESS_LOG_INTERVAL)
            .with_total(task_count as u64);

        let mut partitions: Vec<PartitionResult> = std::thread::scope(|scope| {
            let (tx, rx) = crossbeam_channel::unbounded();
            let handles: Vec<_> = (0..threads)
                .map(|worker| {
                    let tx = tx.clone();
                    let worker_ctx = Worker {
                        id: worker,
                        queue: &queue,
                        scanner: &scanner,
                        state: &state,
                        aggregator: &aggregator,
                        progress: &progress,
                    };
                    scope.spawn(move || worker_ctx.run(factory, &tx))
                })
                .collect();
            drop(tx);

            let results: Vec<PartitionResult> = rx.iter().collect();
            for (worker, handle) in handles.into_iter().enumerate() {
                if let Err(panic_info) = handle.join() {
                    let reason = extract_panic_message(panic_info);
                    log::error!("Worker {worker} panicked: {reason}");
                    state.set_error(SvPrepError::WorkerFailed { worker, reason });
                }
            }
            results
        });

        if let Some(error) = state.take_error() {
            return Err(error);
        }
        progress.log_final();

        let mut leftover_fragments = cache.finalize();
        let before = leftover_fragments.len();
        leftover_fragments.retain(Fragment::is_interesting);
        for fragment in &mut leftover_fragments {
            fragment.mark_written();
        }
        aggregator.merge_reads(&PartitionStats {
            uninteresting_fragments: (before - leftover_fragments.len()) as u64,
            ..Default::default()
        });
        if !leftover_fragments.is_empty() {
            log::debug!("{} fragments left incomplete after all partitions", leftover_fragments.len());
        }

        partitions.sort_by_key(|p| p.task.id);
        Ok(ScanResults {
            partitions,
            leftover_fragments,
            stats: aggregator.into_inner(),
            cache_counters: cache.counters(),
        })
    }
}

/// Borrowed run state for one worker thread.
struct Worker<'s, 'a> {
    id: usize,
    queue: &'s SegQueue<PartitionTask>,
    scanner: &'s PartitionScanner<'a>,
    state: &'s ScanState,
    aggregator: &'s StatsAggregator,
    progress: &'s ProgressTracker,
}

impl Worker<'_, '_> {
    fn run<F: AlignmentSourceFactory>(self, factory: &F, tx: &Sender<PartitionResult>) {
        let mut source = match factory.open() {
            Ok(source) => source,
            Err(e) => {
                self.state.set_error(SvPrepError::WorkerFailed { worker: self.id, reason: format!("{e:#}") });
                return;
            }
        };

        while !self.state.has_error() {
            let Some(task) = self.queue.pop() else { break };
            if !self.scan_one(&task, &mut source, tx) {
                break;
            }
        }
    }

    /// Scans one task. Returns false when the worker should stop.
    fn scan_one<S: AlignmentSource>(
        &self,
        task: &PartitionTask,
        source: &mut S,
        tx: &Sender<PartitionResult>,
    ) -> bool {
        match self.scanner.scan(task, source, &self.state.error_flag) {
            Ok(result) => {
                self.aggregator.merge(&result.stats, &result.discordant_stats, result.elapsed);
                self.progress.log_if_needed(1);
                tx.send(result).is_ok()
            }
            Err(e) => {
                if !matches!(e.downcast_ref::<SvPrepError>(), Some(SvPrepError::Cancelled)) {
                    log::error!("Partition {} ({}) failed: {e:#}", task.id, task.region);
                    self.state.set_error(SvPrepError::PartitionFailed {
                        partition_id: task.id,
                        region: task.region.to_string(),
                        reason: format!("{e:#}"),
                    });
                }
                false
            }
        }
    }
}
