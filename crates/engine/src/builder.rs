//! Sharded index builder
//!
//! Postings are accumulated in memory. When the accumulator reaches the
//! configured term ceiling it is handed to the worker pool as a new shard
//! and ingestion continues into a fresh accumulator. Each worker flushes its
//! shard, submits it to the [`MergeCoordinator`], then merges pairs for as
//! long as the coordinator hands them out. [`ShardedIndexBuilder::finish`]
//! waits for the single surviving shard and installs it as the canonical
//! index.
//!
//! A corpus that never reaches the ceiling is flushed directly on the calling
//! thread, without the pool or any merge.

use crate::config::QuarryConfig;
use crate::coordinator::{MergeCoordinator, Stage};
use crate::merge::merge_shards;
use crate::pool::{Backpressure, PoolSummary, WorkerPool};
use quarry_core::{DocId, Document, Error, Result, ShardId};
use quarry_storage::documents::remove_file_if_present;
use quarry_storage::{Accumulator, DocumentLog, IndexLayout, Partition, PartitionIndex};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Summary of a finished build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Shards flushed to disk
    pub shards: usize,
    /// Pairwise merges performed
    pub merges: usize,
    /// Distinct terms in the canonical index
    pub terms: u64,
    /// Documents registered
    pub documents: usize,
    /// Shards flushed by pool threads
    pub pool_tasks: u64,
    /// Shards flushed on the ingesting thread because the pool queue was full
    pub inline_flushes: usize,
}

/// Builds an on-disk index from a stream of postings
pub struct ShardedIndexBuilder {
    config: QuarryConfig,
    layout: IndexLayout,
    accumulator: Accumulator,
    documents: DocumentLog,
    document_count: usize,
    coordinator: Arc<MergeCoordinator>,
    pool: Option<WorkerPool>,
    inline_flushes: usize,
}

impl ShardedIndexBuilder {
    /// Start a build in `layout`, discarding any previous document metadata
    pub fn new(layout: IndexLayout, config: QuarryConfig) -> Result<Self> {
        config.validate()?;
        std::fs::create_dir_all(layout.root())?;
        let documents = DocumentLog::create(layout.docinfo_path())?;
        remove_file_if_present(&layout.norms_path())?;
        info!(
            target: "quarry::build",
            root = %layout.root().display(),
            table_size = config.table_size,
            max_terms_per_shard = config.max_terms_per_shard,
            "Starting index build"
        );

        Ok(ShardedIndexBuilder {
            config,
            layout,
            accumulator: Accumulator::new(),
            documents,
            document_count: 0,
            coordinator: Arc::new(MergeCoordinator::new()),
            pool: None,
            inline_flushes: 0,
        })
    }

    /// Directory being built
    pub fn layout(&self) -> &IndexLayout {
        &self.layout
    }

    /// Configuration in use
    pub fn config(&self) -> &QuarryConfig {
        &self.config
    }

    /// Record an occurrence of `term` at token `offset` of `doc`
    pub fn insert(&mut self, term: &str, doc: DocId, offset: u32) -> Result<()> {
        self.accumulator.insert(term, doc, offset)?;
        if self.accumulator.len() >= self.config.max_terms_per_shard {
            self.spill()?;
        }
        Ok(())
    }

    /// Record document metadata; ids must be strictly increasing
    pub fn register_document(&mut self, doc: Document) -> Result<()> {
        self.documents.register(doc)?;
        self.document_count += 1;
        Ok(())
    }

    /// Distinct terms currently held in memory
    pub fn pending_terms(&self) -> usize {
        self.accumulator.len()
    }

    /// Hand the current accumulator to a worker as a new shard
    fn spill(&mut self) -> Result<()> {
        self.documents.append_pending()?;
        if self.pool.is_none() {
            self.pool = Some(WorkerPool::new(
                self.config.worker_threads,
                self.config.max_queue_depth,
            )?);
        }

        let shard = self.coordinator.shard_started();
        let task = ShardTask {
            layout: self.layout.clone(),
            table_size: self.config.table_size,
            coordinator: Arc::clone(&self.coordinator),
            shard,
            accumulator: self.accumulator.take(),
        };
        debug!(target: "quarry::build", shard, terms = task.accumulator.len(), "Spilling shard");

        if let Some(pool) = &self.pool {
            if let Err(Backpressure(task)) = pool.submit(move || task.run()) {
                warn!(target: "quarry::build", shard, "Worker queue full, flushing inline");
                self.inline_flushes += 1;
                task();
            }
        }
        Ok(())
    }

    /// Flush what remains, wait for all merges, and install the result
    pub fn finish(mut self) -> Result<BuildReport> {
        self.documents.append_pending()?;

        let report = if self.pool.is_none() {
            self.finish_single()?
        } else {
            self.finish_sharded()?
        };

        info!(
            target: "quarry::build",
            shards = report.shards,
            merges = report.merges,
            terms = report.terms,
            documents = report.documents,
            "Index build complete"
        );
        Ok(report)
    }

    fn finish_single(&mut self) -> Result<BuildReport> {
        let shard = self.coordinator.shard_started();
        let terms = flush_shard(
            &self.layout,
            shard,
            self.config.table_size,
            self.accumulator.take(),
        )?;
        self.layout.install(shard)?;
        Ok(BuildReport {
            shards: 1,
            merges: 0,
            terms,
            documents: self.document_count,
            ..Default::default()
        })
    }

    fn finish_sharded(&mut self) -> Result<BuildReport> {
        // The remainder becomes the last shard even when empty
        self.spill()?;
        self.coordinator.seal();
        let outcome = self.coordinator.wait_for_final();
        let summary = match self.pool.take() {
            Some(mut pool) => pool.close(),
            None => PoolSummary::default(),
        };
        if summary.panicked > 0 {
            warn!(target: "quarry::build", panicked = summary.panicked, "Pool tasks panicked during build");
        }

        let final_shard = outcome?;
        self.layout.install(final_shard.id)?;
        let stats = self.coordinator.stats();
        Ok(BuildReport {
            shards: stats.shards,
            merges: stats.merges,
            terms: final_shard.terms,
            documents: self.document_count,
            pool_tasks: summary.completed + summary.panicked,
            inline_flushes: self.inline_flushes,
        })
    }
}

/// Flush one accumulator as shard `shard`, returning its term count
fn flush_shard(
    layout: &IndexLayout,
    shard: ShardId,
    table_size: u64,
    accumulator: Accumulator,
) -> Result<u64> {
    let mut index = PartitionIndex::create(layout, Partition::Shard(shard), table_size)?
        .with_accumulator(accumulator);
    let stats = index.flush()?;
    Ok(stats.terms as u64)
}

/// Run `f`, turning a panic into a build error
fn guarded<T>(what: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(panic) => {
            let msg = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "(non-string panic)".to_string());
            Err(Error::Build(format!("{} panicked: {}", what, msg)))
        }
    }
}

/// Work item submitted to the pool for one spilled accumulator
struct ShardTask {
    layout: IndexLayout,
    table_size: u64,
    coordinator: Arc<MergeCoordinator>,
    shard: ShardId,
    accumulator: Accumulator,
}

impl ShardTask {
    fn run(self) {
        let ShardTask {
            layout,
            table_size,
            coordinator,
            shard,
            accumulator,
        } = self;

        match guarded("flush", || flush_shard(&layout, shard, table_size, accumulator)) {
            Ok(terms) => coordinator.submit_shard(shard, terms),
            Err(e) => {
                error!(target: "quarry::build", shard, error = %e, "Shard flush failed");
                coordinator.report_failure(Stage::Flush(shard), e.to_string());
                return;
            }
        }
        merge_loop(&coordinator, &layout, table_size);
    }
}

/// Merge pairs until the coordinator has none to hand out
fn merge_loop(coordinator: &MergeCoordinator, layout: &IndexLayout, table_size: u64) {
    while let Some(ticket) = coordinator.request_pair() {
        match guarded("merge", || merge_shards(layout, &ticket, table_size)) {
            Ok(stats) => coordinator.report_merge_done(ticket, stats.terms),
            Err(e) => {
                error!(target: "quarry::merge", ?ticket, error = %e, "Merge failed");
                coordinator.report_failure(Stage::Merge(ticket), e.to_string());
                return;
            }
        }
    }
}
