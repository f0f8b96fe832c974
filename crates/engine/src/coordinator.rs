//! Merge coordinator
//!
//! Owns every piece of state shared by the build workers: the FIFO of shard
//! ids awaiting a partner, counters of in-flight flushes and merges, id
//! allocation, and the sealed flag. Workers talk to it through messages; the
//! final-merge predicate is evaluated only here, under one lock.
//!
//! A worker that submits a shard, or finishes a merge, keeps calling
//! [`MergeCoordinator::request_pair`] until it gets `None`. Since every push
//! onto the queue is followed by such a loop, the queue never holds two ids
//! while no worker is about to pair them.

use parking_lot::{Condvar, Mutex};
use quarry_core::{Error, Result, ShardId};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Two shards to merge into a freshly allocated output shard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeTicket {
    /// Shard streamed first; its offsets come first on overlap
    pub left: ShardId,
    /// Shard probed for each left term
    pub right: ShardId,
    /// Id of the merged shard
    pub output: ShardId,
}

/// Build step that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Flushing a shard
    Flush(ShardId),
    /// Merging a pair
    Merge(MergeTicket),
}

/// The surviving shard once the build is complete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalShard {
    /// Shard id
    pub id: ShardId,
    /// Distinct terms it holds
    pub terms: u64,
}

/// Counters reported at the end of a build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoordinatorStats {
    /// Shard flushes started
    pub shards: usize,
    /// Merges completed
    pub merges: usize,
}

#[derive(Debug, Default)]
struct State {
    queue: VecDeque<ShardId>,
    terms: FxHashMap<ShardId, u64>,
    next_id: ShardId,
    started: usize,
    finished: usize,
    merging: usize,
    merges_done: usize,
    sealed: bool,
    failure: Option<String>,
}

impl State {
    fn quiescent(&self) -> bool {
        self.started == self.finished && self.merging == 0
    }

    fn is_final(&self) -> bool {
        self.sealed && self.quiescent() && (self.queue.len() <= 1 || self.failure.is_some())
    }
}

/// Coordinates shard flushes and pairwise merges
#[derive(Debug, Default)]
pub struct MergeCoordinator {
    state: Mutex<State>,
    changed: Condvar,
}

impl MergeCoordinator {
    /// Create an idle coordinator
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id for a shard about to be flushed and count it in flight
    pub fn shard_started(&self) -> ShardId {
        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.started += 1;
        id
    }

    /// A shard finished flushing and is ready to be paired
    pub fn submit_shard(&self, shard: ShardId, terms: u64) {
        let mut state = self.state.lock();
        state.finished += 1;
        state.terms.insert(shard, terms);
        state.queue.push_back(shard);
        debug!(target: "quarry::merge", shard, terms, queued = state.queue.len(), "Shard submitted");
        self.changed.notify_all();
    }

    /// Take two queued shards to merge, if available
    ///
    /// Returns `None` once any failure has been recorded.
    pub fn request_pair(&self) -> Option<MergeTicket> {
        let mut state = self.state.lock();
        if state.failure.is_some() || state.queue.len() < 2 {
            return None;
        }
        let left = state.queue.pop_front()?;
        let right = state.queue.pop_front()?;
        let output = state.next_id;
        state.next_id += 1;
        state.merging += 1;
        Some(MergeTicket {
            left,
            right,
            output,
        })
    }

    /// A merge finished; its output joins the queue
    pub fn report_merge_done(&self, ticket: MergeTicket, terms: u64) {
        let mut state = self.state.lock();
        state.merging -= 1;
        state.merges_done += 1;
        state.terms.remove(&ticket.left);
        state.terms.remove(&ticket.right);
        state.terms.insert(ticket.output, terms);
        state.queue.push_back(ticket.output);
        self.changed.notify_all();
    }

    /// A flush or merge failed; the build will report the first failure
    pub fn report_failure(&self, stage: Stage, reason: impl Into<String>) {
        let reason = reason.into();
        let mut state = self.state.lock();
        match stage {
            Stage::Flush(_) => state.finished += 1,
            Stage::Merge(_) => state.merging -= 1,
        }
        warn!(target: "quarry::merge", ?stage, reason = %reason, "Build step failed");
        if state.failure.is_none() {
            state.failure = Some(format!("{:?}: {}", stage, reason));
        }
        self.changed.notify_all();
    }

    /// No further shards will be started
    pub fn seal(&self) {
        let mut state = self.state.lock();
        state.sealed = true;
        self.changed.notify_all();
    }

    /// Block until every shard has been merged into one
    ///
    /// Requires a prior [`seal`](Self::seal). Fails with the first recorded
    /// failure, once all in-flight work has stopped.
    pub fn wait_for_final(&self) -> Result<FinalShard> {
        let mut state = self.state.lock();
        if !state.sealed {
            return Err(Error::Build("wait_for_final called before seal".into()));
        }
        while !state.is_final() {
            self.changed.wait(&mut state);
        }

        if let Some(failure) = &state.failure {
            return Err(Error::Build(failure.clone()));
        }
        let id = state
            .queue
            .front()
            .copied()
            .ok_or_else(|| Error::Build("build finished without any shard".into()))?;
        Ok(FinalShard {
            id,
            terms: state.terms.get(&id).copied().unwrap_or(0),
        })
    }

    /// Current counters
    pub fn stats(&self) -> CoordinatorStats {
        let state = self.state.lock();
        CoordinatorStats {
            shards: state.started,
            merges: state.merges_done,
        }
    }
}
