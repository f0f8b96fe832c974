//! Two-way external merge of shard partitions
//!
//! The left shard is streamed blob by blob; each term is probed in the right
//! shard's dictionary. Terms found in both are merged by a docID walk, terms
//! found only on the left are copied verbatim. Afterwards the right shard is
//! streamed and every term not already handled is copied. Both inputs are
//! deleted once the output is synced.

use crate::coordinator::MergeTicket;
use quarry_core::postings::{encode_blob, split_blob};
use quarry_core::{PostingsList, Result};
use quarry_storage::{IndexLayout, Partition, PartitionIndex};
use rustc_hash::FxHashSet;
use tracing::info;

/// Counters reported by one merge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Distinct terms in the output
    pub terms: u64,
    /// Terms present in both inputs
    pub overlapping: u64,
    /// Dictionary collisions while writing the output
    pub collisions: u64,
}

/// Merge the shards named by `ticket` into its output shard
pub fn merge_shards(layout: &IndexLayout, ticket: &MergeTicket, table_size: u64) -> Result<MergeStats> {
    let left = PartitionIndex::open(layout, Partition::Shard(ticket.left))?;
    let mut right = PartitionIndex::open(layout, Partition::Shard(ticket.right))?;
    let mut output = PartitionIndex::create(layout, Partition::Shard(ticket.output), table_size)?;
    let mut handled: FxHashSet<String> = FxHashSet::default();
    let mut stats = MergeStats::default();

    for blob in left.scan()? {
        let blob = blob?;
        let (term, encoded) = split_blob(&blob)?;
        match right.lookup_blob(term)? {
            Some(other) => {
                let (_, other_encoded) = split_blob(&other)?;
                let merged = encoded
                    .parse::<PostingsList>()?
                    .merge(other_encoded.parse()?);
                stats.collisions += output.append_blob(term, &encode_blob(term, &merged))?;
                handled.insert(term.to_string());
                stats.overlapping += 1;
            }
            None => stats.collisions += output.append_blob(term, &blob)?,
        }
        stats.terms += 1;
    }

    for blob in right.scan()? {
        let blob = blob?;
        let (term, _) = split_blob(&blob)?;
        if handled.contains(term) {
            continue;
        }
        stats.collisions += output.append_blob(term, &blob)?;
        stats.terms += 1;
    }

    output.sync()?;
    drop(left);
    drop(right);
    layout.remove(Partition::Shard(ticket.left))?;
    layout.remove(Partition::Shard(ticket.right))?;

    info!(
        target: "quarry::merge",
        left = ticket.left,
        right = ticket.right,
        output = ticket.output,
        terms = stats.terms,
        overlapping = stats.overlapping,
        collisions = stats.collisions,
        "Merged shards"
    );
    Ok(stats)
}
