/*!
 * Wrap-Around Priority Queue
 *
 * Cached priority-sorted snapshot of the registry plus a resume pointer.
 * Within a tick, entries are visited highest priority first; across ticks the
 * walk starts just after the last executed entry, so work skipped because
 * the budget ran out is the first to be offered on the next tick.
 */

use crate::core::types::ProcessId;
use crate::process::Registry;
use std::cmp::Reverse;
use tracing::debug;

#[derive(Debug, Default)]
pub struct WrapQueue {
    entries: Vec<ProcessId>,
    /// Registry generation the snapshot was built from
    built_generation: Option<u64>,
    last_executed_index: Option<usize>,
    last_executed_id: Option<ProcessId>,
}

impl WrapQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether registry membership changed since the last rebuild
    #[inline]
    pub fn is_dirty(&self, generation: u64) -> bool {
        self.built_generation != Some(generation)
    }

    /// Re-snapshot the registry: priority descending, registration order on ties
    ///
    /// The resume pointer follows the last executed id into the new
    /// snapshot, or restarts at the head if that id is gone.
    pub fn rebuild(&mut self, registry: &Registry) {
        let mut keyed: Vec<_> = registry
            .iter()
            .map(|p| (Reverse(p.priority()), p.seq, p.id().clone()))
            .collect();
        keyed.sort_unstable_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        self.entries = keyed.into_iter().map(|(_, _, id)| id).collect();
        self.built_generation = Some(registry.generation());

        self.last_executed_index = self
            .last_executed_id
            .as_ref()
            .and_then(|last| self.entries.iter().position(|id| id == last));
        if self.last_executed_index.is_none() {
            self.last_executed_id = None;
        }

        debug!(
            len = self.entries.len(),
            resume_after = ?self.last_executed_id,
            "Priority queue rebuilt"
        );
    }

    /// Index the next walk starts from
    #[inline]
    pub fn start_index(&self) -> usize {
        match (self.last_executed_index, self.entries.len()) {
            (_, 0) => 0,
            (Some(last), len) => (last + 1) % len,
            (None, _) => 0,
        }
    }

    /// One full pass over the queue starting at `start_index`, wrapping once
    pub fn walk_order(&self) -> Vec<(usize, ProcessId)> {
        let len = self.entries.len();
        let start = self.start_index();
        (0..len)
            .map(|offset| {
                let index = (start + offset) % len;
                (index, self.entries[index].clone())
            })
            .collect()
    }

    /// Advance the resume pointer past an executed entry
    #[inline]
    pub fn mark_executed(&mut self, index: usize) {
        if let Some(id) = self.entries.get(index) {
            self.last_executed_index = Some(index);
            self.last_executed_id = Some(id.clone());
        }
    }

    pub fn entries(&self) -> &[ProcessId] {
        &self.entries
    }

    pub fn last_executed(&self) -> Option<&ProcessId> {
        self.last_executed_id.as_ref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
