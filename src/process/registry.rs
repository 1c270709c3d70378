/*!
 * Process Registry
 * Owns registered processes keyed by id
 */

use super::types::{Process, ProcessDefinition};
use crate::core::types::ProcessId;
use ahash::RandomState;
use std::collections::HashMap;
use tracing::debug;

/// Registered processes
///
/// `generation` changes whenever membership changes, which is how the
/// priority queue knows its snapshot is dirty.
#[derive(Debug, Default)]
pub struct Registry {
    processes: HashMap<ProcessId, Process, RandomState>,
    next_seq: u64,
    generation: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a process; returns true if an entry was replaced
    ///
    /// A replacement starts with fresh stats but keeps the tie-break slot of
    /// the process it replaces.
    pub fn register(&mut self, definition: ProcessDefinition) -> bool {
        let id = definition.id.clone();
        let (seq, replaced) = match self.processes.get(&id) {
            Some(existing) => (existing.seq, true),
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                (seq, false)
            }
        };

        self.processes
            .insert(id.clone(), Process::from_definition(definition, seq));
        self.generation += 1;

        debug!(process_id = %id, seq, replaced, "Process registered");
        replaced
    }

    pub fn unregister(&mut self, id: &str) -> bool {
        let removed = self.processes.remove(id).is_some();
        if removed {
            self.generation += 1;
            debug!(process_id = id, "Process unregistered");
        }
        removed
    }

    pub fn get(&self, id: &str) -> Option<&Process> {
        self.processes.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Process> {
        self.processes.get_mut(id)
    }

    /// All processes, in no particular order
    pub fn list(&self) -> Vec<&Process> {
        self.processes.values().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Process> {
        self.processes.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Process> {
        self.processes.values_mut()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.processes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// Membership version
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
