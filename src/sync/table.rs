use std::collections::HashMap;

use tracing::warn;

use crate::model::descriptor::IssueDescriptor;
use crate::tracker::RemoteIssue;

#[derive(Debug, Clone)]
pub struct SyncEntry {
    pub descriptor: IssueDescriptor,
    pub remote: Option<RemoteIssue>,
}

/// Local id to (descriptor, remote issue), in the order ids first appeared.
///
/// A repeated id replaces the earlier entry in place: the last row wins.
#[derive(Debug, Default)]
pub struct SyncTable {
    entries: Vec<SyncEntry>,
    index: HashMap<String, usize>,
}

impl SyncTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, descriptor: IssueDescriptor, remote: Option<RemoteIssue>) {
        let entry = SyncEntry { descriptor, remote };
        match self.index.get(&entry.descriptor.id) {
            Some(&pos) => {
                warn!(id = %entry.descriptor.id, "duplicate row id; the later row replaces the earlier one");
                self.entries[pos] = entry;
            }
            None => {
                self.index
                    .insert(entry.descriptor.id.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&SyncEntry> {
        self.index.get(id).map(|&pos| &self.entries[pos])
    }

    /// Entries that ended up with a remote issue.
    pub fn synchronized(&self) -> impl Iterator<Item = (&IssueDescriptor, &RemoteIssue)> {
        self.entries
            .iter()
            .filter_map(|e| e.remote.as_ref().map(|r| (&e.descriptor, r)))
    }
}
