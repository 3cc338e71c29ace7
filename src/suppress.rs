// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Self-write suppression.
//!
//! Every write the runtime performs on its own behalf races with the change
//! watcher. Registering the real path here *before* the write is issued
//! guarantees the notification, however soon it arrives, finds the entry
//! already present and is dropped instead of triggering a rebuild.
//!
//! Entries are consumed by the first matching notification. If the watcher
//! coalesces the event away, the entry leaks until a later write to the same
//! path; that imprecision is accepted.

use dashmap::DashSet;
use std::path::Path;
use std::sync::Arc;

/// Process-wide table of real paths whose next change notification is
/// self-inflicted. Shared between the tree and the change coordinator; it is
/// the one piece of state that survives across rebuild generations.
#[derive(Debug, Clone, Default)]
pub struct SuppressionSet {
    paths: Arc<DashSet<String>>,
}

impl SuppressionSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    // Keys are normalized to forward-slash form so watcher paths and
    // computed real paths compare equal on every platform.
    fn key(path: &Path) -> String {
        path.to_string_lossy().replace('\\', "/")
    }

    /// Mark a real path as self-written.
    pub fn insert(&self, path: &Path) {
        self.paths.insert(Self::key(path));
    }

    /// Consume the entry for a path. Returns true if one was present.
    pub fn consume(&self, path: &Path) -> bool {
        self.paths.remove(&Self::key(path)).is_some()
    }

    /// Check for an entry without consuming it.
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(&Self::key(path))
    }

    /// Number of outstanding entries.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// True if no entries are outstanding.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn consume_removes_exactly_one_entry() {
        let set = SuppressionSet::new();
        let path = PathBuf::from("/app/out.txt");

        set.insert(&path);
        assert!(set.contains(&path));
        assert_eq!(set.len(), 1);

        assert!(set.consume(&path));
        assert!(!set.contains(&path));
        assert!(!set.consume(&path));
        assert!(set.is_empty());
    }

    #[test]
    fn keys_are_separator_normalized() {
        let set = SuppressionSet::new();
        set.insert(Path::new(r"app\sub\out.txt"));
        assert!(set.contains(Path::new("app/sub/out.txt")));
        assert!(set.consume(Path::new("app/sub/out.txt")));
    }

    #[test]
    fn clones_share_the_same_table() {
        let set = SuppressionSet::new();
        let alias = set.clone();
        alias.insert(Path::new("/a"));
        assert!(set.contains(Path::new("/a")));
    }
}
