//! Visited-directory tracking for cycle suppression.

use std::path::{Path, PathBuf};

use dashmap::DashSet;

/// Canonical paths of the directories a scan has entered.
///
/// A directory reachable through a symbolic link resolves to the same
/// canonical path as its original, so the second visit is refused.
#[derive(Debug, Default)]
pub struct VisitedDirs {
    seen: DashSet<PathBuf>,
}

impl VisitedDirs {
    pub fn new() -> Self {
        Self {
            seen: DashSet::new(),
        }
    }

    /// Track a canonical directory path. Returns `true` on the first visit.
    pub fn track(&self, canonical: PathBuf) -> bool {
        self.seen.insert(canonical)
    }

    /// Check if a directory has been entered (without tracking).
    pub fn has_visited(&self, canonical: &Path) -> bool {
        self.seen.contains(canonical)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn clear(&self) {
        self.seen.clear();
    }
}
