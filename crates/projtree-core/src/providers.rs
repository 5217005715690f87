//! Capabilities the tree consumes from its environment.
//!
//! Version control, icons and change notification are injected rather than
//! looked up globally, so the tree and the scanner can run without a live
//! IDE behind them.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use compact_str::{CompactString, format_compact};
use serde::{Deserialize, Serialize};

use crate::node::{FileType, NodeId};

/// A version control backend responsible for some directory.
pub trait VersionControl: fmt::Debug + Send + Sync {
    /// Returns `true` for entries that belong to the VCS itself (e.g. `.git`).
    fn is_vcs_file_or_directory(&self, path: &Path) -> bool;

    /// Short description of the checkout state, typically the branch name.
    fn vcs_topic(&self, directory: &Path) -> String;
}

/// Resolves the version control backend for a directory.
pub trait VcsLookup: Send + Sync {
    fn find_version_control_for_directory(&self, directory: &Path)
    -> Option<Arc<dyn VersionControl>>;
}

/// Lookup that never finds a backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoVcs;

impl VcsLookup for NoVcs {
    fn find_version_control_for_directory(
        &self,
        _directory: &Path,
    ) -> Option<Arc<dyn VersionControl>> {
        None
    }
}

/// Opaque icon handle; rendering is up to the view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Icon(CompactString);

impl Icon {
    pub fn new(name: impl Into<CompactString>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// What an icon is requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconKind {
    Folder,
    VirtualFolder,
    Project,
    File(FileType),
}

pub trait IconProvider: Send + Sync {
    fn icon_for(&self, kind: IconKind) -> Icon;
}

/// Freedesktop-style icon names.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultIconProvider;

impl IconProvider for DefaultIconProvider {
    fn icon_for(&self, kind: IconKind) -> Icon {
        match kind {
            IconKind::Folder => Icon::new("folder"),
            IconKind::VirtualFolder => Icon::new("folder-virtual"),
            IconKind::Project => Icon::new("project"),
            IconKind::File(file_type) => {
                let name = format!("{file_type:?}").to_lowercase();
                Icon::new(format_compact!("text-x-{name}"))
            }
        }
    }
}

/// Receives structural change notifications from the tree.
pub trait TreeObserver: Send + Sync {
    fn subtree_changed(&self, folder: NodeId);
}

/// Observer that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl TreeObserver for NullObserver {
    fn subtree_changed(&self, _folder: NodeId) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_vcs() {
        assert!(NoVcs.find_version_control_for_directory(Path::new("/")).is_none());
    }

    #[test]
    fn test_default_icons() {
        let provider = DefaultIconProvider;
        assert_eq!(provider.icon_for(IconKind::Folder).name(), "folder");
        assert_eq!(
            provider.icon_for(IconKind::File(FileType::Header)).name(),
            "text-x-header"
        );
    }
}
