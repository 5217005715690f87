//! Core types and traits for projtree.
//!
//! This crate provides the project tree: the node model, the arena that owns
//! it, delegated project operations, and the scan configuration shared with
//! `projtree-scan`.

mod config;
mod error;
pub mod mime;
mod nesting;
mod node;
mod project;
mod providers;
mod snapshot;
mod tree;

pub use config::{ScanConfig, ScanConfigBuilder};
pub use error::{ProjectError, ScanError, ScanWarning, TreeError, WarningKind};
pub use mime::{ExtensionMimeDatabase, MimeDatabase, MimeType};
pub use node::{
    DEFAULT_FILE_PRIORITY, DEFAULT_FOLDER_PRIORITY, DEFAULT_PROJECT_FILE_PRIORITY,
    DEFAULT_PROJECT_PRIORITY, FileNode, FileType, FolderKind, FolderNode, Node, NodeId, NodeKind,
    NodeType, SESSION_PATH,
};
pub use project::{DefaultProjectManager, ProjectAction, ProjectManager};
pub use providers::{
    DefaultIconProvider, Icon, IconKind, IconProvider, NoVcs, NullObserver, TreeObserver,
    VcsLookup, VersionControl,
};
pub use snapshot::NodeSnapshot;
pub use tree::{AddNewInformation, ProjectTree, SESSION_ADD_FILE_FILTER};
