//! Error types for tree mutations, project operations and scanning.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::node::NodeId;

/// Rejected structural change. The tree is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The id does not resolve (never inserted or already destroyed).
    #[error("Unknown node: {id}")]
    UnknownNode { id: NodeId },

    /// A folder operation was requested on a file.
    #[error("Node {id} is not a folder")]
    NotAFolder { id: NodeId },

    /// The node must be detached before it can be attached elsewhere.
    #[error("Node {node} already has parent {parent}")]
    AlreadyParented { node: NodeId, parent: NodeId },

    /// The node is an ancestor of the target folder.
    #[error("Attaching {node} under {folder} would create a cycle")]
    WouldCreateCycle { node: NodeId, folder: NodeId },

    /// The node is not a direct child of the folder.
    #[error("Node {node} is not a child of {folder}")]
    NotAChild { node: NodeId, folder: NodeId },

    /// The session root cannot be attached, detached or destroyed.
    #[error("Node {id} is the session root")]
    SessionRoot { id: NodeId },
}

/// Failure of a delegated project operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectError {
    /// The project kind does not implement the operation.
    #[error("{operation} is not supported by this project")]
    Unsupported { operation: &'static str },

    /// The project refused some of the paths.
    #[error("{operation} rejected {} path(s)", .paths.len())]
    Rejected {
        operation: &'static str,
        paths: Vec<PathBuf>,
    },

    /// Neither the node nor its ancestors is a project.
    #[error("Node {id} has no managing project")]
    NoManagingProject { id: NodeId },

    /// A project-only operation was requested on another variant.
    #[error("Node {id} is not a project")]
    NotAProject { id: NodeId },
}

impl ProjectError {
    pub fn unsupported(operation: &'static str) -> Self {
        Self::Unsupported { operation }
    }
}

/// Errors that abort a scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Other error.
    #[error("{message}")]
    Other { message: String },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }
}

/// Kind of scan warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// Permission was denied.
    PermissionDenied,
    /// Error reading a directory or entry.
    ReadError,
    /// A directory was reached a second time through a link.
    DirectoryCycle,
}

/// Non-fatal condition encountered during a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a read error warning.
    pub fn read_error(path: impl Into<PathBuf>, error: impl std::fmt::Display) -> Self {
        let path = path.into();
        Self {
            message: format!("Read error: {error}"),
            path,
            kind: WarningKind::ReadError,
        }
    }

    /// Create a permission denied warning.
    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            message: format!("Permission denied: {}", path.display()),
            path,
            kind: WarningKind::PermissionDenied,
        }
    }

    /// Create a warning for an I/O failure, told apart by its kind.
    pub fn io(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::permission_denied(path),
            _ => Self::read_error(path, error),
        }
    }

    /// Create a directory cycle warning.
    pub fn directory_cycle(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            message: format!("Directory already visited: {}", path.display()),
            path,
            kind: WarningKind::DirectoryCycle,
        }
    }
}
