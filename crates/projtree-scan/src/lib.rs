//! Directory scanning engine for projtree.
//!
//! This crate turns a directory into a flat list of detached file nodes,
//! ready to be placed into a [`ProjectTree`](projtree_core::ProjectTree)
//! with nested insertion.
//!
//! # Overview
//!
//! - **Cycle suppression** through canonical paths of visited directories
//! - **Version control aware**: VCS metadata entries are skipped
//! - **Progress updates** via broadcast channels, in a fixed range
//! - **Cooperative cancellation** checked before every entry
//!
//! # Example
//!
//! ```rust,no_run
//! use projtree_core::{FileType, Node};
//! use projtree_scan::{FileScanner, ScanConfig};
//!
//! let config = ScanConfig::new("/path/to/project");
//! let scanner = FileScanner::new();
//! let outcome = scanner
//!     .scan(&config, |path| Some(Node::file(path, FileType::Source, false)))
//!     .unwrap();
//!
//! println!("Found {} files", outcome.files.len());
//! ```
//!
//! # Background Scans
//!
//! Run the scan on a blocking worker and follow its progress:
//!
//! ```rust,no_run
//! use projtree_core::{FileType, Node};
//! use projtree_scan::{FileScanner, ScanConfig, ScanEvent, start_scan};
//!
//! # async fn run() {
//! let mut handle = start_scan(FileScanner::new(), ScanConfig::new("."), |path| {
//!     Some(Node::file(path, FileType::Source, false))
//! });
//!
//! while let Some(event) = handle.recv().await {
//!     match event {
//!         ScanEvent::Progress(progress) => println!("{:.0}%", progress.fraction() * 100.0),
//!         ScanEvent::Complete(result) => println!("{:?}", result.map(|o| o.files.len())),
//!     }
//! }
//! # }
//! ```

mod background;
#[cfg(feature = "git")]
mod git;
mod progress;
mod scanner;
mod visited;

pub use background::{SCAN_CHANNEL_SIZE, ScanEvent, ScanHandle, start_scan};
#[cfg(feature = "git")]
pub use git::{GitControl, GitVcsLookup};
pub use progress::{PROGRESS_MAXIMUM, ScanProgress};
pub use scanner::{FileScanner, ScanOutcome};
pub use visited::VisitedDirs;

// Re-export core types for convenience
pub use projtree_core::{ScanConfig, ScanError, ScanWarning, WarningKind};
