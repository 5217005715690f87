//! Recursive, cancellable directory scanner.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use globset::GlobSet;
use jwalk::{Parallelism, WalkDir};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use projtree_core::{NoVcs, Node, ScanConfig, ScanError, ScanWarning, VcsLookup};

use crate::progress::{PROGRESS_MAXIMUM, ProgressTracker, ScanProgress};
use crate::visited::VisitedDirs;

/// Result of a finished or cancelled scan.
#[derive(Debug)]
pub struct ScanOutcome {
    /// Absolute root the scan started from.
    pub root: PathBuf,
    /// Detached file nodes, in walk order.
    pub files: Vec<Node>,
    pub warnings: Vec<ScanWarning>,
    /// `true` if the scan stopped early; `files` is then partial.
    pub cancelled: bool,
    pub duration: Duration,
}

/// Walks a directory tree and turns its files into detached nodes.
///
/// Each directory is entered at most once (by canonical path), entries that
/// belong to version control are skipped, and cancellation is honored
/// before every entry.
pub struct FileScanner {
    vcs: Arc<dyn VcsLookup>,
    progress_tx: broadcast::Sender<ScanProgress>,
    cancel: CancellationToken,
}

impl FileScanner {
    /// Create a scanner without version control awareness.
    pub fn new() -> Self {
        Self::with_vcs(Arc::new(NoVcs))
    }

    pub fn with_vcs(vcs: Arc<dyn VcsLookup>) -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self {
            vcs,
            progress_tx,
            cancel: CancellationToken::new(),
        }
    }

    /// Subscribe to scan progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Token that stops this scanner's scans when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Scan `config.root`, handing every file to `classify`.
    ///
    /// `classify` returns the node for a file, or `None` to leave it out.
    /// Only a missing or non-directory root fails; unreadable entries and
    /// directory cycles are reported as warnings.
    pub fn scan<C>(&self, config: &ScanConfig, classify: C) -> Result<ScanOutcome, ScanError>
    where
        C: FnMut(&Path) -> Option<Node>,
    {
        let start = Instant::now();
        let root = std::path::absolute(&config.root).map_err(|e| ScanError::io(&config.root, e))?;
        let metadata = std::fs::metadata(&root).map_err(|e| ScanError::io(&root, e))?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory { path: root });
        }

        let mut walk = Walk {
            config,
            ignore: config.ignore_matcher()?,
            vcs: self.vcs.as_ref(),
            cancel: &self.cancel,
            classify,
            visited: VisitedDirs::new(),
            progress: ProgressTracker::new(&self.progress_tx),
            files: Vec::new(),
            warnings: Vec::new(),
        };

        let completed = walk.scan_dir(&root, 0, 0.0, f64::from(PROGRESS_MAXIMUM));
        if completed {
            walk.progress.advance(f64::from(PROGRESS_MAXIMUM), &root);
        }
        debug!(
            root = %root.display(),
            files = walk.progress.files_found(),
            dirs = walk.progress.dirs_scanned(),
            cancelled = !completed,
            "scan finished"
        );

        Ok(ScanOutcome {
            root,
            files: walk.files,
            warnings: walk.warnings,
            cancelled: !completed,
            duration: start.elapsed(),
        })
    }
}

impl Default for FileScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// One directory entry that passed the listing filters.
struct Entry {
    path: PathBuf,
    is_dir: bool,
}

/// State shared across the whole recursive walk.
struct Walk<'a, C> {
    config: &'a ScanConfig,
    ignore: GlobSet,
    vcs: &'a dyn VcsLookup,
    cancel: &'a CancellationToken,
    classify: C,
    visited: VisitedDirs,
    progress: ProgressTracker<'a>,
    files: Vec<Node>,
    warnings: Vec<ScanWarning>,
}

impl<C> Walk<'_, C>
where
    C: FnMut(&Path) -> Option<Node>,
{
    /// Scan `directory`, owning the progress span `start..start + range`.
    ///
    /// Every entry gets an equal share of the span; subdirectories pass
    /// their share down. Returns `false` if cancelled.
    fn scan_dir(&mut self, directory: &Path, depth: u32, start: f64, range: f64) -> bool {
        let canonical = match directory.canonicalize() {
            Ok(canonical) => canonical,
            Err(e) => {
                warn!(path = %directory.display(), error = %e, "cannot resolve directory");
                self.warnings.push(ScanWarning::io(directory, &e));
                return true;
            }
        };
        if !self.visited.track(canonical) {
            warn!(path = %directory.display(), "skipping already visited directory");
            self.warnings.push(ScanWarning::directory_cycle(directory));
            return true;
        }
        self.progress.record_dir();

        if self.config.max_depth.is_some_and(|max| depth >= max) {
            return true;
        }

        let control = self.vcs.find_version_control_for_directory(directory);
        let entries = self.list(directory);
        let increment = range / entries.len().max(1) as f64;
        let mut done = 0.0;

        for entry in entries {
            if self.cancel.is_cancelled() {
                debug!(path = %entry.path.display(), "scan cancelled");
                return false;
            }

            let internal = control
                .as_ref()
                .is_some_and(|control| control.is_vcs_file_or_directory(&entry.path));
            if !internal {
                if entry.is_dir {
                    if !self.scan_dir(&entry.path, depth + 1, start + done, increment) {
                        return false;
                    }
                } else if let Some(node) = (self.classify)(&entry.path) {
                    self.progress.record_file();
                    self.files.push(node);
                }
            }

            done += increment;
            self.progress.advance(start + done, &entry.path);
        }

        self.progress.advance(start + range, directory);
        true
    }

    /// Direct entries of `directory`, sorted by name, without ignored or
    /// hidden ones.
    fn list(&mut self, directory: &Path) -> Vec<Entry> {
        let walker = WalkDir::new(directory)
            .parallelism(Parallelism::Serial)
            .sort(true)
            .skip_hidden(!self.config.include_hidden)
            .follow_links(self.config.follow_symlinks)
            .min_depth(1)
            .max_depth(1);

        let mut entries = Vec::new();
        for entry_result in walker {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| directory.to_path_buf());
                    warn!(path = %path.display(), error = %err, "cannot read entry");
                    let warning = match err.io_error() {
                        Some(io) => ScanWarning::io(path, io),
                        None => ScanWarning::read_error(path, err),
                    };
                    self.warnings.push(warning);
                    continue;
                }
            };

            let file_name = entry.file_name().to_string_lossy();
            if self.ignore.is_match(file_name.as_ref()) {
                continue;
            }

            let path = entry.path();
            let file_type = entry.file_type();
            // Unfollowed links to directories are neither walked nor files.
            if file_type.is_symlink() && path.is_dir() {
                continue;
            }
            entries.push(Entry {
                is_dir: file_type.is_dir(),
                path,
            });
        }
        entries
    }
}
