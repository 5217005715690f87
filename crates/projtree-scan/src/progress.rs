//! Scan progress reporting.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tokio::sync::broadcast;

/// Upper bound of [`ScanProgress::value`].
pub const PROGRESS_MAXIMUM: u32 = 1_000_000;

/// Progress information during a scan.
#[derive(Debug, Clone)]
pub struct ScanProgress {
    /// Position in `0..=maximum`; never decreases within one scan.
    pub value: u32,
    pub maximum: u32,
    /// Number of file nodes produced so far.
    pub files_found: u64,
    /// Number of directories entered so far.
    pub dirs_scanned: u64,
    /// Entry being processed when the update was published.
    pub current_path: PathBuf,
    /// Time elapsed since scan started.
    pub elapsed: Duration,
}

impl ScanProgress {
    pub fn new() -> Self {
        Self {
            value: 0,
            maximum: PROGRESS_MAXIMUM,
            files_found: 0,
            dirs_scanned: 0,
            current_path: PathBuf::new(),
            elapsed: Duration::ZERO,
        }
    }

    /// Completed share in `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        if self.maximum == 0 {
            return 1.0;
        }
        f64::from(self.value) / f64::from(self.maximum)
    }

    pub fn is_complete(&self) -> bool {
        self.value >= self.maximum
    }
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Publishes progress, dropping updates that would not move it forward.
#[derive(Debug)]
pub(crate) struct ProgressTracker<'a> {
    tx: &'a broadcast::Sender<ScanProgress>,
    start_time: Instant,
    last_value: u32,
    files_found: u64,
    dirs_scanned: u64,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(tx: &'a broadcast::Sender<ScanProgress>) -> Self {
        Self {
            tx,
            start_time: Instant::now(),
            last_value: 0,
            files_found: 0,
            dirs_scanned: 0,
        }
    }

    pub fn record_file(&mut self) {
        self.files_found += 1;
    }

    pub fn record_dir(&mut self) {
        self.dirs_scanned += 1;
    }

    pub fn files_found(&self) -> u64 {
        self.files_found
    }

    pub fn dirs_scanned(&self) -> u64 {
        self.dirs_scanned
    }

    /// Report a position in the progress range, clamped to the maximum.
    pub fn advance(&mut self, position: f64, current_path: &Path) {
        let value = position.clamp(0.0, f64::from(PROGRESS_MAXIMUM)) as u32;
        if value <= self.last_value {
            return;
        }
        self.last_value = value;
        // No subscribers is fine.
        let _ = self.tx.send(self.snapshot(current_path));
    }

    pub fn snapshot(&self, current_path: &Path) -> ScanProgress {
        ScanProgress {
            value: self.last_value,
            maximum: PROGRESS_MAXIMUM,
            files_found: self.files_found,
            dirs_scanned: self.dirs_scanned,
            current_path: current_path.to_path_buf(),
            elapsed: self.start_time.elapsed(),
        }
    }
}
