use projtree_core::{FileType, Node, ProjectTree, VcsLookup, VersionControl};
use projtree_scan::{FileScanner, PROGRESS_MAXIMUM, ScanConfig, ScanEvent, start_scan};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

fn source(path: &Path) -> Option<Node> {
    Some(Node::file(path, FileType::Source, false))
}

fn sorted_paths(files: &[Node]) -> Vec<PathBuf> {
    let mut paths: Vec<_> = files.iter().map(|n| n.file_path().to_path_buf()).collect();
    paths.sort();
    paths
}

/// root/{a.cpp, src/{b.cpp, c.cpp, lib/d.h}, docs/e.md}
fn project_dir() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join("src/lib")).unwrap();
    fs::create_dir(root.join("docs")).unwrap();
    for file in ["a.cpp", "src/b.cpp", "src/c.cpp", "src/lib/d.h", "docs/e.md"] {
        fs::write(root.join(file), "").unwrap();
    }
    temp
}

#[cfg(unix)]
#[test]
fn test_symlink_cycle_is_suppressed() {
    let temp = project_dir();
    let scanner = FileScanner::new();
    let without_link = scanner.scan(&ScanConfig::new(temp.path()), source).unwrap();

    std::os::unix::fs::symlink(temp.path(), temp.path().join("src/lib/back")).unwrap();
    let with_link = FileScanner::new()
        .scan(&ScanConfig::new(temp.path()), source)
        .unwrap();

    assert_eq!(sorted_paths(&with_link.files), sorted_paths(&without_link.files));
    assert!(!with_link.cancelled);
    assert!(
        with_link
            .warnings
            .iter()
            .any(|w| w.kind == projtree_scan::WarningKind::DirectoryCycle)
    );
}

#[cfg(unix)]
#[test]
fn test_unfollowed_directory_links_are_skipped() {
    let temp = project_dir();
    std::os::unix::fs::symlink(temp.path().join("src"), temp.path().join("alias")).unwrap();
    let config = ScanConfig::builder()
        .root(temp.path())
        .follow_symlinks(false)
        .build()
        .unwrap();

    let outcome = FileScanner::new().scan(&config, source).unwrap();
    assert_eq!(outcome.files.len(), 5);
}

#[test]
fn test_cancel_after_k_entries() {
    let temp = project_dir();
    let full = FileScanner::new()
        .scan(&ScanConfig::new(temp.path()), source)
        .unwrap();

    let scanner = FileScanner::new();
    let token = scanner.cancellation_token();
    let mut rx = scanner.subscribe();
    let mut seen = 0;
    let outcome = scanner
        .scan(&ScanConfig::new(temp.path()), |path: &Path| {
            seen += 1;
            if seen == 2 {
                token.cancel();
            }
            source(path)
        })
        .unwrap();

    assert!(outcome.cancelled);
    assert_eq!(outcome.files.len(), 2);
    assert!(outcome.files.len() <= full.files.len());

    let mut last = 0;
    while let Ok(progress) = rx.try_recv() {
        assert!(progress.value >= last);
        assert!(progress.value <= PROGRESS_MAXIMUM);
        last = progress.value;
    }
    assert!(last < PROGRESS_MAXIMUM);
}

#[test]
fn test_progress_is_monotonic_and_completes() {
    let temp = project_dir();
    let scanner = FileScanner::new();
    let mut rx = scanner.subscribe();
    scanner.scan(&ScanConfig::new(temp.path()), source).unwrap();

    let mut values = Vec::new();
    while let Ok(progress) = rx.try_recv() {
        values.push(progress.value);
    }
    assert!(values.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(values.last(), Some(&PROGRESS_MAXIMUM));
}

#[derive(Debug)]
struct MetadataDirControl;

impl VersionControl for MetadataDirControl {
    fn is_vcs_file_or_directory(&self, path: &Path) -> bool {
        path.file_name().is_some_and(|name| name == "docs")
    }

    fn vcs_topic(&self, _directory: &Path) -> String {
        "trunk".to_string()
    }
}

struct EverywhereLookup;

impl VcsLookup for EverywhereLookup {
    fn find_version_control_for_directory(
        &self,
        _directory: &Path,
    ) -> Option<Arc<dyn VersionControl>> {
        Some(Arc::new(MetadataDirControl))
    }
}

#[test]
fn test_vcs_entries_are_skipped() {
    let temp = project_dir();
    let scanner = FileScanner::with_vcs(Arc::new(EverywhereLookup));
    let outcome = scanner.scan(&ScanConfig::new(temp.path()), source).unwrap();

    assert_eq!(outcome.files.len(), 4);
    assert!(
        outcome
            .files
            .iter()
            .all(|node| !node.file_path().starts_with(temp.path().join("docs")))
    );
}

#[test]
fn test_scan_then_nested_insertion() {
    let temp = project_dir();
    let outcome = FileScanner::new()
        .scan(&ScanConfig::new(temp.path()), source)
        .unwrap();

    let mut tree = ProjectTree::new();
    let root = tree.insert(Node::folder(&outcome.root));
    tree.add_node(tree.root(), root).unwrap();
    tree.add_nested_nodes(root, outcome.files, None, &mut |path: &Path| Node::folder(path))
        .unwrap();
    tree.compress(root).unwrap();

    let src = tree
        .folder_node(root, &outcome.root.join("src"))
        .expect("src folder");
    assert_eq!(tree.file_nodes(src).len(), 2);
    assert_eq!(tree.folder_nodes(src).len(), 1);
    assert_eq!(tree.snapshot(root).unwrap().file_count(), 5);
}

#[tokio::test]
async fn test_background_scan_delivers_complete() {
    let temp = project_dir();
    let mut handle = start_scan(FileScanner::new(), ScanConfig::new(temp.path()), source);

    let mut last_progress = 0;
    let mut outcome = None;
    while let Some(event) = handle.recv().await {
        match event {
            ScanEvent::Progress(progress) => {
                assert!(progress.value >= last_progress);
                last_progress = progress.value;
            }
            ScanEvent::Complete(result) => outcome = Some(result.unwrap()),
        }
    }

    let outcome = outcome.expect("complete event");
    assert_eq!(outcome.files.len(), 5);
    assert_eq!(last_progress, PROGRESS_MAXIMUM);
}

#[tokio::test]
async fn test_background_scan_cancelled_up_front() {
    let temp = project_dir();
    let scanner = FileScanner::new();
    scanner.cancel();

    let handle = start_scan(scanner, ScanConfig::new(temp.path()), source);
    let outcome = handle.wait().await.unwrap();
    assert!(outcome.cancelled);
    assert!(outcome.files.is_empty());
}
