//! Git-backed version control lookup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use git2::Repository;

use projtree_core::{VcsLookup, VersionControl};

/// Name of the git metadata entry inside a work tree.
const GIT_DIR_NAME: &str = ".git";

/// Finds the git work tree containing a directory.
///
/// Lookups are cached per directory for the lifetime of the value.
#[derive(Debug, Default)]
pub struct GitVcsLookup {
    cache: DashMap<PathBuf, Option<Arc<GitControl>>>,
}

impl GitVcsLookup {
    pub fn new() -> Self {
        Self::default()
    }

    fn discover(directory: &Path) -> Option<Arc<GitControl>> {
        let repo = Repository::discover(directory).ok()?;
        let workdir = repo.workdir()?.to_path_buf();
        Some(Arc::new(GitControl { workdir }))
    }
}

impl VcsLookup for GitVcsLookup {
    fn find_version_control_for_directory(
        &self,
        directory: &Path,
    ) -> Option<Arc<dyn VersionControl>> {
        let cached = self.cache.get(directory).map(|hit| hit.value().clone());
        let control = cached.unwrap_or_else(|| {
            let control = Self::discover(directory);
            self.cache.insert(directory.to_path_buf(), control.clone());
            control
        });
        control.map(|control| control as Arc<dyn VersionControl>)
    }
}

/// A git work tree.
#[derive(Debug, Clone)]
pub struct GitControl {
    workdir: PathBuf,
}

impl GitControl {
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }
}

impl VersionControl for GitControl {
    fn is_vcs_file_or_directory(&self, path: &Path) -> bool {
        path.file_name().is_some_and(|name| name == GIT_DIR_NAME)
    }

    /// The checked-out branch, or empty for an unborn or detached head
    /// without a name.
    fn vcs_topic(&self, directory: &Path) -> String {
        let Ok(repo) = Repository::discover(directory) else {
            return String::new();
        };
        let Ok(head) = repo.head() else {
            return String::new();
        };
        head.shorthand().unwrap_or_default().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn init_with_commit(path: &Path) -> String {
        let repo = Repository::init(path).unwrap();
        let signature = git2::Signature::now("projtree", "projtree@example.com").unwrap();
        let tree_id = repo.index().unwrap().write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        repo.commit(Some("HEAD"), &signature, &signature, "init", &tree, &[])
            .unwrap();
        repo.head().unwrap().shorthand().unwrap().to_string()
    }

    #[test]
    fn test_git_dir_is_internal() {
        let control = GitControl {
            workdir: PathBuf::from("/p"),
        };
        assert!(control.is_vcs_file_or_directory(Path::new("/p/.git")));
        assert!(!control.is_vcs_file_or_directory(Path::new("/p/.gitignore")));
        assert!(!control.is_vcs_file_or_directory(Path::new("/p/src")));
    }

    #[test]
    fn test_lookup_and_topic() {
        let temp = TempDir::new().unwrap();
        let branch = init_with_commit(temp.path());
        std::fs::create_dir(temp.path().join("src")).unwrap();

        let lookup = GitVcsLookup::new();
        let control = lookup
            .find_version_control_for_directory(&temp.path().join("src"))
            .unwrap();
        assert_eq!(control.vcs_topic(temp.path()), branch);
        assert!(control.is_vcs_file_or_directory(&temp.path().join(".git")));

        // Served from the cache the second time.
        assert!(lookup.find_version_control_for_directory(&temp.path().join("src")).is_some());
    }
}
