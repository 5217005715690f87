//! Project nodes and delegated file operations.
//!
//! Concrete project kinds plug in through [`ProjectManager`]. Every default
//! rejects the mutation, so a bare [`DefaultProjectManager`] describes a
//! read-only project.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::error::ProjectError;
use crate::node::{Node, NodeId};
use crate::providers::VcsLookup;
use crate::tree::ProjectTree;

/// Context menu actions a node supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
pub enum ProjectAction {
    AddSubProject,
    RemoveSubProject,
    AddNewFile,
    AddExistingFile,
    AddExistingDirectory,
    RemoveFile,
    EraseFile,
    Rename,
    DuplicateFile,
    HidePathActions,
    HideFileActions,
    HideFolderActions,
    HasSubProjectRunConfigurations,
    /// Marker appended by every level that defers to its parent.
    InheritedFromParent,
}

/// Behavior of a concrete project kind.
pub trait ProjectManager: fmt::Debug + Send {
    fn add_files(&mut self, file_paths: &[PathBuf]) -> Result<(), ProjectError> {
        let _ = file_paths;
        Err(ProjectError::unsupported("add files"))
    }

    fn remove_files(&mut self, file_paths: &[PathBuf]) -> Result<(), ProjectError> {
        let _ = file_paths;
        Err(ProjectError::unsupported("remove files"))
    }

    fn delete_files(&mut self, file_paths: &[PathBuf]) -> Result<(), ProjectError> {
        let _ = file_paths;
        Err(ProjectError::unsupported("delete files"))
    }

    fn can_rename_file(&self, file_path: &Path, new_file_path: &Path) -> bool {
        let _ = (file_path, new_file_path);
        true
    }

    fn rename_file(&mut self, file_path: &Path, new_file_path: &Path) -> Result<(), ProjectError> {
        let _ = (file_path, new_file_path);
        Err(ProjectError::unsupported("rename file"))
    }

    fn can_add_sub_project(&self, project_file_path: &Path) -> bool {
        let _ = project_file_path;
        false
    }

    fn add_sub_project(&mut self, project_file_path: &Path) -> Result<(), ProjectError> {
        let _ = project_file_path;
        Err(ProjectError::unsupported("add sub-project"))
    }

    fn remove_sub_project(&mut self, project_file_path: &Path) -> Result<(), ProjectError> {
        let _ = project_file_path;
        Err(ProjectError::unsupported("remove sub-project"))
    }

    fn deploys_folder(&self, folder: &Path) -> bool {
        let _ = folder;
        false
    }

    /// Actions for `node`, or `None` to defer to the parent chain.
    fn supported_actions(&self, node: &Node) -> Option<Vec<ProjectAction>> {
        let _ = node;
        None
    }

    fn show_in_simple_tree(&self) -> bool {
        false
    }
}

/// Project kind that implements none of the mutations.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultProjectManager;

impl ProjectManager for DefaultProjectManager {}

impl ProjectTree {
    /// Nearest project among the strict ancestors of `id`.
    pub fn parent_project_node(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.get(id)?.parent();
        while let Some(parent) = current {
            let node = self.get(parent)?;
            if node.is_project() {
                return Some(parent);
            }
            current = node.parent();
        }
        None
    }

    /// The project responsible for `id`: its nearest project ancestor, or
    /// the node itself when it is a project. Parentless nodes have none.
    pub fn managing_project(&self, id: NodeId) -> Option<NodeId> {
        let node = self.get(id)?;
        node.parent()?;
        self.parent_project_node(id)
            .or_else(|| node.is_project().then_some(id))
    }

    fn managing_manager_mut(
        &mut self,
        id: NodeId,
    ) -> Result<&mut (dyn ProjectManager + 'static), ProjectError> {
        let project = self
            .managing_project(id)
            .ok_or(ProjectError::NoManagingProject { id })?;
        self.get_mut(project)
            .and_then(Node::project_manager_mut)
            .ok_or(ProjectError::NoManagingProject { id })
    }

    fn project_manager_mut(
        &mut self,
        project: NodeId,
    ) -> Result<&mut (dyn ProjectManager + 'static), ProjectError> {
        self.get_mut(project)
            .and_then(Node::project_manager_mut)
            .ok_or(ProjectError::NotAProject { id: project })
    }

    pub fn add_files(&mut self, id: NodeId, file_paths: &[PathBuf]) -> Result<(), ProjectError> {
        self.managing_manager_mut(id)?.add_files(file_paths)
    }

    pub fn remove_files(&mut self, id: NodeId, file_paths: &[PathBuf]) -> Result<(), ProjectError> {
        self.managing_manager_mut(id)?.remove_files(file_paths)
    }

    pub fn delete_files(&mut self, id: NodeId, file_paths: &[PathBuf]) -> Result<(), ProjectError> {
        self.managing_manager_mut(id)?.delete_files(file_paths)
    }

    pub fn can_rename_file(&self, id: NodeId, file_path: &Path, new_file_path: &Path) -> bool {
        self.managing_project(id)
            .and_then(|project| self.get(project))
            .and_then(Node::project_manager)
            .is_some_and(|manager| manager.can_rename_file(file_path, new_file_path))
    }

    pub fn rename_file(
        &mut self,
        id: NodeId,
        file_path: &Path,
        new_file_path: &Path,
    ) -> Result<(), ProjectError> {
        self.managing_manager_mut(id)?
            .rename_file(file_path, new_file_path)
    }

    pub fn can_add_sub_project(&self, project: NodeId, project_file_path: &Path) -> bool {
        self.get(project)
            .and_then(Node::project_manager)
            .is_some_and(|manager| manager.can_add_sub_project(project_file_path))
    }

    pub fn add_sub_project(
        &mut self,
        project: NodeId,
        project_file_path: &Path,
    ) -> Result<(), ProjectError> {
        self.project_manager_mut(project)?
            .add_sub_project(project_file_path)
    }

    pub fn remove_sub_project(
        &mut self,
        project: NodeId,
        project_file_path: &Path,
    ) -> Result<(), ProjectError> {
        self.project_manager_mut(project)?
            .remove_sub_project(project_file_path)
    }

    pub fn deploys_folder(&self, project: NodeId, folder: &Path) -> bool {
        self.get(project)
            .and_then(Node::project_manager)
            .is_some_and(|manager| manager.deploys_folder(folder))
    }

    /// Direct child project of `project` whose path is `file_path`.
    pub fn project_node(&self, project: NodeId, file_path: &Path) -> Option<NodeId> {
        self.children(project).iter().copied().find(|&child| {
            self.get(child)
                .is_some_and(|node| node.is_project() && node.file_path() == file_path)
        })
    }

    /// VCS topic of the directory holding the project, empty without a VCS.
    pub fn vcs_topic(&self, project: NodeId, vcs: &dyn VcsLookup) -> String {
        let Some(node) = self.get(project) else {
            return String::new();
        };
        let path = node.file_path();
        let directory = if path.is_dir() {
            path
        } else {
            path.parent().unwrap_or(path)
        };
        vcs.find_version_control_for_directory(directory)
            .map(|control| control.vcs_topic(directory))
            .unwrap_or_default()
    }
}
