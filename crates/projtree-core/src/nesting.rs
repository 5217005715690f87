//! Nested insertion and folder compression.

use std::path::{Component, Path, PathBuf};

use compact_str::{CompactString, format_compact};
use tracing::debug;

use crate::error::TreeError;
use crate::node::{Node, NodeId, NodeType};
use crate::tree::ProjectTree;

impl ProjectTree {
    /// Attach `node` below `root`, creating the folder chain that mirrors
    /// its parent directory.
    ///
    /// Segments are taken relative to `base_override` (or the root's own
    /// path) when the directory lies at or under it, otherwise from the
    /// absolute directory. Existing folder children with the same path are
    /// reused; new ones come from `factory` and show their single segment.
    pub fn add_nested_node<F>(
        &mut self,
        root: NodeId,
        node: Node,
        base_override: Option<&Path>,
        factory: &mut F,
    ) -> Result<NodeId, TreeError>
    where
        F: FnMut(&Path) -> Node,
    {
        let directory = std::path::absolute(node.file_path())
            .unwrap_or_else(|_| node.file_path().to_path_buf())
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let folder = self.find_or_create_folder(root, &directory, base_override, factory)?;
        let id = self.insert(node);
        if let Err(e) = self.add_node(folder, id) {
            self.free_subtree(id);
            return Err(e);
        }
        Ok(id)
    }

    /// [`add_nested_node`](Self::add_nested_node) for a batch of files.
    pub fn add_nested_nodes<I, F>(
        &mut self,
        root: NodeId,
        nodes: I,
        base_override: Option<&Path>,
        factory: &mut F,
    ) -> Result<Vec<NodeId>, TreeError>
    where
        I: IntoIterator<Item = Node>,
        F: FnMut(&Path) -> Node,
    {
        nodes
            .into_iter()
            .map(|node| self.add_nested_node(root, node, base_override, factory))
            .collect()
    }

    fn find_or_create_folder<F>(
        &mut self,
        root: NodeId,
        directory: &Path,
        base_override: Option<&Path>,
        factory: &mut F,
    ) -> Result<NodeId, TreeError>
    where
        F: FnMut(&Path) -> Node,
    {
        let root_node = self.get(root).ok_or(TreeError::UnknownNode { id: root })?;
        if !root_node.is_folder() {
            return Err(TreeError::NotAFolder { id: root });
        }
        let base = base_override
            .filter(|base| !base.as_os_str().is_empty())
            .unwrap_or(root_node.file_path())
            .to_path_buf();

        let is_filesystem_root = base.parent().is_none();
        let relative = (!base.as_os_str().is_empty() && !is_filesystem_root)
            .then(|| directory.strip_prefix(&base).ok())
            .flatten();

        let (mut path, segments): (PathBuf, Vec<CompactString>) = match relative {
            Some(rest) => (base.clone(), segments_of(rest)),
            None => (anchor_of(directory), segments_of(directory)),
        };

        let mut parent = root;
        for (index, segment) in segments.iter().enumerate() {
            path.push(segment.as_str());
            parent = match self.folder_node(parent, &path) {
                Some(existing) => existing,
                None => {
                    let mut folder = factory(&path);
                    let display_name = if index == 0 && relative.is_none() && !cfg!(windows) {
                        format_compact!("/{segment}")
                    } else {
                        segment.clone()
                    };
                    folder.set_display_name(display_name);
                    let id = self.insert(folder);
                    if let Err(e) = self.add_node(parent, id) {
                        self.free_subtree(id);
                        return Err(e);
                    }
                    debug!(path = %path.display(), "created nested folder");
                    id
                }
            };
        }
        Ok(parent)
    }

    /// Collapse chains of single-child folders into one display folder.
    ///
    /// A plain or virtual folder whose only child is a plain or virtual
    /// folder absorbs it: the names are joined with `/`, the grandchildren
    /// move up and the folder takes over the child's path while keeping its
    /// own kind. Remaining child folders are compressed in turn. Projects and
    /// the session are never merged.
    pub fn compress(&mut self, folder: NodeId) -> Result<(), TreeError> {
        self.folder(folder)?;
        let mut pending = vec![folder];
        while let Some(id) = pending.pop() {
            while let Some(child) = self.mergeable_child(id) {
                self.merge_child(id, child);
            }
            pending.extend(self.folder_nodes(id));
        }
        Ok(())
    }

    fn mergeable_child(&self, id: NodeId) -> Option<NodeId> {
        let &[child] = self.children(id) else {
            return None;
        };
        let plain_or_virtual =
            |node: &Node| matches!(node.node_type(), NodeType::Folder | NodeType::VirtualFolder);
        (plain_or_virtual(self.get(id)?) && plain_or_virtual(self.get(child)?)).then_some(child)
    }

    fn merge_child(&mut self, id: NodeId, child: NodeId) {
        let Some(child_node) = self.get_mut(child) else {
            return;
        };
        child_node.parent = None;
        let child_path = child_node.file_path.clone();
        let child_name = CompactString::new(child_node.display_name());
        let grandchildren = child_node
            .as_folder_mut()
            .map(|folder| std::mem::take(&mut folder.children))
            .unwrap_or_default();

        for &grandchild in &grandchildren {
            if let Some(node) = self.get_mut(grandchild) {
                node.parent = Some(id);
            }
        }
        if let Some(node) = self.get_mut(id) {
            let name = format_compact!("{}/{}", node.display_name(), child_name);
            node.set_display_name(name);
            node.set_absolute_file_path_and_line(child_path, None);
            if let Some(folder) = node.as_folder_mut() {
                folder.children = grandchildren;
            }
        }
        self.free_subtree(child);
        debug!(folder = %id, merged = %child, "compressed folder");
    }
}

fn segments_of(path: &Path) -> Vec<CompactString> {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(CompactString::new(segment.to_string_lossy())),
            _ => None,
        })
        .collect()
}

/// Prefix and root of an absolute path (`/`, `C:\`), empty otherwise.
fn anchor_of(path: &Path) -> PathBuf {
    path.components()
        .take_while(|component| matches!(component, Component::Prefix(_) | Component::RootDir))
        .collect()
}
