//! Arena-backed project tree.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use compact_str::CompactString;
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, error, warn};

use crate::error::TreeError;
use crate::node::{FolderKind, FolderNode, Node, NodeId, NodeKind};
use crate::project::ProjectAction;
use crate::providers::{DefaultIconProvider, Icon, IconKind, IconProvider, NullObserver, TreeObserver};

/// Add-file filter offered at session level.
pub const SESSION_ADD_FILE_FILTER: &str =
    "*.c; *.cc; *.cpp; *.cp; *.cxx; *.c++; *.h; *.hh; *.hpp; *.hxx;";

/// Display name and priority proposed when adding new files to a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddNewInformation {
    pub display_name: String,
    pub priority: i32,
}

/// The whole node hierarchy of a session.
///
/// All nodes live in one arena. Folders own their children through id
/// lists; the parent link stored on each node is a back reference only.
/// Mutation needs `&mut self`, which serializes structural changes.
pub struct ProjectTree {
    nodes: HashMap<NodeId, Node>,
    next_id: u64,
    root: NodeId,
    icons: Arc<dyn IconProvider>,
    observer: Arc<dyn TreeObserver>,
}

impl fmt::Debug for ProjectTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectTree")
            .field("root", &self.root)
            .field("nodes", &self.nodes.len())
            .finish_non_exhaustive()
    }
}

impl Default for ProjectTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectTree {
    /// Create a tree holding only the session root.
    pub fn new() -> Self {
        let mut tree = Self {
            nodes: HashMap::new(),
            next_id: 0,
            root: NodeId::new(0),
            icons: Arc::new(DefaultIconProvider),
            observer: Arc::new(NullObserver),
        };
        tree.root = tree.insert(Node::session());
        tree
    }

    /// Replace the receiver of subtree change notifications.
    pub fn with_observer(mut self, observer: Arc<dyn TreeObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Replace the icon provider used by [`ProjectTree::icon`].
    pub fn with_icon_provider(mut self, icons: Arc<dyn IconProvider>) -> Self {
        self.icons = icons;
        self
    }

    /// The session root.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes in the arena, attached or not.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Move a detached node into the arena.
    pub fn insert(&mut self, mut node: Node) -> NodeId {
        let id = NodeId::new(self.next_id);
        self.next_id += 1;
        node.parent = None;
        self.nodes.insert(id, node);
        id
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(Node::parent)
    }

    /// Direct children of a folder; empty for files and unknown ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id)
            .and_then(Node::as_folder)
            .map(FolderNode::children)
            .unwrap_or(&[])
    }

    pub(crate) fn folder(&self, id: NodeId) -> Result<&FolderNode, TreeError> {
        self.get(id)
            .ok_or(TreeError::UnknownNode { id })?
            .as_folder()
            .ok_or(TreeError::NotAFolder { id })
    }

    fn attach(&mut self, folder: NodeId, node: NodeId) {
        if let Some(parent) = self.nodes.get_mut(&folder).and_then(Node::as_folder_mut) {
            parent.children.push(node);
        }
        if let Some(child) = self.nodes.get_mut(&node) {
            child.parent = Some(folder);
        }
    }

    fn check_attachable(&self, folder: NodeId, node: NodeId) -> Result<(), TreeError> {
        self.folder(folder)?;
        let child = self.get(node).ok_or(TreeError::UnknownNode { id: node })?;
        if node == self.root {
            return Err(TreeError::SessionRoot { id: node });
        }
        if let Some(parent) = child.parent() {
            error!(%node, %parent, "node already has a parent folder");
            return Err(TreeError::AlreadyParented { node, parent });
        }
        if self.is_ancestor_of(node, folder) {
            return Err(TreeError::WouldCreateCycle { node, folder });
        }
        Ok(())
    }

    /// Append a detached node to `folder`.
    ///
    /// Rejected without any change when the node already has a parent, when
    /// `folder` is not a folder, or when the node is an ancestor of `folder`.
    pub fn add_node(&mut self, folder: NodeId, node: NodeId) -> Result<(), TreeError> {
        self.check_attachable(folder, node)?;
        self.attach(folder, node);
        Ok(())
    }

    /// Detach `node` from `folder` without destroying it.
    ///
    /// The caller becomes responsible for the node: attach it again or
    /// [`destroy`](Self::destroy) it. Returns `false` when `node` is not a
    /// child of `folder`.
    pub fn remove_node(&mut self, folder: NodeId, node: NodeId) -> bool {
        let Some(parent) = self.nodes.get_mut(&folder).and_then(Node::as_folder_mut) else {
            return false;
        };
        let Some(index) = parent.children.iter().position(|&child| child == node) else {
            return false;
        };
        parent.children.remove(index);
        if let Some(child) = self.nodes.get_mut(&node) {
            child.parent = None;
        }
        true
    }

    /// Detach `id` if attached, then drop it and its whole subtree.
    pub fn destroy(&mut self, id: NodeId) -> Result<(), TreeError> {
        if id == self.root {
            return Err(TreeError::SessionRoot { id });
        }
        let parent = self.get(id).ok_or(TreeError::UnknownNode { id })?.parent();
        if let Some(parent) = parent {
            self.remove_node(parent, id);
        }
        self.free_subtree(id);
        Ok(())
    }

    /// Drop a detached subtree from the arena.
    pub(crate) fn free_subtree(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            if let Some(node) = self.nodes.remove(&id) {
                if let NodeKind::Folder(folder) = node.kind {
                    pending.extend(folder.children);
                }
            }
        }
    }

    /// First node matching `predicate` in pre-order, starting with `root`.
    pub fn find_node<P>(&self, root: NodeId, mut predicate: P) -> Option<NodeId>
    where
        P: FnMut(NodeId, &Node) -> bool,
    {
        self.find_first(root, &mut predicate)
    }

    fn find_first<P>(&self, id: NodeId, predicate: &mut P) -> Option<NodeId>
    where
        P: FnMut(NodeId, &Node) -> bool,
    {
        let node = self.get(id)?;
        if predicate(id, node) {
            return Some(id);
        }
        self.children(id)
            .iter()
            .find_map(|&child| self.find_first(child, predicate))
    }

    /// Every node matching `predicate` in pre-order, including `root`.
    pub fn find_nodes<P>(&self, root: NodeId, mut predicate: P) -> Vec<NodeId>
    where
        P: FnMut(NodeId, &Node) -> bool,
    {
        let mut found = Vec::new();
        self.collect_matching(root, &mut predicate, &mut found);
        found
    }

    fn collect_matching<P>(&self, id: NodeId, predicate: &mut P, found: &mut Vec<NodeId>)
    where
        P: FnMut(NodeId, &Node) -> bool,
    {
        let Some(node) = self.get(id) else {
            return;
        };
        if predicate(id, node) {
            found.push(id);
        }
        for &child in self.children(id) {
            self.collect_matching(child, predicate, found);
        }
    }

    /// Depth-first walk over the folders below and including `folder`.
    ///
    /// A folder rejected by `folder_filter` is skipped together with its
    /// subtree. For an accepted folder, its direct files go to `on_file`,
    /// then each child folder goes to `on_folder` before being walked.
    pub fn for_each_node<F, D, P>(
        &self,
        folder: NodeId,
        mut on_file: F,
        mut on_folder: D,
        mut folder_filter: P,
    ) where
        F: FnMut(NodeId, &Node),
        D: FnMut(NodeId, &Node),
        P: FnMut(NodeId, &Node) -> bool,
    {
        self.walk_folder(folder, &mut on_file, &mut on_folder, &mut folder_filter);
    }

    fn walk_folder<F, D, P>(&self, id: NodeId, on_file: &mut F, on_folder: &mut D, folder_filter: &mut P)
    where
        F: FnMut(NodeId, &Node),
        D: FnMut(NodeId, &Node),
        P: FnMut(NodeId, &Node) -> bool,
    {
        let Some(node) = self.get(id) else {
            return;
        };
        if !node.is_folder() || !folder_filter(id, node) {
            return;
        }
        let children = self.children(id);
        for &child in children {
            if let Some(file) = self.get(child).filter(|n| n.is_file()) {
                on_file(child, file);
            }
        }
        for &child in children {
            if let Some(sub) = self.get(child).filter(|n| n.is_folder()) {
                on_folder(child, sub);
                self.walk_folder(child, on_file, on_folder, folder_filter);
            }
        }
    }

    /// Visit every node below `folder` in pre-order, excluding `folder`.
    pub fn for_each_generic_node<V>(&self, folder: NodeId, mut visit: V)
    where
        V: FnMut(NodeId, &Node),
    {
        let mut pending: Vec<NodeId> = self.children(folder).iter().rev().copied().collect();
        while let Some(id) = pending.pop() {
            if let Some(node) = self.get(id) {
                visit(id, node);
                pending.extend(self.children(id).iter().rev());
            }
        }
    }

    /// `true` if `node` is `ancestor` or lies in its subtree.
    pub fn is_ancestor_of(&self, ancestor: NodeId, node: NodeId) -> bool {
        if ancestor == node {
            return true;
        }
        let mut current = self.parent(node);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.parent(parent);
        }
        false
    }

    /// Swap a managed child of `folder` and notify the observer.
    ///
    /// Without `old`, `new` is appended. Otherwise `old` must be a direct
    /// child: `new` takes over its slot (or the slot is dropped) and `old` is
    /// destroyed with its subtree. The observer hears about `folder` once
    /// per successful call.
    pub fn replace_subtree(
        &mut self,
        folder: NodeId,
        old: Option<NodeId>,
        new: Option<NodeId>,
    ) -> Result<(), TreeError> {
        match old {
            None => {
                self.folder(folder)?;
                if let Some(new) = new {
                    self.add_node(folder, new)?;
                }
            }
            Some(old) => {
                let slot = self
                    .folder(folder)?
                    .children
                    .iter()
                    .position(|&child| child == old)
                    .ok_or_else(|| {
                        error!(%old, %folder, "replacing a node that is not a child");
                        TreeError::NotAChild { node: old, folder }
                    })?;
                if let Some(new) = new {
                    self.check_attachable(folder, new)?;
                }

                if let Some(parent) = self.nodes.get_mut(&folder).and_then(Node::as_folder_mut) {
                    match new {
                        Some(new) => parent.children[slot] = new,
                        None => {
                            parent.children.remove(slot);
                        }
                    }
                }
                if let Some(new) = new.and_then(|new| self.nodes.get_mut(&new)) {
                    new.parent = Some(folder);
                }
                if let Some(old) = self.nodes.get_mut(&old) {
                    old.parent = None;
                }
                self.free_subtree(old);
            }
        }
        debug!(%folder, "subtree changed");
        self.observer.subtree_changed(folder);
        Ok(())
    }

    /// Direct file children of `folder`.
    pub fn file_nodes(&self, folder: NodeId) -> Vec<NodeId> {
        self.children_where(folder, Node::is_file)
    }

    /// Direct folder children of `folder`, any folder variant.
    pub fn folder_nodes(&self, folder: NodeId) -> Vec<NodeId> {
        self.children_where(folder, Node::is_folder)
    }

    fn children_where(&self, folder: NodeId, keep: impl Fn(&Node) -> bool) -> Vec<NodeId> {
        self.children(folder)
            .iter()
            .copied()
            .filter(|&child| self.get(child).is_some_and(&keep))
            .collect()
    }

    /// Direct file child of `folder` with the given path.
    pub fn file_node(&self, folder: NodeId, file_path: &Path) -> Option<NodeId> {
        self.children(folder).iter().copied().find(|&child| {
            self.get(child)
                .is_some_and(|node| node.is_file() && node.file_path() == file_path)
        })
    }

    /// Direct folder child of `folder` with the given path.
    pub fn folder_node(&self, folder: NodeId, folder_path: &Path) -> Option<NodeId> {
        self.children(folder).iter().copied().find(|&child| {
            self.get(child)
                .is_some_and(|node| node.is_folder() && node.file_path() == folder_path)
        })
    }

    /// `true` if `folder` has no children (or is not a folder).
    pub fn is_empty(&self, folder: NodeId) -> bool {
        self.children(folder).is_empty()
    }

    /// Effective enablement: the node and all its ancestors are enabled.
    pub fn is_enabled(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(id) = current {
            match self.get(id) {
                Some(node) if node.is_locally_enabled() => current = node.parent(),
                _ => return false,
            }
        }
        true
    }

    /// Set the local enabled flag. Descendants are not touched.
    pub fn set_enabled(&mut self, id: NodeId, enabled: bool) -> Result<(), TreeError> {
        self.get_mut(id)
            .ok_or(TreeError::UnknownNode { id })?
            .set_enabled(enabled);
        Ok(())
    }

    pub fn set_display_name(
        &mut self,
        folder: NodeId,
        name: impl Into<CompactString>,
    ) -> Result<(), TreeError> {
        let folder_node = self
            .nodes
            .get_mut(&folder)
            .ok_or(TreeError::UnknownNode { id: folder })?
            .as_folder_mut()
            .ok_or(TreeError::NotAFolder { id: folder })?;
        folder_node.display_name = name.into();
        Ok(())
    }

    /// Icon of a node. Folder icons are resolved once and cached.
    pub fn icon(&self, id: NodeId) -> Option<Icon> {
        match &self.get(id)?.kind {
            NodeKind::Folder(folder) => Some(folder.icon(self.icons.as_ref()).clone()),
            NodeKind::File(file) => Some(self.icons.icon_for(IconKind::File(file.file_type()))),
        }
    }

    pub fn set_icon(&mut self, folder: NodeId, icon: Icon) -> Result<(), TreeError> {
        self.nodes
            .get_mut(&folder)
            .ok_or(TreeError::UnknownNode { id: folder })?
            .as_folder_mut()
            .ok_or(TreeError::NotAFolder { id: folder })?
            .set_icon(icon);
        Ok(())
    }

    /// Order the children of `folder`: virtual folders, projects, folders,
    /// then files; lower priority first; then by path.
    pub fn sort_children(&mut self, folder: NodeId) {
        let mut children = self.children(folder).to_vec();
        children.sort_by_cached_key(|&child| {
            self.get(child)
                .map(|node| (node.sort_bucket(), node.priority(), node.file_path().to_path_buf()))
        });
        if let Some(folder_node) = self.nodes.get_mut(&folder).and_then(Node::as_folder_mut) {
            folder_node.children = children;
        }
    }

    /// Actions available on `target`, as seen from node `id`.
    ///
    /// Each level defers to its parent and appends
    /// [`ProjectAction::InheritedFromParent`]; a project manager may answer
    /// instead, and the session offers nothing.
    pub fn supported_actions(&self, id: NodeId, target: NodeId) -> Vec<ProjectAction> {
        let Some(node) = self.get(id) else {
            return Vec::new();
        };
        if node.is_session() {
            return Vec::new();
        }
        let answered = node
            .project_manager()
            .zip(self.get(target))
            .and_then(|(manager, target_node)| manager.supported_actions(target_node));
        if let Some(actions) = answered {
            return actions;
        }
        match node.parent() {
            Some(parent) => {
                let mut actions = self.supported_actions(parent, target);
                actions.push(ProjectAction::InheritedFromParent);
                actions
            }
            None => Vec::new(),
        }
    }

    /// Glob filter for files added below `id`, inherited from the parents.
    pub fn add_file_filter(&self, id: NodeId) -> Option<&str> {
        let node = self.get(id)?;
        match node.as_folder().map(FolderNode::kind) {
            Some(FolderKind::Virtual {
                add_file_filter: Some(filter),
            }) => Some(filter.as_str()),
            Some(FolderKind::Session) => Some(SESSION_ADD_FILE_FILTER),
            _ => self.add_file_filter(node.parent()?),
        }
    }

    /// `true` if the file name of `path` matches the add-file filter of `id`.
    pub fn matches_add_file_filter(&self, id: NodeId, path: &Path) -> bool {
        let (Some(filter), Some(name)) = (self.add_file_filter(id), path.file_name()) else {
            return false;
        };
        compile_filter(filter).is_match(name)
    }

    /// Whether the node appears in the simplified project view.
    pub fn show_in_simple_tree(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(|node| {
            node.is_session()
                || node
                    .project_manager()
                    .is_some_and(|manager| manager.show_in_simple_tree())
        })
    }

    /// Suggestion for the "add new file" wizard targeting `folder`.
    pub fn add_new_information(&self, folder: NodeId, context: Option<NodeId>) -> Option<AddNewInformation> {
        let node = self.get(folder)?;
        node.as_folder()?;
        Some(AddNewInformation {
            display_name: node.display_name().into_owned(),
            priority: if context == Some(folder) { 120 } else { 100 },
        })
    }
}

/// Compile a `;`-separated list of globs, skipping invalid entries.
fn compile_filter(filter: &str) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in filter.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => warn!(pattern, error = %e, "ignoring invalid add-file filter pattern"),
        }
    }
    builder.build().unwrap_or_else(|_| GlobSet::empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{FileType, NodeType};
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn file(path: &str) -> Node {
        Node::file(path, FileType::Source, false)
    }

    /// session -> folder(/p) -> [a.cpp, sub(/p/sub) -> [b.h]]
    fn sample() -> (ProjectTree, NodeId, NodeId, NodeId, NodeId) {
        let mut tree = ProjectTree::new();
        let folder = tree.insert(Node::folder("/p"));
        tree.add_node(tree.root(), folder).unwrap();
        let a = tree.insert(file("/p/a.cpp"));
        tree.add_node(folder, a).unwrap();
        let sub = tree.insert(Node::folder("/p/sub"));
        tree.add_node(folder, sub).unwrap();
        let b = tree.insert(Node::file("/p/sub/b.h", FileType::Header, false));
        tree.add_node(sub, b).unwrap();
        (tree, folder, a, sub, b)
    }

    #[test]
    fn test_new_tree_has_session_root() {
        let tree = ProjectTree::new();
        let root = tree.get(tree.root()).unwrap();
        assert_eq!(root.node_type(), NodeType::Session);
        assert_eq!(root.file_path(), Path::new("session"));
        assert!(tree.is_empty(tree.root()));
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_add_node_sets_parent() {
        let (tree, folder, a, sub, b) = sample();
        assert_eq!(tree.parent(a), Some(folder));
        assert_eq!(tree.parent(b), Some(sub));
        assert_eq!(tree.children(folder), &[a, sub]);
    }

    #[test]
    fn test_add_node_rejects_parented_node() {
        let (mut tree, folder, a, sub, _) = sample();
        let err = tree.add_node(sub, a).unwrap_err();
        assert_eq!(err, TreeError::AlreadyParented { node: a, parent: folder });
        assert_eq!(tree.children(folder), &[a, sub]);
        assert_eq!(tree.children(sub).len(), 1);
    }

    #[test]
    fn test_add_node_rejects_cycles_and_files() {
        let (mut tree, folder, a, sub, _) = sample();
        assert!(tree.remove_node(tree.root(), folder));
        assert_eq!(
            tree.add_node(sub, folder),
            Err(TreeError::WouldCreateCycle { node: folder, folder: sub })
        );
        let loose = tree.insert(file("/x.cpp"));
        assert_eq!(tree.add_node(a, loose), Err(TreeError::NotAFolder { id: a }));
        assert_eq!(
            tree.add_node(folder, tree.root()),
            Err(TreeError::SessionRoot { id: tree.root() })
        );
    }

    #[test]
    fn test_remove_node_keeps_node_alive() {
        let (mut tree, folder, a, sub, _) = sample();
        assert!(tree.remove_node(folder, a));
        assert_eq!(tree.children(folder), &[sub]);
        assert_eq!(tree.parent(a), None);
        assert!(tree.contains(a));
        assert!(!tree.remove_node(folder, a));

        tree.add_node(sub, a).unwrap();
        assert_eq!(tree.parent(a), Some(sub));
    }

    #[test]
    fn test_destroy_drops_subtree() {
        let (mut tree, folder, a, sub, b) = sample();
        tree.destroy(sub).unwrap();
        assert!(!tree.contains(sub));
        assert!(!tree.contains(b));
        assert_eq!(tree.children(folder), &[a]);
        assert_eq!(tree.destroy(sub), Err(TreeError::UnknownNode { id: sub }));
        assert!(tree.destroy(tree.root()).is_err());
    }

    #[test]
    fn test_find_node_pre_order() {
        let (tree, folder, a, sub, b) = sample();
        assert_eq!(tree.find_node(folder, |_, _| true), Some(folder));
        assert_eq!(tree.find_node(folder, |_, n| n.is_file()), Some(a));
        assert_eq!(
            tree.find_node(folder, |_, n| n.file_type() == Some(FileType::Header)),
            Some(b)
        );
        assert_eq!(tree.find_node(sub, |id, _| id == a), None);
    }

    #[test]
    fn test_find_nodes_collects_all() {
        let (tree, folder, a, sub, b) = sample();
        assert_eq!(tree.find_nodes(folder, |_, _| true), vec![folder, a, sub, b]);
        assert_eq!(tree.find_nodes(folder, |_, n| n.is_file()), vec![a, b]);
    }

    #[test]
    fn test_for_each_node_order_and_filter() {
        let (tree, folder, a, sub, b) = sample();
        let events = RefCell::new(Vec::new());
        tree.for_each_node(
            tree.root(),
            |id, _| events.borrow_mut().push(("file", id)),
            |id, _| events.borrow_mut().push(("folder", id)),
            |_, _| true,
        );
        assert_eq!(
            events.into_inner(),
            vec![("folder", folder), ("file", a), ("folder", sub), ("file", b)]
        );

        let mut files = Vec::new();
        tree.for_each_node(tree.root(), |id, _| files.push(id), |_, _| {}, |id, _| id != sub);
        assert_eq!(files, vec![a]);

        let mut nothing = Vec::new();
        tree.for_each_node(folder, |id, _| nothing.push(id), |_, _| {}, |_, _| false);
        assert!(nothing.is_empty());
    }

    #[test]
    fn test_for_each_generic_node() {
        let (tree, folder, a, sub, b) = sample();
        let mut seen = Vec::new();
        tree.for_each_generic_node(tree.root(), |id, _| seen.push(id));
        assert_eq!(seen, vec![folder, a, sub, b]);
    }

    #[test]
    fn test_is_ancestor_of() {
        let (tree, folder, a, sub, b) = sample();
        assert!(tree.is_ancestor_of(sub, sub));
        assert!(tree.is_ancestor_of(folder, sub));
        assert!(tree.is_ancestor_of(folder, b));
        assert!(tree.is_ancestor_of(tree.root(), b));
        assert!(!tree.is_ancestor_of(sub, a));
        assert!(!tree.is_ancestor_of(b, sub));
    }

    #[derive(Default)]
    struct CountingObserver(AtomicUsize);

    impl TreeObserver for CountingObserver {
        fn subtree_changed(&self, _folder: NodeId) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_replace_subtree_swaps_slot() {
        let observer = Arc::new(CountingObserver::default());
        let (tree, folder, a, sub, b) = sample();
        let mut tree = tree.with_observer(observer.clone());

        let replacement = tree.insert(Node::folder("/p/other"));
        tree.replace_subtree(folder, Some(sub), Some(replacement)).unwrap();

        assert_eq!(tree.children(folder), &[a, replacement]);
        assert_eq!(tree.parent(replacement), Some(folder));
        assert!(!tree.contains(sub));
        assert!(!tree.contains(b));
        assert_eq!(observer.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_replace_subtree_without_new_removes_slot() {
        let (mut tree, folder, a, sub, _) = sample();
        tree.replace_subtree(folder, Some(a), None).unwrap();
        assert_eq!(tree.children(folder), &[sub]);
        assert!(!tree.contains(a));
    }

    #[test]
    fn test_replace_subtree_without_old_appends() {
        let (mut tree, folder, a, sub, _) = sample();
        let extra = tree.insert(file("/p/c.cpp"));
        tree.replace_subtree(folder, None, Some(extra)).unwrap();
        assert_eq!(tree.children(folder), &[a, sub, extra]);
    }

    #[test]
    fn test_replace_subtree_rejects_non_child() {
        let observer = Arc::new(CountingObserver::default());
        let (tree, folder, _, sub, b) = sample();
        let mut tree = tree.with_observer(observer.clone());
        let replacement = tree.insert(file("/p/c.cpp"));

        assert_eq!(
            tree.replace_subtree(folder, Some(b), Some(replacement)),
            Err(TreeError::NotAChild { node: b, folder })
        );
        assert!(tree.contains(b));
        assert_eq!(tree.parent(b), Some(sub));
        assert_eq!(tree.parent(replacement), None);
        assert_eq!(observer.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_direct_child_queries() {
        let (tree, folder, a, sub, b) = sample();
        assert_eq!(tree.file_nodes(folder), vec![a]);
        assert_eq!(tree.folder_nodes(folder), vec![sub]);
        assert_eq!(tree.file_node(folder, Path::new("/p/a.cpp")), Some(a));
        assert_eq!(tree.file_node(folder, Path::new("/p/sub/b.h")), None);
        assert_eq!(tree.file_node(sub, Path::new("/p/sub/b.h")), Some(b));
        assert_eq!(tree.folder_node(folder, Path::new("/p/sub")), Some(sub));
        assert!(!tree.is_empty(folder));
        assert!(tree.is_empty(a));
    }

    #[test]
    fn test_effective_enablement() {
        let (mut tree, folder, a, sub, b) = sample();
        tree.set_enabled(folder, false).unwrap();
        assert!(!tree.is_enabled(folder));
        assert!(!tree.is_enabled(b));
        assert!(tree.get(b).unwrap().is_locally_enabled());

        tree.set_enabled(folder, true).unwrap();
        tree.set_enabled(sub, false).unwrap();
        assert!(tree.is_enabled(a));
        assert!(!tree.is_enabled(b));
    }

    #[test]
    fn test_icons_are_cached_per_folder() {
        let (mut tree, folder, a, _, _) = sample();
        assert_eq!(tree.icon(folder).unwrap().name(), "folder");
        assert_eq!(tree.icon(a).unwrap().name(), "text-x-source");

        tree.set_icon(folder, Icon::new("custom")).unwrap();
        assert_eq!(tree.icon(folder).unwrap().name(), "custom");
        assert!(tree.set_icon(a, Icon::new("x")).is_err());
    }

    #[test]
    fn test_sort_children() {
        let mut tree = ProjectTree::new();
        let folder = tree.insert(Node::folder("/p"));
        let z = tree.insert(file("/p/z.cpp"));
        let pro = tree.insert(Node::file("/p/app.pro", FileType::Project, false));
        let sub = tree.insert(Node::folder("/p/sub"));
        let headers = tree.insert(Node::virtual_folder("/p/Headers", 1));
        let m = tree.insert(file("/p/m.cpp"));
        for child in [z, pro, sub, headers, m] {
            tree.add_node(folder, child).unwrap();
        }

        tree.sort_children(folder);
        assert_eq!(tree.children(folder), &[headers, sub, m, z, pro]);
    }

    #[test]
    fn test_supported_actions_inherit() {
        let (tree, folder, a, _, b) = sample();
        assert!(tree.supported_actions(tree.root(), a).is_empty());
        assert_eq!(
            tree.supported_actions(folder, a),
            vec![ProjectAction::InheritedFromParent]
        );
        assert_eq!(
            tree.supported_actions(b, b),
            vec![ProjectAction::InheritedFromParent; 3]
        );
    }

    #[test]
    fn test_add_file_filter_inheritance() {
        let (mut tree, folder, _, sub, _) = sample();
        assert_eq!(tree.add_file_filter(sub), Some(SESSION_ADD_FILE_FILTER));
        assert!(tree.matches_add_file_filter(sub, Path::new("/p/x.hpp")));
        assert!(!tree.matches_add_file_filter(sub, Path::new("/p/x.py")));

        let scripts = tree.insert(Node::virtual_folder("/p/Scripts", 5));
        tree.get_mut(scripts).unwrap().set_add_file_filter("*.py; *.sh");
        tree.add_node(folder, scripts).unwrap();
        let nested = tree.insert(Node::folder("/p/Scripts/tools"));
        tree.add_node(scripts, nested).unwrap();

        assert_eq!(tree.add_file_filter(nested), Some("*.py; *.sh"));
        assert!(tree.matches_add_file_filter(nested, Path::new("/p/run.py")));

        let loose = tree.insert(Node::folder("/loose"));
        assert_eq!(tree.add_file_filter(loose), None);
    }

    #[test]
    fn test_simple_tree_and_add_new_information() {
        let (tree, folder, a, _, _) = sample();
        assert!(tree.show_in_simple_tree(tree.root()));
        assert!(!tree.show_in_simple_tree(folder));

        let info = tree.add_new_information(folder, Some(folder)).unwrap();
        assert_eq!(info.display_name, "/p");
        assert_eq!(info.priority, 120);
        assert_eq!(tree.add_new_information(folder, Some(a)).unwrap().priority, 100);
        assert!(tree.add_new_information(a, None).is_none());
    }

    #[test]
    fn test_insert_clears_parent() {
        let mut tree = ProjectTree::new();
        let mut node = Node::folder(PathBuf::from("/p"));
        node.parent = Some(NodeId::new(99));
        let id = tree.insert(node);
        assert_eq!(tree.parent(id), None);
    }
}
