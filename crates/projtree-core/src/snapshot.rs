//! Serializable view of a subtree.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::node::{FileType, NodeId, NodeType};
use crate::tree::ProjectTree;

/// Owned copy of a node and its descendants, detached from the arena.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub node_type: NodeType,
    pub name: String,
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    pub priority: i32,
    /// Effective enablement at snapshot time.
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<FileType>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub generated: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
}

impl NodeSnapshot {
    /// Number of file nodes in this subtree.
    pub fn file_count(&self) -> usize {
        let own = usize::from(self.node_type == NodeType::File);
        own + self.children.iter().map(NodeSnapshot::file_count).sum::<usize>()
    }
}

impl ProjectTree {
    /// Snapshot the subtree rooted at `id`.
    pub fn snapshot(&self, id: NodeId) -> Option<NodeSnapshot> {
        let node = self.get(id)?;
        Some(NodeSnapshot {
            id,
            node_type: node.node_type(),
            name: node.display_name().into_owned(),
            path: node.file_path().to_path_buf(),
            line: node.line(),
            priority: node.priority(),
            enabled: self.is_enabled(id),
            file_type: node.file_type(),
            generated: node.as_file().is_some_and(|file| file.is_generated()),
            children: self
                .children(id)
                .iter()
                .filter_map(|&child| self.snapshot(child))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;

    #[test]
    fn test_snapshot_json() {
        let mut tree = ProjectTree::new();
        let folder = tree.insert(Node::folder_named("/p/src", "src"));
        tree.add_node(tree.root(), folder).unwrap();
        let file = tree.insert(Node::file("/p/src/gen.cpp", FileType::Source, true));
        tree.add_node(folder, file).unwrap();
        tree.set_enabled(folder, false).unwrap();

        let snapshot = tree.snapshot(tree.root()).unwrap();
        assert_eq!(snapshot.file_count(), 1);
        assert!(!snapshot.children[0].children[0].enabled);

        let json = serde_json::to_value(&snapshot).unwrap();
        let child = &json["children"][0];
        assert_eq!(child["name"], "src");
        assert_eq!(child["node_type"], "Folder");
        assert!(child.get("file_type").is_none());
        assert_eq!(child["children"][0]["generated"], true);

        let back: NodeSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn test_snapshot_unknown_node() {
        let tree = ProjectTree::new();
        assert!(tree.snapshot(NodeId::new(42)).is_none());
    }
}
