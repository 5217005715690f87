//! Project tree node types.

use std::borrow::Cow;
use std::cell::OnceCell;
use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::project::ProjectManager;
use crate::providers::{Icon, IconKind, IconProvider};

/// Default priority of ordinary file nodes.
pub const DEFAULT_FILE_PRIORITY: i32 = 100_000;
/// Default priority of folder nodes.
pub const DEFAULT_FOLDER_PRIORITY: i32 = 200_000;
/// Default priority of project nodes.
pub const DEFAULT_PROJECT_PRIORITY: i32 = 300_000;
/// Default priority of project description files.
pub const DEFAULT_PROJECT_FILE_PRIORITY: i32 = 300_000;

/// Synthetic path of the session root.
pub const SESSION_PATH: &str = "session";

/// Unique identifier for a node within a [`ProjectTree`](crate::ProjectTree).
///
/// Identifiers are never reused, so an id that outlives its node simply
/// stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Create a new NodeId from a u64.
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Discriminant of the node variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
pub enum NodeType {
    File,
    Folder,
    #[strum(to_string = "Virtual folder")]
    VirtualFolder,
    Project,
    Session,
}

/// Classification of a file node.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize,
)]
pub enum FileType {
    #[default]
    Unknown,
    Header,
    Source,
    Form,
    #[strum(to_string = "State chart")]
    StateChart,
    Resource,
    #[allow(clippy::upper_case_acronyms)]
    QML,
    Project,
}

/// Leaf payload: one file of the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileNode {
    file_type: FileType,
    generated: bool,
}

impl FileNode {
    /// Kind of the file.
    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    /// Returns `true` if the file is produced by a build step.
    pub fn is_generated(&self) -> bool {
        self.generated
    }
}

/// Specialization of a folder node.
#[derive(Debug)]
pub enum FolderKind {
    /// A directory on disk.
    Plain,
    /// A logical grouping without a filesystem counterpart.
    Virtual {
        /// Overrides the add-file filter inherited from the parents.
        add_file_filter: Option<String>,
    },
    /// A buildable project; mutations go through its manager.
    Project(Box<dyn ProjectManager>),
    /// The tree root.
    Session,
}

/// Interior payload: a folder owning an ordered list of children.
#[derive(Debug)]
pub struct FolderNode {
    pub(crate) display_name: CompactString,
    pub(crate) children: Vec<NodeId>,
    icon: OnceCell<Icon>,
    pub(crate) kind: FolderKind,
}

impl FolderNode {
    fn new(display_name: CompactString, kind: FolderKind) -> Self {
        Self {
            display_name,
            children: Vec::new(),
            icon: OnceCell::new(),
            kind,
        }
    }

    /// Name shown in views, independent of the path.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Direct children in display order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Returns `true` if the folder has no children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// The folder specialization.
    pub fn kind(&self) -> &FolderKind {
        &self.kind
    }

    /// The icon, resolved through `provider` on first use.
    pub fn icon(&self, provider: &dyn IconProvider) -> &Icon {
        self.icon.get_or_init(|| {
            let kind = match self.kind {
                FolderKind::Plain | FolderKind::Session => IconKind::Folder,
                FolderKind::Virtual { .. } => IconKind::VirtualFolder,
                FolderKind::Project(_) => IconKind::Project,
            };
            provider.icon_for(kind)
        })
    }

    pub(crate) fn set_icon(&mut self, icon: Icon) {
        self.icon = OnceCell::from(icon);
    }
}

/// Variant payload of a [`Node`].
#[derive(Debug)]
pub enum NodeKind {
    File(FileNode),
    Folder(FolderNode),
}

/// A single entry of the project tree.
///
/// Nodes are built detached and moved into a tree with
/// [`ProjectTree::insert`](crate::ProjectTree::insert). The parent link is a
/// plain id; ownership runs from folders to their children.
#[derive(Debug)]
pub struct Node {
    pub(crate) file_path: PathBuf,
    pub(crate) line: Option<u32>,
    pub(crate) priority: i32,
    pub(crate) enabled: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) kind: NodeKind,
}

impl Node {
    fn with_kind(file_path: PathBuf, line: Option<u32>, priority: i32, kind: NodeKind) -> Self {
        Self {
            file_path,
            line,
            priority,
            enabled: true,
            parent: None,
            kind,
        }
    }

    /// Create a file node.
    pub fn file(file_path: impl Into<PathBuf>, file_type: FileType, generated: bool) -> Self {
        let priority = if file_type == FileType::Project {
            DEFAULT_PROJECT_FILE_PRIORITY
        } else {
            DEFAULT_FILE_PRIORITY
        };
        Self::with_kind(
            file_path.into(),
            None,
            priority,
            NodeKind::File(FileNode {
                file_type,
                generated,
            }),
        )
    }

    /// Create a file node pointing at a specific line.
    pub fn file_at_line(
        file_path: impl Into<PathBuf>,
        file_type: FileType,
        generated: bool,
        line: u32,
    ) -> Self {
        let mut node = Self::file(file_path, file_type, generated);
        node.line = Some(line);
        node
    }

    /// Create a folder node displayed under its full path.
    pub fn folder(folder_path: impl Into<PathBuf>) -> Self {
        let folder_path = folder_path.into();
        let display_name = user_output(&folder_path);
        Self::folder_named(folder_path, display_name)
    }

    /// Create a folder node with an explicit display name.
    pub fn folder_named(folder_path: impl Into<PathBuf>, display_name: impl Into<CompactString>) -> Self {
        let folder_path = folder_path.into();
        let mut display_name = display_name.into();
        if display_name.is_empty() {
            display_name = user_output(&folder_path);
        }
        Self::with_kind(
            folder_path,
            None,
            DEFAULT_FOLDER_PRIORITY,
            NodeKind::Folder(FolderNode::new(display_name, FolderKind::Plain)),
        )
    }

    /// Create a virtual folder node sorted by `priority`.
    pub fn virtual_folder(folder_path: impl Into<PathBuf>, priority: i32) -> Self {
        let folder_path = folder_path.into();
        let display_name = user_output(&folder_path);
        Self::with_kind(
            folder_path,
            None,
            priority,
            NodeKind::Folder(FolderNode::new(
                display_name,
                FolderKind::Virtual {
                    add_file_filter: None,
                },
            )),
        )
    }

    /// Create a project node managed by `manager`.
    pub fn project(project_path: impl Into<PathBuf>, manager: impl ProjectManager + 'static) -> Self {
        let project_path = project_path.into();
        let display_name = project_path
            .file_name()
            .map(|name| CompactString::new(name.to_string_lossy()))
            .unwrap_or_else(|| user_output(&project_path));
        Self::with_kind(
            project_path,
            None,
            DEFAULT_PROJECT_PRIORITY,
            NodeKind::Folder(FolderNode::new(
                display_name,
                FolderKind::Project(Box::new(manager)),
            )),
        )
    }

    pub(crate) fn session() -> Self {
        Self::with_kind(
            PathBuf::from(SESSION_PATH),
            None,
            DEFAULT_FOLDER_PRIORITY,
            NodeKind::Folder(FolderNode::new(SESSION_PATH.into(), FolderKind::Session)),
        )
    }

    /// Path of the file or folder this node represents.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Associated source line, if any.
    pub fn line(&self) -> Option<u32> {
        self.line
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
    }

    /// Replace the path and line in one step.
    pub fn set_absolute_file_path_and_line(&mut self, file_path: impl Into<PathBuf>, line: Option<u32>) {
        self.file_path = file_path.into();
        self.line = line;
    }

    /// The local enabled flag, ignoring ancestors.
    ///
    /// Use [`ProjectTree::is_enabled`](crate::ProjectTree::is_enabled) for
    /// the effective state.
    pub fn is_locally_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// The owning folder, if attached.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn node_type(&self) -> NodeType {
        match &self.kind {
            NodeKind::File(_) => NodeType::File,
            NodeKind::Folder(folder) => match folder.kind {
                FolderKind::Plain => NodeType::Folder,
                FolderKind::Virtual { .. } => NodeType::VirtualFolder,
                FolderKind::Project(_) => NodeType::Project,
                FolderKind::Session => NodeType::Session,
            },
        }
    }

    pub fn as_file(&self) -> Option<&FileNode> {
        match &self.kind {
            NodeKind::File(file) => Some(file),
            NodeKind::Folder(_) => None,
        }
    }

    /// Folder view of any folder-like variant (including projects and the session).
    pub fn as_folder(&self) -> Option<&FolderNode> {
        match &self.kind {
            NodeKind::Folder(folder) => Some(folder),
            NodeKind::File(_) => None,
        }
    }

    pub(crate) fn as_folder_mut(&mut self) -> Option<&mut FolderNode> {
        match &mut self.kind {
            NodeKind::Folder(folder) => Some(folder),
            NodeKind::File(_) => None,
        }
    }

    /// The project manager if this node is a project.
    pub fn project_manager(&self) -> Option<&dyn ProjectManager> {
        match self.as_folder().map(|folder| &folder.kind) {
            Some(FolderKind::Project(manager)) => Some(manager.as_ref()),
            _ => None,
        }
    }

    pub(crate) fn project_manager_mut(&mut self) -> Option<&mut (dyn ProjectManager + 'static)> {
        match self.as_folder_mut().map(|folder| &mut folder.kind) {
            Some(FolderKind::Project(manager)) => Some(manager.as_mut()),
            _ => None,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, NodeKind::File(_))
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.kind, NodeKind::Folder(_))
    }

    pub fn is_virtual_folder(&self) -> bool {
        self.node_type() == NodeType::VirtualFolder
    }

    pub fn is_project(&self) -> bool {
        self.node_type() == NodeType::Project
    }

    pub fn is_session(&self) -> bool {
        self.node_type() == NodeType::Session
    }

    /// Kind of the file, or `None` for folders.
    pub fn file_type(&self) -> Option<FileType> {
        self.as_file().map(FileNode::file_type)
    }

    /// Name shown in views: the folder's display name or the file name.
    pub fn display_name(&self) -> Cow<'_, str> {
        match &self.kind {
            NodeKind::Folder(folder) => Cow::Borrowed(folder.display_name()),
            NodeKind::File(_) => self
                .file_path
                .file_name()
                .map(|name| name.to_string_lossy())
                .unwrap_or_else(|| self.file_path.to_string_lossy()),
        }
    }

    /// Rename a folder in views. No effect on files.
    pub fn set_display_name(&mut self, name: impl Into<CompactString>) {
        if let Some(folder) = self.as_folder_mut() {
            folder.display_name = name.into();
        }
    }

    pub fn tooltip(&self) -> String {
        user_output(&self.file_path).into()
    }

    /// Set the add-file filter of a virtual folder. No effect on other variants.
    pub fn set_add_file_filter(&mut self, filter: impl Into<String>) {
        if let Some(FolderNode {
            kind: FolderKind::Virtual { add_file_filter },
            ..
        }) = self.as_folder_mut()
        {
            *add_file_filter = Some(filter.into());
        }
    }

    /// Rendering bucket used before priority when ordering siblings.
    pub(crate) fn sort_bucket(&self) -> u8 {
        match self.node_type() {
            NodeType::VirtualFolder => 0,
            NodeType::Session | NodeType::Project => 1,
            NodeType::Folder => 2,
            NodeType::File => 3,
        }
    }

    /// Order two nodes alphabetically by path.
    pub fn sort_by_path(a: &Node, b: &Node) -> Ordering {
        a.file_path.cmp(&b.file_path)
    }
}

fn user_output(path: &Path) -> CompactString {
    CompactString::new(path.to_string_lossy())
}
