//! LiberData file tree.
//!
//! The tree is an arena of nodes addressed by [`NodeId`]. Category roots are
//! known up front; directory contents are fetched lazily, once, on first
//! expansion. Collapsing and re-expanding never refetches.

use tracing::{debug, warn};

use crate::fetch::{DirectoryEntry, EntryKind};
use crate::registry::ToggleButton;

/// A top-level data category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub name: &'static str,
    /// Repository path, already percent-encoded
    pub path: &'static str,
}

/// Categories published in the LiberMap data repository.
pub const DEFAULT_CATEGORIES: [Category; 3] = [
    Category {
        name: "土地房屋 Land & Housing",
        path: "Data_GML/土地房屋%20Land%20%26%20Housing",
    },
    Category {
        name: "保育 Conservation",
        path: "Data_GML/保育%20Conservation",
    },
    Category {
        name: "規劃資料 (資料源自香港政府）Planning data from HK Government",
        path: "Data_GML/規劃資料%20(資料源自香港政府）Planning%20data%20from%20HK%20Government",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Load state of a directory's children.
#[derive(Debug, Clone, PartialEq)]
pub enum Children {
    Unloaded,
    Loading,
    Loaded(Vec<NodeId>),
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Directory { children: Children },
    File {
        download_url: Option<String>,
        button: ToggleButton,
    },
}

#[derive(Debug, Clone)]
pub struct TreeNode {
    pub name: String,
    pub path: String,
    pub kind: NodeKind,
    pub expanded: bool,
    pub parent: Option<NodeId>,
}

impl TreeNode {
    pub fn is_directory(&self) -> bool {
        matches!(self.kind, NodeKind::Directory { .. })
    }

    /// Expansion indicator shown before a directory name.
    pub fn indicator(&self) -> &'static str {
        if self.expanded {
            "▼"
        } else {
            "▶"
        }
    }
}

/// Result of clicking a directory header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    Collapsed,
    /// Expanded with children already known (or a fetch already in flight)
    Expanded,
    /// Expanded for the first time; the caller must list `path`.
    FetchRequired { path: String },
}

#[derive(Debug)]
pub struct FileTree {
    nodes: Vec<TreeNode>,
    roots: Vec<NodeId>,
    panel_open: bool,
}

impl FileTree {
    pub fn new(categories: &[Category]) -> Self {
        let mut tree = Self {
            nodes: Vec::with_capacity(categories.len()),
            roots: Vec::with_capacity(categories.len()),
            panel_open: false,
        };
        for category in categories {
            let id = tree.push(TreeNode {
                name: category.name.to_string(),
                path: category.path.to_string(),
                kind: NodeKind::Directory {
                    children: Children::Unloaded,
                },
                expanded: false,
                parent: None,
            });
            tree.roots.push(id);
        }
        tree
    }

    pub fn with_default_categories() -> Self {
        Self::new(&DEFAULT_CATEGORIES)
    }

    fn push(&mut self, node: TreeNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.0)
    }

    /// Loaded children of a directory; empty otherwise.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.node(id).map(|n| &n.kind) {
            Some(NodeKind::Directory {
                children: Children::Loaded(ids),
            }) => ids,
            _ => &[],
        }
    }

    pub fn find_by_path(&self, path: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.path == path).map(NodeId)
    }

    /// File leaf whose download URL is `url`.
    pub fn find_file_by_url(&self, url: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| {
                matches!(&n.kind, NodeKind::File { download_url: Some(u), .. } if u == url)
            })
            .map(NodeId)
    }

    /// Expand or collapse a directory. `None` for files and unknown ids.
    pub fn toggle(&mut self, id: NodeId) -> Option<ToggleOutcome> {
        let node = self.nodes.get_mut(id.0)?;
        let NodeKind::Directory { children } = &mut node.kind else {
            return None;
        };

        if node.expanded {
            node.expanded = false;
            return Some(ToggleOutcome::Collapsed);
        }
        node.expanded = true;
        if *children == Children::Unloaded {
            *children = Children::Loading;
            debug!(path = %node.path, "Folder listing required");
            return Some(ToggleOutcome::FetchRequired {
                path: node.path.clone(),
            });
        }
        Some(ToggleOutcome::Expanded)
    }

    /// Install the listing for the directory at `path`.
    ///
    /// Returns the number of children added, or `None` when no directory
    /// at `path` is waiting for a listing.
    pub fn apply_listing(&mut self, path: &str, entries: Vec<DirectoryEntry>) -> Option<usize> {
        let parent = self.nodes.iter().position(|n| {
            n.path == path
                && matches!(
                    n.kind,
                    NodeKind::Directory {
                        children: Children::Loading
                    }
                )
        })?;

        let mut ids = Vec::with_capacity(entries.len());
        for entry in entries {
            let kind = match entry.kind {
                EntryKind::Dir => NodeKind::Directory {
                    children: Children::Unloaded,
                },
                EntryKind::File => NodeKind::File {
                    button: ToggleButton::new(format!("toggle-{}", entry.path)),
                    download_url: entry.download_url,
                },
                EntryKind::Other => {
                    debug!(name = %entry.name, "Skipping unsupported entry");
                    continue;
                }
            };
            ids.push(self.push(TreeNode {
                name: entry.name,
                path: entry.path,
                kind,
                expanded: false,
                parent: Some(NodeId(parent)),
            }));
        }

        let count = ids.len();
        self.nodes[parent].kind = NodeKind::Directory {
            children: Children::Loaded(ids),
        };
        Some(count)
    }

    /// Listing for `path` failed: back to unloaded and collapsed, so the next
    /// expansion fetches again.
    pub fn listing_failed(&mut self, path: &str) -> bool {
        let Some(node) = self.nodes.iter_mut().find(|n| n.path == path) else {
            return false;
        };
        match &mut node.kind {
            NodeKind::Directory { children } if *children == Children::Loading => {
                *children = Children::Unloaded;
                node.expanded = false;
                warn!(path = path, "Folder listing failed");
                true
            }
            _ => false,
        }
    }

    /// Open or close the LiberData panel. Returns the new state.
    pub fn toggle_panel(&mut self) -> bool {
        self.panel_open = !self.panel_open;
        self.panel_open
    }

    pub fn is_panel_open(&self) -> bool {
        self.panel_open
    }

    /// Visible rows, depth first, as `(depth, id)`.
    pub fn visible_rows(&self) -> Vec<(usize, NodeId)> {
        let mut rows = Vec::new();
        let mut stack: Vec<(usize, NodeId)> = self.roots.iter().rev().map(|id| (0, *id)).collect();
        while let Some((depth, id)) = stack.pop() {
            rows.push((depth, id));
            if self.node(id).is_some_and(|n| n.expanded) {
                for child in self.children(id).iter().rev() {
                    stack.push((depth + 1, *child));
                }
            }
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ToggleState;

    fn entry(name: &str, path: &str, kind: EntryKind) -> DirectoryEntry {
        DirectoryEntry {
            name: name.to_string(),
            path: path.to_string(),
            kind,
            download_url: match kind {
                EntryKind::File => Some(format!("https://raw.example/{}", path)),
                _ => None,
            },
        }
    }

    fn conservation() -> (FileTree, NodeId) {
        let tree = FileTree::with_default_categories();
        let id = tree.roots()[1];
        (tree, id)
    }

    #[test]
    fn test_roots_are_categories() {
        let tree = FileTree::with_default_categories();
        assert_eq!(tree.roots().len(), 3);
        assert_eq!(tree.node(tree.roots()[1]).unwrap().name, "保育 Conservation");
    }

    #[test]
    fn test_first_expand_fetches_once() {
        let (mut tree, id) = conservation();

        assert_eq!(
            tree.toggle(id),
            Some(ToggleOutcome::FetchRequired {
                path: "Data_GML/保育%20Conservation".into()
            })
        );
        // Collapse and re-expand while the listing is in flight.
        assert_eq!(tree.toggle(id), Some(ToggleOutcome::Collapsed));
        assert_eq!(tree.toggle(id), Some(ToggleOutcome::Expanded));

        let added = tree.apply_listing(
            "Data_GML/保育%20Conservation",
            vec![
                entry("Parks", "Data_GML/保育%20Conservation/Parks", EntryKind::Dir),
                entry("SSSI.kml", "Data_GML/保育%20Conservation/SSSI.kml", EntryKind::File),
                entry("link", "x", EntryKind::Other),
            ],
        );
        assert_eq!(added, Some(2));
        assert_eq!(tree.children(id).len(), 2);

        assert_eq!(tree.toggle(id), Some(ToggleOutcome::Collapsed));
        assert_eq!(tree.toggle(id), Some(ToggleOutcome::Expanded));
    }

    #[test]
    fn test_listing_ignored_unless_loading() {
        let (mut tree, _) = conservation();
        assert_eq!(tree.apply_listing("Data_GML/保育%20Conservation", vec![]), None);
    }

    #[test]
    fn test_failed_listing_refetches_on_next_expand() {
        let (mut tree, id) = conservation();
        tree.toggle(id);
        assert!(tree.listing_failed("Data_GML/保育%20Conservation"));
        assert!(!tree.node(id).unwrap().expanded);
        assert!(matches!(tree.toggle(id), Some(ToggleOutcome::FetchRequired { .. })));
    }

    #[test]
    fn test_file_leaves_have_fresh_buttons() {
        let (mut tree, id) = conservation();
        tree.toggle(id);
        tree.apply_listing(
            "Data_GML/保育%20Conservation",
            vec![entry("a.kml", "p/a.kml", EntryKind::File)],
        );

        let file = tree.find_file_by_url("https://raw.example/p/a.kml").unwrap();
        assert_eq!(tree.toggle(file), None);
        match &tree.node(file).unwrap().kind {
            NodeKind::File { button, .. } => assert_eq!(button.state(), ToggleState::Add),
            other => panic!("expected file, got {:?}", other),
        }
    }

    #[test]
    fn test_visible_rows_follow_expansion() {
        let (mut tree, id) = conservation();
        assert_eq!(tree.visible_rows().len(), 3);

        tree.toggle(id);
        tree.apply_listing(
            "Data_GML/保育%20Conservation",
            vec![
                entry("a.kml", "p/a.kml", EntryKind::File),
                entry("b.kml", "p/b.kml", EntryKind::File),
            ],
        );
        let rows = tree.visible_rows();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[2].0, 1);
        assert_eq!(tree.node(rows[2].1).unwrap().name, "a.kml");
    }
}
