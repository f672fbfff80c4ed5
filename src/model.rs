//! Items shown in the panel: the file tree (as an arena) and saved snippets.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntryKind {
    File,
    Folder,
    Root,
}

/// Nested tree node as the host sends it over the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub path: String,
    pub name: String,
    pub kind: EntryKind,
    #[serde(default)]
    pub fs_path: PathBuf,
    #[serde(default)]
    pub estimated_tokens: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FileEntry>,
}

impl FileEntry {
    pub fn file(path: &str, fs_path: impl Into<PathBuf>, estimated_tokens: u64) -> Self {
        FileEntry {
            path: path.to_string(),
            name: last_segment(path).to_string(),
            kind: EntryKind::File,
            fs_path: fs_path.into(),
            estimated_tokens,
            children: Vec::new(),
        }
    }

    pub fn folder(path: &str, children: Vec<FileEntry>) -> Self {
        FileEntry {
            path: path.to_string(),
            name: last_segment(path).to_string(),
            kind: EntryKind::Folder,
            fs_path: PathBuf::new(),
            estimated_tokens: 0,
            children,
        }
    }

    pub fn root(path: &str, name: &str, children: Vec<FileEntry>) -> Self {
        FileEntry {
            path: path.to_string(),
            name: name.to_string(),
            kind: EntryKind::Root,
            fs_path: PathBuf::new(),
            estimated_tokens: 0,
            children,
        }
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub id: String,
    pub relative_path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub code: String,
    #[serde(default)]
    pub estimated_tokens: u64,
}

impl Snippet {
    pub fn label(&self) -> String {
        format!(
            "{}:{}-{}",
            self.relative_path, self.start_line, self.end_line
        )
    }
}

/// Reference to anything that can occupy a row: a tree node by path, or a snippet by id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemRef {
    Path(String),
    Snippet(String),
}

impl ItemRef {
    pub fn path(path: impl Into<String>) -> Self {
        ItemRef::Path(path.into())
    }

    pub fn snippet(id: impl Into<String>) -> Self {
        ItemRef::Snippet(id.into())
    }
}

pub type NodeId = usize;

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: EntryKind,
    pub path: String,
    pub name: String,
    pub fs_path: PathBuf,
    pub estimated_tokens: u64,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl Node {
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// Arena of tree nodes in pre-order, so a parent always has a smaller id than
/// any of its descendants.
#[derive(Debug, Clone, Default)]
pub struct FileTree {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    by_path: HashMap<String, NodeId>,
}

impl FileTree {
    pub fn from_entries(entries: &[FileEntry]) -> Self {
        let mut tree = FileTree::default();
        for entry in entries {
            if let Some(id) = tree.push(entry, None) {
                tree.roots.push(id);
            }
        }

        // Containers carry the sum of their descendant files.
        for id in (0..tree.nodes.len()).rev() {
            if tree.nodes[id].is_file() {
                continue;
            }
            let sum = tree.nodes[id]
                .children
                .iter()
                .map(|&child| tree.nodes[child].estimated_tokens)
                .sum();
            tree.nodes[id].estimated_tokens = sum;
        }
        tree
    }

    /// Skips an entry (and its subtree) whose path is already in the arena.
    fn push(&mut self, entry: &FileEntry, parent: Option<NodeId>) -> Option<NodeId> {
        if self.by_path.contains_key(&entry.path) {
            tracing::warn!(path = %entry.path, "duplicate path in file tree, keeping the first one");
            return None;
        }
        let id = self.nodes.len();
        self.nodes.push(Node {
            kind: entry.kind,
            path: entry.path.clone(),
            name: entry.name.clone(),
            fs_path: entry.fs_path.clone(),
            estimated_tokens: entry.estimated_tokens,
            parent,
            children: Vec::new(),
        });
        self.by_path.insert(entry.path.clone(), id);
        if entry.kind != EntryKind::File {
            for child in &entry.children {
                if let Some(child_id) = self.push(child, Some(id)) {
                    self.nodes[id].children.push(child_id);
                }
            }
        }
        Some(id)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn lookup(&self, path: &str) -> Option<NodeId> {
        self.by_path.get(path).copied()
    }

    pub fn get(&self, path: &str) -> Option<&Node> {
        self.lookup(path).map(|id| &self.nodes[id])
    }

    pub fn is_file(&self, path: &str) -> bool {
        self.get(path).is_some_and(Node::is_file)
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate()
    }

    /// All files under `id` (or `id` itself when it is a file), in tree order.
    pub fn descendant_files(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = &self.nodes[current];
            if node.is_file() {
                out.push(current);
            } else {
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Vec<FileEntry> {
        vec![FileEntry::root(
            ".",
            "proj",
            vec![
                FileEntry::folder(
                    "src",
                    vec![
                        FileEntry::file("src/a.rs", "/p/src/a.rs", 10),
                        FileEntry::folder(
                            "src/util",
                            vec![FileEntry::file("src/util/b.rs", "/p/src/util/b.rs", 5)],
                        ),
                    ],
                ),
                FileEntry::file("README.md", "/p/README.md", 7),
            ],
        )]
    }

    #[test]
    fn arena_is_pre_order_with_parent_links() {
        let tree = FileTree::from_entries(&sample());
        let paths: Vec<&str> = tree.iter().map(|(_, n)| n.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![".", "src", "src/a.rs", "src/util", "src/util/b.rs", "README.md"]
        );
        let b = tree.lookup("src/util/b.rs").unwrap();
        let util = tree.node(b).parent.unwrap();
        assert_eq!(tree.node(util).path, "src/util");
        assert!(util < b);
    }

    #[test]
    fn container_tokens_are_summed_from_files() {
        let tree = FileTree::from_entries(&sample());
        assert_eq!(tree.get(".").unwrap().estimated_tokens, 22);
        assert_eq!(tree.get("src").unwrap().estimated_tokens, 15);
        assert_eq!(tree.get("src/util").unwrap().estimated_tokens, 5);
    }

    #[test]
    fn descendant_files_skip_folders() {
        let tree = FileTree::from_entries(&sample());
        let files: Vec<String> = tree
            .descendant_files(tree.lookup("src").unwrap())
            .into_iter()
            .map(|id| tree.node(id).path.clone())
            .collect();
        assert_eq!(files, vec!["src/a.rs", "src/util/b.rs"]);
        assert!(tree.is_file("README.md"));
        assert!(!tree.is_file("src"));
    }

    #[test]
    fn duplicate_paths_keep_the_first_node_only() {
        let tree = FileTree::from_entries(&[FileEntry::root(
            ".",
            "proj",
            vec![
                FileEntry::file("a.rs", "/p/a.rs", 10),
                FileEntry::file("a.rs", "/p/a.rs", 99),
                FileEntry::file("b.rs", "/p/b.rs", 1),
            ],
        )]);
        assert_eq!(tree.len(), 3);
        let root = tree.lookup(".").unwrap();
        assert_eq!(tree.node(root).children.len(), 2);
        assert_eq!(tree.get("a.rs").unwrap().estimated_tokens, 10);
        assert_eq!(tree.node(root).estimated_tokens, 11);
    }
}
