//! The single authoritative model of what is checked, expanded, filtered and
//! highlighted in one panel session.

use crate::model::{FileEntry, FileTree, ItemRef, NodeId, Snippet};
use crate::reconcile::{self, SelectionEntry, SelectionKind, SelectionPayload};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Instant;

/// Everything the host hands over when a panel session starts.
#[derive(Debug, Clone, Default)]
pub struct InitData {
    pub files: Vec<FileEntry>,
    pub saved_selection: Option<SelectionPayload>,
    pub saved_expansion: Option<BTreeMap<String, bool>>,
    pub snippets: Vec<Snippet>,
    pub token_limit: u64,
    pub session_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CopyState {
    #[default]
    Idle,
    Pending {
        since: Instant,
    },
}

/// Snapshot sent to the host on every local mutation. Files only.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveSnapshot {
    pub selection: SelectionPayload,
    pub expanded_folders: BTreeMap<String, bool>,
}

#[derive(Debug, Default)]
pub struct Store {
    tree: FileTree,
    snippets: Vec<Snippet>,
    snippet_index: HashMap<String, usize>,
    selected_files: HashSet<String>,
    selected_snippets: HashSet<String>,
    expanded_folders: BTreeMap<String, bool>,
    visual: HashSet<ItemRef>,
    shift_anchor: Option<ItemRef>,
    filter: String,
    show_selected_only: bool,
    token_limit: u64,
    copy: CopyState,
    session_id: String,
}

impl Store {
    pub fn new() -> Self {
        Store::default()
    }

    pub fn initialize(&mut self, init: InitData) {
        self.tree = FileTree::from_entries(&init.files);
        self.set_snippet_list(init.snippets);

        let resolved = match &init.saved_selection {
            Some(payload) => reconcile::resolve_selection(payload, self),
            None => Default::default(),
        };
        self.selected_files = resolved.files;
        self.selected_snippets = resolved.snippets;

        self.expanded_folders = match init.saved_expansion {
            Some(saved) => saved,
            None => self.default_expansion(),
        };
        self.token_limit = init.token_limit;
        self.session_id = init.session_id;
        self.filter.clear();
        self.show_selected_only = false;
        self.copy = CopyState::Idle;
        self.clear_ephemeral();
    }

    /// Opens every root and the root's direct child folders, skipping empty ones.
    fn default_expansion(&self) -> BTreeMap<String, bool> {
        let tree = &self.tree;
        let has_children = |id: NodeId| {
            let node = tree.node(id);
            !node.is_file() && !node.children.is_empty()
        };
        let mut expanded = BTreeMap::new();
        for &root in tree.roots().iter().filter(|&&id| has_children(id)) {
            expanded.insert(tree.node(root).path.clone(), true);
            for &child in tree.node(root).children.iter().filter(|&&id| has_children(id)) {
                expanded.insert(tree.node(child).path.clone(), true);
            }
        }
        expanded
    }

    fn set_snippet_list(&mut self, snippets: Vec<Snippet>) {
        self.snippet_index = snippets
            .iter()
            .enumerate()
            .map(|(idx, snippet)| (snippet.id.clone(), idx))
            .collect();
        self.snippets = snippets;
    }

    /// Rebuilds the tree. Checked paths that vanished stay in the set but no
    /// read resolves them; they are dropped by the next save snapshot.
    pub fn replace_files(&mut self, files: &[FileEntry]) {
        self.tree = FileTree::from_entries(files);
        self.clear_ephemeral();
    }

    pub fn replace_snippets(&mut self, snippets: Vec<Snippet>) {
        self.set_snippet_list(snippets);
        let index = &self.snippet_index;
        self.selected_snippets.retain(|id| index.contains_key(id));
        self.clear_ephemeral();
    }

    pub fn set_filter(&mut self, text: &str) -> bool {
        if self.filter == text {
            return false;
        }
        self.filter = text.to_string();
        self.clear_ephemeral();
        true
    }

    pub fn set_show_selected_only(&mut self, value: bool) -> bool {
        if self.show_selected_only == value {
            return false;
        }
        self.show_selected_only = value;
        self.clear_ephemeral();
        true
    }

    pub fn toggle_folder_expansion(&mut self, path: &str) -> bool {
        match self.tree.get(path) {
            Some(node) if !node.is_file() => {
                let expanded = self.is_expanded(path);
                self.expanded_folders.insert(path.to_string(), !expanded);
                true
            }
            _ => false,
        }
    }

    pub fn set_token_limit(&mut self, limit: u64) -> bool {
        let changed = self.token_limit != limit;
        self.token_limit = limit;
        changed
    }

    /// Checks or unchecks an item; folders and roots apply to every file below them.
    pub fn set_checked(&mut self, item: &ItemRef, checked: bool) -> bool {
        match item {
            ItemRef::Path(path) => {
                let Some(id) = self.tree.lookup(path) else {
                    tracing::debug!(%path, "set_checked on unknown path ignored");
                    return false;
                };
                let mut changed = false;
                for file in self.tree.descendant_files(id) {
                    let file_path = &self.tree.node(file).path;
                    changed |= if checked {
                        self.selected_files.insert(file_path.clone())
                    } else {
                        self.selected_files.remove(file_path)
                    };
                }
                changed
            }
            ItemRef::Snippet(id) => {
                if !self.snippet_index.contains_key(id) {
                    tracing::debug!(%id, "set_checked on unknown snippet ignored");
                    return false;
                }
                if checked {
                    self.selected_snippets.insert(id.clone())
                } else {
                    self.selected_snippets.remove(id)
                }
            }
        }
    }

    pub fn batch_set_checked(
        &mut self,
        paths: &HashSet<String>,
        snippet_ids: &HashSet<String>,
        checked: bool,
    ) -> bool {
        let mut changed = false;
        for path in paths {
            changed |= self.set_checked(&ItemRef::Path(path.clone()), checked);
        }
        for id in snippet_ids {
            changed |= self.set_checked(&ItemRef::Snippet(id.clone()), checked);
        }
        changed
    }

    /// Wholesale overwrite, used when the host is authoritative.
    pub fn replace_selection(&mut self, files: HashSet<String>, snippets: HashSet<String>) -> bool {
        let changed = files != self.selected_files || snippets != self.selected_snippets;
        self.selected_files = files;
        self.selected_snippets = snippets;
        changed
    }

    pub fn replace_expansion(&mut self, expanded: BTreeMap<String, bool>) {
        self.expanded_folders = expanded;
    }

    // --- visual selection ---

    pub fn clear_visual(&mut self) {
        self.visual.clear();
    }

    pub fn set_visual(&mut self, items: impl IntoIterator<Item = ItemRef>) {
        self.visual = items.into_iter().collect();
    }

    pub fn add_visual(&mut self, item: ItemRef) {
        self.visual.insert(item);
    }

    pub fn remove_visual(&mut self, item: &ItemRef) {
        self.visual.remove(item);
    }

    pub fn set_shift_anchor(&mut self, anchor: Option<ItemRef>) {
        self.shift_anchor = anchor;
    }

    pub fn clear_ephemeral(&mut self) {
        self.visual.clear();
        self.shift_anchor = None;
    }

    // --- copy flag ---

    pub fn copy_state(&self) -> CopyState {
        self.copy
    }

    pub fn copy_in_progress(&self) -> bool {
        matches!(self.copy, CopyState::Pending { .. })
    }

    pub fn begin_copy(&mut self, now: Instant) {
        self.copy = CopyState::Pending { since: now };
    }

    pub fn finish_copy(&mut self) {
        self.copy = CopyState::Idle;
    }

    // --- reads ---

    pub fn tree(&self) -> &FileTree {
        &self.tree
    }

    pub fn snippets(&self) -> &[Snippet] {
        &self.snippets
    }

    pub fn snippet(&self, id: &str) -> Option<&Snippet> {
        self.snippet_index.get(id).map(|&idx| &self.snippets[idx])
    }

    pub fn has_snippet(&self, id: &str) -> bool {
        self.snippet_index.contains_key(id)
    }

    /// True only for checked paths that still resolve to a file.
    pub fn is_file_selected(&self, path: &str) -> bool {
        self.selected_files.contains(path) && self.tree.is_file(path)
    }

    pub fn is_snippet_selected(&self, id: &str) -> bool {
        self.selected_snippets.contains(id)
    }

    /// Checked files that resolve in the current tree, sorted.
    pub fn selected_file_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .selected_files
            .iter()
            .filter(|path| self.tree.is_file(path))
            .cloned()
            .collect();
        paths.sort();
        paths
    }

    /// Checked snippet ids in snippet-list order.
    pub fn selected_snippet_ids(&self) -> Vec<String> {
        self.snippets
            .iter()
            .filter(|snippet| self.selected_snippets.contains(&snippet.id))
            .map(|snippet| snippet.id.clone())
            .collect()
    }

    #[cfg(test)]
    pub fn raw_selected_files(&self) -> &HashSet<String> {
        &self.selected_files
    }

    pub fn is_expanded(&self, path: &str) -> bool {
        self.expanded_folders.get(path).copied().unwrap_or(false)
    }

    pub fn expanded_folders(&self) -> &BTreeMap<String, bool> {
        &self.expanded_folders
    }

    pub fn visual(&self) -> &HashSet<ItemRef> {
        &self.visual
    }

    pub fn is_visual(&self, item: &ItemRef) -> bool {
        self.visual.contains(item)
    }

    pub fn shift_anchor(&self) -> Option<&ItemRef> {
        self.shift_anchor.as_ref()
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn show_selected_only(&self) -> bool {
        self.show_selected_only
    }

    pub fn token_limit(&self) -> u64 {
        self.token_limit
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Drops checked paths that no longer resolve to a file. Returns how many went.
    pub fn prune_dangling_files(&mut self) -> usize {
        let before = self.selected_files.len();
        let tree = &self.tree;
        self.selected_files.retain(|path| tree.is_file(path));
        let pruned = before - self.selected_files.len();
        if pruned > 0 {
            tracing::debug!(pruned, "pruned selected files missing from the tree");
        }
        pruned
    }

    /// Drops expansion keys that no longer name a folder. Returns how many went.
    pub fn prune_stale_expansion(&mut self) -> usize {
        let before = self.expanded_folders.len();
        let tree = &self.tree;
        self.expanded_folders
            .retain(|path, _| tree.get(path).is_some_and(|node| !node.is_file()));
        let pruned = before - self.expanded_folders.len();
        if pruned > 0 {
            tracing::debug!(pruned, "pruned expansion entries missing from the tree");
        }
        pruned
    }

    pub fn save_snapshot(&mut self) -> SaveSnapshot {
        self.prune_dangling_files();
        self.prune_stale_expansion();
        let selection = self
            .selected_file_paths()
            .into_iter()
            .map(|id| SelectionEntry {
                kind: SelectionKind::File,
                id,
            })
            .collect();
        SaveSnapshot {
            selection: SelectionPayload::Tagged(selection),
            expanded_folders: self.expanded_folders.clone(),
        }
    }
}
