//! Read-only views derived from the store: tri-state folders, visibility,
//! rendered row order and selection totals.

use crate::model::{ItemRef, NodeId, Snippet};
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderState {
    All,
    Partial,
    None,
}

/// Lower-cased, whitespace-separated keywords. Every keyword has to match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterKeywords(Vec<String>);

impl FilterKeywords {
    pub fn parse(text: &str) -> Self {
        FilterKeywords(text.split_whitespace().map(str::to_lowercase).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Each keyword must be a substring of at least one field.
    pub fn matches(&self, fields: &[&str]) -> bool {
        if self.0.is_empty() {
            return true;
        }
        let lowered: Vec<String> = fields.iter().map(|f| f.to_lowercase()).collect();
        self.0
            .iter()
            .all(|keyword| lowered.iter().any(|field| field.contains(keyword.as_str())))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    File,
    Folder { expanded: bool },
    Snippet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub item: ItemRef,
    pub kind: RowKind,
    pub depth: usize,
    pub label: String,
    pub check: FolderState,
    pub tokens: u64,
    pub highlighted: bool,
}

impl Row {
    /// Value a checkbox click on this row sets.
    pub fn toggled_value(&self) -> bool {
        self.check != FolderState::All
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    pub file_count: usize,
    pub snippet_count: usize,
    pub total_tokens: u64,
    pub token_limit: u64,
}

impl Summary {
    pub fn over_limit(&self) -> bool {
        self.token_limit > 0 && self.total_tokens > self.token_limit
    }

    pub fn is_empty(&self) -> bool {
        self.file_count == 0 && self.snippet_count == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmptyState {
    NoItems,
    NoFilterResults(String),
    NoSelectedItems,
}

impl EmptyState {
    pub fn message(&self) -> String {
        match self {
            EmptyState::NoItems => "No files or snippets to show.".to_string(),
            EmptyState::NoFilterResults(filter) => format!("No results for '{}'.", filter),
            EmptyState::NoSelectedItems => "Nothing is selected yet.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    selected: usize,
    total: usize,
}

/// Built fresh for each render; the tallies are a pure fold over the store.
pub struct Projection<'a> {
    store: &'a Store,
    tally: Vec<Tally>,
    keywords: FilterKeywords,
}

impl<'a> Projection<'a> {
    pub fn new(store: &'a Store) -> Self {
        let tree = store.tree();
        let mut tally = vec![Tally::default(); tree.len()];
        // Pre-order ids: walking backwards visits children before parents.
        for id in (0..tree.len()).rev() {
            let node = tree.node(id);
            if node.is_file() {
                tally[id] = Tally {
                    selected: usize::from(store.is_file_selected(&node.path)),
                    total: 1,
                };
            }
            if let Some(parent) = node.parent {
                let own = tally[id];
                tally[parent].selected += own.selected;
                tally[parent].total += own.total;
            }
        }
        Projection {
            store,
            tally,
            keywords: FilterKeywords::parse(store.filter()),
        }
    }

    pub fn folder_state(&self, id: NodeId) -> FolderState {
        let Tally { selected, total } = self.tally[id];
        if total == 0 || selected == 0 {
            FolderState::None
        } else if selected == total {
            FolderState::All
        } else {
            FolderState::Partial
        }
    }

    pub fn is_selected_or_descendant_selected(&self, id: NodeId) -> bool {
        self.tally[id].selected > 0
    }

    pub fn is_snippet_selected(&self, id: &str) -> bool {
        self.store.is_snippet_selected(id)
    }

    pub fn node_visible(&self, id: NodeId, keywords: &FilterKeywords, selected_only: bool) -> bool {
        let node = self.store.tree().node(id);
        keywords.matches(&[node.path.as_str(), node.name.as_str()])
            && (!selected_only || self.is_selected_or_descendant_selected(id))
    }

    pub fn snippet_visible(
        &self,
        snippet: &Snippet,
        keywords: &FilterKeywords,
        selected_only: bool,
    ) -> bool {
        keywords.matches(&[snippet.relative_path.as_str(), snippet.code.as_str()])
            && (!selected_only || self.is_snippet_selected(&snippet.id))
    }

    pub fn summary(&self) -> Summary {
        let tree = self.store.tree();
        let files = self.store.selected_file_paths();
        let file_tokens: u64 = files
            .iter()
            .filter_map(|path| tree.get(path))
            .map(|node| node.estimated_tokens)
            .sum();
        let snippets = self.store.selected_snippet_ids();
        let snippet_tokens: u64 = snippets
            .iter()
            .filter_map(|id| self.store.snippet(id))
            .map(|snippet| snippet.estimated_tokens)
            .sum();
        Summary {
            file_count: files.len(),
            snippet_count: snippets.len(),
            total_tokens: file_tokens + snippet_tokens,
            token_limit: self.store.token_limit(),
        }
    }

    /// Rows in display order: tree rows, then snippet rows.
    pub fn rows(&self) -> Vec<Row> {
        let mut rows = Vec::new();
        let selected_only = self.store.show_selected_only();
        let tree = self.store.tree();

        if self.keywords.is_empty() {
            for &root in tree.roots() {
                self.push_tree_rows(root, 0, selected_only, &mut rows);
            }
        } else {
            // Search ignores expansion and never shows folders.
            for &root in tree.roots() {
                for file in tree.descendant_files(root) {
                    if self.node_visible(file, &self.keywords, selected_only) {
                        rows.push(self.node_row(file, 0, tree.node(file).path.clone()));
                    }
                }
            }
        }

        for snippet in self.store.snippets() {
            if self.snippet_visible(snippet, &self.keywords, selected_only) {
                let item = ItemRef::snippet(snippet.id.as_str());
                rows.push(Row {
                    highlighted: self.store.is_visual(&item),
                    item,
                    kind: RowKind::Snippet,
                    depth: 0,
                    label: snippet.label(),
                    check: if self.is_snippet_selected(&snippet.id) {
                        FolderState::All
                    } else {
                        FolderState::None
                    },
                    tokens: snippet.estimated_tokens,
                });
            }
        }
        rows
    }

    /// Without keywords a folder only fails the predicate when nothing below it
    /// is selected, so its whole subtree is hidden along with it.
    fn push_tree_rows(&self, id: NodeId, depth: usize, selected_only: bool, out: &mut Vec<Row>) {
        if !self.node_visible(id, &self.keywords, selected_only) {
            return;
        }
        let node = self.store.tree().node(id);
        out.push(self.node_row(id, depth, node.name.clone()));
        if !node.is_file() && self.store.is_expanded(&node.path) {
            for &child in &node.children {
                self.push_tree_rows(child, depth + 1, selected_only, out);
            }
        }
    }

    fn node_row(&self, id: NodeId, depth: usize, label: String) -> Row {
        let node = self.store.tree().node(id);
        let item = ItemRef::path(node.path.as_str());
        Row {
            highlighted: self.store.is_visual(&item),
            item,
            kind: if node.is_file() {
                RowKind::File
            } else {
                RowKind::Folder {
                    expanded: self.store.is_expanded(&node.path),
                }
            },
            depth,
            label,
            check: self.folder_state(id),
            tokens: node.estimated_tokens,
        }
    }

    pub fn empty_state(&self, rows: &[Row]) -> Option<EmptyState> {
        if !rows.is_empty() {
            return None;
        }
        let nothing_loaded = self.store.tree().is_empty() && self.store.snippets().is_empty();
        Some(if nothing_loaded {
            EmptyState::NoItems
        } else if !self.keywords.is_empty() {
            EmptyState::NoFilterResults(self.store.filter().to_string())
        } else if self.store.show_selected_only() {
            EmptyState::NoSelectedItems
        } else {
            EmptyState::NoItems
        })
    }
}

pub fn visible_order(rows: &[Row]) -> Vec<ItemRef> {
    rows.iter().map(|row| row.item.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FileEntry;
    use crate::store::tests::{sample_store, snippet};
    use crate::store::{InitData, Store};
    use pretty_assertions::assert_eq;

    fn labels(rows: &[Row]) -> Vec<String> {
        rows.iter()
            .map(|row| format!("{}{}", "  ".repeat(row.depth), row.label))
            .collect()
    }

    fn id(store: &Store, path: &str) -> NodeId {
        store.tree().lookup(path).unwrap()
    }

    #[test]
    fn folder_tri_state_follows_descendant_files() {
        let mut store = sample_store();
        let p = Projection::new(&store);
        assert_eq!(p.folder_state(id(&store, "src")), FolderState::None);

        store.set_checked(&ItemRef::path("src/a.ts"), true);
        let p = Projection::new(&store);
        assert_eq!(p.folder_state(id(&store, "src")), FolderState::Partial);
        assert_eq!(p.folder_state(id(&store, ".")), FolderState::Partial);

        store.set_checked(&ItemRef::path("src"), true);
        let p = Projection::new(&store);
        assert_eq!(p.folder_state(id(&store, "src")), FolderState::All);
        assert_eq!(p.folder_state(id(&store, "src/utils")), FolderState::All);
    }

    #[test]
    fn folder_without_files_is_never_checked() {
        let mut store = Store::new();
        store.initialize(InitData {
            files: vec![FileEntry::root(
                ".",
                "proj",
                vec![FileEntry::folder("a", vec![FileEntry::folder("a/b", vec![])])],
            )],
            ..Default::default()
        });
        store.set_checked(&ItemRef::path("a"), true);
        let p = Projection::new(&store);
        assert_eq!(p.folder_state(id(&store, "a")), FolderState::None);
    }

    #[test]
    fn keywords_use_and_semantics() {
        let kw = FilterKeywords::parse("util help");
        assert!(kw.matches(&["src/utils/helper.ts", "helper.ts"]));
        assert!(!FilterKeywords::parse("util missing").matches(&["src/utils/helper.ts"]));
        assert!(FilterKeywords::parse("  UTIL  ").matches(&["src/utils/helper.ts"]));
        assert!(FilterKeywords::parse("").matches(&["anything"]));
    }

    #[test]
    fn summary_totals_selected_files_and_snippets() {
        let mut store = sample_store();
        store.set_checked(&ItemRef::path("src/a.ts"), true);
        store.set_checked(&ItemRef::path("src/b.ts"), true);
        store.set_checked(&ItemRef::snippet("snippet-1"), true);
        store.set_filter("readme");
        let summary = Projection::new(&store).summary();
        assert_eq!(
            summary,
            Summary {
                file_count: 2,
                snippet_count: 1,
                total_tokens: 400,
                token_limit: 0,
            }
        );
        assert!(!summary.over_limit());
    }

    #[test]
    fn token_limit_flags_oversized_selection() {
        let mut store = sample_store();
        store.set_token_limit(120);
        store.set_checked(&ItemRef::path("src/b.ts"), true);
        assert!(Projection::new(&store).summary().over_limit());
    }

    #[test]
    fn hierarchical_rows_follow_expansion() {
        let mut store = sample_store();
        assert_eq!(
            labels(&Projection::new(&store).rows())[..7],
            ["proj", "  src", "    a.ts", "    b.ts", "    utils", "  empty", "  README.md"]
        );
        store.toggle_folder_expansion("src");
        assert_eq!(
            labels(&Projection::new(&store).rows()),
            vec!["proj", "  src", "  empty", "  README.md", "src/lib.rs:1-3", "src/lib.rs:1-3"]
        );
    }

    #[test]
    fn selected_only_keeps_ancestors_and_skips_collapsed_subtrees() {
        let mut store = sample_store();
        store.toggle_folder_expansion("src/utils");
        store.set_checked(&ItemRef::path("src/utils/helper.ts"), true);
        store.set_show_selected_only(true);
        assert_eq!(
            labels(&Projection::new(&store).rows()),
            vec!["proj", "  src", "    utils", "      helper.ts"]
        );

        store.toggle_folder_expansion("src/utils");
        assert_eq!(
            labels(&Projection::new(&store).rows()),
            vec!["proj", "  src", "    utils"]
        );
    }

    #[test]
    fn selected_only_hides_expanded_folders_with_nothing_selected() {
        let mut store = sample_store();
        store.toggle_folder_expansion("src/utils");
        store.set_checked(&ItemRef::path("README.md"), true);
        store.set_show_selected_only(true);
        assert_eq!(
            labels(&Projection::new(&store).rows()),
            vec!["proj", "  README.md"]
        );
    }

    #[test]
    fn search_lists_matching_files_regardless_of_expansion() {
        let mut store = sample_store();
        store.set_filter("util help");
        let rows = Projection::new(&store).rows();
        assert_eq!(labels(&rows), vec!["src/utils/helper.ts"]);
        assert_eq!(rows[0].kind, RowKind::File);
    }

    #[test]
    fn search_matches_snippet_code() {
        let mut store = sample_store();
        store.set_filter("snippet_2");
        let rows = Projection::new(&store).rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].item, ItemRef::snippet("snippet-2"));
    }

    #[test]
    fn rows_carry_check_and_highlight_state() {
        let mut store = sample_store();
        store.set_checked(&ItemRef::snippet("snippet-1"), true);
        store.set_visual([ItemRef::path("README.md")]);
        let rows = Projection::new(&store).rows();
        let readme = rows.iter().find(|r| r.label == "README.md").unwrap();
        assert!(readme.highlighted);
        assert!(readme.toggled_value());
        let snip = rows
            .iter()
            .find(|r| r.item == ItemRef::snippet("snippet-1"))
            .unwrap();
        assert_eq!(snip.check, FolderState::All);
        assert!(!snip.toggled_value());
    }

    #[test]
    fn empty_states_explain_why_nothing_shows() {
        let empty = Store::new();
        let p = Projection::new(&empty);
        assert_eq!(p.empty_state(&p.rows()), Some(EmptyState::NoItems));

        let mut store = sample_store();
        store.set_filter("zzz");
        let p = Projection::new(&store);
        assert_eq!(
            p.empty_state(&p.rows()),
            Some(EmptyState::NoFilterResults("zzz".to_string()))
        );

        let mut store = sample_store();
        store.set_show_selected_only(true);
        let p = Projection::new(&store);
        assert_eq!(p.empty_state(&p.rows()), Some(EmptyState::NoSelectedItems));

        let store = sample_store();
        let p = Projection::new(&store);
        assert_eq!(p.empty_state(&p.rows()), None);
    }

    #[test]
    fn snippet_visibility_respects_selected_only() {
        let mut store = sample_store();
        store.replace_snippets(vec![snippet("snippet-1", 5), snippet("snippet-3", 5)]);
        store.set_checked(&ItemRef::snippet("snippet-3"), true);
        store.set_show_selected_only(true);
        let rows = Projection::new(&store).rows();
        let snippet_rows: Vec<&ItemRef> = rows
            .iter()
            .filter(|r| r.kind == RowKind::Snippet)
            .map(|r| &r.item)
            .collect();
        assert_eq!(snippet_rows, vec![&ItemRef::snippet("snippet-3")]);
    }
}
