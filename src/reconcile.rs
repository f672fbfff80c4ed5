//! Merging authoritative state pushed by the host into the local store.

use crate::model::Snippet;
use crate::store::Store;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionKind {
    File,
    Snippet,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionEntry {
    pub kind: SelectionKind,
    pub id: String,
}

/// A persisted selection. `Tagged` says what each key is; `Legacy` is the old
/// flat `key -> bool` map whose keys have to be classified through the maps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectionPayload {
    Tagged(Vec<SelectionEntry>),
    Legacy(BTreeMap<String, bool>),
}

impl Default for SelectionPayload {
    fn default() -> Self {
        SelectionPayload::Tagged(Vec::new())
    }
}

impl SelectionPayload {
    /// Adds file keys, converting a legacy map in place.
    pub fn with_files(self, paths: impl IntoIterator<Item = String>) -> Self {
        match self {
            SelectionPayload::Tagged(mut entries) => {
                for id in paths {
                    let entry = SelectionEntry {
                        kind: SelectionKind::File,
                        id,
                    };
                    if !entries.contains(&entry) {
                        entries.push(entry);
                    }
                }
                SelectionPayload::Tagged(entries)
            }
            SelectionPayload::Legacy(mut map) => {
                for path in paths {
                    map.insert(path, true);
                }
                SelectionPayload::Legacy(map)
            }
        }
    }
}

/// State pushed by the host; absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippets: Option<Vec<Snippet>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_state: Option<SelectionPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded_folders: Option<BTreeMap<String, bool>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSelection {
    pub files: HashSet<String>,
    pub snippets: HashSet<String>,
}

pub fn resolve_selection(payload: &SelectionPayload, store: &Store) -> ResolvedSelection {
    let mut resolved = ResolvedSelection::default();
    match payload {
        SelectionPayload::Tagged(entries) => {
            for entry in entries {
                let known = match entry.kind {
                    SelectionKind::File => store.tree().is_file(&entry.id),
                    SelectionKind::Snippet => store.has_snippet(&entry.id),
                };
                if !known {
                    tracing::debug!(id = %entry.id, kind = ?entry.kind, "dropping unresolved selection entry");
                    continue;
                }
                match entry.kind {
                    SelectionKind::File => resolved.files.insert(entry.id.clone()),
                    SelectionKind::Snippet => resolved.snippets.insert(entry.id.clone()),
                };
            }
        }
        SelectionPayload::Legacy(map) => {
            for (key, _) in map.iter().filter(|(_, checked)| **checked) {
                if store.tree().is_file(key) {
                    resolved.files.insert(key.clone());
                } else if store.has_snippet(key) {
                    resolved.snippets.insert(key.clone());
                } else {
                    tracing::debug!(%key, "dropping selection key that is neither a file nor a snippet");
                }
            }
        }
    }
    resolved
}

fn snippets_differ(current: &[Snippet], incoming: &[Snippet]) -> bool {
    current.len() != incoming.len()
        || current
            .iter()
            .zip(incoming)
            .any(|(old, new)| old.id != new.id)
}

fn expansion_differs(current: &BTreeMap<String, bool>, incoming: &BTreeMap<String, bool>) -> bool {
    current.len() != incoming.len()
        || incoming
            .iter()
            .any(|(path, expanded)| current.get(path) != Some(expanded))
}

/// Applies host state with overwrite semantics. Returns whether anything
/// changed. Never asks for a save: the host already has this state.
pub fn reconcile_from_host(store: &mut Store, state: HostState) -> bool {
    let mut changed = false;

    // Snippets first so selection keys resolve against the new list.
    if let Some(snippets) = state.snippets {
        if snippets_differ(store.snippets(), &snippets) {
            store.replace_snippets(snippets);
            changed = true;
        }
    }

    if let Some(payload) = state.selection_state {
        let resolved = resolve_selection(&payload, store);
        changed |= store.replace_selection(resolved.files, resolved.snippets);
    }

    if let Some(expanded) = state.expanded_folders {
        if expansion_differs(store.expanded_folders(), &expanded) {
            store.replace_expansion(expanded);
            changed = true;
        }
    }

    if changed {
        store.clear_ephemeral();
    }
    tracing::debug!(changed, "reconciled host state");
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ItemRef;
    use crate::store::tests::{sample_store, snippet};
    use pretty_assertions::assert_eq;

    fn legacy(keys: &[(&str, bool)]) -> SelectionPayload {
        SelectionPayload::Legacy(keys.iter().map(|(k, v)| (k.to_string(), *v)).collect())
    }

    fn set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn legacy_keys_split_into_files_and_snippets() {
        let store = sample_store();
        let resolved = resolve_selection(
            &legacy(&[("src/a.ts", true), ("snippet-1", true), ("src", true), ("ghost", true)]),
            &store,
        );
        assert_eq!(resolved.files, set(&["src/a.ts"]));
        assert_eq!(resolved.snippets, set(&["snippet-1"]));
    }

    #[test]
    fn tagged_entries_must_match_their_kind() {
        let store = sample_store();
        let payload = SelectionPayload::Tagged(vec![
            SelectionEntry {
                kind: SelectionKind::File,
                id: "README.md".to_string(),
            },
            SelectionEntry {
                kind: SelectionKind::Snippet,
                id: "README.md".to_string(),
            },
            SelectionEntry {
                kind: SelectionKind::Snippet,
                id: "snippet-2".to_string(),
            },
        ]);
        let resolved = resolve_selection(&payload, &store);
        assert_eq!(resolved.files, set(&["README.md"]));
        assert_eq!(resolved.snippets, set(&["snippet-2"]));
    }

    #[test]
    fn payload_parses_both_wire_shapes() {
        let tagged: SelectionPayload =
            serde_json::from_str(r#"[{"kind":"file","id":"src/a.ts"}]"#).unwrap();
        assert!(matches!(tagged, SelectionPayload::Tagged(_)));
        let flat: SelectionPayload = serde_json::from_str(r#"{"src/a.ts":true}"#).unwrap();
        assert_eq!(flat, legacy(&[("src/a.ts", true)]));
    }

    #[test]
    fn host_selection_overwrites_instead_of_merging() {
        let mut store = sample_store();
        store.set_checked(&ItemRef::path("src/a.ts"), true);
        store.set_checked(&ItemRef::path("src/b.ts"), true);

        let changed = reconcile_from_host(
            &mut store,
            HostState {
                selection_state: Some(legacy(&[("src/a.ts", true)])),
                ..Default::default()
            },
        );
        assert!(changed);
        assert_eq!(store.raw_selected_files(), &set(&["src/a.ts"]));
    }

    #[test]
    fn unchanged_state_keeps_visual_selection() {
        let mut store = sample_store();
        store.set_checked(&ItemRef::path("src/a.ts"), true);
        store.set_visual([ItemRef::path("src/b.ts")]);
        let expanded = store.expanded_folders().clone();
        let snippets = store.snippets().to_vec();

        let changed = reconcile_from_host(
            &mut store,
            HostState {
                snippets: Some(snippets),
                selection_state: Some(legacy(&[("src/a.ts", true)])),
                expanded_folders: Some(expanded),
            },
        );
        assert!(!changed);
        assert_eq!(store.visual().len(), 1);
    }

    #[test]
    fn any_change_clears_visual_selection() {
        let mut store = sample_store();
        store.set_visual([ItemRef::path("src/b.ts")]);
        store.set_shift_anchor(Some(ItemRef::path("src/b.ts")));

        let expanded: BTreeMap<String, bool> = [
            (".".to_string(), true),
            ("src".to_string(), true),
            ("src/utils".to_string(), true),
        ]
        .into_iter()
        .collect();
        let changed = reconcile_from_host(
            &mut store,
            HostState {
                expanded_folders: Some(expanded.clone()),
                ..Default::default()
            },
        );
        assert!(changed);
        assert_eq!(store.expanded_folders(), &expanded);
        assert!(store.visual().is_empty());
        assert!(store.shift_anchor().is_none());
    }

    #[test]
    fn expansion_value_mismatch_counts_as_change() {
        let mut store = sample_store();
        let flipped: BTreeMap<String, bool> = [(".".to_string(), false), ("src".to_string(), true)]
            .into_iter()
            .collect();
        assert!(reconcile_from_host(
            &mut store,
            HostState {
                expanded_folders: Some(flipped),
                ..Default::default()
            },
        ));
        assert!(!store.is_expanded("."));
    }

    #[test]
    fn new_snippets_are_applied_before_selection_resolves() {
        let mut store = sample_store();
        let changed = reconcile_from_host(
            &mut store,
            HostState {
                snippets: Some(vec![snippet("snippet-9", 5)]),
                selection_state: Some(legacy(&[("snippet-9", true), ("snippet-1", true)])),
                ..Default::default()
            },
        );
        assert!(changed);
        assert_eq!(store.selected_snippet_ids(), vec!["snippet-9"]);
        assert!(!store.has_snippet("snippet-1"));
    }

    #[test]
    fn with_files_extends_either_shape() {
        let tagged = SelectionPayload::default().with_files(["a".to_string(), "a".to_string()]);
        assert_eq!(
            tagged,
            SelectionPayload::Tagged(vec![SelectionEntry {
                kind: SelectionKind::File,
                id: "a".to_string(),
            }])
        );
        let flat = legacy(&[("b", false)]).with_files(["b".to_string()]);
        assert_eq!(flat, legacy(&[("b", true)]));
    }
}
