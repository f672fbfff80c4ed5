//! Turns pointer and keyboard gestures on rows into store mutations, with the
//! multi-select behaviour of a typical file manager.

use crate::model::ItemRef;
use crate::store::Store;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gesture {
    /// Click on the row body. `ctrl` covers Cmd as well.
    RowClick {
        target: ItemRef,
        ctrl: bool,
        shift: bool,
    },
    CheckboxClick {
        target: ItemRef,
        checked: bool,
    },
    ExpandClick {
        path: String,
    },
    BackgroundClick,
}

/// What the caller has to do after a gesture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outcome {
    pub rerender: bool,
    pub persist: bool,
}

/// `visible_order` is the rendered row order; shift ranges are taken over it.
pub fn apply(store: &mut Store, gesture: Gesture, visible_order: &[ItemRef]) -> Outcome {
    match gesture {
        Gesture::RowClick {
            target,
            shift: true,
            ctrl,
        } => {
            shift_click(store, target, ctrl, visible_order);
            Outcome {
                rerender: true,
                persist: false,
            }
        }
        Gesture::RowClick {
            target, ctrl: true, ..
        } => {
            if store.is_visual(&target) {
                store.remove_visual(&target);
            } else {
                store.add_visual(target.clone());
            }
            store.set_shift_anchor(Some(target));
            Outcome {
                rerender: true,
                persist: false,
            }
        }
        Gesture::RowClick { target, .. } => {
            plain_click(store, target);
            Outcome {
                rerender: true,
                persist: false,
            }
        }
        Gesture::CheckboxClick { target, checked } => {
            checkbox_click(store, target, checked);
            Outcome {
                rerender: true,
                persist: true,
            }
        }
        Gesture::ExpandClick { path } => {
            let toggled = store.toggle_folder_expansion(&path);
            Outcome {
                rerender: toggled,
                persist: toggled,
            }
        }
        Gesture::BackgroundClick => {
            store.clear_visual();
            Outcome {
                rerender: true,
                persist: false,
            }
        }
    }
}

fn plain_click(store: &mut Store, target: ItemRef) {
    store.set_visual([target.clone()]);
    store.set_shift_anchor(Some(target));
}

fn shift_click(store: &mut Store, target: ItemRef, ctrl: bool, visible_order: &[ItemRef]) {
    let anchor_pos = store
        .shift_anchor()
        .and_then(|anchor| visible_order.iter().position(|item| item == anchor));
    let target_pos = visible_order.iter().position(|item| *item == target);

    let (Some(a), Some(b)) = (anchor_pos, target_pos) else {
        tracing::debug!(?target, "shift range endpoint not visible, treating as plain click");
        plain_click(store, target);
        return;
    };
    let range = &visible_order[a.min(b)..=a.max(b)];
    if ctrl {
        for item in range {
            store.add_visual(item.clone());
        }
    } else {
        store.set_visual(range.iter().cloned());
    }
}

fn checkbox_click(store: &mut Store, target: ItemRef, checked: bool) {
    if store.visual().len() > 1 && store.is_visual(&target) {
        let mut paths = HashSet::new();
        let mut snippets = HashSet::new();
        for item in store.visual() {
            match item {
                ItemRef::Path(path) => paths.insert(path.clone()),
                ItemRef::Snippet(id) => snippets.insert(id.clone()),
            };
        }
        store.batch_set_checked(&paths, &snippets, checked);
    } else {
        store.set_checked(&target, checked);
        plain_click(store, target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::sample_store;
    use pretty_assertions::assert_eq;

    fn refs(paths: &[&str]) -> Vec<ItemRef> {
        paths.iter().map(|p| ItemRef::path(*p)).collect()
    }

    fn visual_set(paths: &[&str]) -> HashSet<ItemRef> {
        refs(paths).into_iter().collect()
    }

    fn click(target: &str, ctrl: bool, shift: bool) -> Gesture {
        Gesture::RowClick {
            target: ItemRef::path(target),
            ctrl,
            shift,
        }
    }

    const ORDER: [&str; 4] = ["src/a.ts", "src/b.ts", "src/utils/helper.ts", "README.md"];

    #[test]
    fn plain_click_selects_one_and_sets_anchor() {
        let mut store = sample_store();
        store.set_visual(refs(&["src/b.ts", "README.md"]));
        let outcome = apply(&mut store, click("src/a.ts", false, false), &refs(&ORDER));
        assert_eq!(store.visual(), &visual_set(&["src/a.ts"]));
        assert_eq!(store.shift_anchor(), Some(&ItemRef::path("src/a.ts")));
        assert_eq!(
            outcome,
            Outcome {
                rerender: true,
                persist: false
            }
        );
    }

    #[test]
    fn shift_click_selects_range_and_keeps_anchor() {
        let mut store = sample_store();
        let order = refs(&ORDER);
        apply(&mut store, click("src/a.ts", false, false), &order);
        apply(&mut store, click("README.md", false, true), &order);
        assert_eq!(store.visual(), &visual_set(&ORDER));
        assert_eq!(store.shift_anchor(), Some(&ItemRef::path("src/a.ts")));

        // Backwards range from the same anchor replaces the previous one.
        apply(&mut store, click("src/b.ts", false, true), &order);
        assert_eq!(store.visual(), &visual_set(&["src/a.ts", "src/b.ts"]));
    }

    #[test]
    fn ctrl_shift_adds_range_to_existing_selection() {
        let mut store = sample_store();
        let order = refs(&ORDER);
        apply(&mut store, click("README.md", false, false), &order);
        apply(&mut store, click("src/a.ts", true, false), &order);
        apply(&mut store, click("src/b.ts", true, true), &order);
        assert_eq!(
            store.visual(),
            &visual_set(&["README.md", "src/a.ts", "src/b.ts"])
        );
    }

    #[test]
    fn shift_click_without_visible_anchor_degrades_to_plain_click() {
        let mut store = sample_store();
        let order = refs(&ORDER);
        apply(&mut store, click("src/b.ts", false, true), &order);
        assert_eq!(store.visual(), &visual_set(&["src/b.ts"]));
        assert_eq!(store.shift_anchor(), Some(&ItemRef::path("src/b.ts")));

        store.set_shift_anchor(Some(ItemRef::path("hidden.rs")));
        apply(&mut store, click("README.md", false, true), &order);
        assert_eq!(store.visual(), &visual_set(&["README.md"]));
        assert_eq!(store.shift_anchor(), Some(&ItemRef::path("README.md")));
    }

    #[test]
    fn ctrl_click_toggles_without_clearing() {
        let mut store = sample_store();
        let order = refs(&ORDER);
        apply(&mut store, click("src/a.ts", false, false), &order);
        apply(&mut store, click("src/b.ts", true, false), &order);
        assert_eq!(store.visual(), &visual_set(&["src/a.ts", "src/b.ts"]));
        apply(&mut store, click("src/a.ts", true, false), &order);
        assert_eq!(store.visual(), &visual_set(&["src/b.ts"]));
        assert_eq!(store.shift_anchor(), Some(&ItemRef::path("src/a.ts")));
    }

    #[test]
    fn checkbox_on_highlighted_row_applies_to_whole_visual_selection() {
        let mut store = sample_store();
        store.set_visual(refs(&["src/a.ts", "src/b.ts", "README.md"]));
        let outcome = apply(
            &mut store,
            Gesture::CheckboxClick {
                target: ItemRef::path("src/b.ts"),
                checked: true,
            },
            &refs(&ORDER),
        );
        assert_eq!(store.selected_file_paths(), vec!["README.md", "src/a.ts", "src/b.ts"]);
        assert_eq!(store.visual().len(), 3);
        assert!(outcome.persist);
    }

    #[test]
    fn checkbox_outside_visual_selection_applies_to_one_and_collapses_highlight() {
        let mut store = sample_store();
        store.set_visual(refs(&["src/a.ts", "src/b.ts"]));
        apply(
            &mut store,
            Gesture::CheckboxClick {
                target: ItemRef::path("README.md"),
                checked: true,
            },
            &refs(&ORDER),
        );
        assert_eq!(store.selected_file_paths(), vec!["README.md"]);
        assert_eq!(store.visual(), &visual_set(&["README.md"]));
    }

    #[test]
    fn checkbox_batch_includes_snippets_and_folders() {
        let mut store = sample_store();
        store.set_visual([ItemRef::path("src/utils"), ItemRef::snippet("snippet-2")]);
        apply(
            &mut store,
            Gesture::CheckboxClick {
                target: ItemRef::snippet("snippet-2"),
                checked: true,
            },
            &[],
        );
        assert_eq!(store.selected_file_paths(), vec!["src/utils/helper.ts"]);
        assert_eq!(store.selected_snippet_ids(), vec!["snippet-2"]);
    }

    #[test]
    fn expand_click_only_touches_expansion() {
        let mut store = sample_store();
        store.set_visual(refs(&["src/a.ts"]));
        let outcome = apply(
            &mut store,
            Gesture::ExpandClick {
                path: "src/utils".to_string(),
            },
            &[],
        );
        assert!(store.is_expanded("src/utils"));
        assert_eq!(store.visual().len(), 1);
        assert!(store.selected_file_paths().is_empty());
        assert!(outcome.persist);
    }

    #[test]
    fn background_click_clears_visual_selection() {
        let mut store = sample_store();
        store.set_visual(refs(&["src/a.ts", "src/b.ts"]));
        apply(&mut store, Gesture::BackgroundClick, &[]);
        assert!(store.visual().is_empty());
    }
}
