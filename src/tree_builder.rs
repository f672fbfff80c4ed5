use std::collections::{BTreeMap, HashMap};

/// Build pretty tree-style labels in **O(n log n)** for the given relative
/// `/`-separated file keys. Every ancestor directory gets its own line.
///
/// The first label is `{root_label}/`; directories carry a trailing `/`.
pub fn build_tree_labels(root_label: &str, file_paths: &[String]) -> Vec<String> {
    // components -> is_dir; component-wise ordering keeps parents before children
    let mut entries: BTreeMap<Vec<&str>, bool> = BTreeMap::new();
    for path in file_paths {
        let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
        if parts.is_empty() {
            continue;
        }
        for depth in 1..parts.len() {
            entries.insert(parts[..depth].to_vec(), true);
        }
        entries.entry(parts).or_insert(false);
    }
    let entries: Vec<(Vec<&str>, bool)> = entries.into_iter().collect();

    let mut labels = Vec::with_capacity(entries.len() + 1);
    labels.push(format!("{}/", root_label));

    // PASS #1 – record each directory's last immediate child index
    let mut last_child_map: HashMap<&[&str], usize> = HashMap::new();
    for (idx, (parts, _)) in entries.iter().enumerate() {
        last_child_map.insert(&parts[..parts.len() - 1], idx);
    }

    // PASS #2 – scan once, using a stack of ancestor indices (stack[d] sits at depth d + 1)
    let mut is_last_vec = vec![false; entries.len()];
    let mut ancestor_stack: Vec<usize> = Vec::new();
    for (idx, (parts, is_dir)) in entries.iter().enumerate() {
        let depth = parts.len();
        ancestor_stack.truncate(depth - 1);

        let is_last_child = last_child_map.get(&parts[..depth - 1]) == Some(&idx);
        is_last_vec[idx] = is_last_child;

        let mut prefix = String::new();
        for &ancestor_idx in &ancestor_stack {
            prefix.push_str(if is_last_vec[ancestor_idx] {
                "   "
            } else {
                "│  "
            });
        }
        prefix.push_str(if is_last_child { "└─ " } else { "├─ " });

        let name = parts[depth - 1];
        labels.push(if *is_dir {
            format!("{}{}/", prefix, name)
        } else {
            format!("{}{}", prefix, name)
        });

        if *is_dir {
            ancestor_stack.push(idx);
        }
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn keys(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn nested_directories_get_connectors() {
        let labels = build_tree_labels(
            "proj",
            &keys(&["src/main.rs", "src/tui/mod.rs", "src/tui/app.rs", "README.md"]),
        );
        assert_eq!(
            labels,
            vec![
                "proj/",
                "├─ README.md",
                "└─ src/",
                "   ├─ main.rs",
                "   └─ tui/",
                "      ├─ app.rs",
                "      └─ mod.rs",
            ]
        );
    }

    #[test]
    fn open_ancestors_draw_vertical_bars() {
        let labels = build_tree_labels("r", &keys(&["a/b/c.txt", "a/d.txt", "z.txt"]));
        assert_eq!(
            labels,
            vec![
                "r/",
                "├─ a/",
                "│  ├─ b/",
                "│  │  └─ c.txt",
                "│  └─ d.txt",
                "└─ z.txt",
            ]
        );
    }

    #[test]
    fn empty_selection_is_just_the_root() {
        assert_eq!(build_tree_labels("r", &[]), vec!["r/"]);
    }
}
