use crate::model::{EntryKind, FileEntry};
use crate::utils;
use anyhow::{Context, Result};
use globset::{Glob, GlobSetBuilder};
use ignore::WalkBuilder;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub struct ScanOptions<'a> {
    pub types_filter: &'a [String],
    pub include_ignored: bool,
    /// Directory never listed, e.g. our own state dir inside the root.
    pub skip_dir: Option<&'a Path>,
}

fn keep_by_type(path: &Path, types_filter: &[String]) -> bool {
    types_filter.is_empty()
        || types_filter
            .iter()
            .any(|ext_filter_str| path.extension() == Some(OsStr::new(ext_filter_str)))
}

/// Sorted `(path, is_dir)` pairs under `root`, the root itself first.
pub fn scan_files(root: &Path, options: &ScanOptions) -> Result<Vec<(PathBuf, bool)>> {
    let mut collected_paths: Vec<(PathBuf, bool)> = Vec::new();
    if root.is_dir() {
        collected_paths.push((root.to_path_buf(), true));
    }
    let skipped = |path: &Path| options.skip_dir.is_some_and(|skip| path.starts_with(skip));

    if options.include_ignored {
        // No ignore files at all: plain walk, only VCS internals are left out.
        let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
            entry.file_name() != OsStr::new(".git") && !skipped(entry.path())
        });
        for result in walker {
            let dirent = match result {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable entry during scan");
                    continue;
                }
            };
            let is_dir = dirent.file_type().is_dir();
            if dirent.path() == root || (!is_dir && !keep_by_type(dirent.path(), options.types_filter)) {
                continue;
            }
            collected_paths.push((dirent.into_path(), is_dir));
        }
    } else {
        let skip_dir = options.skip_dir.map(Path::to_path_buf);
        let mut builder = WalkBuilder::new(root);
        builder.filter_entry(move |entry| {
            skip_dir
                .as_deref()
                .is_none_or(|skip| !entry.path().starts_with(skip))
        });
        for result in builder.build() {
            let dirent = match result {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable entry during scan");
                    continue;
                }
            };
            let is_dir = dirent.file_type().is_some_and(|ft| ft.is_dir());
            if dirent.path() == root || (!is_dir && !keep_by_type(dirent.path(), options.types_filter)) {
                continue;
            }
            collected_paths.push((dirent.into_path(), is_dir));
        }
    }

    collected_paths.sort_by(|(a, _), (b, _)| a.cmp(b));
    collected_paths.dedup_by(|(a, _), (b, _)| a == b);
    Ok(collected_paths)
}

/// Nested tree rooted at `root` with token estimates from file sizes.
/// Folders with no file anywhere below them are dropped.
pub fn build_file_tree(root: &Path, scanned: &[(PathBuf, bool)]) -> FileEntry {
    let mut children_of: HashMap<PathBuf, Vec<(PathBuf, bool)>> = HashMap::new();
    for (path, is_dir) in scanned {
        if path == root {
            continue;
        }
        if let Some(parent) = path.parent() {
            children_of
                .entry(parent.to_path_buf())
                .or_default()
                .push((path.clone(), *is_dir));
        }
    }

    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| ".".to_string());
    let children = build_children(root, root, &children_of);
    FileEntry::root(".", &name, children)
}

fn build_children(
    root: &Path,
    dir: &Path,
    children_of: &HashMap<PathBuf, Vec<(PathBuf, bool)>>,
) -> Vec<FileEntry> {
    let Some(children) = children_of.get(dir) else {
        return Vec::new();
    };
    children
        .iter()
        .filter_map(|(path, is_dir)| {
            let key = utils::relative_key(path.strip_prefix(root).unwrap_or(path));
            if *is_dir {
                let nested = build_children(root, path, children_of);
                (!nested.is_empty()).then(|| FileEntry::folder(&key, nested))
            } else {
                let len = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
                Some(FileEntry::file(
                    &key,
                    path.clone(),
                    utils::approx_tokens_for_len(len),
                ))
            }
        })
        .collect()
}

/// Every file in the tree, as `(relative key, filesystem path)`, in tree order.
pub fn flatten_files(entry: &FileEntry) -> Vec<(String, PathBuf)> {
    let mut out = Vec::new();
    let mut stack = vec![entry];
    while let Some(current) = stack.pop() {
        if current.kind == EntryKind::File {
            out.push((current.path.clone(), current.fs_path.clone()));
        } else {
            stack.extend(current.children.iter().rev());
        }
    }
    out
}

/// Relative file keys matching any of the `--preselect` globs.
pub fn match_preselect(patterns: &[String], file_keys: &[String]) -> Result<Vec<String>> {
    if patterns.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(
            Glob::new(pattern).with_context(|| format!("invalid --preselect pattern '{}'", pattern))?,
        );
    }
    let set = builder.build().context("failed to compile --preselect patterns")?;
    Ok(file_keys
        .iter()
        .filter(|key| set.is_match(key.as_str()))
        .cloned()
        .collect())
}
