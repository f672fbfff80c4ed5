use crate::clipboard::{ClipboardSink, SystemClipboard};
use crate::host::persistence::{PersistedState, STATE_FILE_NAME};
use crate::host::{self, HostConfig, snippets};
use crate::model::Snippet;
use crate::panel::Panel;
use crate::ui_state::UiStateStore;
use crate::{cli, file_scanner, tree_builder, tui, utils};
use anyhow::{Context, Result, anyhow, bail};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

const STATE_DIR_NAME: &str = ".yankboard";

// Resolves the root, the state location and the scan options from the command line.
fn host_config(cli_args: &cli::Cli) -> Result<HostConfig> {
    let root = cli_args
        .root
        .canonicalize()
        .with_context(|| format!("cannot open {}", cli_args.root.display()))?;
    if !root.is_dir() {
        bail!("{} is not a directory", root.display());
    }
    let state_dir = cli_args
        .state_dir
        .clone()
        .unwrap_or_else(|| root.join(STATE_DIR_NAME));
    Ok(HostConfig {
        types: cli_args.types.clone(),
        include_ignored: cli_args.include_ignored,
        preselect: cli_args.preselect.clone(),
        token_limit: cli_args.token_limit,
        state_file: state_dir.join(STATE_FILE_NAME),
        state_dir,
        root,
    })
}

// Applies --clear-snippets and --snippet to the state file before anything reads it.
fn record_snippets(config: &HostConfig, cli_args: &cli::Cli) -> Result<()> {
    if !cli_args.clear_snippets && cli_args.snippet.is_empty() {
        return Ok(());
    }
    let mut state = PersistedState::load(&config.state_file)?;
    if cli_args.clear_snippets {
        tracing::info!(dropped = state.snippets.len(), "clearing saved snippets");
        state.snippets.clear();
    }
    for spec in &cli_args.snippet {
        let snippet = snippets::capture(&config.root, spec, &state.snippets)
            .with_context(|| format!("cannot record snippet from {}", spec.path.display()))?;
        tracing::info!(id = %snippet.id, label = %snippet.label(), "recorded snippet");
        state.snippets.push(snippet);
    }
    state.save(&config.state_file)?;
    Ok(())
}

/// The clipboard blob: a tree of the selected files, then one block per file
/// and one per snippet. Always ends in exactly one newline.
pub fn render_output(root_label: &str, files: &[(String, PathBuf)], snippets: &[Snippet]) -> String {
    let keys: Vec<String> = files.iter().map(|(key, _)| key.clone()).collect();
    let mut output_string_parts: Vec<String> = tree_builder::build_tree_labels(root_label, &keys);
    output_string_parts.push(String::new());

    for (relative_path, file_path) in files {
        match fs::read_to_string(file_path) {
            Ok(contents) => {
                output_string_parts.push(format!("---\nFile: {}\n---", relative_path));
                output_string_parts.push(String::new());
                output_string_parts.push(contents.trim_end().to_string());
                output_string_parts.push(String::new());
            }
            Err(e) => {
                tracing::warn!(path = %file_path.display(), error = %e, "could not read file");
                output_string_parts.push(format!(
                    "---\nFile: {} (Error reading file: {})\n---",
                    relative_path, e
                ));
                output_string_parts.push(String::new());
                output_string_parts.push("[Content not available]".to_string());
                output_string_parts.push(String::new());
            }
        }
    }

    for snippet in snippets {
        output_string_parts.push(format!(
            "---\nSnippet: {} (lines {}-{})\n---",
            snippet.relative_path, snippet.start_line, snippet.end_line
        ));
        output_string_parts.push(String::new());
        output_string_parts.push(snippet.code.trim_end().to_string());
        output_string_parts.push(String::new());
    }

    let mut final_output_string = output_string_parts.join("\n");
    final_output_string.truncate(final_output_string.trim_end_matches('\n').len());
    final_output_string.push('\n');
    final_output_string
}

/// The `--headless` selection: every file matching `--preselect`.
/// Returns the blob and the number of files in it.
fn collect_headless(config: &HostConfig) -> Result<(String, usize)> {
    let tree = host::scan_project(config)?;
    let files = file_scanner::flatten_files(&tree);
    let keys: Vec<String> = files.iter().map(|(key, _)| key.clone()).collect();
    let matched: HashSet<String> = file_scanner::match_preselect(&config.preselect, &keys)?
        .into_iter()
        .collect();
    let files_to_yank: Vec<(String, PathBuf)> = files
        .into_iter()
        .filter(|(key, _)| matched.contains(key))
        .collect();
    if files_to_yank.is_empty() {
        bail!("No files matched the --preselect patterns and filters.");
    }
    let blob = render_output(&config.root_label(), &files_to_yank, &[]);
    Ok((blob, files_to_yank.len()))
}

// Performs the final action: printing for dry-run or copying to clipboard.
fn run_headless_mode(
    config: &HostConfig,
    dry_run: bool,
    clipboard: &mut dyn ClipboardSink,
) -> Result<()> {
    let (output_string, files_to_yank_count) = collect_headless(config)?;
    let tokens = utils::approx_tokens(&output_string);
    if dry_run {
        print!("{}", output_string);
        println!(
            "(Dry run: Would copy {} files (≈ {} tokens). Clipboard not affected.)",
            files_to_yank_count, tokens
        );
    } else {
        clipboard.copy(&output_string)?;
        println!(
            "✅ Copied {} files (≈ {} tokens) to the clipboard.",
            files_to_yank_count, tokens
        );
    }
    Ok(())
}

fn run_interactive_mode(config: HostConfig) -> Result<()> {
    let (endpoint, host_thread) = host::spawn(config, SystemClipboard)?;
    let panel = Panel::new(endpoint, UiStateStore::default_location());
    // The panel owns the bridge; returning drops it and lets the host thread exit.
    let tui_result = tui::run(panel);
    host_thread
        .join()
        .map_err(|_| anyhow!("host thread panicked"))?;
    tui_result
}

// Main orchestrator for the yankboard application logic.
pub fn run_yankboard(cli_args: cli::Cli) -> Result<()> {
    let config = host_config(&cli_args)?;
    record_snippets(&config, &cli_args)?;

    if cli_args.headless {
        let mut clipboard = SystemClipboard;
        return run_headless_mode(&config, cli_args.dry_run, &mut clipboard);
    }
    tracing::info!(root = %config.root.display(), "starting interactive panel");
    run_interactive_mode(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    struct Capture(Vec<String>);

    impl ClipboardSink for Capture {
        fn copy(&mut self, text: &str) -> Result<()> {
            self.0.push(text.to_string());
            Ok(())
        }
    }

    fn config_for(root: &Path, preselect: &[&str]) -> HostConfig {
        let state_dir = root.join(STATE_DIR_NAME);
        HostConfig {
            root: root.to_path_buf(),
            types: Vec::new(),
            include_ignored: true,
            preselect: preselect.iter().map(|p| p.to_string()).collect(),
            token_limit: 0,
            state_file: state_dir.join(STATE_FILE_NAME),
            state_dir,
        }
    }

    #[test]
    fn output_has_tree_file_blocks_and_snippets() {
        let dir = tempfile::tempdir().unwrap();
        let main = dir.path().join("main.rs");
        fs::write(&main, "fn main() {}\n\n\n").unwrap();
        let snippet = Snippet {
            id: "snippet-1".to_string(),
            relative_path: "lib.rs".to_string(),
            start_line: 2,
            end_line: 3,
            code: "let a = 1;\nlet b = 2;".to_string(),
            estimated_tokens: 5,
        };
        let out = render_output(
            "proj",
            &[
                ("main.rs".to_string(), main),
                ("missing.rs".to_string(), dir.path().join("missing.rs")),
            ],
            &[snippet],
        );
        let expected_head = "proj/\n├─ main.rs\n└─ missing.rs\n\n---\nFile: main.rs\n---\n\nfn main() {}\n\n---\nFile: missing.rs (Error reading file: ";
        assert!(out.starts_with(expected_head), "{}", out);
        assert!(out.ends_with(
            "[Content not available]\n\n---\nSnippet: lib.rs (lines 2-3)\n---\n\nlet a = 1;\nlet b = 2;\n"
        ));
    }

    #[test]
    fn headless_copies_only_preselected_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/a.rs"), "a\n").unwrap();
        fs::write(dir.path().join("notes.md"), "n\n").unwrap();
        let config = config_for(dir.path(), &["src/**"]);

        let mut sink = Capture(Vec::new());
        run_headless_mode(&config, false, &mut sink).unwrap();
        assert_eq!(sink.0.len(), 1);
        assert!(sink.0[0].contains("File: src/a.rs"));
        assert!(!sink.0[0].contains("notes.md"));
    }

    #[test]
    fn headless_without_matches_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.md"), "n\n").unwrap();
        let config = config_for(dir.path(), &["*.rs"]);
        let mut sink = Capture(Vec::new());
        assert!(run_headless_mode(&config, false, &mut sink).is_err());
        assert!(sink.0.is_empty());
    }

    #[test]
    fn snippet_flags_update_the_state_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("lib.rs"), "a\nb\nc\n").unwrap();
        let root = dir.path().to_string_lossy().into_owned();
        let cli_args = cli::Cli::parse_from(["yankboard", root.as_str(), "--snippet", "lib.rs:2-3"]);
        let config = host_config(&cli_args).unwrap();
        record_snippets(&config, &cli_args).unwrap();
        record_snippets(&config, &cli_args).unwrap();

        let state = PersistedState::load(&config.state_file).unwrap();
        let ids: Vec<&str> = state.snippets.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["snippet-1", "snippet-2"]);
        assert_eq!(state.snippets[0].code, "b\nc");

        let clear = cli::Cli::parse_from(["yankboard", root.as_str(), "--clear-snippets"]);
        record_snippets(&config, &clear).unwrap();
        assert!(PersistedState::load(&config.state_file).unwrap().snippets.is_empty());
    }
}
