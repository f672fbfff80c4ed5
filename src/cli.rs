use crate::host::snippets::SnippetSpec;
use clap::Parser;
use std::path::PathBuf;

/// yankboard – pick files and snippets in a terminal panel, copy them as one blob
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Root to scan (defaults to CWD)
    #[arg(value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Comma-separated file-types to include (extension only, no dot).
    #[arg(long, value_delimiter = ',', value_name = "EXTENSIONS")]
    pub types: Vec<String>,

    /// Include files ignored by .gitignore
    #[arg(long)]
    pub include_ignored: bool,

    /// Glob patterns to preselect files (e.g., "src/**/*.rs").
    /// Paths are relative to the root directory. Repeatable.
    #[arg(long, value_name = "PATTERN")]
    pub preselect: Vec<String>,

    /// Copy the preselected files and exit without the panel.
    #[arg(long, requires = "preselect")]
    pub headless: bool,

    /// With --headless, print the blob instead of copying it.
    #[arg(long, requires = "headless")]
    pub dry_run: bool,

    /// Save a snippet of PATH covering lines START to END (inclusive). Repeatable.
    #[arg(long, value_name = "PATH:START-END")]
    pub snippet: Vec<SnippetSpec>,

    /// Drop all saved snippets before adding new ones.
    #[arg(long)]
    pub clear_snippets: bool,

    /// Warn when the selection exceeds this many tokens (0 = no limit).
    #[arg(long, value_name = "TOKENS", default_value_t = 0)]
    pub token_limit: u64,

    /// Where saved selection and snippets live [default: <DIR>/.yankboard]
    #[arg(long, value_name = "DIR")]
    pub state_dir: Option<PathBuf>,

    /// Write logs here while the panel owns the terminal.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn headless_requires_preselect() {
        assert!(Cli::try_parse_from(["yankboard", "--headless"]).is_err());
        let cli = Cli::try_parse_from([
            "yankboard",
            "--headless",
            "--preselect",
            "src/**",
            "--types",
            "rs,toml",
        ])
        .unwrap();
        assert_eq!(cli.types, vec!["rs", "toml"]);
    }

    #[test]
    fn snippet_arguments_are_validated_at_parse_time() {
        let cli = Cli::try_parse_from(["yankboard", "--snippet", "src/a.rs:1-4"]).unwrap();
        assert_eq!(cli.snippet[0].end_line, 4);
        assert!(Cli::try_parse_from(["yankboard", "--snippet", "src/a.rs:4-1"]).is_err());
    }
}
