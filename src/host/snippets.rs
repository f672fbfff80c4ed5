use crate::error::SnippetSpecError;
use crate::model::Snippet;
use crate::utils;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A `--snippet PATH:START-END` request, lines 1-based and inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetSpec {
    pub path: PathBuf,
    pub start_line: u32,
    pub end_line: u32,
}

impl FromStr for SnippetSpec {
    type Err = SnippetSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (path, range) = s
            .rsplit_once(':')
            .ok_or_else(|| SnippetSpecError::Format(s.to_string()))?;
        let (start, end) = range
            .split_once('-')
            .ok_or_else(|| SnippetSpecError::Format(s.to_string()))?;
        if path.is_empty() {
            return Err(SnippetSpecError::Format(s.to_string()));
        }
        let parse_line = |raw: &str| match raw.trim().parse::<u32>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(SnippetSpecError::LineNumber(raw.to_string())),
        };
        let start_line = parse_line(start)?;
        let end_line = parse_line(end)?;
        if end_line < start_line {
            return Err(SnippetSpecError::Range {
                start: start_line,
                end: end_line,
            });
        }
        Ok(SnippetSpec {
            path: PathBuf::from(path),
            start_line,
            end_line,
        })
    }
}

/// `snippet-N` with N one past the highest numbered id already in use.
pub fn next_snippet_id(existing: &[Snippet]) -> String {
    let highest = existing
        .iter()
        .filter_map(|s| s.id.strip_prefix("snippet-")?.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    format!("snippet-{}", highest + 1)
}

/// Reads the requested lines from disk and turns them into a new snippet.
pub fn capture(
    root: &Path,
    spec: &SnippetSpec,
    existing: &[Snippet],
) -> Result<Snippet, SnippetSpecError> {
    let full_path = if spec.path.is_absolute() {
        spec.path.clone()
    } else {
        root.join(&spec.path)
    };
    let relative_path = utils::relative_key(full_path.strip_prefix(root).unwrap_or(spec.path.as_path()));
    let text = fs::read_to_string(&full_path).map_err(|e| SnippetSpecError::Read {
        path: relative_path.clone(),
        reason: e.to_string(),
    })?;

    if spec.start_line == 0 || spec.end_line < spec.start_line {
        return Err(SnippetSpecError::Range {
            start: spec.start_line,
            end: spec.end_line,
        });
    }
    let lines: Vec<&str> = text.lines().collect();
    if spec.end_line as usize > lines.len() {
        return Err(SnippetSpecError::OutOfBounds {
            path: relative_path,
            lines: lines.len(),
        });
    }
    let code = lines[spec.start_line as usize - 1..spec.end_line as usize].join("\n");
    Ok(Snippet {
        id: next_snippet_id(existing),
        estimated_tokens: utils::approx_tokens(&code),
        relative_path,
        start_line: spec.start_line,
        end_line: spec.end_line,
        code,
    })
}
