use std::path::Path;

/// Rough estimate: GPT-style token ≈ 4 chars (good enough for UI)
pub fn approx_tokens(s: &str) -> u64 {
    (s.chars().count() / 4) as u64
}

/// Same heuristic from a byte length, for files we haven't read.
pub fn approx_tokens_for_len(bytes: u64) -> u64 {
    bytes / 4
}

/// `/`-separated key for a path relative to the scan root ("" for the root itself).
pub fn relative_key(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_keys_are_slash_separated() {
        assert_eq!(relative_key(Path::new("src/tui/mod.rs")), "src/tui/mod.rs");
        assert_eq!(relative_key(Path::new("./a")), "a");
        assert_eq!(relative_key(Path::new("")), "");
    }

    #[test]
    fn token_estimates_agree() {
        assert_eq!(approx_tokens("abcdefgh"), 2);
        assert_eq!(approx_tokens_for_len(8), 2);
    }
}
