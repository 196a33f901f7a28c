// Wordlist loading for wordlist-driven fuzz values

use crate::payload::FuzzValues;
use std::fs;
use std::path::Path;

/// Load a newline-delimited wordlist. Every line is a fuzz value taken
/// verbatim: only the line terminator is removed and only empty lines are
/// skipped. Leading `#` and surrounding whitespace are part of the value.
pub fn load_wordlist(path: &Path) -> Result<Vec<String>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read wordlist {}: {}", path.display(), e))?;

    // `lines` strips "\n" and "\r\n" but leaves all other whitespace alone.
    let words: Vec<String> = content
        .lines()
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();

    if words.is_empty() {
        return Err(format!("Wordlist {} is empty", path.display()));
    }

    Ok(words)
}

/// Fuzz values backed by the wordlist at `path`
pub fn wordlist_values(path: &Path) -> Result<FuzzValues, String> {
    load_wordlist(path).map(FuzzValues::Wordlist)
}
