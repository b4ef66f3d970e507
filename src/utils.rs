//! Text helpers shared by the extractors.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref ASSIGNMENT_PREFIX: Regex = Regex::new(r"^\s*(?::\s*=|=)\s*").unwrap();
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
    static ref WORD: Regex = Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").unwrap();
}

/// Replace every whitespace run (line breaks included) with one space.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Drop a leading `:=`, `: =` or `=` from a default value.
pub fn strip_assignment(text: &str) -> String {
    ASSIGNMENT_PREFIX.replace(text, "").trim().to_string()
}

pub fn is_identifier_like(text: &str) -> bool {
    IDENTIFIER.is_match(text)
}

/// Identifier-shaped words in `text`, in order.
pub fn words(text: &str) -> impl Iterator<Item = &str> {
    WORD.find_iter(text).map(|m| m.as_str())
}

/// Trim every line and drop blank lines at either end.
pub fn normalize_description(text: &str) -> String {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let start = lines.iter().position(|l| !l.is_empty());
    let end = lines.iter().rposition(|l| !l.is_empty());
    match (start, end) {
        (Some(start), Some(end)) => lines[start..=end].join("\n"),
        _ => String::new(),
    }
}

/// Remove every occurrence of `marker`, dropping lines that only held the
/// marker. Returns the cleaned text and whether the marker was present.
pub fn strip_marker(text: &str, marker: &str) -> (String, bool) {
    if marker.is_empty() || !text.contains(marker) {
        return (text.to_string(), false);
    }
    let kept: Vec<String> = text
        .lines()
        .filter_map(|line| {
            if !line.contains(marker) {
                return Some(line.to_string());
            }
            let cleaned = line.replace(marker, "");
            let cleaned = cleaned.trim();
            (!cleaned.is_empty()).then(|| cleaned.to_string())
        })
        .collect();
    (normalize_description(&kept.join("\n")), true)
}
