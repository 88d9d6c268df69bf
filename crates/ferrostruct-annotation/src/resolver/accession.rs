//! Canonical accession shape, text scanning and plausibility.

use std::sync::OnceLock;

use regex::Regex;

/// First letter from O/P/Q or the other allowed letters, then five
/// alphanumerics with digits at the second and last positions.
const ACCESSION_PATTERN: &str = r"(?:[OPQ][0-9][A-Z0-9]{3}[0-9]|[A-NR-Z][0-9][A-Z0-9]{3}[0-9])";

/// Template accession seen in documentation and fixtures, never a real hit.
const PLACEHOLDER_ACCESSION: &str = "P12345";

fn exact_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!("^{ACCESSION_PATTERN}$")).ok())
        .as_ref()
}

fn scan_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!(r"\b{ACCESSION_PATTERN}\b")).ok())
        .as_ref()
}

/// Trimmed, upper-cased identifier.
pub fn normalize(identifier: &str) -> String {
    identifier.trim().to_ascii_uppercase()
}

pub fn is_canonical(identifier: &str) -> bool {
    exact_regex().is_some_and(|re| re.is_match(identifier))
}

/// Accession-shaped substrings of `text`, first occurrence order, deduplicated.
pub fn scan(text: &str) -> Vec<String> {
    let Some(re) = scan_regex() else {
        return Vec::new();
    };
    let mut found: Vec<String> = Vec::new();
    for m in re.find_iter(text) {
        if !found.iter().any(|f| f == m.as_str()) {
            found.push(m.as_str().to_string());
        }
    }
    found
}

/// Rejects degenerate shapes a text scan turns up by accident.
pub fn is_plausible(candidate: &str) -> bool {
    if candidate == PLACEHOLDER_ACCESSION {
        return false;
    }

    let letters: Vec<char> = candidate.chars().filter(|c| c.is_ascii_alphabetic()).collect();
    if letters.len() >= 3 && letters.iter().all(|&c| c == letters[0]) {
        return false;
    }

    let tail: Vec<char> = candidate.chars().skip(1).collect();
    if tail.iter().all(|c| c.is_ascii_digit()) && tail.iter().all(|&c| c == tail[0]) {
        return false;
    }

    true
}
