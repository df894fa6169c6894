//! Text canonicalization for Danish club and team names.
//!
//! This module provides the comparison keys used to join spreadsheet data
//! against the team universe: a canonical key for exact-but-forgiving
//! matching, and a loose key that additionally drops generic organisation
//! suffixes.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Generic organisation suffixes that often vary between the match
/// programme and the team list (e.g. "Benløse FC" vs "Benløse IF").
/// Only used for resolution when the resulting mapping stays unique.
const TEAM_STOP_WORDS: &[&str] = &["fc", "if", "ff", "ft", "fk", "floorball", "club", "klub"];

/// Lowercase and fold Danish text into plain ASCII-ish form.
///
/// Rules applied:
/// 1. Trim + lowercase
/// 2. Map æ/ø/å to ae/oe/aa
/// 3. NFD decomposition, dropping combining marks (é -> e, ü -> u)
///
/// Word structure and punctuation are preserved; see [`canonical_key`] for
/// the full comparison key.
pub(crate) fn fold_danish(value: &str) -> String {
    let lower = value.trim().to_lowercase();

    let mut folded = String::with_capacity(lower.len());
    for c in lower.chars() {
        match c {
            'æ' => folded.push_str("ae"),
            'ø' => folded.push_str("oe"),
            'å' => folded.push_str("aa"),
            c => folded.push(c),
        }
    }

    folded.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Normalize free text into a canonical comparison key.
///
/// Builds on [`fold_danish`], then replaces every run of
/// non-alphanumeric characters with a single space and trims. Total and
/// deterministic; empty input yields the empty string.
///
/// # Examples
///
/// ```
/// use turnering_import::text::canonical_key;
///
/// assert_eq!(canonical_key("Bagsværd IF"), "bagsvaerd if");
/// assert_eq!(canonical_key("  Benløse  FC. "), "benloese fc");
/// ```
pub fn canonical_key(value: &str) -> String {
    let folded = fold_danish(value);

    let spaced: String = folded
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical key with generic club/team suffix tokens removed.
///
/// Used only as a fallback when exact-name matching fails. Returns the
/// empty string when filtering removes every token; callers must then skip
/// loose matching for that name.
pub fn loose_team_key(value: &str) -> String {
    let key = canonical_key(value);
    if key.is_empty() {
        return String::new();
    }

    let kept: Vec<&str> = key
        .split(' ')
        .filter(|t| !t.is_empty() && !TEAM_STOP_WORDS.contains(t))
        .collect();

    kept.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_key_basic() {
        assert_eq!(canonical_key("Bagsværd IF"), "bagsvaerd if");
        assert_eq!(canonical_key("Bagsvaerd if"), "bagsvaerd if");
        assert_eq!(canonical_key("Benløse FC"), "benloese fc");
        assert_eq!(canonical_key("Århus Floorball"), "aarhus floorball");
    }

    #[test]
    fn test_canonical_key_diacritic_folding_matches() {
        assert_eq!(canonical_key("Bagsværd IF"), canonical_key("Bagsvaerd if"));
        assert_eq!(canonical_key("café"), "cafe");
        assert_eq!(canonical_key("Müller"), "muller");
    }

    #[test]
    fn test_canonical_key_punctuation_and_whitespace() {
        assert_eq!(canonical_key("A.B.  Team - 1"), "a b team 1");
        assert_eq!(canonical_key("   "), "");
        assert_eq!(canonical_key(""), "");
    }

    #[test]
    fn test_canonical_key_idempotent() {
        for s in ["Bagsværd IF", "  A.B. Team ", "Benløse-FC/2", ""] {
            let once = canonical_key(s);
            assert_eq!(canonical_key(&once), once, "not idempotent for {:?}", s);
        }
    }

    #[test]
    fn test_loose_team_key_strips_suffixes() {
        assert_eq!(loose_team_key("Benløse FC"), "benloese");
        assert_eq!(loose_team_key("Benløse IF"), "benloese");
        assert_eq!(loose_team_key("Bagsværd Floorball Klub"), "bagsvaerd");
        assert_eq!(loose_team_key("Team A"), "team a");
    }

    #[test]
    fn test_loose_team_key_empty_when_only_stop_words() {
        assert_eq!(loose_team_key("Floorball Klub"), "");
        assert_eq!(loose_team_key("FC"), "");
        assert_eq!(loose_team_key(""), "");
    }
}
