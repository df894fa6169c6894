//! Gender classification from explicit spreadsheet values and free-text hints.
//!
//! Two paths exist: [`normalize_gender_like`] for explicit enumerated values
//! (the authoritative path when the source carries a gender column), and
//! [`gender_hint`] for scanning league/pool/team free text. Ambiguity is
//! never guessed away: both paths return `None` when the signal is unclear.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::text::fold_danish;

/// Tournament gender classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "MEN")]
    Men,
    #[serde(rename = "WOMEN")]
    Women,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Men => "MEN",
            Gender::Women => "WOMEN",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse an explicit gender-like value (Danish or English, abbreviated or
/// spelled out) into a [`Gender`].
///
/// Women-tokens are checked first so that `female`/`women` are not
/// swallowed by the `male`/`men` substring checks.
pub fn normalize_gender_like(raw: &str) -> Option<Gender> {
    let v = fold_danish(raw);
    if v.is_empty() {
        return None;
    }

    if v == "women"
        || v == "w"
        || v == "k"
        || v.contains("kvinde")
        || v.contains("dame")
        || v.contains("female")
    {
        return Some(Gender::Women);
    }

    if v == "men"
        || v == "m"
        || v.contains("maend")
        || v.contains("mand")
        || v.contains("herre")
        || v.contains("male")
    {
        return Some(Gender::Men);
    }

    None
}

const WOMEN_HINTS: &[&str] = &["dame", "kvinde", "pige", "women", "female", "girls"];
const MEN_HINTS: &[&str] = &["herre", "mand", "maend", "men", "male", "boys", "drenge"];

/// Scan free text (league + pool, or a team name) for gender hints.
///
/// Returns `None` when both hint sets match or neither does; callers must
/// propagate the ambiguity rather than defaulting.
pub fn gender_hint(text: &str) -> Option<Gender> {
    let t = fold_danish(text);

    let is_women = WOMEN_HINTS.iter().any(|h| t.contains(h));
    let is_men = MEN_HINTS.iter().any(|h| t.contains(h));

    match (is_women, is_men) {
        (true, false) => Some(Gender::Women),
        (false, true) => Some(Gender::Men),
        (true, true) => {
            debug!(text = %text, "gender hint ambiguous: both hint sets match");
            None
        }
        (false, false) => None,
    }
}
