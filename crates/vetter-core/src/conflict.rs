//! How two candidate codes are presented and accepted.

use crate::model::Item;
use serde::Serialize;
use std::fmt;

/// Presentation mode for an item's candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewMode {
    /// Existing and model codes agree; one candidate, plain accept.
    SingleMatch,
    /// Both codes present and different; the reviewer must pick one.
    Conflict,
    /// At most one code present.
    SingleCandidate,
}

impl fmt::Display for ReviewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SingleMatch => "match",
            Self::Conflict => "conflict",
            Self::SingleCandidate => "single candidate",
        })
    }
}

/// The two candidate codes of an item, with blanks normalised to `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidates<'a> {
    pub existing: Option<&'a str>,
    pub model: Option<&'a str>,
}

impl<'a> Candidates<'a> {
    #[must_use]
    pub fn new(existing: Option<&'a str>, model: Option<&'a str>) -> Self {
        let clean = |code: Option<&'a str>| code.map(str::trim).filter(|c| !c.is_empty());
        Self {
            existing: clean(existing),
            model: clean(model),
        }
    }

    #[must_use]
    pub fn of(item: &'a Item) -> Self {
        Self::new(item.existing(), item.model())
    }

    #[must_use]
    pub fn mode(&self) -> ReviewMode {
        match (self.existing, self.model) {
            (Some(existing), Some(model)) if existing == model => ReviewMode::SingleMatch,
            (Some(_), Some(_)) => ReviewMode::Conflict,
            _ => ReviewMode::SingleCandidate,
        }
    }

    #[must_use]
    pub fn has_conflict(&self) -> bool {
        self.mode() == ReviewMode::Conflict
    }

    /// Code submitted by a plain accept: the model's if present, else the
    /// existing one, else empty.
    #[must_use]
    pub fn default_code(&self) -> &'a str {
        self.model.or(self.existing).unwrap_or("")
    }
}

/// True iff both codes are present and differ.
#[must_use]
pub fn has_conflict(existing: Option<&str>, model: Option<&str>) -> bool {
    Candidates::new(existing, model).has_conflict()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_codes_are_a_single_match() {
        let c = Candidates::new(Some("01.1.1"), Some("01.1.1"));
        assert_eq!(c.mode(), ReviewMode::SingleMatch);
        assert_eq!(c.default_code(), "01.1.1");
        assert!(!c.has_conflict());
    }

    #[test]
    fn different_codes_conflict() {
        let c = Candidates::new(Some("01.1.1"), Some("01.1.2"));
        assert_eq!(c.mode(), ReviewMode::Conflict);
        assert!(c.has_conflict());
    }

    #[test]
    fn single_candidate_prefers_model_then_existing() {
        let only_existing = Candidates::new(Some("02.0.0"), None);
        assert_eq!(only_existing.mode(), ReviewMode::SingleCandidate);
        assert_eq!(only_existing.default_code(), "02.0.0");

        let only_model = Candidates::new(None, Some("03.1.2"));
        assert_eq!(only_model.default_code(), "03.1.2");

        let neither = Candidates::new(None, None);
        assert_eq!(neither.mode(), ReviewMode::SingleCandidate);
        assert_eq!(neither.default_code(), "");
    }

    #[test]
    fn has_conflict_truth_table() {
        assert!(has_conflict(Some("a"), Some("b")));
        assert!(!has_conflict(Some("a"), Some("a")));
        assert!(!has_conflict(Some("a"), None));
        assert!(!has_conflict(None, Some("b")));
        assert!(!has_conflict(None, None));
    }

    #[test]
    fn blank_strings_do_not_count_as_candidates() {
        assert!(!has_conflict(Some(""), Some("01.1.1")));
        let c = Candidates::new(Some(" "), Some("01.1.1"));
        assert_eq!(c.mode(), ReviewMode::SingleCandidate);
        assert_eq!(c.default_code(), "01.1.1");
    }
}
