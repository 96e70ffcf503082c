//! Ranking and filtering of taxonomy search results.
//!
//! The server returns results in relevance order; the client re-orders them
//! by specificity (Class, Group, Division, anything else) and then by code.
//! Only Class-level entries can be chosen as a fix. Broader entries are
//! hidden by default and, when context mode is on, shown as informational
//! rows that the cursor skips over.

use crate::hierarchy::{self, Level};
use crate::model::Classification;

/// One ranked result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry {
    pub classification: Classification,
    pub level: Option<Level>,
}

impl RankedEntry {
    #[must_use]
    pub fn code(&self) -> &str {
        &self.classification.code
    }

    /// Only Class-level entries may be submitted as a fix.
    #[must_use]
    pub fn is_selectable(&self) -> bool {
        self.level == Some(Level::Class)
    }

    fn priority(&self) -> u8 {
        self.level.map_or(3, Level::search_priority)
    }
}

/// Order `results` by level priority, then lexicographically by code.
#[must_use]
pub fn rank(results: Vec<Classification>) -> Vec<RankedEntry> {
    let mut ranked: Vec<RankedEntry> = results
        .into_iter()
        .map(|classification| RankedEntry {
            level: hierarchy::level_of(&classification.code),
            classification,
        })
        .collect();
    ranked.sort_by(|a, b| {
        a.priority()
            .cmp(&b.priority())
            .then_with(|| a.code().cmp(b.code()))
    });
    ranked
}

/// Ranked results plus the context toggle and a cursor that only ever rests
/// on a selectable row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    ranked: Vec<RankedEntry>,
    show_context: bool,
    /// Index into [`Self::visible`].
    cursor: Option<usize>,
}

impl SearchResults {
    #[must_use]
    pub fn new(results: Vec<Classification>, show_context: bool) -> Self {
        let mut out = Self {
            ranked: rank(results),
            show_context,
            cursor: None,
        };
        out.cursor = out.first_selectable();
        out
    }

    /// Rows currently shown, in display order.
    #[must_use]
    pub fn visible(&self) -> Vec<&RankedEntry> {
        self.ranked
            .iter()
            .filter(|entry| self.show_context || entry.is_selectable())
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    /// Rows hidden because context mode is off.
    #[must_use]
    pub fn hidden(&self) -> usize {
        if self.show_context {
            0
        } else {
            self.ranked.iter().filter(|e| !e.is_selectable()).count()
        }
    }

    #[must_use]
    pub const fn show_context(&self) -> bool {
        self.show_context
    }

    /// Flip context mode, keeping the cursor on the same code.
    pub fn toggle_context(&mut self) -> bool {
        let keep = self.selected().map(|entry| entry.code().to_string());
        self.show_context = !self.show_context;
        self.cursor = keep
            .and_then(|code| self.visible().iter().position(|e| e.code() == code))
            .or_else(|| self.first_selectable());
        self.show_context
    }

    /// Visible index of the cursor.
    #[must_use]
    pub const fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    #[must_use]
    pub fn selected(&self) -> Option<&RankedEntry> {
        self.cursor
            .and_then(|idx| self.visible().get(idx).copied())
            .filter(|entry| entry.is_selectable())
    }

    /// Move to the next selectable row; stays put at the last one.
    pub fn select_next(&mut self) {
        let selectable = self.selectable_indices();
        let Some(current) = self.cursor else {
            self.cursor = selectable.first().copied();
            return;
        };
        if let Some(next) = selectable.into_iter().find(|&idx| idx > current) {
            self.cursor = Some(next);
        }
    }

    /// Move to the previous selectable row; stays put at the first one.
    pub fn select_prev(&mut self) {
        let selectable = self.selectable_indices();
        let Some(current) = self.cursor else {
            self.cursor = selectable.first().copied();
            return;
        };
        if let Some(prev) = selectable.into_iter().rev().find(|&idx| idx < current) {
            self.cursor = Some(prev);
        }
    }

    /// Code at visible row `idx` if that row may be chosen.
    #[must_use]
    pub fn choose(&self, idx: usize) -> Option<&str> {
        self.visible()
            .get(idx)
            .filter(|entry| entry.is_selectable())
            .map(|entry| entry.code())
    }

    fn selectable_indices(&self) -> Vec<usize> {
        self.visible()
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.is_selectable())
            .map(|(idx, _)| idx)
            .collect()
    }

    fn first_selectable(&self) -> Option<usize> {
        self.selectable_indices().first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn class(code: &str) -> Classification {
        Classification {
            code: code.to_string(),
            title: format!("title {code}"),
            intro: None,
            includes: None,
            also_includes: None,
            excludes: None,
        }
    }

    fn codes<'a>(entries: impl IntoIterator<Item = &'a RankedEntry>) -> Vec<&'a str> {
        entries.into_iter().map(RankedEntry::code).collect()
    }

    #[test]
    fn ranks_class_then_group_then_division() {
        let ranked = rank(vec![
            class("01.2"),
            class("01.1.3"),
            class("01"),
            class("01.1.1"),
        ]);
        assert_eq!(codes(&ranked), vec!["01.1.1", "01.1.3", "01.2", "01"]);
    }

    #[test]
    fn detail_and_blank_codes_sort_last() {
        let ranked = rank(vec![class("01.1.1.1"), class("02"), class("")]);
        assert_eq!(codes(&ranked), vec!["02", "", "01.1.1.1"]);
    }

    #[test]
    fn default_filter_shows_only_classes() {
        let results = SearchResults::new(
            vec![class("01.2"), class("01.1.3"), class("01"), class("01.1.1")],
            false,
        );
        assert_eq!(codes(results.visible()), vec!["01.1.1", "01.1.3"]);
        assert_eq!(results.hidden(), 2);
    }

    #[test]
    fn context_mode_reveals_informational_rows() {
        let mut results = SearchResults::new(vec![class("01.2"), class("01.1.1")], false);
        assert!(results.toggle_context());
        assert_eq!(codes(results.visible()), vec!["01.1.1", "01.2"]);
        assert_eq!(results.hidden(), 0);
        assert_eq!(results.choose(1), None);
        assert_eq!(results.choose(0), Some("01.1.1"));
    }

    #[test]
    fn navigation_skips_informational_rows_and_clamps() {
        let mut results = SearchResults::new(
            vec![class("01.1.1"), class("01"), class("01.1"), class("02.1.1")],
            true,
        );
        // visible: 01.1.1, 02.1.1, 01.1, 01
        assert_eq!(results.selected().map(RankedEntry::code), Some("01.1.1"));
        results.select_next();
        assert_eq!(results.selected().map(RankedEntry::code), Some("02.1.1"));
        results.select_next();
        assert_eq!(results.selected().map(RankedEntry::code), Some("02.1.1"));
        results.select_prev();
        results.select_prev();
        assert_eq!(results.selected().map(RankedEntry::code), Some("01.1.1"));
    }

    #[test]
    fn toggle_keeps_the_selected_code() {
        let mut results = SearchResults::new(
            vec![class("01"), class("01.1.1"), class("01.1.2")],
            false,
        );
        results.select_next();
        assert_eq!(results.selected().map(RankedEntry::code), Some("01.1.2"));
        results.toggle_context();
        assert_eq!(results.selected().map(RankedEntry::code), Some("01.1.2"));
        results.toggle_context();
        assert_eq!(results.selected().map(RankedEntry::code), Some("01.1.2"));
    }

    #[test]
    fn no_selectable_rows_means_no_cursor() {
        let mut results = SearchResults::new(vec![class("01"), class("01.1")], true);
        assert_eq!(results.cursor(), None);
        results.select_next();
        assert!(results.selected().is_none());
    }

    proptest! {
        #[test]
        fn ranking_is_a_sorted_permutation(
            raw in proptest::collection::vec("[0-9]{1,2}(\\.[0-9]{1,2}){0,3}", 0..20)
        ) {
            let ranked = rank(raw.iter().map(|c| class(c)).collect());
            prop_assert_eq!(ranked.len(), raw.len());
            for pair in ranked.windows(2) {
                let key = |e: &RankedEntry| (e.priority(), e.code().to_string());
                prop_assert!(key(&pair[0]) <= key(&pair[1]));
            }
        }
    }
}
