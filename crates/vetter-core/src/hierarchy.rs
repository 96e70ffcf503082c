//! Dotted-code decomposition.
//!
//! A hierarchical code such as `01.1.4` names a Class whose ancestors are the
//! Group `01.1` and the Division `01`. Everything here is pure string work; the
//! titles for each prefix come from [`crate::cache::ClassificationCache`].

use crate::model::Classification;
use std::fmt;

/// Specificity level of a code, derived only from its prefix-chain length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Division,
    Group,
    Class,
    Detail,
}

impl Level {
    /// Level for a chain of `depth` prefixes. Depth zero has no level.
    #[must_use]
    pub const fn from_depth(depth: usize) -> Option<Self> {
        match depth {
            0 => None,
            1 => Some(Self::Division),
            2 => Some(Self::Group),
            3 => Some(Self::Class),
            _ => Some(Self::Detail),
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Division => "Division",
            Self::Group => "Group",
            Self::Class => "Class",
            Self::Detail => "Detail",
        }
    }

    /// Sort priority used by search ranking: Class first, then broader levels.
    #[must_use]
    pub const fn search_priority(self) -> u8 {
        match self {
            Self::Class => 0,
            Self::Group => 1,
            Self::Division => 2,
            Self::Detail => 3,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One rung of a code's ancestor chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyEntry {
    pub level: Level,
    pub code: String,
    pub classification: Option<Classification>,
}

/// Decompose `code` into its prefix chain, shortest first.
///
/// `resolve("1.2.3") == ["1", "1.2", "1.2.3"]`; blank input yields an empty
/// chain.
#[must_use]
pub fn resolve(code: &str) -> Vec<String> {
    let code = code.trim();
    if code.is_empty() {
        return Vec::new();
    }

    let mut prefixes = Vec::new();
    let mut current = String::with_capacity(code.len());
    for (idx, part) in code.split('.').enumerate() {
        if idx > 0 {
            current.push('.');
        }
        current.push_str(part);
        prefixes.push(current.clone());
    }
    prefixes
}

/// Level of `code`, or `None` for a blank code.
#[must_use]
pub fn level_of(code: &str) -> Option<Level> {
    Level::from_depth(resolve(code).len())
}

/// Human label for `code`'s level; `"Unknown"` for a blank code.
#[must_use]
pub fn level_label(code: &str) -> &'static str {
    level_of(code).map_or("Unknown", Level::label)
}

/// Build the labelled ancestor chain for `code`, filling in whatever the
/// lookup currently knows about each prefix.
pub fn build_hierarchy<F>(code: &str, mut lookup: F) -> Vec<HierarchyEntry>
where
    F: FnMut(&str) -> Option<Classification>,
{
    resolve(code)
        .into_iter()
        .enumerate()
        .filter_map(|(idx, prefix)| {
            let level = Level::from_depth(idx + 1)?;
            let classification = lookup(&prefix);
            Some(HierarchyEntry {
                level,
                code: prefix,
                classification,
            })
        })
        .collect()
}
