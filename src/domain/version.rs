//! Game version classification from repository tags.

use std::fmt;

use regex::Regex;

/// A released version number, or the work after the last tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Version {
    Released(u32),
    Unreleased,
}

impl Version {
    pub fn is_released(&self) -> bool {
        matches!(self, Version::Released(_))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::Released(n) => write!(f, "{}", n),
            Version::Unreleased => f.write_str("unreleased"),
        }
    }
}

/// Rules turning tag names into version numbers.
#[derive(Debug, Clone)]
pub struct TagRules {
    prefix: String,
    ignore: Vec<String>,
    window: u32,
    number: Regex,
}

impl TagRules {
    pub fn new(prefix: impl Into<String>, ignore: Vec<String>, window: u32) -> Self {
        Self {
            prefix: prefix.into(),
            ignore,
            window,
            number: Regex::new(r"^\d+").expect("static regex"),
        }
    }

    /// Version number encoded in `tag`, ignoring the window.
    pub fn parse(&self, tag: &str) -> Option<u32> {
        let tag = tag.trim();
        let rest = tag.strip_prefix(self.prefix.as_str())?;
        if self.ignore.iter().any(|marker| rest.contains(marker.as_str())) {
            return None;
        }
        self.number.find(rest)?.as_str().parse().ok()
    }
}

/// Ordered list of versions derived from a tag listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeLog {
    versions: Vec<Version>,
    tags: Vec<(u32, String)>,
}

impl ChangeLog {
    /// Keep the tags within `window` of the newest one, oldest first.
    ///
    /// With `released_only` unset an [`Version::Unreleased`] entry closes the
    /// list.
    pub fn from_tags<S: AsRef<str>>(tags: &[S], rules: &TagRules, released_only: bool) -> Self {
        let parsed: Vec<(u32, String)> = tags
            .iter()
            .filter_map(|t| rules.parse(t.as_ref()).map(|n| (n, t.as_ref().trim().to_string())))
            .collect();
        let max = parsed.iter().map(|(n, _)| *n).max().unwrap_or(0);
        let floor = max.saturating_sub(rules.window);

        let mut kept: Vec<(u32, String)> = parsed.into_iter().filter(|(n, _)| *n > floor).collect();
        kept.sort_by_key(|(n, _)| *n);
        kept.dedup_by_key(|(n, _)| *n);

        let mut versions: Vec<Version> = kept.iter().map(|(n, _)| Version::Released(*n)).collect();
        if !released_only {
            versions.push(Version::Unreleased);
        }
        Self { versions, tags: kept }
    }

    /// All versions, oldest first.
    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    /// Released versions with their tag names, oldest first.
    pub fn tagged(&self) -> &[(u32, String)] {
        &self.tags
    }

    /// Versions after the baseline, newest first.
    pub fn valid_versions(&self) -> Vec<Version> {
        self.versions.iter().skip(1).rev().copied().collect()
    }

    pub fn last_released(&self) -> Option<Version> {
        self.versions.iter().rev().find(|v| v.is_released()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> TagRules {
        TagRules::new("OneLife_v", vec!["_test".to_string()], 3)
    }

    #[test]
    fn given_tags_when_parsing_then_strips_prefix_and_skips_markers() {
        let rules = rules();
        assert_eq!(rules.parse("OneLife_v42"), Some(42));
        assert_eq!(rules.parse("OneLife_v42b"), Some(42));
        assert_eq!(rules.parse("OneLife_v42_test"), None);
        assert_eq!(rules.parse("Other_v42"), None);
        assert_eq!(rules.parse("OneLife_vX"), None);
    }

    #[test]
    fn given_tag_listing_when_building_then_keeps_window_sorted() {
        let tags = ["OneLife_v10", "OneLife_v8", "OneLife_v7", "OneLife_v9", "junk"];

        let log = ChangeLog::from_tags(&tags, &rules(), false);

        assert_eq!(
            log.versions(),
            &[
                Version::Released(8),
                Version::Released(9),
                Version::Released(10),
                Version::Unreleased
            ]
        );
        assert_eq!(
            log.valid_versions(),
            vec![Version::Unreleased, Version::Released(10), Version::Released(9)]
        );
        assert_eq!(log.last_released(), Some(Version::Released(10)));
        assert_eq!(log.tagged()[0], (8, "OneLife_v8".to_string()));
    }

    #[test]
    fn given_released_only_when_building_then_has_no_unreleased_entry() {
        let log = ChangeLog::from_tags(&["OneLife_v1", "OneLife_v2"], &rules(), true);

        assert_eq!(log.versions(), &[Version::Released(1), Version::Released(2)]);
        assert_eq!(log.valid_versions(), vec![Version::Released(2)]);
    }

    #[test]
    fn given_no_tags_when_building_then_only_unreleased() {
        let log = ChangeLog::from_tags::<&str>(&[], &rules(), false);

        assert_eq!(log.versions(), &[Version::Unreleased]);
        assert_eq!(log.last_released(), None);
        assert!(log.valid_versions().is_empty());
    }
}
