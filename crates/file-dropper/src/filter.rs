// Copyright 2023-2024 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

use std::path::Path;

use crate::oracle::ExistenceOracle;

const WILDCARD: &str = ".";

/// Accepted extensions, parsed from a pattern such as `"*.png; *.jpg"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionFilter {
    /// Every path passes, whatever its extension.
    Any,
    /// Literal extensions including the leading dot, compared case-sensitively.
    Only(Vec<String>),
}

impl ExtensionFilter {
    pub fn parse(pattern: &str) -> Self {
        if pattern.is_empty() {
            return Self::Any;
        }
        let pattern: String = pattern
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '*')
            .collect();

        let mut tokens: Vec<String> = pattern.split(';').map(str::to_string).collect();
        // a trailing `;` does not open another token
        if tokens.last().is_some_and(|t| t.is_empty()) {
            tokens.pop();
        }

        if tokens.iter().any(|t| t == WILDCARD) {
            Self::Any
        } else {
            Self::Only(tokens)
        }
    }

    /// An empty token matches paths without an extension; no tokens match nothing.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Only(tokens) => {
                let ext = extension(path);
                tokens.iter().any(|t| t == ext)
            }
        }
    }
}

/// Suffix of the file name starting at its last dot, empty when there is none.
///
/// Both separators are honoured so Windows paths split the same on every host.
fn extension(path: &str) -> &str {
    let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    name.rfind('.').map_or("", |dot| &name[dot..])
}

/// Which dropped paths the host gets to see.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct FilterPolicy {
    /// `;` separated extensions. Empty accepts everything.
    pub pattern: String,
    pub allow_files: bool,
    pub allow_directories: bool,
    /// Return every match instead of only the first one. Also makes drops accumulate.
    pub allow_multiple: bool,
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self {
            pattern: String::new(),
            allow_files: true,
            allow_directories: true,
            allow_multiple: true,
        }
    }
}

impl FilterPolicy {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            ..Default::default()
        }
    }

    pub fn allow_files(mut self, allow: bool) -> Self {
        self.allow_files = allow;
        self
    }

    pub fn allow_directories(mut self, allow: bool) -> Self {
        self.allow_directories = allow;
        self
    }

    pub fn allow_multiple(mut self, allow: bool) -> Self {
        self.allow_multiple = allow;
        self
    }

    pub fn allows_multiple(&self) -> bool {
        self.allow_multiple
    }

    pub fn extensions(&self) -> ExtensionFilter {
        ExtensionFilter::parse(&self.pattern)
    }

    fn admits<O: ExistenceOracle + ?Sized>(&self, path: &str, oracle: &O) -> bool {
        let path = Path::new(path);
        (self.allow_files && oracle.is_file(path)) || (self.allow_directories && oracle.is_dir(path))
    }

    /// Keeps the paths of `pending` that pass the policy, in their original order.
    ///
    /// Paths that no longer exist are dropped silently.
    pub fn apply<O: ExistenceOracle + ?Sized>(&self, pending: &[String], oracle: &O) -> Vec<String> {
        let extensions = self.extensions();
        let mut survivors = pending
            .iter()
            .filter(|path| extensions.matches(path))
            .filter(|path| self.admits(path, oracle));

        if self.allow_multiple {
            survivors.cloned().collect()
        } else {
            survivors.next().cloned().into_iter().collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::tests::FakeOracle;

    fn paths(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn parse_pattern() {
        assert_eq!(ExtensionFilter::parse(""), ExtensionFilter::Any);
        assert_eq!(ExtensionFilter::parse("*.*"), ExtensionFilter::Any);
        assert_eq!(ExtensionFilter::parse(".png;."), ExtensionFilter::Any);
        assert_eq!(ExtensionFilter::parse("*"), ExtensionFilter::Only(vec![]));
        assert_eq!(ExtensionFilter::parse("  "), ExtensionFilter::Only(vec![]));
        assert_eq!(
            ExtensionFilter::parse(" *.txt ; *.md;"),
            ExtensionFilter::Only(vec![".txt".into(), ".md".into()])
        );
        assert_eq!(
            ExtensionFilter::parse(";.txt;;.md"),
            ExtensionFilter::Only(vec!["".into(), ".txt".into(), "".into(), ".md".into()])
        );
    }

    #[test]
    fn stripped_to_nothing_matches_nothing() {
        let oracle = FakeOracle::new(&["a.txt", "noext"], &["dir1"]);
        let pending = paths(&["a.txt", "dir1", "noext"]);
        assert!(FilterPolicy::new("*").apply(&pending, &oracle).is_empty());
        assert!(FilterPolicy::new("**").apply(&pending, &oracle).is_empty());
        assert!(FilterPolicy::new("  ").apply(&pending, &oracle).is_empty());
    }

    #[test]
    fn empty_token_keeps_paths_without_extension() {
        let oracle = FakeOracle::new(&["a.txt", "b.md", "noext"], &["dir1"]);
        let pending = paths(&["a.txt", "b.md", "dir1", "noext"]);
        assert_eq!(
            FilterPolicy::new(";.txt").apply(&pending, &oracle),
            ["a.txt", "dir1", "noext"]
        );
        assert_eq!(
            FilterPolicy::new(";.txt").allow_directories(false).apply(&pending, &oracle),
            ["a.txt", "noext"]
        );
    }

    #[test]
    fn extension_is_case_sensitive_suffix() {
        let filter = ExtensionFilter::parse(".txt");
        assert!(filter.matches(r"C:\notes\a.b.txt"));
        assert!(!filter.matches(r"C:\notes\A.TXT"));
        assert!(!filter.matches(r"C:\notes.txt\readme"));
        assert!(!filter.matches("/tmp/txt"));
        assert!(ExtensionFilter::Any.matches("/tmp/txt"));
    }

    #[test]
    fn files_only_by_extension() {
        let oracle = FakeOracle::new(&["a.txt", "b.md", "c.png"], &["dir1"]);
        let policy = FilterPolicy::new(".txt;.md").allow_directories(false);
        let out = policy.apply(&paths(&["a.txt", "b.md", "c.png", "dir1"]), &oracle);
        assert_eq!(out, ["a.txt", "b.md"]);
    }

    #[test]
    fn single_result_takes_first_admitted() {
        let oracle = FakeOracle::new(&["b.txt", "c.txt"], &[]);
        let policy = FilterPolicy::new(".txt").allow_multiple(false);
        assert_eq!(policy.apply(&paths(&["a.txt", "b.txt", "c.txt"]), &oracle), ["b.txt"]);

        let oracle = FakeOracle::new(&["a.txt", "b.txt"], &[]);
        assert_eq!(policy.apply(&paths(&["a.txt", "b.txt"]), &oracle), ["a.txt"]);
    }

    #[test]
    fn wildcard_keeps_existing_entries() {
        let oracle = FakeOracle::new(&["a.txt", "noext"], &["dir1"]);
        let out = FilterPolicy::default().apply(&paths(&["a.txt", "dir1", "gone", "noext"]), &oracle);
        assert_eq!(out, ["a.txt", "dir1", "noext"]);
    }

    #[test]
    fn directories_only() {
        let oracle = FakeOracle::new(&["a.txt"], &["dir1", "dir2.d"]);
        let policy = FilterPolicy::default().allow_files(false);
        let out = policy.apply(&paths(&["a.txt", "dir1", "dir2.d"]), &oracle);
        assert_eq!(out, ["dir1", "dir2.d"]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn policy_from_json() {
        let policy: FilterPolicy =
            serde_json::from_str(r#"{ "pattern": ".png", "allowMultiple": false }"#).unwrap();
        assert_eq!(policy, FilterPolicy::new(".png").allow_multiple(false));
    }
}
