//! Base-name patterns for files and directories.
//!
//! Patterns are regular expressions matched against the last path component
//! only. Matching is case-insensitive unless requested otherwise, and can be
//! inverted so a pattern selects everything it does *not* match.
//!
//! A malformed expression is reported once, when it is compiled. From then on
//! it never matches anything, and so it never filters anything out.

use std::path::Path;

use regex::{Regex, RegexBuilder};

/// A compiled base-name pattern.
#[derive(Debug, Clone)]
pub struct NamePattern {
    source: String,
    regex: Option<Regex>,
    invert: bool,
}

impl NamePattern {
    /// Compile `expr`.
    ///
    /// Never fails: an invalid expression is logged and yields a pattern
    /// that matches nothing.
    #[must_use]
    pub fn new(expr: &str, case_sensitive: bool, invert: bool) -> Self {
        let regex = match RegexBuilder::new(expr)
            .case_insensitive(!case_sensitive)
            .build()
        {
            Ok(re) => Some(re),
            Err(e) => {
                log::warn!("Invalid pattern '{}', ignoring it: {}", expr, e);
                None
            }
        };

        Self {
            source: expr.to_string(),
            regex,
            invert,
        }
    }

    /// The expression as written.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the expression compiled.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.regex.is_some()
    }

    /// Raw match of the base name of `path`, ignoring inversion.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        let Some(re) = &self.regex else {
            return false;
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        re.is_match(&name)
    }

    /// Whether `path` is selected by this pattern.
    ///
    /// A valid pattern selects what it matches (or, inverted, what it does
    /// not match). An invalid pattern selects everything.
    #[must_use]
    pub fn accepts(&self, path: &Path) -> bool {
        if !self.is_valid() {
            return true;
        }
        self.matches(path) != self.invert
    }
}
