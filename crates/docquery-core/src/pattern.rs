//! Regular expression input for `$regex` conditions
//!
//! Patterns are forwarded to the datastore verbatim; only the anchoring rule
//! and the flag set are checked here.

use crate::error::{QueryError, Result};

/// A regular expression source plus the flags a regex literal can carry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    ignore_case: bool,
    multiline: bool,
}

impl Pattern {
    /// A bare expression source with no flags.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    /// Read a `/source/flags` literal.
    ///
    /// Input that does not start with `/` is taken as a bare source.
    pub fn parse(literal: &str) -> Result<Self> {
        let Some(rest) = literal.strip_prefix('/') else {
            return Ok(Self::new(literal));
        };
        let Some(end) = rest.rfind('/') else {
            return Err(QueryError::InvalidPattern(format!(
                "missing closing '/' in {literal}"
            )));
        };

        let mut pattern = Self::new(&rest[..end]);
        for flag in rest[end + 1..].chars() {
            match flag {
                'i' => pattern.ignore_case = true,
                'm' => pattern.multiline = true,
                // Global, sticky, unicode and dot-all have no say in $options
                'g' | 'y' | 'u' | 's' => {}
                other => {
                    return Err(QueryError::InvalidPattern(format!(
                        "unknown flag '{other}' in {literal}"
                    )))
                }
            }
        }
        Ok(pattern)
    }

    pub fn ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    pub fn multiline(mut self, multiline: bool) -> Self {
        self.multiline = multiline;
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_anchored(&self) -> bool {
        self.source.starts_with('^')
    }

    /// Resolve the `$options` flag string, rejecting case-insensitivity.
    pub(crate) fn options(&self, options: &MatchOptions) -> Result<String> {
        if (self.ignore_case || options.ignore_case == Some(true))
            && options.ignore_case != Some(false)
        {
            return Err(QueryError::CaseInsensitivePattern);
        }

        let mut flags = String::new();
        if (self.multiline || options.multiline == Some(true)) && options.multiline != Some(false)
        {
            flags.push('m');
        }
        if options.extended {
            flags.push('x');
        }
        if options.dot_matches_all {
            flags.push('s');
        }
        Ok(flags)
    }
}

impl From<&str> for Pattern {
    fn from(source: &str) -> Self {
        Pattern::new(source)
    }
}

impl From<String> for Pattern {
    fn from(source: String) -> Self {
        Pattern::new(source)
    }
}

/// Per-call overrides for `matches`.
///
/// `ignore_case` and `multiline` inherit the pattern's own flag when `None`;
/// `Some(false)` switches the flag off even if the pattern sets it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchOptions {
    pub ignore_case: Option<bool>,
    pub multiline: Option<bool>,
    pub extended: bool,
    pub dot_matches_all: bool,
}

impl MatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn multiline(mut self, multiline: bool) -> Self {
        self.multiline = Some(multiline);
        self
    }

    pub fn ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = Some(ignore_case);
        self
    }

    pub fn extended(mut self, extended: bool) -> Self {
        self.extended = extended;
        self
    }

    pub fn dot_matches_all(mut self, dot_matches_all: bool) -> Self {
        self.dot_matches_all = dot_matches_all;
        self
    }
}
