//! Field-name matchers for scoping sanitization.

use regex::Regex;

/// A predicate over environment field names.
///
/// # Examples
///
/// ```
/// use utf8_sanitizer::Matcher;
///
/// let exact = Matcher::exact("HTTP_USER_AGENT");
/// assert!(exact.matches("HTTP_USER_AGENT"));
/// assert!(!exact.matches("HTTP_USER_AGENT_X"));
///
/// let pattern = Matcher::pattern("^HTTP_X_").unwrap();
/// assert!(pattern.matches("HTTP_X_FORWARDED_FOR"));
/// ```
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Matches one field name exactly.
    Exact(String),
    /// Matches any field name the expression finds a match in (unanchored).
    Pattern(Regex),
}

impl Matcher {
    /// Creates an exact-name matcher.
    pub fn exact(name: impl Into<String>) -> Self {
        Matcher::Exact(name.into())
    }

    /// Creates a regular-expression matcher.
    ///
    /// # Errors
    ///
    /// Returns `regex::Error` if `pattern` is not a valid expression.
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Matcher::Pattern(Regex::new(pattern)?))
    }

    /// Returns `true` if `name` matches.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Matcher::Exact(exact) => exact == name,
            Matcher::Pattern(regex) => regex.is_match(name),
        }
    }
}

impl From<&str> for Matcher {
    fn from(name: &str) -> Self {
        Matcher::exact(name)
    }
}

impl From<String> for Matcher {
    fn from(name: String) -> Self {
        Matcher::Exact(name)
    }
}

impl From<Regex> for Matcher {
    fn from(regex: Regex) -> Self {
        Matcher::Pattern(regex)
    }
}

/// The `only` / `except` allow- and deny-lists.
///
/// A field is skipped when it hits any `except` matcher, or when `only` is
/// non-empty and the field hits none of its matchers. Empty lists never skip.
#[derive(Debug, Clone, Default)]
pub struct FieldFilter {
    only: Vec<Matcher>,
    except: Vec<Matcher>,
}

impl FieldFilter {
    /// Creates a filter from its two lists.
    pub fn new(only: Vec<Matcher>, except: Vec<Matcher>) -> Self {
        Self { only, except }
    }

    /// Returns the allow-list.
    pub fn only(&self) -> &[Matcher] {
        &self.only
    }

    /// Returns the deny-list.
    pub fn except(&self) -> &[Matcher] {
        &self.except
    }

    /// Returns `true` if the field must be left untouched.
    pub fn skip(&self, name: &str) -> bool {
        if self.except.iter().any(|m| m.matches(name)) {
            return true;
        }
        !self.only.is_empty() && !self.only.iter().any(|m| m.matches(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_skips_nothing() {
        let filter = FieldFilter::default();
        assert!(!filter.skip("PATH_INFO"));
    }

    #[test]
    fn only_list_skips_unlisted_fields() {
        let filter = FieldFilter::new(vec![Matcher::exact("PATH_INFO")], vec![]);

        assert!(!filter.skip("PATH_INFO"));
        assert!(filter.skip("QUERY_STRING"));
    }

    #[test]
    fn except_list_skips_listed_fields() {
        let filter = FieldFilter::new(vec![], vec![Matcher::exact("HTTP_COOKIE")]);

        assert!(filter.skip("HTTP_COOKIE"));
        assert!(!filter.skip("HTTP_REFERER"));
    }

    #[test]
    fn except_wins_over_only() {
        let filter = FieldFilter::new(
            vec![Matcher::pattern("^HTTP_").unwrap()],
            vec![Matcher::exact("HTTP_USER_AGENT")],
        );

        assert!(filter.skip("HTTP_USER_AGENT"));
        assert!(!filter.skip("HTTP_ACCEPT"));
        assert!(filter.skip("PATH_INFO"));
    }

    #[test]
    fn pattern_is_unanchored() {
        let matcher = Matcher::pattern("AGENT").unwrap();
        assert!(matcher.matches("HTTP_USER_AGENT"));
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        assert!(Matcher::pattern("(unclosed").is_err());
    }

    #[test]
    fn conversions_build_expected_variants() {
        assert!(matches!(Matcher::from("A"), Matcher::Exact(_)));
        assert!(matches!(Matcher::from("A".to_string()), Matcher::Exact(_)));
        assert!(matches!(
            Matcher::from(Regex::new("A").unwrap()),
            Matcher::Pattern(_)
        ));
    }
}
