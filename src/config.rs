use std::collections::HashSet;

use crate::matcher::{FieldFilter, Matcher};
use crate::method::HttpMethod;
use crate::strategy::{Strategy, StrategyOptions};

/// Media types whose bodies are sanitized by default.
pub const DEFAULT_SANITIZABLE_CONTENT_TYPES: &[&str] = &[
    "text/plain",
    "application/x-www-form-urlencoded",
    "application/json",
    "text/javascript",
];

/// Media types whose bodies are additionally percent-normalized.
pub const URI_ENCODED_CONTENT_TYPES: &[&str] = &["application/x-www-form-urlencoded"];

/// Immutable sanitization settings.
///
/// A `Config` is built once at startup and shared read-only (typically behind
/// an `Arc`) by every request. It is never mutated after [`ConfigBuilder::build`].
///
/// # Examples
///
/// ```
/// use utf8_sanitizer::{Config, Matcher, Strategy};
///
/// let config = Config::builder()
///     .strategy(Strategy::RaiseOnInvalid)
///     .additional_content_types(["application/xml"])
///     .except(Matcher::exact("HTTP_AUTHORIZATION"))
///     .sanitize_null_bytes(true)
///     .build();
///
/// assert!(config.is_sanitizable("application/xml"));
/// assert!(config.is_sanitizable("text/plain"));
/// assert!(config.filter().skip("HTTP_AUTHORIZATION"));
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    strategy: Strategy,
    sanitizable_content_types: HashSet<String>,
    uri_encoded_content_types: HashSet<String>,
    filter: FieldFilter,
    sanitize_null_bytes: bool,
    body_methods: Option<Vec<HttpMethod>>,
}

impl Config {
    /// Starts building a configuration from the defaults.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Returns the encoding strategy.
    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Returns the options handed to the strategy.
    pub fn strategy_options(&self) -> StrategyOptions {
        StrategyOptions {
            sanitize_null_bytes: self.sanitize_null_bytes,
        }
    }

    /// Returns `true` if null bytes are treated as invalid input.
    pub fn sanitize_null_bytes(&self) -> bool {
        self.sanitize_null_bytes
    }

    /// Returns the `only` / `except` field filter.
    pub fn filter(&self) -> &FieldFilter {
        &self.filter
    }

    /// Returns `true` if bodies of `media_type` are sanitized.
    ///
    /// The comparison ignores ASCII case.
    pub fn is_sanitizable(&self, media_type: &str) -> bool {
        self.sanitizable_content_types
            .contains(&media_type.to_ascii_lowercase())
    }

    /// Returns `true` if bodies of `media_type` are percent-normalized.
    pub fn is_uri_encoded(&self, media_type: &str) -> bool {
        self.uri_encoded_content_types
            .contains(&media_type.to_ascii_lowercase())
    }

    /// Returns the method allow-list for body sanitization, if any.
    pub fn body_methods(&self) -> Option<&[HttpMethod]> {
        self.body_methods.as_deref()
    }

    /// Returns `true` if a body sent with `method` may be sanitized.
    ///
    /// Without an allow-list every request qualifies. With one, requests whose
    /// method is missing or unknown never do.
    pub fn allows_body_method(&self, method: Option<HttpMethod>) -> bool {
        match (&self.body_methods, method) {
            (None, _) => true,
            (Some(allowed), Some(method)) => allowed.contains(&method),
            (Some(_), None) => false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        ConfigBuilder::new().build()
    }
}

/// Builder for [`Config`].
///
/// Every setter consumes and returns the builder to allow chaining.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    strategy: Strategy,
    sanitizable_content_types: Option<Vec<String>>,
    additional_content_types: Vec<String>,
    only: Vec<Matcher>,
    except: Vec<Matcher>,
    sanitize_null_bytes: bool,
    body_methods: Option<Vec<HttpMethod>>,
}

impl ConfigBuilder {
    /// Creates a builder holding the defaults.
    pub fn new() -> Self {
        Self {
            strategy: Strategy::default(),
            sanitizable_content_types: None,
            additional_content_types: Vec::new(),
            only: Vec::new(),
            except: Vec::new(),
            sanitize_null_bytes: false,
            body_methods: None,
        }
    }

    /// Sets the encoding strategy.
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Replaces the default set of sanitizable media types.
    pub fn sanitizable_content_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sanitizable_content_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    /// Adds media types to the sanitizable set.
    pub fn additional_content_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.additional_content_types
            .extend(types.into_iter().map(Into::into));
        self
    }

    /// Adds a matcher to the allow-list.
    ///
    /// An exact matcher already present is not added again.
    pub fn only(mut self, matcher: impl Into<Matcher>) -> Self {
        push_matcher(&mut self.only, matcher.into());
        self
    }

    /// Adds a matcher to the deny-list.
    ///
    /// An exact matcher already present is not added again.
    pub fn except(mut self, matcher: impl Into<Matcher>) -> Self {
        push_matcher(&mut self.except, matcher.into());
        self
    }

    /// Treats null bytes (raw or `%00`) as invalid input.
    pub fn sanitize_null_bytes(mut self, enabled: bool) -> Self {
        self.sanitize_null_bytes = enabled;
        self
    }

    /// Restricts body sanitization to the given methods.
    pub fn body_methods(mut self, methods: impl IntoIterator<Item = HttpMethod>) -> Self {
        self.body_methods = Some(methods.into_iter().collect());
        self
    }

    /// Builds the immutable configuration.
    pub fn build(self) -> Config {
        let base = match self.sanitizable_content_types {
            Some(types) => types,
            None => DEFAULT_SANITIZABLE_CONTENT_TYPES
                .iter()
                .map(|t| t.to_string())
                .collect(),
        };

        let sanitizable_content_types = base
            .into_iter()
            .chain(self.additional_content_types)
            .map(|t| t.to_ascii_lowercase())
            .collect();

        let uri_encoded_content_types = URI_ENCODED_CONTENT_TYPES
            .iter()
            .map(|t| t.to_string())
            .collect();

        Config {
            strategy: self.strategy,
            sanitizable_content_types,
            uri_encoded_content_types,
            filter: FieldFilter::new(self.only, self.except),
            sanitize_null_bytes: self.sanitize_null_bytes,
            body_methods: self.body_methods,
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn push_matcher(list: &mut Vec<Matcher>, matcher: Matcher) {
    // Deduplicate: only add if not already present
    if let Matcher::Exact(name) = &matcher {
        if list
            .iter()
            .any(|m| matches!(m, Matcher::Exact(existing) if existing == name))
        {
            return;
        }
    }
    list.push(matcher);
}
