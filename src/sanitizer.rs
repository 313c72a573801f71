use std::borrow::Cow;

use crate::config::Config;
use crate::error::Error;
use crate::strategy::{Strategy, StrategyOptions};
use crate::value::FieldValue;

/// Trait for sanitizing a single request field.
///
/// `Sanitizer` defines the interface shared by every field-level sanitizer in
/// this crate: text headers, URI-like fields and cookies.
///
/// # Invariants
///
/// Implementations MUST:
/// - Return a value whose bytes are valid UTF-8
/// - Return the input unchanged (bytes and mutability) when it needs no repair
/// - Carry the input's [`Mutability`](crate::Mutability) over to the output
/// - Propagate strategy failures instead of swallowing them
///
/// # Examples
///
/// ```
/// use utf8_sanitizer::{FieldValue, Sanitizer, StringSanitizer, Strategy, StrategyOptions};
///
/// let strategy = Strategy::replace();
/// let sanitizer = StringSanitizer::new(&strategy, StrategyOptions::default());
///
/// let clean = sanitizer.sanitize(FieldValue::new(b"Mozilla\xe0".to_vec())).unwrap();
/// assert_eq!(clean.as_str(), Some("Mozilla\u{FFFD}"));
/// ```
pub trait Sanitizer {
    /// Sanitizes a field value.
    ///
    /// # Errors
    ///
    /// Returns the active strategy's [`Error`] if it refuses the input.
    fn sanitize(&self, input: FieldValue) -> Result<FieldValue, Error>;
}

/// Validates and repairs plain text fields such as request headers.
///
/// Input that is already valid UTF-8 (and free of null bytes when those are
/// forbidden) is returned as-is. Anything else is handed to the configured
/// [`Strategy`].
#[derive(Debug, Clone, Copy)]
pub struct StringSanitizer<'a> {
    strategy: &'a Strategy,
    options: StrategyOptions,
}

impl<'a> StringSanitizer<'a> {
    /// Creates a string sanitizer from a strategy and its options.
    pub fn new(strategy: &'a Strategy, options: StrategyOptions) -> Self {
        Self { strategy, options }
    }

    /// Creates a string sanitizer using the configuration's strategy and
    /// null-byte policy.
    pub fn from_config(config: &'a Config) -> Self {
        Self::new(config.strategy(), config.strategy_options())
    }

    /// Returns the options passed to the strategy.
    pub fn options(&self) -> StrategyOptions {
        self.options
    }

    /// Returns `true` if `bytes` must go through the strategy.
    pub fn needs_repair(&self, bytes: &[u8]) -> bool {
        std::str::from_utf8(bytes).is_err()
            || (self.options.sanitize_null_bytes && memchr::memchr(0, bytes).is_some())
    }

    /// Sanitizes raw bytes, borrowing them when no repair is needed.
    ///
    /// # Errors
    ///
    /// Returns the strategy's [`Error`] if it refuses the input.
    pub fn sanitize_bytes<'b>(&self, bytes: &'b [u8]) -> Result<Cow<'b, [u8]>, Error> {
        if !self.needs_repair(bytes) {
            return Ok(Cow::Borrowed(bytes));
        }

        let repaired = self.strategy.apply(bytes, self.options)?;
        Ok(Cow::Owned(repaired.into_bytes()))
    }
}

impl Sanitizer for StringSanitizer<'_> {
    fn sanitize(&self, input: FieldValue) -> Result<FieldValue, Error> {
        if !self.needs_repair(input.as_bytes()) {
            return Ok(input);
        }

        let repaired = self.strategy.apply(input.as_bytes(), self.options)?;
        Ok(input.transfer(repaired.into_bytes()))
    }
}
