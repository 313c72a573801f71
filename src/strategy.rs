//! Encoding-repair strategies.
//!
//! A strategy turns an arbitrary byte sequence into valid UTF-8 text, or
//! refuses to. The sanitizers only call the active strategy for input that
//! actually needs repair; valid input never reaches it.

use std::fmt;
use std::sync::Arc;

use crate::error::{EncodingError, Error, NullByteError};

/// The default replacement for invalid sequences (U+FFFD).
pub const REPLACEMENT_CHARACTER: &str = "\u{FFFD}";

/// Options passed to every strategy invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StrategyOptions {
    /// Treat null bytes as invalid input.
    pub sanitize_null_bytes: bool,
}

/// A caller-supplied encoding strategy.
///
/// Implementations receive the raw bytes of a field that is either not valid
/// UTF-8 or contains a forbidden null byte, and must return valid text or an
/// error. Closures with the matching signature implement this trait.
///
/// # Examples
///
/// ```
/// use utf8_sanitizer::{Strategy, StrategyOptions, Error};
///
/// // Drop every non-ASCII byte.
/// let strategy = Strategy::custom(|input: &[u8], _options: StrategyOptions| {
///     Ok::<String, Error>(input.iter().filter(|b| b.is_ascii()).map(|&b| b as char).collect())
/// });
///
/// let text = strategy.apply(b"caf\xe9", StrategyOptions::default()).unwrap();
/// assert_eq!(text, "caf");
/// ```
pub trait EncodingStrategy: Send + Sync {
    /// Repairs `input` into valid UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if the strategy refuses the input.
    fn repair(&self, input: &[u8], options: StrategyOptions) -> Result<String, Error>;
}

impl<F> EncodingStrategy for F
where
    F: Fn(&[u8], StrategyOptions) -> Result<String, Error> + Send + Sync,
{
    fn repair(&self, input: &[u8], options: StrategyOptions) -> Result<String, Error> {
        self(input, options)
    }
}

/// The encoding-repair strategy used by every sanitizer.
///
/// # Examples
///
/// ```
/// use utf8_sanitizer::{Strategy, StrategyOptions};
///
/// let options = StrategyOptions::default();
///
/// let lossy = Strategy::replace();
/// assert_eq!(lossy.apply(b"foo\xe0", options).unwrap(), "foo\u{FFFD}");
///
/// let strict = Strategy::RaiseOnInvalid;
/// assert!(strict.apply(b"foo\xe0", options).is_err());
/// ```
#[derive(Clone)]
pub enum Strategy {
    /// Substitute every maximal invalid subsequence with `replacement`.
    ///
    /// Null bytes are removed when null-byte sanitization is enabled.
    Replace {
        /// Text inserted in place of each invalid sequence
        replacement: String,
    },
    /// Fail on invalid input, and on null bytes when they are forbidden.
    RaiseOnInvalid,
    /// Delegate to a caller-supplied strategy.
    Custom(Arc<dyn EncodingStrategy>),
}

impl Strategy {
    /// The lossy strategy using U+FFFD as replacement.
    pub fn replace() -> Self {
        Self::replace_with(REPLACEMENT_CHARACTER)
    }

    /// The lossy strategy using `replacement` for invalid sequences.
    pub fn replace_with(replacement: impl Into<String>) -> Self {
        Strategy::Replace {
            replacement: replacement.into(),
        }
    }

    /// Wraps a caller-supplied strategy.
    pub fn custom(strategy: impl EncodingStrategy + 'static) -> Self {
        Strategy::Custom(Arc::new(strategy))
    }

    /// Runs the strategy over `input`.
    ///
    /// # Errors
    ///
    /// `RaiseOnInvalid` returns [`Error::Encoding`] for invalid UTF-8 and
    /// [`Error::NullByte`] for a forbidden null byte; the encoding error
    /// wins when both are present. Custom strategies may return either.
    pub fn apply(&self, input: &[u8], options: StrategyOptions) -> Result<String, Error> {
        match self {
            Strategy::Replace { replacement } => Ok(replace_invalid(input, replacement, options)),
            Strategy::RaiseOnInvalid => raise_on_invalid(input, options),
            Strategy::Custom(strategy) => strategy.repair(input, options),
        }
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Self::replace()
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Replace { replacement } => f
                .debug_struct("Replace")
                .field("replacement", replacement)
                .finish(),
            Strategy::RaiseOnInvalid => write!(f, "RaiseOnInvalid"),
            Strategy::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

fn replace_invalid(input: &[u8], replacement: &str, options: StrategyOptions) -> String {
    let mut output = String::with_capacity(input.len());

    for chunk in input.utf8_chunks() {
        let valid = chunk.valid();
        if options.sanitize_null_bytes {
            output.extend(valid.chars().filter(|&c| c != '\0'));
        } else {
            output.push_str(valid);
        }

        if !chunk.invalid().is_empty() {
            output.push_str(replacement);
        }
    }

    output
}

fn raise_on_invalid(input: &[u8], options: StrategyOptions) -> Result<String, Error> {
    let text = std::str::from_utf8(input).map_err(EncodingError::from)?;

    if options.sanitize_null_bytes {
        if let Some(offset) = memchr::memchr(0, input) {
            return Err(NullByteError::new(offset).into());
        }
    }

    Ok(text.to_owned())
}
