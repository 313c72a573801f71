//! Cookie header sanitization.

use crate::config::Config;
use crate::error::Error;
use crate::percent::UriSanitizer;
use crate::sanitizer::Sanitizer;
use crate::value::FieldValue;

/// Separator used when the cookie pairs are joined back together.
pub const COOKIE_SEPARATOR: &str = "; ";

/// Sanitizes a `Cookie` header pair by pair.
///
/// The header is split on `;` or `,` (plus any spaces that follow) and
/// every piece is normalized on its own with the [`UriSanitizer`]. A value
/// that decodes to a literal `;` therefore cannot merge into, or split off,
/// a neighbouring cookie.
///
/// # Examples
///
/// ```
/// use utf8_sanitizer::{Config, CookieSanitizer, FieldValue, Sanitizer};
///
/// let config = Config::default();
/// let sanitizer = CookieSanitizer::from_config(&config);
///
/// let cookie = sanitizer
///     .sanitize(FieldValue::new(b"foo=bla; quux=bar\xED".to_vec()))
///     .unwrap();
/// assert_eq!(cookie.as_str(), Some("foo=bla; quux=bar%EF%BF%BD"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CookieSanitizer<'a> {
    uri: UriSanitizer<'a>,
}

impl<'a> CookieSanitizer<'a> {
    /// Creates a cookie sanitizer on top of a URI sanitizer.
    pub fn new(uri: UriSanitizer<'a>) -> Self {
        Self { uri }
    }

    /// Creates a cookie sanitizer from the configuration.
    pub fn from_config(config: &'a Config) -> Self {
        Self::new(UriSanitizer::from_config(config))
    }
}

impl Sanitizer for CookieSanitizer<'_> {
    fn sanitize(&self, input: FieldValue) -> Result<FieldValue, Error> {
        let pairs = split_cookie_pairs(input.as_bytes())
            .into_iter()
            .map(|pair| self.uri.normalize(pair))
            .collect::<Result<Vec<_>, _>>()?;
        let joined = pairs.join(COOKIE_SEPARATOR);

        if joined.as_bytes() == input.as_bytes() {
            return Ok(input);
        }
        Ok(input.transfer(joined.into_bytes()))
    }
}

/// Splits a raw cookie header into its pairs.
///
/// Every space after a delimiter is consumed. Pairs are not split on `=`.
/// Trailing empty pieces are dropped.
pub fn split_cookie_pairs(header: &[u8]) -> Vec<&[u8]> {
    let mut pairs = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < header.len() {
        if matches!(header[i], b';' | b',') {
            pairs.push(&header[start..i]);
            i += 1;
            while header.get(i) == Some(&b' ') {
                i += 1;
            }
            start = i;
        } else {
            i += 1;
        }
    }
    pairs.push(&header[start..]);

    while pairs.last().is_some_and(|pair| pair.is_empty()) {
        pairs.pop();
    }
    pairs
}
