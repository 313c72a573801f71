//! Percent-encoding normalization for URI-like fields.
//!
//! Normalization runs in four steps:
//!
//! 1. repair the raw value with the active strategy
//! 2. decode `%XX` triplets that stand for unreserved characters or bytes of
//!    a multibyte UTF-8 sequence, leaving reserved delimiters encoded
//! 3. repair again, since decoded bytes may form invalid sequences
//! 4. percent-encode every byte outside the reserved and unreserved sets
//!
//! The output is pure ASCII and the URI structure (`/`, `?`, `&`, `=` and
//! the other delimiters) is never altered: an encoded `%2F` stays encoded and
//! a literal `/` stays literal.
//!
//! Byte classes are lookup tables rather than regular expressions: a
//! 256-entry table for the decode step and a `percent_encoding::AsciiSet`
//! for the encode step.

use std::borrow::Cow;

use memchr::memchr;
use percent_encoding::{percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::config::Config;
use crate::error::Error;
use crate::sanitizer::{Sanitizer, StringSanitizer};
use crate::value::FieldValue;

const UNRESERVED_PUNCT: &[u8] = b"-._~";

// Unreserved and reserved punctuation, plus `%` itself: triplets left over
// from the decode step must not be encoded twice.
const SAFE_PUNCT: &[u8] = b"-._~:/?#[]@!$&'()*+,;=%";

const fn build_table(extra: &[u8], alphanumeric: bool) -> [bool; 256] {
    let mut table = [false; 256];
    let mut b = 0;
    while b < 256 {
        let byte = b as u8;
        table[b] = alphanumeric && byte.is_ascii_alphanumeric();
        b += 1;
    }
    let mut i = 0;
    while i < extra.len() {
        table[extra[i] as usize] = true;
        i += 1;
    }
    table
}

const fn build_unsafe_set(safe: &[u8]) -> AsciiSet {
    let mut set = NON_ALPHANUMERIC.union(AsciiSet::EMPTY);
    let mut i = 0;
    while i < safe.len() {
        set = set.remove(safe[i]);
        i += 1;
    }
    set
}

static UNRESERVED: [bool; 256] = build_table(UNRESERVED_PUNCT, true);

// Non-ASCII bytes are always encoded by `percent_encode`.
const URI_UNSAFE: &AsciiSet = &build_unsafe_set(SAFE_PUNCT);

/// Returns `true` for RFC3986 unreserved characters (`A-Za-z0-9-._~`).
pub fn is_unreserved(byte: u8) -> bool {
    UNRESERVED[byte as usize]
}

/// Returns `true` for bytes that are left unescaped by [`escape_unsafe`].
pub fn is_uri_safe(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || SAFE_PUNCT.contains(&byte)
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn decode_triplet(input: &[u8]) -> Option<u8> {
    match input {
        [b'%', hi, lo, ..] => Some(hex_digit(*hi)? << 4 | hex_digit(*lo)?),
        _ => None,
    }
}

/// Decodes percent-triplets that stand for unreserved characters.
///
/// A triplet is replaced by its raw byte when the byte is unreserved, has the
/// high bit set (part of a multibyte UTF-8 sequence) or, with `decode_null`,
/// is the null byte. Every other triplet is kept verbatim, including its
/// original hex case. Malformed triplets are ordinary text.
///
/// Returns the input borrowed when it contains no `%`.
///
/// # Examples
///
/// ```
/// use utf8_sanitizer::percent::unescape_unreserved;
///
/// assert_eq!(&*unescape_unreserved(b"%7Euser%2Fdocs", false), b"~user%2Fdocs");
/// assert_eq!(&*unescape_unreserved(b"%D0%BB", false), "л".as_bytes());
/// assert_eq!(&*unescape_unreserved(b"100%zz", false), b"100%zz");
/// ```
pub fn unescape_unreserved(input: &[u8], decode_null: bool) -> Cow<'_, [u8]> {
    let Some(first) = memchr(b'%', input) else {
        return Cow::Borrowed(input);
    };

    let mut output = Vec::with_capacity(input.len());
    output.extend_from_slice(&input[..first]);
    let mut i = first;

    while i < input.len() {
        let Some(offset) = memchr(b'%', &input[i..]) else {
            output.extend_from_slice(&input[i..]);
            break;
        };
        output.extend_from_slice(&input[i..i + offset]);
        i += offset;

        match decode_triplet(&input[i..]) {
            Some(byte) if is_unreserved(byte) || byte >= 0x80 || (decode_null && byte == 0) => {
                output.push(byte);
                i += 3;
            }
            Some(_) => {
                output.extend_from_slice(&input[i..i + 3]);
                i += 3;
            }
            None => {
                output.push(b'%');
                i += 1;
            }
        }
    }

    Cow::Owned(output)
}

/// Percent-encodes every byte outside the reserved and unreserved sets.
///
/// `%` is left alone so triplets kept by [`unescape_unreserved`] survive.
/// Hex digits are uppercase. The result is pure ASCII.
///
/// # Examples
///
/// ```
/// use utf8_sanitizer::percent::escape_unsafe;
///
/// assert_eq!(escape_unsafe("foo bar".as_bytes()), "foo%20bar");
/// assert_eq!(escape_unsafe("лол".as_bytes()), "%D0%BB%D0%BE%D0%BB");
/// assert_eq!(escape_unsafe(b"a=1&b=%2F"), "a=1&b=%2F");
/// ```
pub fn escape_unsafe(input: &[u8]) -> String {
    percent_encode(input, URI_UNSAFE).to_string()
}

/// Normalizes URI-like fields: paths, query strings, referrers.
///
/// # Examples
///
/// ```
/// use utf8_sanitizer::{Config, FieldValue, Sanitizer, UriSanitizer};
///
/// let config = Config::default();
/// let sanitizer = UriSanitizer::from_config(&config);
///
/// let path = sanitizer.sanitize(FieldValue::new("/foo%E0")).unwrap();
/// assert_eq!(path.as_str(), Some("/foo%EF%BF%BD"));
///
/// let reserved = sanitizer.sanitize(FieldValue::new("foo+%2F%3A+bar")).unwrap();
/// assert_eq!(reserved.as_str(), Some("foo+%2F%3A+bar"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct UriSanitizer<'a> {
    text: StringSanitizer<'a>,
}

impl<'a> UriSanitizer<'a> {
    /// Creates a URI sanitizer on top of a string sanitizer.
    pub fn new(text: StringSanitizer<'a>) -> Self {
        Self { text }
    }

    /// Creates a URI sanitizer from the configuration.
    pub fn from_config(config: &'a Config) -> Self {
        Self::new(StringSanitizer::from_config(config))
    }

    /// Runs the full decode, repair and re-encode pipeline over raw bytes.
    ///
    /// # Errors
    ///
    /// Returns the strategy's [`Error`] if it refuses the input, either as
    /// received or after decoding.
    pub fn normalize(&self, input: &[u8]) -> Result<String, Error> {
        let cleaned = self.text.sanitize_bytes(input)?;
        let decoded = unescape_unreserved(&cleaned, self.text.options().sanitize_null_bytes);
        let repaired = self.text.sanitize_bytes(&decoded)?;
        Ok(escape_unsafe(&repaired))
    }
}

impl Sanitizer for UriSanitizer<'_> {
    fn sanitize(&self, input: FieldValue) -> Result<FieldValue, Error> {
        let normalized = self.normalize(input.as_bytes())?;

        if normalized.as_bytes() == input.as_bytes() {
            return Ok(input);
        }
        Ok(input.transfer(normalized.into_bytes()))
    }
}
